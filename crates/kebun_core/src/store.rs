use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::model::{
    Garden, Issue, IssueStatus, Maintenance, MaintenanceStatus, NewMaintenance, RecordId, Task,
    TaskStatus,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// CRUD surface of the backing database that the dashboard needs.
pub trait KebunStore: Send + Sync {
    fn list_gardens(&self) -> StoreResult<Vec<Garden>>;
    fn list_maintenances(&self, garden_id: &str) -> StoreResult<Vec<Maintenance>>;
    fn list_issues(&self, garden_id: &str) -> StoreResult<Vec<Issue>>;
    fn list_tasks(&self, garden_id: &str) -> StoreResult<Vec<Task>>;

    fn update_maintenance_status(
        &self,
        id: &str,
        status: MaintenanceStatus,
    ) -> StoreResult<Maintenance>;
    fn create_maintenance(&self, record: NewMaintenance) -> StoreResult<Maintenance>;
    fn update_issue_status(&self, id: &str, status: IssueStatus) -> StoreResult<Issue>;
    fn update_task_status(&self, id: &str, status: TaskStatus) -> StoreResult<Task>;
}

impl<S: KebunStore + ?Sized> KebunStore for Arc<S> {
    fn list_gardens(&self) -> StoreResult<Vec<Garden>> {
        (**self).list_gardens()
    }

    fn list_maintenances(&self, garden_id: &str) -> StoreResult<Vec<Maintenance>> {
        (**self).list_maintenances(garden_id)
    }

    fn list_issues(&self, garden_id: &str) -> StoreResult<Vec<Issue>> {
        (**self).list_issues(garden_id)
    }

    fn list_tasks(&self, garden_id: &str) -> StoreResult<Vec<Task>> {
        (**self).list_tasks(garden_id)
    }

    fn update_maintenance_status(
        &self,
        id: &str,
        status: MaintenanceStatus,
    ) -> StoreResult<Maintenance> {
        (**self).update_maintenance_status(id, status)
    }

    fn create_maintenance(&self, record: NewMaintenance) -> StoreResult<Maintenance> {
        (**self).create_maintenance(record)
    }

    fn update_issue_status(&self, id: &str, status: IssueStatus) -> StoreResult<Issue> {
        (**self).update_issue_status(id, status)
    }

    fn update_task_status(&self, id: &str, status: TaskStatus) -> StoreResult<Task> {
        (**self).update_task_status(id, status)
    }
}

/// Flat dump of every table, as exported to or imported from a JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub gardens: Vec<Garden>,
    #[serde(default)]
    pub maintenances: Vec<Maintenance>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Snapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let payload = serde_json::to_string_pretty(self)?;
        fs::write(path, payload)
            .with_context(|| format!("failed to write snapshot {}", path.display()))
    }
}

/// Store kept entirely in memory, seeded from a [`Snapshot`].
pub struct InMemoryStore {
    state: RwLock<Snapshot>,
    clock: Arc<dyn Clock>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self::with_clock(snapshot, Arc::new(SystemClock))
    }

    /// Completion stamps (`tanggalSelesai`) are taken from `clock`.
    pub fn with_clock(snapshot: Snapshot, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(snapshot),
            clock,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.read().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

impl KebunStore for InMemoryStore {
    fn list_gardens(&self) -> StoreResult<Vec<Garden>> {
        Ok(self.state.read().gardens.clone())
    }

    fn list_maintenances(&self, garden_id: &str) -> StoreResult<Vec<Maintenance>> {
        Ok(self
            .state
            .read()
            .maintenances
            .iter()
            .filter(|m| m.garden_id == garden_id)
            .cloned()
            .collect())
    }

    fn list_issues(&self, garden_id: &str) -> StoreResult<Vec<Issue>> {
        Ok(self
            .state
            .read()
            .issues
            .iter()
            .filter(|i| i.garden_id == garden_id)
            .cloned()
            .collect())
    }

    fn list_tasks(&self, garden_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .state
            .read()
            .tasks
            .iter()
            .filter(|t| t.garden_id == garden_id)
            .cloned()
            .collect())
    }

    fn update_maintenance_status(
        &self,
        id: &str,
        status: MaintenanceStatus,
    ) -> StoreResult<Maintenance> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let record = state
            .maintenances
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| not_found("maintenance", id))?;
        record.status = status;
        record.tanggal_selesai = match status {
            MaintenanceStatus::Completed => Some(now),
            _ => None,
        };
        Ok(record.clone())
    }

    fn create_maintenance(&self, record: NewMaintenance) -> StoreResult<Maintenance> {
        let mut state = self.state.write();
        if !state.gardens.iter().any(|g| g.id == record.garden_id) {
            return Err(not_found("garden", &record.garden_id));
        }
        let created = record.into_record(Uuid::new_v4().to_string());
        state.maintenances.push(created.clone());
        Ok(created)
    }

    fn update_issue_status(&self, id: &str, status: IssueStatus) -> StoreResult<Issue> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let record = state
            .issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("issue", id))?;
        record.status = status;
        record.tanggal_selesai = match status {
            IssueStatus::Resolved => Some(now),
            IssueStatus::Open => None,
        };
        Ok(record.clone())
    }

    fn update_task_status(&self, id: &str, status: TaskStatus) -> StoreResult<Task> {
        let mut state = self.state.write();
        let record = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("task", id))?;
        record.status = status;
        Ok(record.clone())
    }
}

fn not_found(entity: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}
