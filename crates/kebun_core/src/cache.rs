use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use chrono::{Duration, NaiveDateTime};
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::Clock;
use crate::model::{
    Garden, Issue, IssueStatus, Maintenance, MaintenanceStatus, NewMaintenance, RecordId, Task,
    TaskStatus,
};
use crate::store::{KebunStore, StoreResult};

/// Lists are served from cache for one minute unless configured otherwise.
pub const DEFAULT_FRESHNESS_SECS: i64 = 60;

struct Entry<T> {
    value: T,
    fetched_at: NaiveDateTime,
}

struct Table<K, T> {
    entries: RwLock<HashMap<K, Entry<T>>>,
}

impl<K: Eq + Hash + Clone, T: Clone> Table<K, T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn fresh(&self, key: &K, now: NaiveDateTime, window: Duration) -> Option<T> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        (now - entry.fetched_at < window).then(|| entry.value.clone())
    }

    fn store(&self, key: K, value: T, now: NaiveDateTime) {
        self.entries.write().insert(
            key,
            Entry {
                value,
                fetched_at: now,
            },
        );
    }

    fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Read-through cache in front of another store.
///
/// Listings are keyed by garden and reused while younger than the freshness
/// window. Errors are passed through and never cached. Writes invalidate the
/// cached lists of the garden they touch.
pub struct CachedStore<S> {
    inner: S,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    gardens: Table<(), Vec<Garden>>,
    maintenances: Table<RecordId, Vec<Maintenance>>,
    issues: Table<RecordId, Vec<Issue>>,
    tasks: Table<RecordId, Vec<Task>>,
}

impl<S: KebunStore> CachedStore<S> {
    pub fn with_clock(inner: S, clock: Arc<dyn Clock>, freshness: Duration) -> Self {
        Self {
            inner,
            clock,
            freshness,
            gardens: Table::new(),
            maintenances: Table::new(),
            issues: Table::new(),
            tasks: Table::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached listing.
    pub fn invalidate_all(&self) {
        self.gardens.clear();
        self.maintenances.clear();
        self.issues.clear();
        self.tasks.clear();
    }

    fn read_through<K, T>(
        &self,
        table: &Table<K, T>,
        key: K,
        fetch: impl FnOnce() -> StoreResult<T>,
    ) -> StoreResult<T>
    where
        K: Eq + Hash + Clone + std::fmt::Debug,
        T: Clone,
    {
        let now = self.clock.now();
        if let Some(hit) = table.fresh(&key, now, self.freshness) {
            return Ok(hit);
        }
        debug!(?key, "cache miss");
        let value = fetch()?;
        table.store(key, value.clone(), now);
        Ok(value)
    }
}

impl<S: KebunStore> KebunStore for CachedStore<S> {
    fn list_gardens(&self) -> StoreResult<Vec<Garden>> {
        self.read_through(&self.gardens, (), || self.inner.list_gardens())
    }

    fn list_maintenances(&self, garden_id: &str) -> StoreResult<Vec<Maintenance>> {
        self.read_through(&self.maintenances, garden_id.to_string(), || {
            self.inner.list_maintenances(garden_id)
        })
    }

    fn list_issues(&self, garden_id: &str) -> StoreResult<Vec<Issue>> {
        self.read_through(&self.issues, garden_id.to_string(), || {
            self.inner.list_issues(garden_id)
        })
    }

    fn list_tasks(&self, garden_id: &str) -> StoreResult<Vec<Task>> {
        self.read_through(&self.tasks, garden_id.to_string(), || {
            self.inner.list_tasks(garden_id)
        })
    }

    fn update_maintenance_status(
        &self,
        id: &str,
        status: MaintenanceStatus,
    ) -> StoreResult<Maintenance> {
        let updated = self.inner.update_maintenance_status(id, status)?;
        self.maintenances.invalidate(&updated.garden_id);
        Ok(updated)
    }

    fn create_maintenance(&self, record: NewMaintenance) -> StoreResult<Maintenance> {
        let created = self.inner.create_maintenance(record)?;
        self.maintenances.invalidate(&created.garden_id);
        Ok(created)
    }

    fn update_issue_status(&self, id: &str, status: IssueStatus) -> StoreResult<Issue> {
        let updated = self.inner.update_issue_status(id, status)?;
        self.issues.invalidate(&updated.garden_id);
        Ok(updated)
    }

    fn update_task_status(&self, id: &str, status: TaskStatus) -> StoreResult<Task> {
        let updated = self.inner.update_task_status(id, status)?;
        self.tasks.invalidate(&updated.garden_id);
        Ok(updated)
    }
}
