use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    buckets::{group_by_date, TodoBuckets},
    cache::CachedStore,
    clock::{Clock, SystemClock},
    model::{Garden, Issue, IssueStatus, Maintenance, MaintenanceStatus, Task, TaskStatus},
    recurrence::{RecurrenceOutcome, RecurrenceScheduler},
    store::{KebunStore, StoreError, StoreResult},
    summary::{find_garden, GardenSummary},
    todo::{TodoAggregator, TodoItem, TodoKind},
};

/// A bucketed todo list, possibly truncated, plus the size before truncation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoBoard {
    pub buckets: TodoBuckets,
    pub total: usize,
}

impl TodoBoard {
    pub fn shown(&self) -> usize {
        self.buckets.len()
    }

    pub fn has_more(&self) -> bool {
        self.total > self.shown()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub completed: Maintenance,
    pub recurrence: RecurrenceOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TodoCompletion {
    Maintenance(CompletionReport),
    Issue(Issue),
    Task(Task),
}

pub struct KebunService {
    store: Arc<dyn KebunStore>,
    clock: Arc<dyn Clock>,
}

pub struct KebunServiceBuilder {
    store: Option<Arc<dyn KebunStore>>,
    clock: Option<Arc<dyn Clock>>,
    cache_freshness: Option<Duration>,
}

impl KebunServiceBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            clock: None,
            cache_freshness: None,
        }
    }

    pub fn with_store(mut self, store: impl KebunStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Serves listings from a read-through cache younger than `freshness`.
    pub fn with_cache(mut self, freshness: Duration) -> Self {
        self.cache_freshness = Some(freshness);
        self
    }

    pub fn build(self) -> Result<KebunService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("a store is required to build the service"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store: Arc<dyn KebunStore> = match self.cache_freshness {
            Some(freshness) => Arc::new(CachedStore::with_clock(store, clock.clone(), freshness)),
            None => store,
        };
        Ok(KebunService { store, clock })
    }
}

impl Default for KebunServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KebunService {
    pub fn builder() -> KebunServiceBuilder {
        KebunServiceBuilder::new()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Pending maintenance, open issues and unfinished tasks across all
    /// gardens, earliest first. Never fails; unreachable data is skipped.
    pub fn todos(&self) -> Vec<TodoItem> {
        TodoAggregator::new(self.store.as_ref()).collect()
    }

    pub fn pending_todos_count(&self) -> usize {
        self.todos().len()
    }

    pub fn todos_grouped_by_date(&self) -> TodoBuckets {
        group_by_date(self.todos(), self.clock.today())
    }

    pub fn todo_board(&self, limit: Option<usize>) -> TodoBoard {
        let buckets = self.todos_grouped_by_date();
        let total = buckets.len();
        let buckets = match limit {
            Some(limit) => buckets.truncated(limit),
            None => buckets,
        };
        TodoBoard { buckets, total }
    }

    pub fn find_todo(&self, id: &str) -> Option<TodoItem> {
        self.todos().into_iter().find(|item| item.id == id)
    }

    pub fn gardens(&self) -> StoreResult<Vec<Garden>> {
        self.store.list_gardens()
    }

    pub fn summary(&self) -> StoreResult<GardenSummary> {
        Ok(GardenSummary::from_gardens(&self.gardens()?))
    }

    pub fn resolve_garden(&self, id_or_slug: &str) -> StoreResult<Option<Garden>> {
        let gardens = self.gardens()?;
        Ok(find_garden(&gardens, id_or_slug).cloned())
    }

    /// Marks a maintenance done and schedules its next occurrence when it
    /// recurs. Only the status change can fail; scheduling problems are
    /// reported in the returned outcome.
    #[instrument(skip(self))]
    pub fn complete_maintenance(
        &self,
        garden_id: &str,
        maintenance_id: &str,
    ) -> StoreResult<CompletionReport> {
        let existing = self.store.list_maintenances(garden_id)?;
        if !existing.iter().any(|m| m.id == maintenance_id) {
            return Err(StoreError::NotFound {
                entity: "maintenance",
                id: maintenance_id.to_string(),
            });
        }

        let completed = self
            .store
            .update_maintenance_status(maintenance_id, MaintenanceStatus::Completed)?;
        info!(maintenance = %completed.id, "maintenance marked done");

        let recurrence = RecurrenceScheduler::new(self.store.as_ref()).on_completed(
            &completed,
            &existing,
            self.clock.now(),
        );
        Ok(CompletionReport {
            completed,
            recurrence,
        })
    }

    /// Completes a todo the way the dashboard swipe does: maintenance goes
    /// through [`Self::complete_maintenance`], issues are resolved and tasks
    /// are marked done.
    #[instrument(skip(self, item), fields(todo = %item.id, kind = item.kind.as_str()))]
    pub fn complete_todo(&self, item: &TodoItem) -> StoreResult<TodoCompletion> {
        match item.kind {
            TodoKind::Maintenance => self
                .complete_maintenance(&item.garden_id, &item.id)
                .map(TodoCompletion::Maintenance),
            TodoKind::Issue => self
                .store
                .update_issue_status(&item.id, IssueStatus::Resolved)
                .map(TodoCompletion::Issue),
            TodoKind::Task => self
                .store
                .update_task_status(&item.id, TaskStatus::Done)
                .map(TodoCompletion::Task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::{InMemoryStore, Snapshot};
    use chrono::NaiveDateTime;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 24)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn days(n: i64) -> NaiveDateTime {
        now() + Duration::days(n)
    }

    fn snapshot() -> Snapshot {
        let garden = Garden {
            id: "g-1".into(),
            nama: "Kebun Lestari".into(),
            slug: "kebun-lestari".into(),
            lokasi: "Siak".into(),
            luas: 8.0,
            jumlah_pohon: 1100,
            status: "Produktif".into(),
        };
        let maintenance = Maintenance {
            id: "m-1".into(),
            garden_id: "g-1".into(),
            jenis_perawatan: "Pemupukan".into(),
            judul: "Pupuk bulanan".into(),
            tanggal_dijadwalkan: days(-3),
            status: MaintenanceStatus::Scheduled,
            detail: None,
            penanggung_jawab: Some("Pak Joko".into()),
            is_recurring: true,
            recurring_interval: Some(30),
            tanggal_selesai: None,
        };
        let task = Task {
            id: "t-1".into(),
            garden_id: "g-1".into(),
            judul: "Cek drainase".into(),
            deskripsi: None,
            kategori: "Infrastruktur".into(),
            prioritas: "Tinggi".into(),
            status: TaskStatus::InProgress,
            tanggal_target: days(2),
            assigned_to: None,
        };
        Snapshot {
            gardens: vec![garden],
            maintenances: vec![maintenance],
            issues: Vec::new(),
            tasks: vec![task],
        }
    }

    fn service(cache: Option<Duration>) -> (KebunService, Arc<InMemoryStore>) {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
        let store = Arc::new(InMemoryStore::with_clock(snapshot(), clock.clone()));
        let mut builder = KebunService::builder()
            .with_store(store.clone())
            .with_clock(clock);
        if let Some(freshness) = cache {
            builder = builder.with_cache(freshness);
        }
        (builder.build().unwrap(), store)
    }

    #[test]
    fn build_requires_a_store() {
        assert!(KebunService::builder().build().is_err());
    }

    #[test]
    fn board_reports_total_beyond_limit() {
        let (service, _) = service(None);
        let board = service.todo_board(Some(1));
        assert_eq!(board.total, 2);
        assert_eq!(board.shown(), 1);
        assert!(board.has_more());
        assert_eq!(board.buckets.overdue[0].id, "m-1");

        let full = service.todo_board(None);
        assert!(!full.has_more());
        assert_eq!(full.buckets.this_week[0].id, "t-1");
    }

    #[test]
    fn completing_todo_dispatches_on_kind() {
        let (service, store) = service(None);
        let task = service.find_todo("t-1").unwrap();
        let TodoCompletion::Task(done) = service.complete_todo(&task).unwrap() else {
            panic!("expected task completion");
        };
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(store.snapshot().tasks[0].status, TaskStatus::Done);
        assert!(service.find_todo("t-1").is_none());
    }

    #[test]
    fn completing_unknown_maintenance_is_an_error() {
        let (service, _) = service(None);
        assert!(matches!(
            service.complete_maintenance("g-1", "m-404"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn cached_service_sees_its_own_writes() {
        let (service, _) = service(Some(Duration::seconds(60)));
        assert_eq!(service.pending_todos_count(), 2);

        let report = service.complete_maintenance("g-1", "m-1").unwrap();
        assert!(matches!(report.recurrence, RecurrenceOutcome::Scheduled { .. }));

        let todos = service.todos();
        assert_eq!(todos.len(), 2);
        assert!(todos.iter().all(|t| t.id != "m-1"));
        assert!(todos.iter().any(|t| t.judul == "Pupuk bulanan" && t.tanggal == days(30)));
    }

    #[test]
    fn summary_and_slug_lookup() {
        let (service, _) = service(None);
        let summary = service.summary().unwrap();
        assert_eq!(summary.total_gardens, 1);
        assert_eq!(summary.total_pohon, 1100);
        let garden = service.resolve_garden("kebun-lestari").unwrap();
        assert_eq!(garden.map(|g| g.id), Some("g-1".to_string()));
    }
}
