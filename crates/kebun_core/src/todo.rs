use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::{Garden, Issue, IssueStatus, Maintenance, RecordId, Task};
use crate::store::{KebunStore, StoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TodoKind {
    Maintenance,
    Issue,
    Task,
}

impl TodoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Issue => "issue",
            Self::Task => "task",
        }
    }
}

/// Pending work projected from a maintenance, issue or task of one garden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: RecordId,
    pub garden_id: RecordId,
    pub garden_name: String,
    pub garden_slug: String,
    #[serde(rename = "type")]
    pub kind: TodoKind,
    pub judul: String,
    /// Scheduled date for maintenance, report date for issues, target date for tasks.
    pub tanggal: NaiveDateTime,
    /// Maintenance type, issue severity or task category.
    pub kategori: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penanggung_jawab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_terdampak: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prioritas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl TodoItem {
    fn base(garden: &Garden, kind: TodoKind, id: &str, judul: &str, tanggal: NaiveDateTime) -> Self {
        Self {
            id: id.to_string(),
            garden_id: garden.id.clone(),
            garden_name: garden.nama.clone(),
            garden_slug: garden.slug.clone(),
            kind,
            judul: judul.to_string(),
            tanggal,
            kategori: String::new(),
            status: String::new(),
            deskripsi: None,
            penanggung_jawab: None,
            area_terdampak: None,
            prioritas: None,
            assigned_to: None,
        }
    }

    pub fn from_maintenance(garden: &Garden, m: &Maintenance) -> Self {
        Self {
            kategori: m.jenis_perawatan.clone(),
            status: m.status.as_str().to_string(),
            deskripsi: m.detail.clone(),
            penanggung_jawab: m.penanggung_jawab.clone(),
            ..Self::base(garden, TodoKind::Maintenance, &m.id, &m.judul, m.tanggal_dijadwalkan)
        }
    }

    pub fn from_issue(garden: &Garden, issue: &Issue) -> Self {
        Self {
            kategori: issue.tingkat_keparahan.clone(),
            status: issue.status.as_str().to_string(),
            deskripsi: non_empty(&issue.deskripsi),
            area_terdampak: non_empty(&issue.area_terdampak),
            ..Self::base(garden, TodoKind::Issue, &issue.id, &issue.judul, issue.tanggal_lapor)
        }
    }

    pub fn from_task(garden: &Garden, task: &Task) -> Self {
        Self {
            kategori: task.kategori.clone(),
            status: task.status.as_str().to_string(),
            deskripsi: task.deskripsi.clone(),
            prioritas: Some(task.prioritas.clone()),
            assigned_to: task.assigned_to.clone(),
            ..Self::base(garden, TodoKind::Task, &task.id, &task.judul, task.tanggal_target)
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Keeps the pending records of one garden and projects them, maintenance
/// first, then issues, then tasks, each in record order.
pub fn garden_todos(
    garden: &Garden,
    maintenances: &[Maintenance],
    issues: &[Issue],
    tasks: &[Task],
) -> Vec<TodoItem> {
    let maintenance = maintenances
        .iter()
        .filter(|m| m.status.is_pending())
        .map(|m| TodoItem::from_maintenance(garden, m));
    let open_issues = issues
        .iter()
        .filter(|i| i.status == IssueStatus::Open)
        .map(|i| TodoItem::from_issue(garden, i));
    let pending_tasks = tasks
        .iter()
        .filter(|t| t.status.is_pending())
        .map(|t| TodoItem::from_task(garden, t));

    maintenance.chain(open_issues).chain(pending_tasks).collect()
}

/// Earliest first. The sort is stable so equal dates keep insertion order.
pub fn sort_todos(items: &mut [TodoItem]) {
    items.sort_by_key(|item| item.tanggal);
}

/// Collects todos across every garden of a store.
///
/// Fetch failures never escape: a failed garden listing yields no todos and
/// a failed per-garden listing contributes nothing for that entity type.
pub struct TodoAggregator<'a, S: KebunStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KebunStore + ?Sized> TodoAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn collect(&self) -> Vec<TodoItem> {
        let gardens = match self.store.list_gardens() {
            Ok(gardens) => gardens,
            Err(err) => {
                warn!(%err, "unable to list gardens; todo list left empty");
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        for garden in &gardens {
            items.extend(self.collect_garden(garden));
        }
        sort_todos(&mut items);
        debug!(gardens = gardens.len(), todos = items.len(), "aggregated todos");
        items
    }

    pub fn collect_garden(&self, garden: &Garden) -> Vec<TodoItem> {
        let maintenances = or_empty(
            self.store.list_maintenances(&garden.id),
            garden,
            "maintenances",
        );
        let issues = or_empty(self.store.list_issues(&garden.id), garden, "issues");
        let tasks = or_empty(self.store.list_tasks(&garden.id), garden, "tasks");
        garden_todos(garden, &maintenances, &issues, &tasks)
    }
}

fn or_empty<T>(result: StoreResult<Vec<T>>, garden: &Garden, entity: &str) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(garden = %garden.id, entity, %err, "fetch failed; skipping");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MaintenanceStatus, NewMaintenance, TaskStatus};
    use crate::store::StoreError;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn garden(id: &str) -> Garden {
        Garden {
            id: id.into(),
            nama: format!("Kebun {id}"),
            slug: format!("kebun-{id}"),
            lokasi: String::new(),
            luas: 0.0,
            jumlah_pohon: 0,
            status: String::new(),
        }
    }

    fn maintenance(id: &str, status: MaintenanceStatus, when: NaiveDateTime) -> Maintenance {
        Maintenance {
            id: id.into(),
            garden_id: "g".into(),
            jenis_perawatan: "Pemupukan".into(),
            judul: format!("Perawatan {id}"),
            tanggal_dijadwalkan: when,
            status,
            detail: Some("Dosis 2 kg per pohon".into()),
            penanggung_jawab: Some("Pak Budi".into()),
            is_recurring: false,
            recurring_interval: None,
            tanggal_selesai: None,
        }
    }

    fn issue(id: &str, status: IssueStatus, when: NaiveDateTime) -> Issue {
        Issue {
            id: id.into(),
            garden_id: "g".into(),
            judul: format!("Masalah {id}"),
            deskripsi: "Daun menguning".into(),
            area_terdampak: "Blok A".into(),
            tingkat_keparahan: "Tinggi".into(),
            status,
            tanggal_lapor: when,
            tanggal_selesai: None,
            solusi: None,
        }
    }

    fn task(id: &str, status: TaskStatus, when: NaiveDateTime) -> Task {
        Task {
            id: id.into(),
            garden_id: "g".into(),
            judul: format!("Tugas {id}"),
            deskripsi: None,
            kategori: "Panen".into(),
            prioritas: "Sedang".into(),
            status,
            tanggal_target: when,
            assigned_to: Some("Andi".into()),
        }
    }

    #[test]
    fn keeps_only_pending_records() {
        let g = garden("g");
        let items = garden_todos(
            &g,
            &[
                maintenance("m1", MaintenanceStatus::Scheduled, at(1, 8)),
                maintenance("m2", MaintenanceStatus::Completed, at(1, 8)),
                maintenance("m3", MaintenanceStatus::Late, at(1, 8)),
            ],
            &[
                issue("i1", IssueStatus::Open, at(2, 8)),
                issue("i2", IssueStatus::Resolved, at(2, 8)),
            ],
            &[
                task("t1", TaskStatus::Todo, at(3, 8)),
                task("t2", TaskStatus::InProgress, at(3, 8)),
                task("t3", TaskStatus::Done, at(3, 8)),
            ],
        );
        let ids: Vec<&str> = items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m3", "i1", "t1", "t2"]);
    }

    #[test]
    fn maps_type_specific_fields() {
        let g = garden("g");
        let items = garden_todos(
            &g,
            &[maintenance("m1", MaintenanceStatus::Late, at(1, 8))],
            &[issue("i1", IssueStatus::Open, at(2, 9))],
            &[task("t1", TaskStatus::Todo, at(3, 10))],
        );

        let m = &items[0];
        assert_eq!(m.kind, TodoKind::Maintenance);
        assert_eq!(m.kategori, "Pemupukan");
        assert_eq!(m.status, "Terlambat");
        assert_eq!(m.penanggung_jawab.as_deref(), Some("Pak Budi"));
        assert_eq!(m.garden_slug, "kebun-g");

        let i = &items[1];
        assert_eq!(i.kategori, "Tinggi");
        assert_eq!(i.area_terdampak.as_deref(), Some("Blok A"));
        assert_eq!(i.tanggal, at(2, 9));

        let t = &items[2];
        assert_eq!(t.kategori, "Panen");
        assert_eq!(t.status, "To Do");
        assert_eq!(t.prioritas.as_deref(), Some("Sedang"));
        assert_eq!(t.assigned_to.as_deref(), Some("Andi"));
    }

    #[test]
    fn serialises_kind_as_type_field() {
        let g = garden("g");
        let item = TodoItem::from_task(&g, &task("t1", TaskStatus::Todo, at(3, 10)));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "task");
        assert_eq!(value["gardenName"], "Kebun g");
        assert!(value.get("penanggungJawab").is_none());
    }

    #[test]
    fn blank_issue_details_are_left_out() {
        let g = garden("g");
        let mut bare = issue("i1", IssueStatus::Open, at(2, 9));
        bare.deskripsi.clear();
        bare.area_terdampak.clear();
        let item = TodoItem::from_issue(&g, &bare);
        assert!(item.deskripsi.is_none());
        assert!(item.area_terdampak.is_none());

        let value = serde_json::to_value(&item).unwrap();
        assert!(value.get("areaTerdampak").is_none());
        assert!(value.get("deskripsi").is_none());
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let g = garden("g");
        let mut items = garden_todos(
            &g,
            &[
                maintenance("late", MaintenanceStatus::Scheduled, at(9, 8)),
                maintenance("tie-a", MaintenanceStatus::Scheduled, at(4, 8)),
            ],
            &[issue("tie-b", IssueStatus::Open, at(4, 8))],
            &[task("first", TaskStatus::Todo, at(1, 8))],
        );
        sort_todos(&mut items);
        let ids: Vec<&str> = items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["first", "tie-a", "tie-b", "late"]);
    }

    struct FlakyStore {
        fail_gardens: bool,
    }

    impl KebunStore for FlakyStore {
        fn list_gardens(&self) -> StoreResult<Vec<Garden>> {
            if self.fail_gardens {
                return Err(StoreError::Unavailable("offline".into()));
            }
            Ok(vec![garden("a"), garden("b")])
        }

        fn list_maintenances(&self, garden_id: &str) -> StoreResult<Vec<Maintenance>> {
            if garden_id == "a" {
                return Err(StoreError::Unavailable("timeout".into()));
            }
            Ok(vec![maintenance("m-b", MaintenanceStatus::Scheduled, at(5, 8))])
        }

        fn list_issues(&self, garden_id: &str) -> StoreResult<Vec<Issue>> {
            Ok(vec![issue(&format!("i-{garden_id}"), IssueStatus::Open, at(6, 8))])
        }

        fn list_tasks(&self, _garden_id: &str) -> StoreResult<Vec<Task>> {
            Err(StoreError::Unavailable("tasks table missing".into()))
        }

        fn update_maintenance_status(
            &self,
            id: &str,
            _status: MaintenanceStatus,
        ) -> StoreResult<Maintenance> {
            Err(StoreError::NotFound {
                entity: "maintenance",
                id: id.into(),
            })
        }

        fn create_maintenance(&self, _record: NewMaintenance) -> StoreResult<Maintenance> {
            Err(StoreError::Unavailable("read only".into()))
        }

        fn update_issue_status(&self, id: &str, _status: IssueStatus) -> StoreResult<Issue> {
            Err(StoreError::NotFound {
                entity: "issue",
                id: id.into(),
            })
        }

        fn update_task_status(&self, id: &str, _status: TaskStatus) -> StoreResult<Task> {
            Err(StoreError::NotFound {
                entity: "task",
                id: id.into(),
            })
        }
    }

    #[test]
    fn fetch_failures_degrade_to_partial_results() {
        let store = FlakyStore {
            fail_gardens: false,
        };
        let items = TodoAggregator::new(&store).collect();
        let ids: Vec<&str> = items.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["m-b", "i-a", "i-b"]);
    }

    #[test]
    fn garden_listing_failure_yields_nothing() {
        let store = FlakyStore { fail_gardens: true };
        assert!(TodoAggregator::new(&store).collect().is_empty());
    }
}
