//! Successor scheduling for recurring maintenance.
//!
//! When a recurring maintenance is marked done the next occurrence is due
//! `recurringInterval` days after completion. A pending record with the same
//! title in the same garden counts as that successor already existing.
//! Title equality is a heuristic: two unrelated chores sharing a title are
//! indistinguishable here.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::{info, warn};

use crate::model::{Maintenance, MaintenanceStatus, NewMaintenance, RecordId};
use crate::store::KebunStore;

/// What should follow a completed maintenance, before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessorPlan {
    NotRecurring,
    AlreadyScheduled { existing_id: RecordId },
    Create(NewMaintenance),
}

/// Result of scheduling after a completion. None of these undo the completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecurrenceOutcome {
    NotRecurring,
    AlreadyScheduled { existing_id: RecordId },
    Scheduled { next_date: NaiveDateTime, record: Maintenance },
    SchedulingFailed { next_date: NaiveDateTime, reason: String },
}

impl RecurrenceOutcome {
    pub fn next_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Scheduled { next_date, .. } | Self::SchedulingFailed { next_date, .. } => {
                Some(*next_date)
            }
            Self::NotRecurring | Self::AlreadyScheduled { .. } => None,
        }
    }
}

/// `None` when the date would fall outside the representable calendar.
pub fn next_occurrence(completed_at: NaiveDateTime, interval_days: u32) -> Option<NaiveDateTime> {
    completed_at.checked_add_signed(Duration::days(i64::from(interval_days)))
}

/// Decides the successor for `completed`, given the garden's maintenance
/// list. `now` stands in for a missing completion date.
pub fn plan_successor(
    completed: &Maintenance,
    existing: &[Maintenance],
    now: NaiveDateTime,
) -> SuccessorPlan {
    let Some(interval) = completed.recurrence_days() else {
        return SuccessorPlan::NotRecurring;
    };

    let already = existing.iter().find(|m| {
        m.garden_id == completed.garden_id
            && m.judul == completed.judul
            && m.status == MaintenanceStatus::Scheduled
            && m.id != completed.id
    });
    if let Some(next) = already {
        return SuccessorPlan::AlreadyScheduled {
            existing_id: next.id.clone(),
        };
    }

    let completed_at = completed.tanggal_selesai.unwrap_or(now);
    let Some(next_date) = next_occurrence(completed_at, interval) else {
        warn!(
            maintenance = %completed.id,
            interval,
            "next occurrence out of calendar range; not scheduling"
        );
        return SuccessorPlan::NotRecurring;
    };
    SuccessorPlan::Create(NewMaintenance {
        garden_id: completed.garden_id.clone(),
        jenis_perawatan: completed.jenis_perawatan.clone(),
        judul: completed.judul.clone(),
        tanggal_dijadwalkan: next_date,
        status: MaintenanceStatus::Scheduled,
        detail: completed.detail.clone(),
        penanggung_jawab: completed.penanggung_jawab.clone(),
        is_recurring: true,
        recurring_interval: Some(interval),
    })
}

/// Plans and persists the successor of a just-completed maintenance.
pub struct RecurrenceScheduler<'a, S: KebunStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: KebunStore + ?Sized> RecurrenceScheduler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn on_completed(
        &self,
        completed: &Maintenance,
        existing: &[Maintenance],
        now: NaiveDateTime,
    ) -> RecurrenceOutcome {
        match plan_successor(completed, existing, now) {
            SuccessorPlan::NotRecurring => RecurrenceOutcome::NotRecurring,
            SuccessorPlan::AlreadyScheduled { existing_id } => {
                info!(
                    maintenance = %completed.id,
                    %existing_id,
                    "next occurrence already scheduled"
                );
                RecurrenceOutcome::AlreadyScheduled { existing_id }
            }
            SuccessorPlan::Create(record) => {
                let next_date = record.tanggal_dijadwalkan;
                match self.store.create_maintenance(record) {
                    Ok(record) => {
                        info!(
                            maintenance = %completed.id,
                            successor = %record.id,
                            %next_date,
                            "scheduled next occurrence"
                        );
                        RecurrenceOutcome::Scheduled { next_date, record }
                    }
                    Err(err) => {
                        warn!(maintenance = %completed.id, %err, "failed to schedule next occurrence");
                        RecurrenceOutcome::SchedulingFailed {
                            next_date,
                            reason: err.to_string(),
                        }
                    }
                }
            }
        }
    }
}
