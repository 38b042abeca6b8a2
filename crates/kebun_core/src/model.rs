use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the backing store. Gardens may also be addressed by slug.
pub type RecordId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Garden {
    pub id: RecordId,
    pub nama: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub lokasi: String,
    /// Planted area in hectares.
    #[serde(default)]
    pub luas: f64,
    #[serde(default)]
    pub jumlah_pohon: u32,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MaintenanceStatus {
    #[serde(rename = "Dijadwalkan")]
    Scheduled,
    #[serde(rename = "Selesai")]
    Completed,
    #[serde(rename = "Terlambat")]
    Late,
}

impl MaintenanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Dijadwalkan",
            Self::Completed => "Selesai",
            Self::Late => "Terlambat",
        }
    }

    /// Scheduled and late maintenance still needs doing.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Scheduled | Self::Late)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IssueStatus {
    Open,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Resolved => "Resolved",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    pub fn is_pending(self) -> bool {
        !matches!(self, Self::Done)
    }
}

macro_rules! display_as_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_label!(MaintenanceStatus, IssueStatus, TaskStatus);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Maintenance {
    pub id: RecordId,
    pub garden_id: RecordId,
    pub jenis_perawatan: String,
    pub judul: String,
    pub tanggal_dijadwalkan: NaiveDateTime,
    pub status: MaintenanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penanggung_jawab: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    /// Days between occurrences. Ignored unless `is_recurring` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tanggal_selesai: Option<NaiveDateTime>,
}

impl Maintenance {
    /// The interval in days when this record actually recurs.
    pub fn recurrence_days(&self) -> Option<u32> {
        if !self.is_recurring {
            return None;
        }
        self.recurring_interval.filter(|days| *days > 0)
    }
}

/// Insert payload for a maintenance record; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewMaintenance {
    pub garden_id: RecordId,
    pub jenis_perawatan: String,
    pub judul: String,
    pub tanggal_dijadwalkan: NaiveDateTime,
    pub status: MaintenanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penanggung_jawab: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_interval: Option<u32>,
}

impl NewMaintenance {
    pub fn into_record(self, id: RecordId) -> Maintenance {
        Maintenance {
            id,
            garden_id: self.garden_id,
            jenis_perawatan: self.jenis_perawatan,
            judul: self.judul,
            tanggal_dijadwalkan: self.tanggal_dijadwalkan,
            status: self.status,
            detail: self.detail,
            penanggung_jawab: self.penanggung_jawab,
            is_recurring: self.is_recurring,
            recurring_interval: self.recurring_interval,
            tanggal_selesai: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: RecordId,
    pub garden_id: RecordId,
    pub judul: String,
    #[serde(default)]
    pub deskripsi: String,
    #[serde(default)]
    pub area_terdampak: String,
    pub tingkat_keparahan: String,
    pub status: IssueStatus,
    pub tanggal_lapor: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tanggal_selesai: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solusi: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub garden_id: RecordId,
    pub judul: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub kategori: String,
    #[serde(default)]
    pub prioritas: String,
    pub status: TaskStatus,
    pub tanggal_target: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}
