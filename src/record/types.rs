//! Attendance log record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an accepted scan means for the attendee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    CheckIn,
    CheckOut,
    /// Contact exchange at networking events; no in/out sequencing.
    Networking,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::CheckIn => "check_in",
            CheckKind::CheckOut => "check_out",
            CheckKind::Networking => "networking",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "check_in" => Some(CheckKind::CheckIn),
            "check_out" => Some(CheckKind::CheckOut),
            "networking" => Some(CheckKind::Networking),
            _ => None,
        }
    }
}

/// Persisted scanning session row.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: i64,
    pub scanner_id: String,
    pub event_id: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_scans: u64,
    pub unique_scans: u64,
    pub duplicate_scans: u64,
    pub notes: Option<String>,
}

/// Persisted scan row. Only accepted (new) scans are recorded; duplicates
/// are counted on the session row but never stored individually.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub session_id: i64,
    pub attendee_id: String,
    pub attendee_name: String,
    pub code: String,
    pub kind: CheckKind,
    pub scanned_at: DateTime<Utc>,
    pub location: Option<String>,
    pub first_visit: bool,
}

/// Aggregate attendance figures across the whole log.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LogStats {
    pub sessions: u64,
    pub scans_recorded: u64,
    pub distinct_attendees: u64,
    pub check_ins: u64,
    pub check_outs: u64,
    pub currently_checked_in: u64,
}
