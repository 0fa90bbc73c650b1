//! Persistent attendance log
//!
//! Accepted scans and finished sessions land in a local SQLite database;
//! duplicates are counted on the session row but never stored as rows.

pub mod database;
pub mod types;

pub use database::{default_data_dir, AttendanceLog};
pub use types::{CheckKind, LogStats, ScanRecord, SessionRecord};
