//! Scan session tracking

pub mod tracker;

pub use tracker::{
    Classification, ScanEntry, ScanOutcome, ScanSession, SessionStats, SessionSummary,
    DEFAULT_DEDUP_WINDOW_MS, HISTORY_LIMIT,
};
