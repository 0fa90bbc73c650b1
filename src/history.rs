//! Session summary files for post-event reporting
//!
//! Every ended session is written out as a JSON file so summaries can be
//! collected from scanning devices without touching the SQLite database.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::record::CheckKind;
use crate::session::SessionSummary;

/// One finished session as written to disk.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionReport {
    /// Which device or desk ran the session
    pub scanner_id: String,
    /// Event the session belonged to, if the operator gave one
    pub event_id: Option<i64>,
    /// Physical location label (e.g. "main_entrance")
    pub location: Option<String>,
    /// What the scans meant (check-in, check-out, networking)
    pub kind: CheckKind,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub ended_at: DateTime<Utc>,
    pub total_scans: u64,
    pub unique_scans: u64,
    pub duplicate_scans: u64,
    pub duration_ms: i64,
    pub notes: Option<String>,
}

impl SessionReport {
    pub fn new(
        scanner_id: &str,
        event_id: Option<i64>,
        location: Option<&str>,
        kind: CheckKind,
        summary: &SessionSummary,
    ) -> Self {
        Self {
            scanner_id: scanner_id.to_string(),
            event_id,
            location: location.map(str::to_string),
            kind,
            started_at: summary.started_at,
            ended_at: summary.ended_at,
            total_scans: summary.total_scans,
            unique_scans: summary.unique_scans,
            duplicate_scans: summary.duplicate_scans,
            duration_ms: summary.duration_ms,
            notes: summary.notes.clone(),
        }
    }

    /// Save the report into the default history directory.
    ///
    /// Returns the path to the written file.
    pub fn save(&self) -> Result<PathBuf> {
        self.save_to(&get_history_dir()?)
    }

    /// Save the report into an explicit directory.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create history directory: {}", dir.display()))?;

        let filename = format!("session_{}.json", self.started_at.format("%Y%m%d_%H%M%S"));
        let report_path = dir.join(filename);

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize session report")?;
        fs::write(&report_path, json).with_context(|| {
            format!("Failed to write session report to {}", report_path.display())
        })?;

        Ok(report_path)
    }

    /// One-line figure summary for the end-of-session message.
    pub fn summary_line(&self) -> String {
        format!(
            "{} scans, {} unique, {} duplicates",
            self.total_scans, self.unique_scans, self.duplicate_scans
        )
    }
}

/// Default history directory, created on first use.
pub fn get_history_dir() -> Result<PathBuf> {
    let dir = crate::record::default_data_dir()?.join("history");
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create history directory: {}", dir.display()))?;
    }
    Ok(dir)
}

/// All report files in a directory, newest first.
///
/// Filenames embed the start timestamp, so a reverse filename sort is a
/// reverse chronological sort.
pub fn list_reports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut reports: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read history directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();

    reports.sort();
    reports.reverse();

    Ok(reports)
}

/// Load a session report from a file.
pub fn load_report(path: &Path) -> Result<SessionReport> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;

    let report: SessionReport = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse report file: {}", path.display()))?;

    Ok(report)
}
