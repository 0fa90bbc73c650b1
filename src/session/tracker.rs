//! In-memory scan session tracking with duplicate suppression
//!
//! A `ScanSession` classifies every decoded payload handed to it as new,
//! duplicate or ignorable, and keeps the running counters the operator sees
//! on the stat tiles. It performs no I/O: badge lookup and attendance
//! recording are driven by the station layer after it observes a `New`
//! classification. Timestamps are passed in by the caller so the 2-second
//! window is deterministic under test.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default suppression window: a repeat of the most recent badge within this
/// interval is a duplicate, not a second attendee.
pub const DEFAULT_DEDUP_WINDOW_MS: i64 = 2_000;

/// Number of accepted scans kept for the recent-scans display.
pub const HISTORY_LIMIT: usize = 10;

/// One accepted scan, as shown in the recent-scans list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEntry {
    pub code: String,
    pub observed_at: DateTime<Utc>,
}

/// Running counters for a session.
///
/// `total_scans == unique_scans + duplicate_scans` holds at every point:
/// each accepted scan increments `total_scans` and exactly one of the other
/// two buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total_scans: u64,
    pub unique_scans: u64,
    pub duplicate_scans: u64,
}

/// How a submitted payload was classified, without committing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Accepted; advances the suppression anchor.
    New,
    /// Repeat of the most recent accepted code inside the window.
    Duplicate,
    /// Empty or whitespace-only input; dropped silently.
    Ignored,
}

/// Result of submitting a payload to the session.
///
/// None of these are errors: duplicates and closed-session submissions are
/// expected outcomes the caller switches on for operator feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    New,
    Duplicate,
    Ignored,
    /// Submitted after `end()`; counters untouched. The scanner hardware can
    /// race the end command with an in-flight read, so this is a normal
    /// outcome rather than a panic.
    SessionClosed,
}

/// Final session report, also what gets persisted and written to history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub total_scans: u64,
    pub unique_scans: u64,
    pub duplicate_scans: u64,
    pub duration_ms: i64,
    pub notes: Option<String>,
}

/// A single device-local scanning session.
///
/// Open from construction until `end()`; append-only while open; no further
/// scans are accepted once closed. One instance per operator session, never
/// shared across threads.
#[derive(Debug, Clone)]
pub struct ScanSession {
    started_at: DateTime<Utc>,
    dedup_window: Duration,
    stats: SessionStats,
    /// Most recent accepted scans, newest first, capped at `HISTORY_LIMIT`.
    history: Vec<ScanEntry>,
    /// Suppression anchor. Only advances on a `New` classification, so a
    /// burst of identical reads is measured against the first accepted one.
    last_accepted: Option<ScanEntry>,
    /// Set once by the first `end()` call; later calls return this verbatim.
    summary: Option<SessionSummary>,
}

impl ScanSession {
    /// Start a session with the default 2-second suppression window.
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self::with_window(started_at, DEFAULT_DEDUP_WINDOW_MS)
    }

    /// Start a session with a custom suppression window in milliseconds.
    pub fn with_window(started_at: DateTime<Utc>, window_ms: i64) -> Self {
        Self {
            started_at,
            dedup_window: Duration::milliseconds(window_ms),
            stats: SessionStats::default(),
            history: Vec::new(),
            last_accepted: None,
            summary: None,
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_open(&self) -> bool {
        self.summary.is_none()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Recent accepted scans, newest first.
    pub fn history(&self) -> &[ScanEntry] {
        &self.history
    }

    /// Classify a payload against the current anchor without mutating
    /// anything. The station uses this to run badge resolution before
    /// committing a `New` scan, so an unresolvable code never reaches the
    /// counters.
    pub fn classify(&self, code: &str, observed_at: DateTime<Utc>) -> Classification {
        let code = code.trim();
        if code.is_empty() {
            return Classification::Ignored;
        }

        match &self.last_accepted {
            Some(anchor)
                if anchor.code == code && observed_at - anchor.observed_at < self.dedup_window =>
            {
                Classification::Duplicate
            }
            _ => Classification::New,
        }
    }

    /// Submit a payload: classify it and commit the counters.
    ///
    /// Duplicates count toward `total_scans` and `duplicate_scans` but do not
    /// advance the anchor, so every repeat inside the window is measured
    /// against the originally accepted scan. New scans advance the anchor and
    /// enter the history.
    pub fn submit(&mut self, code: &str, observed_at: DateTime<Utc>) -> ScanOutcome {
        if !self.is_open() {
            return ScanOutcome::SessionClosed;
        }

        match self.classify(code, observed_at) {
            Classification::Ignored => ScanOutcome::Ignored,
            Classification::Duplicate => {
                self.stats.total_scans += 1;
                self.stats.duplicate_scans += 1;
                ScanOutcome::Duplicate
            }
            Classification::New => {
                let entry = ScanEntry {
                    code: code.trim().to_string(),
                    observed_at,
                };
                self.stats.total_scans += 1;
                self.stats.unique_scans += 1;
                self.history.insert(0, entry.clone());
                self.history.truncate(HISTORY_LIMIT);
                self.last_accepted = Some(entry);
                ScanOutcome::New
            }
        }
    }

    /// Close the session and return its summary.
    ///
    /// Idempotent: the first call fixes `ended_at` and the notes; any later
    /// call returns that same summary and never double-counts.
    pub fn end(&mut self, ended_at: DateTime<Utc>, notes: Option<String>) -> SessionSummary {
        if let Some(summary) = &self.summary {
            return summary.clone();
        }

        let summary = SessionSummary {
            started_at: self.started_at,
            ended_at,
            total_scans: self.stats.total_scans,
            unique_scans: self.stats.unique_scans,
            duplicate_scans: self.stats.duplicate_scans,
            duration_ms: (ended_at - self.started_at).num_milliseconds(),
            notes,
        };
        self.summary = Some(summary.clone());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap()
    }

    fn at_ms(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    fn assert_invariant(session: &ScanSession) {
        let stats = session.stats();
        assert_eq!(
            stats.total_scans,
            stats.unique_scans + stats.duplicate_scans
        );
    }

    #[test]
    fn first_scan_is_new() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.stats().total_scans, 1);
        assert_eq!(session.stats().unique_scans, 1);
        assert_eq!(session.stats().duplicate_scans, 0);
        assert_invariant(&session);
    }

    #[test]
    fn repeat_inside_window_is_duplicate() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("QR-100", at_ms(1_500)), ScanOutcome::Duplicate);

        let stats = session.stats();
        assert_eq!(stats.total_scans, 2);
        assert_eq!(stats.unique_scans, 1);
        assert_eq!(stats.duplicate_scans, 1);
        assert_invariant(&session);
    }

    #[test]
    fn repeat_at_window_boundary_is_new() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        // Gap of exactly 2000ms is outside the window.
        assert_eq!(session.submit("QR-100", at_ms(2_000)), ScanOutcome::New);
        assert_eq!(session.stats().unique_scans, 2);
        assert_invariant(&session);
    }

    #[test]
    fn anchor_does_not_advance_on_duplicates() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("QR-100", at_ms(1_200)), ScanOutcome::Duplicate);
        // 1.9s after the second read but still inside the window of the
        // first accepted scan, which is the anchor.
        assert_eq!(session.submit("QR-100", at_ms(1_900)), ScanOutcome::Duplicate);
        // Past the window of the original acceptance.
        assert_eq!(session.submit("QR-100", at_ms(2_100)), ScanOutcome::New);

        let stats = session.stats();
        assert_eq!(stats.total_scans, 4);
        assert_eq!(stats.unique_scans, 2);
        assert_eq!(stats.duplicate_scans, 2);
        assert_invariant(&session);
    }

    #[test]
    fn alternating_codes_are_all_new() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("A", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("B", at_ms(100)), ScanOutcome::New);
        // Only the immediately preceding accepted code is compared, so A is
        // new again even inside the window of its first read.
        assert_eq!(session.submit("A", at_ms(200)), ScanOutcome::New);
        assert_eq!(session.stats().unique_scans, 3);
        assert_invariant(&session);
    }

    #[test]
    fn empty_and_whitespace_input_is_ignored() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("", at_ms(0)), ScanOutcome::Ignored);
        assert_eq!(session.submit("   ", at_ms(10)), ScanOutcome::Ignored);
        assert_eq!(session.submit("\t\n", at_ms(20)), ScanOutcome::Ignored);
        assert_eq!(session.stats(), SessionStats::default());
        assert!(session.history().is_empty());
    }

    #[test]
    fn codes_are_trimmed_before_comparison() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("  QR-100  ", at_ms(500)), ScanOutcome::Duplicate);
    }

    #[test]
    fn spec_scenario_walkthrough() {
        let mut session = ScanSession::start(t0());
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("QR-100", at_ms(1_500)), ScanOutcome::Duplicate);
        assert_eq!(session.submit("QR-200", at_ms(1_600)), ScanOutcome::New);
        // Anchor is now QR-200, so QR-100 is new again.
        assert_eq!(session.submit("QR-100", at_ms(1_700)), ScanOutcome::New);

        let summary = session.end(at_ms(5_000), None);
        assert_eq!(summary.total_scans, 4);
        assert_eq!(summary.unique_scans, 3);
        assert_eq!(summary.duplicate_scans, 1);
        assert_eq!(summary.duration_ms, 5_000);
    }

    #[test]
    fn history_is_newest_first_and_capped() {
        let mut session = ScanSession::start(t0());
        for i in 0..15 {
            let code = format!("QR-{i:03}");
            assert_eq!(session.submit(&code, at_ms(i * 10)), ScanOutcome::New);
        }

        let history = session.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].code, "QR-014");
        assert_eq!(history[9].code, "QR-005");
    }

    #[test]
    fn duplicates_do_not_enter_history() {
        let mut session = ScanSession::start(t0());
        session.submit("QR-100", at_ms(0));
        session.submit("QR-100", at_ms(500));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn end_is_idempotent() {
        let mut session = ScanSession::start(t0());
        session.submit("QR-100", at_ms(0));

        let first = session.end(at_ms(10_000), Some("door A".to_string()));
        let second = session.end(at_ms(99_000), Some("ignored".to_string()));
        assert_eq!(first, second);
        assert_eq!(second.ended_at, at_ms(10_000));
        assert_eq!(second.notes.as_deref(), Some("door A"));
    }

    #[test]
    fn submit_after_end_is_rejected_without_mutation() {
        let mut session = ScanSession::start(t0());
        session.submit("QR-100", at_ms(0));
        session.end(at_ms(1_000), None);

        assert_eq!(session.submit("QR-200", at_ms(2_000)), ScanOutcome::SessionClosed);
        assert_eq!(session.stats().total_scans, 1);
        assert_eq!(session.history().len(), 1);
        assert!(!session.is_open());
    }

    #[test]
    fn custom_window_is_respected() {
        let mut session = ScanSession::with_window(t0(), 500);
        assert_eq!(session.submit("QR-100", at_ms(0)), ScanOutcome::New);
        assert_eq!(session.submit("QR-100", at_ms(400)), ScanOutcome::Duplicate);
        assert_eq!(session.submit("QR-100", at_ms(600)), ScanOutcome::New);
    }

    #[test]
    fn invariant_holds_over_mixed_sequence() {
        let mut session = ScanSession::start(t0());
        let inputs = [
            ("QR-1", 0),
            ("QR-1", 100),
            ("", 150),
            ("QR-2", 200),
            ("QR-2", 300),
            ("QR-2", 2_400),
            ("  ", 2_500),
            ("QR-3", 2_600),
        ];
        for (code, ms) in inputs {
            session.submit(code, at_ms(ms));
            assert_invariant(&session);
        }
    }
}
