//! Station driver: wires the session tracker to badge resolution and the
//! attendance log
//!
//! The tracker decides, the station acts. Classification is computed
//! synchronously against the session anchor; only a would-be new scan
//! triggers the resolver, and only a resolved one is committed and recorded.
//! This keeps unresolvable codes out of the counters entirely.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::badge;
use crate::record::{AttendanceLog, CheckKind};
use crate::resolver::{BadgeResolver, ResolvedBadge};
use crate::session::{Classification, ScanSession, SessionStats, SessionSummary};

/// Per-session parameters chosen by the operator.
#[derive(Debug, Clone)]
pub struct StationConfig {
    pub scanner_id: String,
    pub event_id: Option<i64>,
    pub location: Option<String>,
    pub kind: CheckKind,
    pub dedup_window_ms: i64,
}

/// Operator feedback for one submitted payload, with the updated counters
/// where the session was touched.
#[derive(Debug)]
pub enum ScanResponse {
    /// Accepted, resolved and written to the attendance log.
    Recorded {
        badge: ResolvedBadge,
        kind: CheckKind,
        first_visit: bool,
        stats: SessionStats,
    },
    /// Repeat of the most recent badge inside the suppression window.
    Duplicate { stats: SessionStats },
    /// Empty input; nothing happened.
    Ignored,
    /// The code does not resolve to anyone; counters untouched.
    ResolutionFailed { code: String, reason: String },
    /// Resolved and counted, but the attendance log refused the movement
    /// (e.g. a second check-in without a check-out in between).
    RecordRejected {
        badge: ResolvedBadge,
        message: String,
        stats: SessionStats,
    },
    /// The session has already been ended.
    SessionClosed,
}

/// One scanning device session: a live tracker plus its database row.
pub struct Station<R: BadgeResolver> {
    session: ScanSession,
    resolver: R,
    log: AttendanceLog,
    db_session_id: i64,
    config: StationConfig,
    finalized: bool,
}

impl<R: BadgeResolver> Station<R> {
    /// Open a session: starts the tracker and its attendance-log row.
    pub fn begin(
        mut log: AttendanceLog,
        resolver: R,
        config: StationConfig,
        started_at: DateTime<Utc>,
    ) -> Result<Self> {
        let db_session_id = log
            .start_session(&config.scanner_id, config.event_id, started_at)
            .context("Failed to open a session in the attendance log")?;

        Ok(Self {
            session: ScanSession::with_window(started_at, config.dedup_window_ms),
            resolver,
            log,
            db_session_id,
            config,
            finalized: false,
        })
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.session.started_at()
    }

    pub fn history(&self) -> &[crate::session::ScanEntry] {
        self.session.history()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    /// Process one payload from the scanner or keyboard.
    ///
    /// Errors are database failures only; classification outcomes, duplicate
    /// reads, unknown codes and sequencing refusals are all ordinary
    /// `ScanResponse` variants.
    pub fn process_scan(&mut self, raw: &str, observed_at: DateTime<Utc>) -> Result<ScanResponse> {
        let handle = match badge::extract_handle(raw) {
            Some(handle) => handle.to_string(),
            None => return Ok(ScanResponse::Ignored),
        };

        if !self.session.is_open() {
            return Ok(ScanResponse::SessionClosed);
        }

        match self.session.classify(&handle, observed_at) {
            Classification::Ignored => Ok(ScanResponse::Ignored),
            Classification::Duplicate => {
                self.session.submit(&handle, observed_at);
                Ok(ScanResponse::Duplicate {
                    stats: self.session.stats(),
                })
            }
            Classification::New => {
                // Resolve before committing so a dead code never counts.
                let badge = match self.resolver.resolve(&handle) {
                    Ok(badge) => badge,
                    Err(err) => {
                        return Ok(ScanResponse::ResolutionFailed {
                            code: handle,
                            reason: err.to_string(),
                        })
                    }
                };

                self.session.submit(&handle, observed_at);
                let stats = self.session.stats();

                if let Some(message) = self.sequencing_refusal(&badge)? {
                    return Ok(ScanResponse::RecordRejected {
                        badge,
                        message,
                        stats,
                    });
                }

                let first_visit = self.config.kind == CheckKind::CheckIn
                    && !self.log.has_checked_in_before(&badge.id)?;

                self.log
                    .insert_scan(
                        self.db_session_id,
                        &badge.id,
                        &badge.name,
                        &handle,
                        self.config.kind,
                        observed_at,
                        self.config.location.as_deref(),
                        first_visit,
                    )
                    .context("Failed to record scan in the attendance log")?;

                Ok(ScanResponse::Recorded {
                    badge,
                    kind: self.config.kind,
                    first_visit,
                    stats,
                })
            }
        }
    }

    /// Check-in/check-out alternation per badge; networking scans are free.
    fn sequencing_refusal(&self, badge: &ResolvedBadge) -> Result<Option<String>> {
        let last = self.log.last_check_kind(&badge.id)?;
        let message = match self.config.kind {
            CheckKind::CheckIn if last == Some(CheckKind::CheckIn) => Some(format!(
                "{} is already checked in; check out first",
                badge.name
            )),
            CheckKind::CheckOut if last != Some(CheckKind::CheckIn) => {
                Some(format!("{} is not currently checked in", badge.name))
            }
            _ => None,
        };
        Ok(message)
    }

    /// End the session: close the tracker and finalize the database row.
    ///
    /// Safe to call more than once; the summary is fixed by the first call
    /// and the row is only written once.
    pub fn end(&mut self, ended_at: DateTime<Utc>, notes: Option<String>) -> Result<SessionSummary> {
        let summary = self.session.end(ended_at, notes);

        if !self.finalized {
            self.log
                .finish_session(
                    self.db_session_id,
                    summary.ended_at,
                    summary.total_scans,
                    summary.unique_scans,
                    summary.duplicate_scans,
                    summary.notes.as_deref(),
                )
                .context("Failed to finalize session in the attendance log")?;
            self.finalized = true;
        }

        Ok(summary)
    }

    /// Give the attendance log back for post-session queries.
    pub fn into_log(self) -> AttendanceLog {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolveError;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct MapResolver {
        badges: HashMap<String, ResolvedBadge>,
    }

    impl MapResolver {
        fn with(entries: &[(&str, &str, &str)]) -> Self {
            let badges = entries
                .iter()
                .map(|(code, id, name)| {
                    (
                        code.to_string(),
                        ResolvedBadge {
                            id: id.to_string(),
                            name: name.to_string(),
                            company: None,
                            participant_type: None,
                            active: true,
                        },
                    )
                })
                .collect();
            Self { badges }
        }
    }

    impl BadgeResolver for MapResolver {
        fn resolve(&self, code: &str) -> Result<ResolvedBadge, ResolveError> {
            self.badges.get(code).cloned().ok_or(ResolveError::NotFound)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 14, 9, 0, 0).unwrap()
    }

    fn at_ms(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    fn config(kind: CheckKind) -> StationConfig {
        StationConfig {
            scanner_id: "test-desk".to_string(),
            event_id: None,
            location: Some("main_entrance".to_string()),
            kind,
            dedup_window_ms: 2_000,
        }
    }

    fn station(kind: CheckKind, resolver: MapResolver) -> (TempDir, Station<MapResolver>) {
        let temp_dir = TempDir::new().unwrap();
        let log = AttendanceLog::open(&temp_dir.path().join("attendance.db")).unwrap();
        let station = Station::begin(log, resolver, config(kind), t0()).unwrap();
        (temp_dir, station)
    }

    #[test]
    fn recorded_scan_lands_in_the_log() {
        let resolver = MapResolver::with(&[("QR-100", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::CheckIn, resolver);

        let response = station.process_scan("QR-100", at_ms(0)).unwrap();
        match response {
            ScanResponse::Recorded { badge, first_visit, stats, .. } => {
                assert_eq!(badge.name, "Jane Doe");
                assert!(first_visit);
                assert_eq!(stats.total_scans, 1);
            }
            other => panic!("expected Recorded, got {other:?}"),
        }

        let summary = station.end(at_ms(1_000), None).unwrap();
        let log = station.into_log();
        let scans = log.scans_for_session(1).unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].attendee_id, "user-1");
        assert_eq!(summary.unique_scans, 1);
    }

    #[test]
    fn unresolved_code_does_not_touch_counters() {
        let resolver = MapResolver::with(&[]);
        let (_temp_dir, mut station) = station(CheckKind::CheckIn, resolver);

        let response = station.process_scan("QR-404", at_ms(0)).unwrap();
        assert!(matches!(response, ScanResponse::ResolutionFailed { .. }));
        assert_eq!(station.stats(), SessionStats::default());
        assert!(station.history().is_empty());
    }

    #[test]
    fn duplicates_are_counted_but_not_recorded() {
        let resolver = MapResolver::with(&[("QR-100", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::Networking, resolver);

        assert!(matches!(
            station.process_scan("QR-100", at_ms(0)).unwrap(),
            ScanResponse::Recorded { .. }
        ));
        let response = station.process_scan("QR-100", at_ms(800)).unwrap();
        match response {
            ScanResponse::Duplicate { stats } => {
                assert_eq!(stats.total_scans, 2);
                assert_eq!(stats.duplicate_scans, 1);
            }
            other => panic!("expected Duplicate, got {other:?}"),
        }

        station.end(at_ms(1_000), None).unwrap();
        let log = station.into_log();
        assert_eq!(log.scans_for_session(1).unwrap().len(), 1);
    }

    #[test]
    fn url_payload_resolves_by_its_handle() {
        let resolver = MapResolver::with(&[("jane-doe", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::Networking, resolver);

        let response = station
            .process_scan("https://example.org/members/jane-doe", at_ms(0))
            .unwrap();
        assert!(matches!(response, ScanResponse::Recorded { .. }));

        // The bare handle right after is the same code, hence a duplicate.
        let response = station.process_scan("jane-doe", at_ms(500)).unwrap();
        assert!(matches!(response, ScanResponse::Duplicate { .. }));
    }

    #[test]
    fn double_check_in_is_rejected_but_counted() {
        let resolver = MapResolver::with(&[("QR-100", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::CheckIn, resolver);

        assert!(matches!(
            station.process_scan("QR-100", at_ms(0)).unwrap(),
            ScanResponse::Recorded { .. }
        ));

        // Past the dedup window, so the tracker accepts it; the log refuses.
        let response = station.process_scan("QR-100", at_ms(3_000)).unwrap();
        match response {
            ScanResponse::RecordRejected { message, stats, .. } => {
                assert!(message.contains("already checked in"));
                assert_eq!(stats.unique_scans, 2);
            }
            other => panic!("expected RecordRejected, got {other:?}"),
        }

        station.end(at_ms(4_000), None).unwrap();
        let log = station.into_log();
        assert_eq!(log.scans_for_session(1).unwrap().len(), 1);
    }

    #[test]
    fn check_out_requires_a_prior_check_in() {
        let resolver = MapResolver::with(&[("QR-100", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::CheckOut, resolver);

        let response = station.process_scan("QR-100", at_ms(0)).unwrap();
        match response {
            ScanResponse::RecordRejected { message, .. } => {
                assert!(message.contains("not currently checked in"));
            }
            other => panic!("expected RecordRejected, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_ignored() {
        let resolver = MapResolver::with(&[]);
        let (_temp_dir, mut station) = station(CheckKind::CheckIn, resolver);

        assert!(matches!(
            station.process_scan("   ", at_ms(0)).unwrap(),
            ScanResponse::Ignored
        ));
        assert_eq!(station.stats(), SessionStats::default());
    }

    #[test]
    fn scans_after_end_report_session_closed() {
        let resolver = MapResolver::with(&[("QR-100", "user-1", "Jane Doe")]);
        let (_temp_dir, mut station) = station(CheckKind::CheckIn, resolver);

        station.process_scan("QR-100", at_ms(0)).unwrap();
        let first = station.end(at_ms(1_000), Some("done".to_string())).unwrap();

        assert!(matches!(
            station.process_scan("QR-200", at_ms(2_000)).unwrap(),
            ScanResponse::SessionClosed
        ));

        // Ending again returns the identical summary.
        let second = station.end(at_ms(9_000), None).unwrap();
        assert_eq!(first, second);
    }
}
