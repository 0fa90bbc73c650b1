//! SQLite operations for the attendance log

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::record::types::{CheckKind, LogStats, ScanRecord, SessionRecord};

const SCHEMA_VERSION: i32 = 1;

/// Local attendance database: one row per scanning session, one row per
/// accepted scan. Authoritative record on the device; the JSON history files
/// are convenience copies.
pub struct AttendanceLog {
    db: Connection,
}

impl AttendanceLog {
    /// Open or create the attendance log in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dir = default_data_dir()?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Self::open(&dir.join("attendance.db"))
    }

    /// Open or create the attendance log at an explicit path.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // WAL so a reporting query never blocks an in-progress session.
        db.pragma_update(None, "journal_mode", "WAL")
            .context("Failed to enable WAL mode")?;
        db.busy_timeout(std::time::Duration::from_secs(30))
            .context("Failed to set busy timeout")?;

        let mut log = Self { db };
        log.init_schema()?;
        Ok(log)
    }

    fn init_schema(&mut self) -> Result<()> {
        let version: i32 = self
            .db
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .or_else(|_| {
                self.db.execute(
                    "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
                    [],
                )?;
                self.db
                    .execute("INSERT INTO schema_version (version) VALUES (0)", [])?;
                Ok::<i32, rusqlite::Error>(0)
            })?;

        if version < SCHEMA_VERSION {
            self.migrate_schema(version)?;
        }

        Ok(())
    }

    fn migrate_schema(&mut self, from_version: i32) -> Result<()> {
        let tx = self
            .db
            .transaction()
            .context("Failed to start migration transaction")?;

        if from_version == 0 {
            tx.execute(
                "CREATE TABLE IF NOT EXISTS scan_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    scanner_id TEXT NOT NULL,
                    event_id INTEGER,
                    started_at INTEGER NOT NULL,
                    ended_at INTEGER,
                    total_scans INTEGER NOT NULL DEFAULT 0,
                    unique_scans INTEGER NOT NULL DEFAULT 0,
                    duplicate_scans INTEGER NOT NULL DEFAULT 0,
                    notes TEXT
                )",
                [],
            )
            .context("Failed to create scan_sessions table")?;

            tx.execute(
                "CREATE TABLE IF NOT EXISTS scan_records (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id INTEGER NOT NULL REFERENCES scan_sessions(id),
                    attendee_id TEXT NOT NULL,
                    attendee_name TEXT NOT NULL,
                    code TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    scanned_at INTEGER NOT NULL,
                    location TEXT,
                    first_visit INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )
            .context("Failed to create scan_records table")?;

            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_records_attendee ON scan_records(attendee_id)",
                [],
            )
            .context("Failed to create attendee index")?;
            tx.execute(
                "CREATE INDEX IF NOT EXISTS idx_records_session ON scan_records(session_id)",
                [],
            )
            .context("Failed to create session index")?;

            tx.execute("UPDATE schema_version SET version = ?1", [SCHEMA_VERSION])
                .context("Failed to update schema version")?;
        }

        tx.commit().context("Failed to commit migration transaction")
    }

    /// Open a new session row; returns its id.
    pub fn start_session(
        &mut self,
        scanner_id: &str,
        event_id: Option<i64>,
        started_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.db.execute(
            "INSERT INTO scan_sessions (scanner_id, event_id, started_at) VALUES (?1, ?2, ?3)",
            params![scanner_id, event_id, started_at.timestamp()],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// Finalize a session row with the tracker's summary figures.
    pub fn finish_session(
        &mut self,
        session_id: i64,
        ended_at: DateTime<Utc>,
        total_scans: u64,
        unique_scans: u64,
        duplicate_scans: u64,
        notes: Option<&str>,
    ) -> Result<()> {
        self.db.execute(
            "UPDATE scan_sessions SET
                ended_at = ?1,
                total_scans = ?2,
                unique_scans = ?3,
                duplicate_scans = ?4,
                notes = ?5
             WHERE id = ?6",
            params![
                ended_at.timestamp(),
                total_scans as i64,
                unique_scans as i64,
                duplicate_scans as i64,
                notes,
                session_id
            ],
        )?;
        Ok(())
    }

    /// Insert an accepted scan; returns the stored row.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_scan(
        &mut self,
        session_id: i64,
        attendee_id: &str,
        attendee_name: &str,
        code: &str,
        kind: CheckKind,
        scanned_at: DateTime<Utc>,
        location: Option<&str>,
        first_visit: bool,
    ) -> Result<i64> {
        self.db.execute(
            "INSERT INTO scan_records
                (session_id, attendee_id, attendee_name, code, kind, scanned_at, location, first_visit)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session_id,
                attendee_id,
                attendee_name,
                code,
                kind.as_str(),
                scanned_at.timestamp(),
                location,
                first_visit
            ],
        )?;
        Ok(self.db.last_insert_rowid())
    }

    /// Most recent check-in/check-out for an attendee, if any. Networking
    /// scans do not participate in the sequence.
    pub fn last_check_kind(&self, attendee_id: &str) -> Result<Option<CheckKind>> {
        let kind: Option<String> = self
            .db
            .query_row(
                "SELECT kind FROM scan_records
                 WHERE attendee_id = ?1 AND kind IN ('check_in', 'check_out')
                 ORDER BY id DESC LIMIT 1",
                [attendee_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(kind.as_deref().and_then(CheckKind::parse))
    }

    /// Whether an attendee has ever checked in before.
    pub fn has_checked_in_before(&self, attendee_id: &str) -> Result<bool> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM scan_records WHERE attendee_id = ?1 AND kind = 'check_in'",
            [attendee_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Past sessions, newest first.
    pub fn list_sessions(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.db.prepare(
            "SELECT id, scanner_id, event_id, started_at, ended_at,
                    total_scans, unique_scans, duplicate_scans, notes
             FROM scan_sessions
             ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let started_at: i64 = row.get(3)?;
            let ended_at: Option<i64> = row.get(4)?;
            Ok(SessionRecord {
                id: row.get(0)?,
                scanner_id: row.get(1)?,
                event_id: row.get(2)?,
                started_at: DateTime::from_timestamp(started_at, 0).unwrap_or_else(Utc::now),
                ended_at: ended_at
                    .map(|ts| DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)),
                total_scans: row.get::<_, i64>(5)? as u64,
                unique_scans: row.get::<_, i64>(6)? as u64,
                duplicate_scans: row.get::<_, i64>(7)? as u64,
                notes: row.get(8)?,
            })
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }
        Ok(sessions)
    }

    /// All scans recorded during one session, oldest first.
    pub fn scans_for_session(&self, session_id: i64) -> Result<Vec<ScanRecord>> {
        let mut stmt = self.db.prepare(
            "SELECT id, session_id, attendee_id, attendee_name, code, kind,
                    scanned_at, location, first_visit
             FROM scan_records
             WHERE session_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([session_id], |row| {
            let kind: String = row.get(5)?;
            let scanned_at: i64 = row.get(6)?;
            Ok(ScanRecord {
                id: row.get(0)?,
                session_id: row.get(1)?,
                attendee_id: row.get(2)?,
                attendee_name: row.get(3)?,
                code: row.get(4)?,
                kind: CheckKind::parse(&kind).unwrap_or(CheckKind::Networking),
                scanned_at: DateTime::from_timestamp(scanned_at, 0).unwrap_or_else(Utc::now),
                location: row.get(7)?,
                first_visit: row.get(8)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Aggregate figures across the whole log.
    pub fn stats(&self) -> Result<LogStats> {
        let sessions: i64 =
            self.db
                .query_row("SELECT COUNT(*) FROM scan_sessions", [], |row| row.get(0))?;
        let scans_recorded: i64 =
            self.db
                .query_row("SELECT COUNT(*) FROM scan_records", [], |row| row.get(0))?;
        let distinct_attendees: i64 = self.db.query_row(
            "SELECT COUNT(DISTINCT attendee_id) FROM scan_records",
            [],
            |row| row.get(0),
        )?;
        let check_ins: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM scan_records WHERE kind = 'check_in'",
            [],
            |row| row.get(0),
        )?;
        let check_outs: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM scan_records WHERE kind = 'check_out'",
            [],
            |row| row.get(0),
        )?;
        // Attendees whose most recent check movement is a check-in.
        let currently_checked_in: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM scan_records r
             WHERE r.kind = 'check_in'
               AND r.id = (SELECT MAX(r2.id) FROM scan_records r2
                           WHERE r2.attendee_id = r.attendee_id
                             AND r2.kind IN ('check_in', 'check_out'))",
            [],
            |row| row.get(0),
        )?;

        Ok(LogStats {
            sessions: sessions as u64,
            scans_recorded: scans_recorded as u64,
            distinct_attendees: distinct_attendees as u64,
            check_ins: check_ins as u64,
            check_outs: check_outs as u64,
            currently_checked_in: currently_checked_in as u64,
        })
    }
}

/// Platform data directory for the attendance database.
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "doorscan")
        .context("Failed to determine a data directory for this platform")?;
    Ok(dirs.data_dir().to_path_buf())
}
