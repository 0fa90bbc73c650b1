//! Interactive scanning session.
//!
//! This module owns and handles the "doorscan scan" command behavior: a
//! read-scan-feedback loop driven by a keyboard-wedge QR scanner, which types
//! each decoded payload followed by Enter, or by manual entry.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use crate::config::Config;
use crate::history::SessionReport;
use crate::output::{self, OutputMode};
use crate::record::{AttendanceLog, CheckKind};
use crate::station::{ScanResponse, Station, StationConfig};
use crate::theme::Theme;

/// Read a line from stdin, returning None at end of input.
///
/// A fresh handle is taken per read; keyboard-wedge scanners can leave the
/// terminal in odd focus states between bursts and a stale locked handle
/// makes that worse.
fn read_line_from_stdin() -> io::Result<Option<String>> {
    io::stdout().flush()?;

    use std::io::BufRead;
    let stdin = io::stdin();
    let mut handle = stdin.lock();

    let mut input = String::new();
    let bytes = handle.read_line(&mut input)?;
    if bytes == 0 {
        return Ok(None);
    }

    Ok(Some(input))
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn handle_scan(
    config: &Config,
    kind: CheckKind,
    event: Option<i64>,
    location: Option<String>,
    scanner: Option<String>,
    notes: Option<String>,
    offline: bool,
    mode: OutputMode,
) -> Result<()> {
    if let Some(expected) = &config.access_code {
        print!("Access code: ");
        let entered = read_line_from_stdin()
            .context("Failed to read access code")?
            .unwrap_or_default();
        if entered.trim() != expected {
            bail!("Wrong access code");
        }
    }

    let resolver = crate::cli::build_resolver(config, offline);
    let log = AttendanceLog::open_default()?;

    let station_config = StationConfig {
        scanner_id: scanner.unwrap_or_else(|| config.scanner_id.clone()),
        event_id: event.or(config.event_id),
        location: location.or_else(|| config.location.clone()),
        kind,
        dedup_window_ms: config.dedup_window_ms,
    };
    let scanner_id = station_config.scanner_id.clone();
    let session_location = station_config.location.clone();
    let event_id = station_config.event_id;

    let mut station = Station::begin(log, resolver, station_config, Utc::now())?;

    if mode != OutputMode::Quiet {
        println!();
        println!(
            "{} {}",
            Theme::header("Scanning session open"),
            Theme::muted(&format!("({} mode)", kind.as_str()))
        );
        if config.api_base_url.is_none() || offline {
            println!(
                "{}",
                Theme::warn("Offline: badge formats are checked, identities are not")
            );
        }
        println!(
            "{}",
            Theme::muted("Scan a badge or type a code. /stats shows figures, /end finishes.")
        );
        println!("{}", Theme::divider(60));
    }

    loop {
        let line = match read_line_from_stdin().context("Failed to read scanner input")? {
            Some(line) => line,
            None => break,
        };

        match line.trim() {
            "/end" => break,
            "/stats" => {
                let elapsed = (Utc::now() - station.started_at()).num_milliseconds();
                output::print_stat_tiles(station.stats(), elapsed, mode);
                output::print_recent_scans(station.history(), mode);
            }
            _ => {
                let response = station.process_scan(&line, Utc::now());
                match response {
                    Ok(response) => {
                        output::print_scan_feedback(&response, mode);
                        if !matches!(response, ScanResponse::Ignored) {
                            let elapsed =
                                (Utc::now() - station.started_at()).num_milliseconds();
                            output::print_stat_tiles(station.stats(), elapsed, mode);
                        }
                    }
                    // A failed write is reported and scanning continues; the
                    // session counters are still intact.
                    Err(err) => println!("{} {err:#}", Theme::error("✗")),
                }
            }
        }
    }

    let summary = station.end(Utc::now(), notes)?;
    let report = SessionReport::new(
        &scanner_id,
        event_id,
        session_location.as_deref(),
        kind,
        &summary,
    );
    let report_path = report.save()?;

    output::print_session_summary(&report, &report_path, mode);
    Ok(())
}
