use crate::history::SessionReport;
use crate::record::{LogStats, SessionRecord};
use crate::resolver::ResolvedBadge;
use crate::session::{ScanEntry, SessionStats};
use crate::station::ScanResponse;
use crate::theme::Theme;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Quiet,   // Only errors
    Normal,  // Standard output
    Verbose, // More details
}

impl OutputMode {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbose > 0 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

/// Format elapsed milliseconds as HH:MM:SS, the wall clock the operator
/// glances at between scans.
pub fn format_hms(elapsed_ms: i64) -> String {
    let total_secs = (elapsed_ms / 1_000).max(0);
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// The four stat tiles shown after every accepted or suppressed scan.
pub fn print_stat_tiles(stats: SessionStats, elapsed_ms: i64, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!(
        "  {} {}   {} {}   {} {}   {} {}",
        Theme::muted("total"),
        Theme::value(&stats.total_scans.to_string()),
        Theme::muted("unique"),
        Theme::success(&stats.unique_scans.to_string()),
        Theme::muted("duplicates"),
        Theme::warn(&stats.duplicate_scans.to_string()),
        Theme::muted("time"),
        Theme::value(&format_hms(elapsed_ms)),
    );
}

/// Recent accepted scans, newest first. Verbose mode adds timestamps.
pub fn print_recent_scans(history: &[ScanEntry], mode: OutputMode) {
    if mode == OutputMode::Quiet || history.is_empty() {
        return;
    }

    println!();
    println!("{}", Theme::primary("Recent scans"));
    for (i, entry) in history.iter().enumerate() {
        let line = if mode == OutputMode::Verbose {
            format!("{}  {}", entry.observed_at.format("%H:%M:%S"), entry.code)
        } else {
            entry.code.clone()
        };
        if i == 0 {
            println!("  {}", Theme::value(&line));
        } else {
            println!("  {}", Theme::muted(&line));
        }
    }
}

/// One line of operator feedback per submitted payload.
pub fn print_scan_feedback(response: &ScanResponse, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    match response {
        ScanResponse::Recorded {
            badge,
            kind,
            first_visit,
            ..
        } => {
            let mut line = format!("{} {} ({})", badge.name, kind.as_str(), badge.id);
            if let Some(company) = &badge.company {
                line.push_str(&format!(" · {company}"));
            }
            println!("{} {}", Theme::success("✓"), line);
            if *first_visit {
                println!("  {}", Theme::primary("First visit, welcome them!"));
            }
        }
        ScanResponse::Duplicate { .. } => {
            println!("{} {}", Theme::warn("≈"), Theme::muted("duplicate scan, ignored"));
        }
        ScanResponse::Ignored => {}
        ScanResponse::ResolutionFailed { code, reason } => {
            println!("{} {code}: {reason}", Theme::error("✗"));
        }
        ScanResponse::RecordRejected { message, .. } => {
            println!("{} {}", Theme::warn("!"), message);
        }
        ScanResponse::SessionClosed => {
            println!("{}", Theme::muted("session is closed"));
        }
    }
}

/// End-of-session summary block.
pub fn print_session_summary(report: &SessionReport, report_path: &std::path::Path, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("Session summary"));
    println!("{}", Theme::divider_bold(48));
    println!("  {:<12} {}", Theme::muted("scanner"), report.scanner_id);
    if let Some(location) = &report.location {
        println!("  {:<12} {}", Theme::muted("location"), location);
    }
    println!("  {:<12} {}", Theme::muted("mode"), report.kind.as_str());
    println!(
        "  {:<12} {}",
        Theme::muted("duration"),
        format_hms(report.duration_ms)
    );
    println!(
        "  {:<12} {}",
        Theme::muted("scans"),
        report.summary_line()
    );
    if let Some(notes) = &report.notes {
        println!("  {:<12} {}", Theme::muted("notes"), notes);
    }
    println!("{}", Theme::divider(48));
    println!(
        "  {}",
        Theme::muted(&format!("report written to {}", report_path.display()))
    );
    println!();
}

/// Past sessions table for `doorscan sessions`.
pub fn print_sessions(sessions: &[SessionRecord], mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        println!(
            "Run {} to start scanning.",
            Theme::command("doorscan scan")
        );
        return;
    }

    println!();
    println!(
        "{:<5} {:<20} {:<14} {:>7} {:>7} {:>11}",
        Theme::primary("id"),
        Theme::primary("started"),
        Theme::primary("scanner"),
        Theme::primary("total"),
        Theme::primary("unique"),
        Theme::primary("duplicates")
    );
    println!("{}", Theme::divider(68));

    for session in sessions {
        let started = session.started_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<5} {:<20} {:<14} {:>7} {:>7} {:>11}",
            session.id,
            started,
            session.scanner_id,
            session.total_scans,
            session.unique_scans,
            session.duplicate_scans
        );
        if mode == OutputMode::Verbose {
            if let Some(notes) = &session.notes {
                println!("      {}", Theme::muted(notes));
            }
        }
    }
    println!();
}

pub fn print_sessions_json(sessions: &[SessionRecord]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(sessions)?);
    Ok(())
}

/// Aggregate attendance figures for `doorscan stats`.
pub fn print_log_stats(stats: &LogStats, mode: OutputMode) {
    if mode == OutputMode::Quiet {
        return;
    }

    println!();
    println!("{}", Theme::header("Attendance log"));
    println!("{}", Theme::divider_bold(40));
    println!("  {:<22} {}", Theme::muted("sessions"), Theme::value(&stats.sessions.to_string()));
    println!(
        "  {:<22} {}",
        Theme::muted("scans recorded"),
        Theme::value(&stats.scans_recorded.to_string())
    );
    println!(
        "  {:<22} {}",
        Theme::muted("distinct attendees"),
        Theme::value(&stats.distinct_attendees.to_string())
    );
    println!(
        "  {:<22} {}",
        Theme::muted("check-ins"),
        Theme::value(&stats.check_ins.to_string())
    );
    println!(
        "  {:<22} {}",
        Theme::muted("check-outs"),
        Theme::value(&stats.check_outs.to_string())
    );
    println!(
        "  {:<22} {}",
        Theme::muted("currently checked in"),
        Theme::success(&stats.currently_checked_in.to_string())
    );
    println!();
}

pub fn print_log_stats_json(stats: &LogStats) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(stats)?);
    Ok(())
}

/// Lookup result for `doorscan resolve`.
pub fn print_resolved_badge(code: &str, badge: &ResolvedBadge) {
    println!("{} {}", Theme::success("✓"), Theme::value(&badge.name));
    println!("  {:<10} {}", Theme::muted("code"), code);
    println!("  {:<10} {}", Theme::muted("id"), badge.id);
    if let Some(company) = &badge.company {
        println!("  {:<10} {}", Theme::muted("company"), company);
    }
    if let Some(participant_type) = &badge.participant_type {
        println!("  {:<10} {}", Theme::muted("type"), participant_type);
    }
}
