use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::config::{self, Config};
use crate::output::{self, OutputMode};
use crate::record::{AttendanceLog, CheckKind};
use crate::resolver::{BadgeResolver, HttpBadgeResolver, OfflineResolver};
use crate::theme::Theme;

pub mod commands;

#[derive(Parser)]
#[command(name = "doorscan")]
#[command(version)]
#[command(about = "Badge scanning station for event check-in desks")]
#[command(long_about = "Doorscan turns a laptop with a keyboard-wedge QR scanner into an \
    event check-in station: it deduplicates rapid repeat reads, resolves badges against \
    the membership API and keeps a local attendance log.\n\n\
    Examples:\n  \
    doorscan scan                         # Start a check-in session\n  \
    doorscan scan --kind check-out        # Run the exit desk\n  \
    doorscan scan --offline               # No connectivity, format checks only\n  \
    doorscan sessions --limit 5           # Recent sessions\n  \
    doorscan resolve AIS2025-7G2KX9QD     # Look up a single badge")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// What recorded scans mean, selectable per session.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScanMode {
    CheckIn,
    CheckOut,
    Networking,
}

impl From<ScanMode> for CheckKind {
    fn from(mode: ScanMode) -> Self {
        match mode {
            ScanMode::CheckIn => CheckKind::CheckIn,
            ScanMode::CheckOut => CheckKind::CheckOut,
            ScanMode::Networking => CheckKind::Networking,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive scanning session
    #[command(visible_alias = "s")]
    Scan {
        /// What the scans mean for attendees
        #[arg(long, value_enum, default_value = "check-in")]
        kind: ScanMode,

        /// Event id to attach to the session (overrides config)
        #[arg(long, value_name = "ID")]
        event: Option<i64>,

        /// Location label recorded with each scan (overrides config)
        #[arg(long, value_name = "LABEL")]
        location: Option<String>,

        /// Scanner identifier for this device (overrides config)
        #[arg(long, value_name = "NAME")]
        scanner: Option<String>,

        /// Notes to attach to the session summary
        #[arg(long, value_name = "TEXT")]
        notes: Option<String>,

        /// Skip the membership API; accept known badge formats only
        #[arg(long)]
        offline: bool,
    },

    /// List past scanning sessions
    Sessions {
        /// Maximum number of sessions to show
        #[arg(long, default_value = "10", value_name = "N")]
        limit: usize,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate attendance figures
    Stats {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Resolve a single badge code without recording anything
    Resolve {
        /// Badge code, QR payload or profile URL
        code: String,

        /// Check the format only, without calling the membership API
        #[arg(long)]
        offline: bool,
    },

    /// Show the configuration file location and current values
    Config,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let mode = OutputMode::from_flags(self.verbose, self.quiet);
        let config = Config::load().context("Failed to load configuration")?;

        match self.command {
            Commands::Scan {
                kind,
                event,
                location,
                scanner,
                notes,
                offline,
            } => commands::scan_command::handle_scan(
                &config,
                kind.into(),
                event,
                location,
                scanner,
                notes,
                offline,
                mode,
            ),
            Commands::Sessions { limit, json } => {
                let log = AttendanceLog::open_default()?;
                let sessions = log.list_sessions(limit)?;
                if json {
                    output::print_sessions_json(&sessions)
                } else {
                    output::print_sessions(&sessions, mode);
                    Ok(())
                }
            }
            Commands::Stats { json } => {
                let log = AttendanceLog::open_default()?;
                let stats = log.stats()?;
                if json {
                    output::print_log_stats_json(&stats)
                } else {
                    output::print_log_stats(&stats, mode);
                    Ok(())
                }
            }
            Commands::Resolve { code, offline } => {
                let handle = crate::badge::extract_handle(&code)
                    .context("Nothing to resolve: the code is empty")?;

                let resolver = build_resolver(&config, offline);
                match resolver.resolve(handle) {
                    Ok(badge) => {
                        output::print_resolved_badge(handle, &badge);
                        Ok(())
                    }
                    Err(err) => {
                        println!("{} {handle}: {err}", Theme::error("✗"));
                        std::process::exit(1);
                    }
                }
            }
            Commands::Config => {
                let path = config::config_path()?;
                println!("Config file: {}", Theme::primary(&path.display().to_string()));
                if !path.exists() {
                    println!("{}", Theme::muted("(not created yet, using defaults)"));
                }
                println!();
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        }
    }
}

/// Pick the resolver for this invocation. No configured API base means the
/// station can only do offline format checks.
pub(crate) fn build_resolver(config: &Config, offline: bool) -> Box<dyn BadgeResolver> {
    match (&config.api_base_url, offline) {
        (Some(base_url), false) => Box::new(HttpBadgeResolver::new(base_url.clone())),
        _ => Box::new(OfflineResolver),
    }
}
