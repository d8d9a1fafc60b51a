//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - Flags override values loaded from the XML config.

use clap::{Parser, ValueHint};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::config::types::{Config, LogLevel};

/// Watch a drop directory and upload each new file to an HTTP endpoint.
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Upload files dropped into a directory, then file them under completed/ or failed/"
)]
pub struct Args {
    /// Config file to load (overrides FILE_UPLOADER_CONFIG and the default location).
    #[arg(long, short = 'c', value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long, help = "Enable debug logging (shorthand for --log-level debug)")]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, value_parser = LogLevel::from_str, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<LogLevel>,

    /// Write logs to this file in addition to stdout.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Poll only; do not subscribe to filesystem events.
    #[arg(long, help = "Disable live filesystem events and rely on periodic scans")]
    pub no_watch: bool,

    /// Directory scan interval in seconds.
    #[arg(long, value_name = "SECS")]
    pub scan_interval: Option<u64>,

    /// Abort an upload that takes longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub upload_timeout: Option<u64>,

    /// Print where the config file is looked up, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config value).
    /// An unknown --log-level is rejected at parse time, as in the XML config.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.clone()
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(f) = &self.log_file {
            cfg.log_file = Some(f.clone());
        }
        if self.no_watch {
            cfg.watch = false;
        }
        if let Some(s) = self.scan_interval {
            cfg.scan_interval = Some(Duration::from_secs(s));
        }
        if let Some(s) = self.upload_timeout {
            cfg.upload_timeout = (s > 0).then(|| Duration::from_secs(s));
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
