//! Core configuration types.
//! - Config holds the directory roots, the upload endpoint and runtime knobs.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::{POLL_ONLY_SCAN_INTERVAL, WATCH_SCAN_INTERVAL};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for the upload pipeline.
///
/// Built once at startup and handed to each component by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Drop location watched for new files
    pub source_dir: PathBuf,
    /// Terminal directory for successful uploads
    pub completed_dir: PathBuf,
    /// Terminal directory for failed uploads
    pub failed_dir: PathBuf,
    /// Endpoint receiving the multipart POST
    pub upload_url: Url,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Subscribe to filesystem create-events in addition to polling
    pub watch: bool,
    /// Explicit scan interval; None picks a default based on `watch`
    pub scan_interval: Option<Duration>,
    /// Per-request upload timeout; None waits indefinitely
    pub upload_timeout: Option<Duration>,
}

impl Config {
    /// Construct a Config with explicit directories and URL; other fields use defaults.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        completed_dir: impl Into<PathBuf>,
        failed_dir: impl Into<PathBuf>,
        upload_url: Url,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            completed_dir: completed_dir.into(),
            failed_dir: failed_dir.into(),
            upload_url,
            log_level: LogLevel::Normal,
            log_file: None,
            watch: true,
            scan_interval: None,
            upload_timeout: None,
        }
    }

    /// Effective scan interval. Poll-only deployments scan more often.
    pub fn effective_scan_interval(&self) -> Duration {
        match self.scan_interval {
            Some(d) if !d.is_zero() => d,
            _ if self.watch => WATCH_SCAN_INTERVAL,
            _ => POLL_ONLY_SCAN_INTERVAL,
        }
    }
}
