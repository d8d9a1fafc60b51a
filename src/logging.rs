//! Tracing initialization.
//! Builds a subscriber with EnvFilter, compact or JSON formatting, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by LogLevel. `quiet` keeps errors only.
//! - reqwest/hyper/notify internals are capped at `warn` so `debug` stays readable.
//! - If `log_file` is provided and passes safety checks, a non-blocking file layer is added.
//!
//! File logging:
//! - `log_file` names the directory and the file stem/extension; the appender
//!   writes `<stem>.<YYYY-MM-DD>.<ext>` and rotates daily.
//! - At most `LOG_FILES_KEPT` files are kept; older ones are pruned on startup
//!   and on every rotation.
//! - Refused if any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use file_uploader::output as out;
use file_uploader::platform::set_dir_mode_0700;
use file_uploader::{LogLevel, default_log_path, path_has_symlink_ancestor};
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

const NOISY_DEPS: &[&str] = &["hyper", "hyper_util", "reqwest", "notify", "mio"];

/// Rotated log files kept on disk, including the active one.
pub(crate) const LOG_FILES_KEPT: usize = 3;

/// Timestamp formatter (YYYY-MM-DD HH:MM:SS, local time)
struct LocalTime;
impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

#[inline]
pub(crate) fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn env_filter_for(level_filter: LevelFilter) -> EnvFilter {
    let mut filter = EnvFilter::default().add_directive(level_filter.into());
    if level_filter > LevelFilter::WARN {
        for dep in NOISY_DEPS {
            if let Ok(d) = format!("{dep}=warn").parse() {
                filter = filter.add_directive(d);
            }
        }
    }
    filter
}

/// Open a non-blocking file writer, or explain on stderr why not.
fn open_file_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            eprintln!(
                "Refusing to enable file logging: ancestor of {} is a symlink; proceeding without file logging.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!(
                "Error checking log path {} for symlinks: {}; proceeding without file logging.",
                path.display(),
                e
            );
            return None;
        }
        Ok(false) => {}
    }

    match rolling_appender(path) {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {}", path.display(), e);
            None
        }
    }
}

/// Daily-rotating appender derived from `path`, pruned to `LOG_FILES_KEPT` files.
pub(crate) fn rolling_appender(path: &Path) -> Result<RollingFileAppender, InitError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.exists() && std::fs::create_dir_all(dir).is_ok() {
        let _ = set_dir_mode_0700(dir);
    }

    let prefix = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let mut builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(LOG_FILES_KEPT);
    if let Some(ext) = path.extension() {
        builder = builder.filename_suffix(ext.to_string_lossy().into_owned());
    }
    builder.build(dir)
}

/// Initialize tracing. Returns a WorkerGuard when a file appender is active;
/// hold it until shutdown so buffered lines are flushed.
pub fn init_tracing(lvl: &LogLevel, log_file: Option<&Path>, json: bool) -> Result<Option<WorkerGuard>> {
    let env_filter = env_filter_for(to_level_filter(lvl));

    let file = log_file.and_then(|path| {
        let opened = open_file_writer(path);
        if opened.is_none() {
            out::print_warn(&format!(
                "Requested file logging to '{}' was not enabled. Check that the parent directory is writable and that no ancestor is a symlink. Logs will continue to stdout.",
                path.display()
            ));
            if let Ok(def) = default_log_path() {
                out::print_info(&format!("You can try the default log path instead: {}", def.display()));
            }
        }
        opened
    });
    let (file_writer, guard) = match file {
        Some((w, g)) => (Some(w), Some(g)),
        None => (None, None),
    };

    if json {
        let stdout_layer = tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalTime)
            .with_target(true);
        let file_layer = file_writer.map(|w| {
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalTime)
                .with_target(true)
                .with_ansi(false)
                .with_writer(w)
        });
        registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer)
            .try_init()?;
    } else {
        let stdout_layer = tsfmt::layer()
            .with_timer(LocalTime)
            .with_target(false)
            .compact();
        let file_layer = file_writer.map(|w| {
            tsfmt::layer()
                .with_timer(LocalTime)
                .with_target(false)
                .with_ansi(false)
                .compact()
                .with_writer(w)
        });
        registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer)
            .try_init()?;
    }
    Ok(guard)
}
