//! Config module.
//! Provides configuration types, default paths, XML loading, and directory bootstrap.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{CONFIG_ENV_VAR, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use validate::prepare_directories;
pub use xml::{LoadResult, create_template_config, load_config_from_xml_path, load_or_init};

use std::time::Duration;

/// Defaults written into a fresh template config.
pub const SOURCE_DIR_DEFAULT: &str = "/var/spool/file_uploader/incoming";
pub const COMPLETED_DIR_DEFAULT: &str = "/var/spool/file_uploader/completed";
pub const FAILED_DIR_DEFAULT: &str = "/var/spool/file_uploader/failed";
pub const UPLOAD_URL_DEFAULT: &str = "http://localhost:8080/upload";

/// Scan cadence when live create-events are also subscribed.
pub const WATCH_SCAN_INTERVAL: Duration = Duration::from_secs(5);
/// Scan cadence for poll-only deployments.
pub const POLL_ONLY_SCAN_INTERVAL: Duration = Duration::from_secs(1);
