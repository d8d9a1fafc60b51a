//! Core library for `file_uploader`.
//!
//! Watches a source directory (periodic scan plus optional live events),
//! uploads each file once as a streamed multipart POST, then renames it into
//! a completed or failed directory.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod errors;
pub mod fs_ops;
pub mod output;
pub mod platform;
pub mod service;
pub mod shutdown;
pub mod upload;

pub use config::{Config, LogLevel, default_config_path, load_config_from_xml_path, default_log_path, path_has_symlink_ancestor};
pub use dispatcher::{DispatchStats, Dispatcher, Processed};
pub use errors::{LockError, MoveError, UploadError, UploaderError};
pub use service::Service;
pub use upload::{UploadOutcome, Uploader};

/// Convenience re-exports for embedding the pipeline.
pub mod prelude {
    pub use crate::config::{Config, LogLevel, load_config_from_xml_path, prepare_directories};
    pub use crate::dispatcher::{DispatchStats, Dispatcher, Processed};
    pub use crate::errors::UploaderError as Error;
    pub use crate::fs_ops::LockPolicy;
    pub use crate::service::Service;
    pub use crate::shutdown::ShutdownSignal;
    pub use crate::upload::{UploadOutcome, Uploader};
}
