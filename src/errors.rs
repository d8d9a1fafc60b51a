//! Typed error definitions for file_uploader.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Lock Guard failures.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("could not lock {path} after {attempts} attempts")]
    Exhausted { path: PathBuf, attempts: u32 },

    #[error("cannot open {path} for locking: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Upload failures. Transport and HTTP-level errors are both reported as failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot open {path} for upload: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("upload transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upload failed with status {status}, body: {body}")]
    Status { status: u16, body: String },

    #[error("upload failed with status {status}; could not read body: {reason}")]
    StatusUnreadable { status: u16, reason: String },
}

impl UploadError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UploadError::Status { status, .. } | UploadError::StatusUnreadable { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// State Mover failures.
#[derive(Debug, Error)]
pub enum MoveError {
    #[error("source file missing a file name: {0}")]
    NoFileName(PathBuf),

    #[error("rename {src} -> {dest} failed: {source}{hint}")]
    Rename {
        src: PathBuf,
        dest: PathBuf,
        hint: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Umbrella error for one unit of work passing through the dispatcher.
#[derive(Debug, Error)]
pub enum UploaderError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("cannot inspect {path}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UploaderError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            UploaderError::Inspect { .. } => 10,
            UploaderError::Lock(LockError::Exhausted { .. }) => 20,
            UploaderError::Lock(LockError::Open { .. }) => 21,
            UploaderError::Upload(UploadError::Open { .. }) => 30,
            UploaderError::Upload(UploadError::Transport(_)) => 31,
            UploaderError::Upload(UploadError::Status { .. }) => 32,
            UploaderError::Upload(UploadError::StatusUnreadable { .. }) => 33,
            UploaderError::Move(_) => 40,
        }
    }

    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            UploaderError::Inspect { .. } => "inspect",
            UploaderError::Lock(_) => "lock",
            UploaderError::Upload(_) => "upload",
            UploaderError::Move(_) => "move",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_mentions_code_and_body() {
        let e = UploadError::Status { status: 500, body: "server error".into() };
        let msg = e.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("server error"));
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn codes_are_distinct_per_kind() {
        let lock: UploaderError = LockError::Exhausted { path: "a".into(), attempts: 6 }.into();
        let mv: UploaderError = MoveError::NoFileName("/".into()).into();
        assert_ne!(lock.code(), mv.code());
        assert_eq!(lock.kind(), "lock");
        assert_eq!(mv.kind(), "move");
    }
}
