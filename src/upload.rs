//! Streaming multipart uploader.
//!
//! The file is never read fully into memory: a `ReaderStream` over the open
//! file feeds the single `file` part chunk by chunk while reqwest writes the
//! request. A read error mid-stream ends the body early and reqwest reports it
//! as a transport error, so a truncated request is never treated as success.

use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::{Body, Client, Response, StatusCode};
use std::path::Path;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::errors::UploadError;
use crate::fs_ops::Terminal;

/// Multipart field carrying the file.
pub const FORM_FIELD: &str = "file";
const PART_MIME: &str = "application/octet-stream";
/// Bytes of a failure response body kept for the error and the log line.
pub const ERROR_BODY_LIMIT: usize = 4 * 1024;
const TRUNCATED_MARKER: &str = " ...(truncated)";

/// Result of one upload attempt.
#[derive(Debug)]
pub enum UploadOutcome {
    Success,
    /// Worth retrying by an operator (network trouble, 5xx, 408, 429).
    TransientFailure(UploadError),
    /// The endpoint rejected the file.
    PermanentFailure(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success)
    }

    /// Success goes to `completed`, every failure to `failed`.
    pub fn terminal(&self) -> Terminal {
        match self {
            UploadOutcome::Success => Terminal::Completed,
            _ => Terminal::Failed,
        }
    }

    pub fn into_error(self) -> Option<UploadError> {
        match self {
            UploadOutcome::Success => None,
            UploadOutcome::TransientFailure(e) | UploadOutcome::PermanentFailure(e) => Some(e),
        }
    }

    fn failure(err: UploadError) -> Self {
        let transient = match err.status() {
            None => true,
            Some(code) => {
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                status.is_server_error()
                    || status == StatusCode::REQUEST_TIMEOUT
                    || status == StatusCode::TOO_MANY_REQUESTS
            }
        };
        if transient {
            UploadOutcome::TransientFailure(err)
        } else {
            UploadOutcome::PermanentFailure(err)
        }
    }
}

/// HTTP client bound to the configured endpoint.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    url: Url,
}

impl Uploader {
    /// Build the client. No timeout unless configured.
    ///
    /// Redirects are not followed: a 3xx would otherwise turn the POST into a
    /// GET whose 2xx looks like a successful upload.
    pub fn new(cfg: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = cfg.upload_timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            url: cfg.upload_url.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// POST `path` as `multipart/form-data` and classify the response.
    pub async fn upload(&self, path: &Path) -> UploadOutcome {
        match self.send(path).await {
            Ok(()) => UploadOutcome::Success,
            Err(e) => UploadOutcome::failure(e),
        }
    }

    async fn send(&self, path: &Path) -> Result<(), UploadError> {
        info!(path = %path.display(), "Processing file");

        let file = tokio::fs::File::open(path).await.map_err(|source| UploadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        let part = Part::stream(Body::wrap_stream(ReaderStream::new(file)))
            .file_name(file_name)
            .mime_str(PART_MIME)?;
        let form = Form::new().part(FORM_FIELD, part);

        let resp = self.client.post(self.url.clone()).multipart(form).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!(path = %path.display(), status = status.as_u16(), "Upload accepted");
            return Ok(());
        }

        let code = status.as_u16();
        match read_error_body(resp).await {
            Ok(body) => Err(UploadError::Status { status: code, body }),
            Err(e) => {
                warn!(status = code, error = %e, "Could not read failure body");
                Err(UploadError::StatusUnreadable {
                    status: code,
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// Read at most `ERROR_BODY_LIMIT` bytes of a failure body.
async fn read_error_body(mut resp: Response) -> Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = resp.chunk().await? {
        let room = ERROR_BODY_LIMIT - buf.len();
        if chunk.len() > room {
            buf.extend_from_slice(&chunk[..room]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    let mut body = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        body.push_str(TRUNCATED_MARKER);
    }
    Ok(body)
}
