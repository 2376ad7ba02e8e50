//! Single-attempt multipart upload and the local spool used on failure.

use crate::{Artifact, CaptureError, CaptureSettings, CoreResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use reqwest::{
    Client, Url,
    multipart::{Form, Part},
};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

/// Upload endpoint for `destination`, ignoring trailing separators.
pub fn upload_url(destination: &str) -> String {
    format!("{}/upload", destination.trim_end_matches('/'))
}

/// Posts artifacts to the backend's `/upload` endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Uploader {
    client: Client,
    field_name: String,
    mime_type: String,
}

impl Uploader {
    #[track_caller]
    pub(crate) fn new(settings: &CaptureSettings) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(settings.upload_timeout)
            .build()
            .map_err(|e| CaptureError::TransferFailed {
                reason: format!("Failed to create HTTP client: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            client,
            field_name: settings.field_name.clone(),
            mime_type: settings.mime_type.clone(),
        })
    }

    /// Send `artifact` as one multipart transfer. No retry.
    ///
    /// Returns the JSON object the server answered with, or an empty map when
    /// a successful response has no JSON object body.
    #[instrument(skip(self, artifact), fields(artifact = artifact.name(), bytes = artifact.len()))]
    pub(crate) async fn upload(
        &self,
        destination: &str,
        artifact: &Artifact,
    ) -> CoreResult<Map<String, Value>> {
        let url = upload_url(destination);

        let part = Part::bytes(artifact.payload().to_vec())
            .file_name(artifact.name().to_string())
            .mime_str(&self.mime_type)
            .map_err(|e| CaptureError::TransferFailed {
                reason: format!("Invalid MIME type {}: {}", self.mime_type, e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CaptureError::TransferFailed {
                reason: format!("Request to {} failed: {}", url, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptureError::TransferFailed {
                reason: format!("Server returned {}", status),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        // The artifact is stored once the status is a success; the body is
        // optional metadata.
        let metadata = match response.bytes().await {
            Ok(body) => match serde_json::from_slice::<Value>(&body) {
                Ok(Value::Object(metadata)) => metadata,
                _ => {
                    debug!(bytes = body.len(), "Upload response carried no JSON object");
                    Map::new()
                }
            },
            Err(e) => {
                warn!(error = ?e, "Failed to read upload response body");
                Map::new()
            }
        };

        info!(url = %url, status = %status, "Artifact uploaded");

        Ok(metadata)
    }
}

/// Write `artifact` into `spool_dir` and return a `file://` reference to it.
#[instrument(skip(artifact), fields(artifact = artifact.name()))]
pub(crate) async fn spool(spool_dir: &Path, artifact: &Artifact) -> CoreResult<String> {
    tokio::fs::create_dir_all(spool_dir)
        .await
        .map_err(|source| CaptureError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;
    let spool_dir = tokio::fs::canonicalize(spool_dir)
        .await
        .map_err(|source| CaptureError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

    let path = spool_dir.join(artifact.name());
    tokio::fs::write(&path, artifact.payload())
        .await
        .map_err(|source| CaptureError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

    let local_ref = Url::from_file_path(&path).map_err(|()| CaptureError::Io {
        source: std::io::Error::other(format!("{:?} is not an absolute path", path)),
        location: ErrorLocation::from(Location::caller()),
    })?;

    debug!(local_ref = %local_ref, "Artifact spooled");

    Ok(local_ref.to_string())
}

/// Turn a `file://` reference from a fallback event back into a path.
///
/// # Errors
///
/// Returns [`CaptureError::Io`] if `local_ref` is not a file URL.
#[track_caller]
pub fn resolve_local_ref(local_ref: &str) -> CoreResult<PathBuf> {
    Url::parse(local_ref)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .ok_or_else(|| CaptureError::Io {
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a local file reference: {}", local_ref),
            ),
            location: ErrorLocation::from(Location::caller()),
        })
}
