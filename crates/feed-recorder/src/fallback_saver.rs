//! Moves artifacts from failed uploads into the download directory.

use crate::{AppError, AppResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use feed_recorder_core::{WorkerEvent, resolve_local_ref};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, instrument, warn};

/// Saves spooled fallback artifacts under their suggested filename.
#[derive(Debug, Clone)]
pub struct FallbackSaver {
    download_dir: PathBuf,
}

impl FallbackSaver {
    /// Create a saver writing into `download_dir`.
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    /// Handle fallback events until every publisher is gone.
    #[instrument(skip(self, events), fields(download_dir = ?self.download_dir))]
    pub async fn run(self, mut events: broadcast::Receiver<WorkerEvent>) {
        loop {
            match events.recv().await {
                Ok(WorkerEvent::DownloadFallback {
                    local_ref,
                    filename,
                }) => match self.save(&local_ref, &filename).await {
                    Ok(path) => info!(path = ?path, "Recording saved locally"),
                    Err(e) => error!(local_ref = %local_ref, error = ?e, "Failed to save recording locally"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Fallback saver lagged, events dropped");
                }
                Err(RecvError::Closed) => {
                    debug!("Fallback event channel closed");
                    break;
                }
            }
        }
    }

    /// Move the artifact at `local_ref` to `download_dir/filename`.
    ///
    /// Falls back to copy-then-remove when a rename crosses filesystems.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is not a local file, the filename has
    /// no final component, or the move fails.
    pub async fn save(&self, local_ref: &str, filename: &str) -> AppResult<PathBuf> {
        let source = resolve_local_ref(local_ref)?;

        let Some(name) = Path::new(filename).file_name() else {
            return Err(AppError::IoError {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Fallback filename {:?} has no file name", filename),
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        };
        let target = self.download_dir.join(name);

        tokio::fs::create_dir_all(&self.download_dir).await?;

        if tokio::fs::rename(&source, &target).await.is_err() {
            tokio::fs::copy(&source, &target).await?;
            if let Err(e) = tokio::fs::remove_file(&source).await {
                warn!(source = ?source, error = ?e, "Failed to remove spooled artifact");
            }
        }

        Ok(target)
    }
}
