//! File-backed capture host.
//!
//! A target names a media file inside a sources directory, typically one an
//! external encoder is still writing. The device reads whatever bytes were
//! appended since the previous tick. Targets that resolve outside the
//! sources directory are rejected.

use crate::{
    CaptureError, CoreResult, StreamSourceId, TargetId,
    capture::{CaptureDevice, CaptureHost},
};

use std::{
    fs::File,
    io::Read,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Resolves targets to files under `sources_dir`.
#[derive(Debug, Clone)]
pub struct FileCaptureHost {
    sources_dir: PathBuf,
}

impl FileCaptureHost {
    /// Create a host rooted at `sources_dir`.
    pub fn new(sources_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources_dir: sources_dir.into(),
        }
    }

    /// Directory targets are resolved against.
    pub fn sources_dir(&self) -> &Path {
        &self.sources_dir
    }
}

impl CaptureHost for FileCaptureHost {
    #[track_caller]
    #[instrument(skip(self))]
    fn acquire_stream_source(&self, target: &TargetId) -> CoreResult<StreamSourceId> {
        let sources_dir = self
            .sources_dir
            .canonicalize()
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: format!("Sources directory {:?} unavailable: {}", self.sources_dir, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let path = sources_dir
            .join(target.as_str())
            .canonicalize()
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: format!("No stream source for target {}: {}", target, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        // Absolute targets, `..` and symlinks must still land inside the
        // sources directory.
        if !path.starts_with(&sources_dir) {
            return Err(CaptureError::DeviceUnavailable {
                reason: format!("Target {} is outside the sources directory", target),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !path.is_file() {
            return Err(CaptureError::DeviceUnavailable {
                reason: format!("Stream source {:?} is not a file", path),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        debug!(path = ?path, "Stream source acquired");

        Ok(StreamSourceId::new(path.to_string_lossy()))
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn open(&self, source: &StreamSourceId) -> CoreResult<Box<dyn CaptureDevice>> {
        let path = PathBuf::from(source.as_str());
        let file = File::open(&path).map_err(|e| CaptureError::DeviceUnavailable {
            reason: format!("Failed to open {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(path = ?path, "File capture device opened");

        Ok(Box::new(FileDevice {
            path,
            file: Some(file),
        }))
    }
}

struct FileDevice {
    path: PathBuf,
    file: Option<File>,
}

impl FileDevice {
    #[track_caller]
    fn drain(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        let mut chunk = Vec::new();
        file.read_to_end(&mut chunk)
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: format!("Failed to read {:?}: {}", self.path, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok((!chunk.is_empty()).then_some(chunk))
    }
}

impl CaptureDevice for FileDevice {
    fn read_chunk(&mut self) -> CoreResult<Option<Vec<u8>>> {
        self.drain()
    }

    fn finalize(&mut self) -> CoreResult<Option<Vec<u8>>> {
        self.drain()
    }

    fn release(&mut self) {
        if self.file.take().is_some() {
            debug!(path = ?self.path, "File capture device closed");
        }
    }
}
