use std::{path::PathBuf, time::Duration};

/// Interval between buffered chunks.
pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_secs(1);

/// Upper bound on a single upload transfer.
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Capture worker settings, fixed for the lifetime of a coordinator.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// How often the device is drained into the chunk buffer.
    pub chunk_interval: Duration,
    /// Container extension used in synthesized filenames (without the dot).
    pub extension: String,
    /// MIME type sent with the multipart upload.
    pub mime_type: String,
    /// Multipart field the backend reads the artifact from.
    pub field_name: String,
    /// Timeout applied to the upload request.
    pub upload_timeout: Duration,
    /// Directory where artifacts are spooled when the upload fails.
    pub spool_dir: PathBuf,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            chunk_interval: DEFAULT_CHUNK_INTERVAL,
            extension: "webm".to_string(),
            mime_type: "video/webm".to_string(),
            field_name: "video".to_string(),
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            spool_dir: std::env::temp_dir().join("feed-recorder-spool"),
        }
    }
}
