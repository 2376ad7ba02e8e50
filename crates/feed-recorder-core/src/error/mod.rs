use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture and session errors with source location tracking.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// A session already holds the capture resource.
    #[error("Recording already in progress: {reason} {location}")]
    AlreadyActive {
        /// What currently holds the session.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No session is active.
    #[error("No recording in progress {location}")]
    NotActive {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture device could not be acquired or opened.
    #[error("Capture device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The worker was asked to stop while not capturing.
    #[error("Capture worker is not capturing {location}")]
    NotCapturing {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The upload transfer failed (transport fault or non-success status).
    #[error("Upload failed: {reason} {location}")]
    TransferFailed {
        /// Description of the transfer failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The control surface found no valid target to record.
    #[error("No capture target selected {location}")]
    NoActiveTarget {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A context's mailbox was closed before the request was answered.
    #[error("Channel closed: {message} {location}")]
    ChannelClosed {
        /// Human-readable error message.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Local filesystem operation failed.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CaptureError {
    /// Machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::AlreadyActive { .. } => ErrorKind::AlreadyActive,
            CaptureError::NotActive { .. } => ErrorKind::NotActive,
            CaptureError::DeviceUnavailable { .. } => ErrorKind::DeviceUnavailable,
            CaptureError::NotCapturing { .. } => ErrorKind::NotCapturing,
            CaptureError::TransferFailed { .. } => ErrorKind::TransferFailed,
            CaptureError::NoActiveTarget { .. } => ErrorKind::NoActiveTarget,
            CaptureError::ChannelClosed { .. } => ErrorKind::ChannelClosed,
            CaptureError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Error kinds carried in protocol responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`CaptureError::AlreadyActive`].
    AlreadyActive,
    /// See [`CaptureError::NotActive`].
    NotActive,
    /// See [`CaptureError::DeviceUnavailable`].
    DeviceUnavailable,
    /// See [`CaptureError::NotCapturing`].
    NotCapturing,
    /// See [`CaptureError::TransferFailed`].
    TransferFailed,
    /// See [`CaptureError::NoActiveTarget`].
    NoActiveTarget,
    /// See [`CaptureError::ChannelClosed`].
    ChannelClosed,
    /// See [`CaptureError::Io`].
    Io,
}

/// Result type alias using [`CaptureError`].
pub type Result<T> = std::result::Result<T, CaptureError>;
