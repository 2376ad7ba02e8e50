//! Cross-context message contract.
//!
//! Each context owns a typed mailbox: the coordinator receives only
//! [`CoordinatorRequest`], the capture worker receives only [`WorkerRequest`].
//! Every request carries a `oneshot` sender for its statically typed reply.
//! The only one-way message is [`WorkerEvent`], published on a broadcast
//! channel with best-effort delivery.

use crate::{CaptureError, ErrorKind};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::oneshot;

/// Opaque identifier of a capture target (e.g. a tab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Wrap a target identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a stream source bound to a target, handed to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamSourceId(String);

impl StreamSourceId {
    /// Wrap a stream-source identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reply to `getStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether a session is active.
    pub is_recording: bool,
    /// Whole seconds since the session started, 0 when idle.
    pub elapsed: u64,
}

impl StatusResponse {
    /// Status of an idle coordinator.
    pub const IDLE: StatusResponse = StatusResponse {
        is_recording: false,
        elapsed: 0,
    };
}

/// Reply to `startRecording` and `startCapture`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// Whether the command succeeded.
    pub success: bool,
    /// Human-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable failure kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl CommandResponse {
    /// Successful reply.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            kind: None,
        }
    }

    /// Failed reply describing `err`.
    pub fn failed(err: &CaptureError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }
}

/// Reply to `stopRecording` and `stopCapture`.
///
/// On a successful upload, whatever the server returned is flattened into
/// `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    /// Whether the artifact reached the destination.
    pub success: bool,
    /// Human-readable failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable failure kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Set when the upload failed but the artifact was handed to the local
    /// fallback.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub saved_locally: bool,
    /// Artifact filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Opaque server metadata.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl StopResponse {
    /// Upload succeeded. A `filename` in the server metadata takes
    /// precedence over the synthesized one.
    pub fn uploaded(filename: String, mut metadata: Map<String, Value>) -> Self {
        metadata.remove("success");
        let filename = match metadata.remove("filename") {
            Some(Value::String(server_name)) => server_name,
            _ => filename,
        };

        Self {
            success: true,
            error: None,
            kind: None,
            saved_locally: false,
            filename: Some(filename),
            metadata,
        }
    }

    /// Upload failed but the artifact was spooled for a local save.
    pub fn saved_locally(err: &CaptureError, filename: String) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
            saved_locally: true,
            filename: Some(filename),
            metadata: Map::new(),
        }
    }

    /// Failed reply describing `err`; nothing was saved.
    pub fn failed(err: &CaptureError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
            saved_locally: false,
            filename: None,
            metadata: Map::new(),
        }
    }
}

/// Requests handled by the session coordinator.
#[derive(Debug)]
pub enum CoordinatorRequest {
    /// Query the current session status.
    GetStatus {
        /// Reply channel.
        reply: oneshot::Sender<StatusResponse>,
    },
    /// Begin an exclusive session on `target_id`.
    StartRecording {
        /// Target to capture.
        target_id: TargetId,
        /// Reply channel.
        reply: oneshot::Sender<CommandResponse>,
    },
    /// End the active session and upload its artifact to `destination`.
    StopRecording {
        /// Upload endpoint base address.
        destination: String,
        /// Reply channel.
        reply: oneshot::Sender<StopResponse>,
    },
}

/// Requests handled by the capture worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Open the device bound to `stream_source_id` and start buffering.
    StartCapture {
        /// Stream source acquired by the coordinator.
        stream_source_id: StreamSourceId,
        /// Reply channel.
        reply: oneshot::Sender<CommandResponse>,
    },
    /// Finalize the capture and upload the artifact to `destination`.
    StopCapture {
        /// Upload endpoint base address.
        destination: String,
        /// Reply channel.
        reply: oneshot::Sender<StopResponse>,
    },
}

/// One-way notifications published by the capture worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum WorkerEvent {
    /// Upload failed; the artifact is reachable at `local_ref` and should be
    /// saved as `filename`.
    #[serde(rename_all = "camelCase")]
    DownloadFallback {
        /// Locally addressable reference (a `file://` URL).
        local_ref: String,
        /// Suggested filename for the saved artifact.
        filename: String,
    },
}
