//! Feed-recorder Core Library
//!
//! Coordinates one exclusive capture session across three message-passing
//! contexts: a control surface, the session [`Coordinator`], and a capture
//! worker that buffers device output, uploads the finished [`Artifact`] and
//! falls back to a local save when the upload fails.
//!
//! # Example
//!
//! ```no_run
//! use feed_recorder_core::{
//!     CaptureSettings, Coordinator, CoreResult, FileCaptureHost, SystemClock, TargetId,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let host = Arc::new(FileCaptureHost::new("/tmp/feeds"));
//!     let coordinator =
//!         Coordinator::new(host, Arc::new(SystemClock), CaptureSettings::default()).spawn();
//!
//!     coordinator.start_recording(TargetId::new("tab1.webm")).await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     let result = coordinator.stop_recording("http://localhost:8000").await?;
//!
//!     println!("Uploaded: {}", result.success);
//!     Ok(())
//! }
//! ```

mod capture;
mod clock;
mod coordinator;
mod error;
mod protocol;
mod upload;

pub use {
    capture::{
        Artifact, CaptureDevice, CaptureHost, CaptureSettings, CaptureState,
        DEFAULT_CHUNK_INTERVAL, DEFAULT_UPLOAD_TIMEOUT, FileCaptureHost, artifact_filename,
    },
    clock::{Clock, ManualClock, SystemClock},
    coordinator::{Coordinator, CoordinatorHandle, IndicatorState, Session},
    error::{CaptureError, ErrorKind, Result as CoreResult},
    protocol::{
        CommandResponse, CoordinatorRequest, StatusResponse, StopResponse, StreamSourceId,
        TargetId, WorkerEvent, WorkerRequest,
    },
    upload::{resolve_local_ref, upload_url},
};

#[cfg(test)]
mod tests;
