use crate::{
    Artifact, CaptureError, CaptureSettings, CommandResponse, CoreResult, StopResponse,
    StreamSourceId, WorkerEvent, WorkerRequest,
    capture::{CaptureHandle, CaptureHost, CaptureState, artifact_filename},
    upload::{Uploader, spool},
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

const WORKER_MAILBOX_CAPACITY: usize = 8;

/// How long teardown waits for the worker task to drain.
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Execution context of the capture worker: a task plus its mailbox.
pub(crate) struct WorkerContext {
    tx: mpsc::Sender<WorkerRequest>,
    task: JoinHandle<()>,
}

impl WorkerContext {
    /// Spawn a fresh worker task.
    #[track_caller]
    pub(crate) fn spawn(
        host: Arc<dyn CaptureHost>,
        settings: CaptureSettings,
        events: broadcast::Sender<WorkerEvent>,
    ) -> CoreResult<Self> {
        let uploader = Uploader::new(&settings)?;
        let (tx, rx) = mpsc::channel(WORKER_MAILBOX_CAPACITY);

        let worker = CaptureWorker {
            host,
            settings,
            uploader,
            events,
            capture: CaptureHandle::new(),
        };
        let task = tokio::spawn(worker.run(rx));

        info!("Capture worker context created");

        Ok(Self { tx, task })
    }

    /// Delegate `startCapture` and await the worker's reply.
    pub(crate) async fn start_capture(
        &self,
        stream_source_id: StreamSourceId,
    ) -> CoreResult<CommandResponse> {
        let (reply, rx) = oneshot::channel();
        self.send(WorkerRequest::StartCapture {
            stream_source_id,
            reply,
        })
        .await?;

        rx.await.map_err(|e| CaptureError::ChannelClosed {
            message: format!("Worker dropped startCapture reply: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Delegate `stopCapture` and await the worker's reply.
    pub(crate) async fn stop_capture(&self, destination: String) -> CoreResult<StopResponse> {
        let (reply, rx) = oneshot::channel();
        self.send(WorkerRequest::StopCapture { destination, reply })
            .await?;

        rx.await.map_err(|e| CaptureError::ChannelClosed {
            message: format!("Worker dropped stopCapture reply: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Close the mailbox and wait briefly for the task to finish.
    pub(crate) async fn shutdown(self) {
        drop(self.tx);

        match tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, self.task).await {
            Ok(Ok(())) => info!("Capture worker context destroyed"),
            Ok(Err(e)) => error!(error = ?e, "Capture worker task panicked"),
            Err(_) => warn!(
                "Capture worker did not stop within timeout, \
                 will finish after its current request"
            ),
        }
    }

    async fn send(&self, request: WorkerRequest) -> CoreResult<()> {
        self.tx
            .send(request)
            .await
            .map_err(|e| CaptureError::ChannelClosed {
                message: format!("Capture worker mailbox closed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Owns the capture handle. Knows nothing about sessions.
struct CaptureWorker {
    host: Arc<dyn CaptureHost>,
    settings: CaptureSettings,
    uploader: Uploader,
    events: broadcast::Sender<WorkerEvent>,
    capture: CaptureHandle,
}

impl CaptureWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<WorkerRequest>) {
        while let Some(request) = rx.recv().await {
            match request {
                WorkerRequest::StartCapture {
                    stream_source_id,
                    reply,
                } => {
                    let response = match self.start_capture(&stream_source_id) {
                        Ok(()) => CommandResponse::ok(),
                        Err(e) => {
                            warn!(error = ?e, "startCapture failed");
                            CommandResponse::failed(&e)
                        }
                    };
                    let _ = reply.send(response);
                }
                WorkerRequest::StopCapture { destination, reply } => {
                    let response = self.stop_capture(&destination).await;
                    let _ = reply.send(response);
                }
            }
        }

        if self.capture.state() != CaptureState::Idle {
            warn!("Capture worker torn down mid-capture, discarding buffer");
        }
        debug!("Capture worker mailbox closed");
    }

    #[instrument(skip(self))]
    fn start_capture(&mut self, stream_source_id: &StreamSourceId) -> CoreResult<()> {
        self.capture.start(
            self.host.as_ref(),
            stream_source_id,
            self.settings.chunk_interval,
        )
    }

    #[instrument(skip(self))]
    async fn stop_capture(&mut self, destination: &str) -> StopResponse {
        let name = artifact_filename(&self.settings.extension);
        match self.capture.stop(name).await {
            Ok(artifact) => self.deliver(destination, artifact).await,
            Err(e) => {
                warn!(error = ?e, "stopCapture failed");
                StopResponse::failed(&e)
            }
        }
    }

    /// Upload once; on any failure spool locally and publish a fallback
    /// event without waiting for it to be handled.
    async fn deliver(&self, destination: &str, artifact: Artifact) -> StopResponse {
        let upload_err = match self.uploader.upload(destination, &artifact).await {
            Ok(metadata) => {
                return StopResponse::uploaded(artifact.name().to_string(), metadata);
            }
            Err(e) => e,
        };

        warn!(error = ?upload_err, "Upload failed, falling back to local save");

        match spool(&self.settings.spool_dir, &artifact).await {
            Ok(local_ref) => {
                let filename = artifact.name().to_string();
                let event = WorkerEvent::DownloadFallback {
                    local_ref,
                    filename: filename.clone(),
                };
                if self.events.send(event).is_err() {
                    warn!(filename = %filename, "No subscriber for fallback save");
                }
                StopResponse::saved_locally(&upload_err, filename)
            }
            Err(spool_err) => {
                error!(error = ?spool_err, "Local fallback failed, artifact lost");
                StopResponse::failed(&upload_err)
            }
        }
    }
}
