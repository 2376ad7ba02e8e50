//! Session coordinator: the single owner of session state.
//!
//! Runs as a task behind a typed mailbox. Status queries are answered inline
//! from the published [`Session`]; start and stop run as their own tasks so
//! the mailbox stays responsive while a worker round trip is outstanding.
//! The session is only republished once a round trip resolves, so a status
//! query issued mid-transition sees the pre-transition state.

use crate::{
    CaptureError, CaptureHost, CaptureSettings, Clock, CommandResponse, CoordinatorRequest,
    CoreResult, IndicatorState, Session, StatusResponse, StopResponse, TargetId, WorkerEvent,
    capture::WorkerContext,
    coordinator::WorkerSlot,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot, watch};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const COORDINATOR_MAILBOX_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Process-wide session coordinator.
///
/// Construct with [`Coordinator::new`], then [`Coordinator::spawn`] it and
/// talk to it through the returned [`CoordinatorHandle`].
pub struct Coordinator {
    session: watch::Sender<Session>,
    indicator: watch::Sender<IndicatorState>,
    /// Held for the full duration of a start or stop. Owns the worker
    /// context so only a transition can create or destroy it.
    transition: Mutex<WorkerSlot>,
    host: Arc<dyn CaptureHost>,
    clock: Arc<dyn Clock>,
    settings: CaptureSettings,
    events: broadcast::Sender<WorkerEvent>,
}

impl Coordinator {
    /// Create an idle coordinator.
    pub fn new(
        host: Arc<dyn CaptureHost>,
        clock: Arc<dyn Clock>,
        settings: CaptureSettings,
    ) -> Self {
        let (session, _) = watch::channel(Session::Idle);
        let (indicator, _) = watch::channel(IndicatorState::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            session,
            indicator,
            transition: Mutex::new(WorkerSlot::default()),
            host,
            clock,
            settings,
            events,
        }
    }

    /// Start the coordinator task.
    ///
    /// The task exits, tearing down any worker context, once every handle
    /// has been dropped.
    pub fn spawn(self) -> CoordinatorHandle {
        let (tx, rx) = mpsc::channel(COORDINATOR_MAILBOX_CAPACITY);

        let handle = CoordinatorHandle {
            tx,
            session: self.session.subscribe(),
            indicator: self.indicator.subscribe(),
            events: self.events.clone(),
        };

        tokio::spawn(Arc::new(self).run(rx));

        handle
    }

    async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<CoordinatorRequest>) {
        info!("Coordinator started");

        while let Some(request) = rx.recv().await {
            match request {
                CoordinatorRequest::GetStatus { reply } => {
                    let _ = reply.send(self.status());
                }
                CoordinatorRequest::StartRecording { target_id, reply } => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _ = reply.send(this.start_recording(target_id).await);
                    });
                }
                CoordinatorRequest::StopRecording { destination, reply } => {
                    let this = Arc::clone(&self);
                    tokio::spawn(async move {
                        let _ = reply.send(this.stop_recording(destination).await);
                    });
                }
            }
        }

        self.transition.lock().await.teardown().await;
        info!("Coordinator stopped");
    }

    fn status(&self) -> StatusResponse {
        self.session.borrow().status(self.clock.now())
    }

    #[instrument(skip(self), fields(target_id = %target_id))]
    async fn start_recording(&self, target_id: TargetId) -> CommandResponse {
        match self.try_start(target_id).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = ?e, "startRecording failed");
                CommandResponse::failed(&e)
            }
        }
    }

    async fn try_start(&self, target_id: TargetId) -> CoreResult<CommandResponse> {
        let Ok(mut slot) = self.transition.try_lock() else {
            return Err(CaptureError::AlreadyActive {
                reason: "another recording command is in flight".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let active = self.session.borrow().target_id().cloned();
        if let Some(active) = active {
            return Err(CaptureError::AlreadyActive {
                reason: format!("target {} is being recorded", active),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let stream_source_id = self.host.acquire_stream_source(&target_id)?;

        let worker = slot.ensure(|| {
            WorkerContext::spawn(
                Arc::clone(&self.host),
                self.settings.clone(),
                self.events.clone(),
            )
        })?;

        let response = match worker.start_capture(stream_source_id).await {
            Ok(response) => response,
            Err(e) => {
                // Mailbox is gone; drop the dead context so the next start
                // creates a fresh one.
                slot.teardown().await;
                return Err(e);
            }
        };

        if !response.success {
            return Ok(response);
        }

        let session_id = Uuid::new_v4();
        self.session.send_replace(Session::Recording {
            target_id,
            started_at: self.clock.now(),
            session_id,
        });
        self.indicator.send_replace(IndicatorState::Recording);

        info!(session_id = %session_id, "Recording started");

        Ok(response)
    }

    #[instrument(skip(self))]
    async fn stop_recording(&self, destination: String) -> StopResponse {
        let Ok(mut slot) = self.transition.try_lock() else {
            let e = CaptureError::NotActive {
                location: ErrorLocation::from(Location::caller()),
            };
            warn!(error = ?e, "stopRecording rejected, transition in flight");
            return StopResponse::failed(&e);
        };

        let session_id = self.session.borrow().session_id();
        let Some(session_id) = session_id else {
            let e = CaptureError::NotActive {
                location: ErrorLocation::from(Location::caller()),
            };
            warn!(error = ?e, "stopRecording rejected");
            return StopResponse::failed(&e);
        };

        let response = match slot.get() {
            Some(worker) => match worker.stop_capture(destination).await {
                Ok(response) => response,
                Err(e) => StopResponse::failed(&e),
            },
            None => StopResponse::failed(&CaptureError::NotCapturing {
                location: ErrorLocation::from(Location::caller()),
            }),
        };

        // Cleanup regardless of the worker's outcome.
        self.session.send_replace(Session::Idle);
        self.indicator.send_replace(IndicatorState::Idle);
        slot.teardown().await;

        info!(
            session_id = %session_id,
            success = response.success,
            saved_locally = response.saved_locally,
            "Recording stopped"
        );

        response
    }
}

/// Cloneable client of a running [`Coordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<CoordinatorRequest>,
    session: watch::Receiver<Session>,
    indicator: watch::Receiver<IndicatorState>,
    events: broadcast::Sender<WorkerEvent>,
}

impl CoordinatorHandle {
    /// `getStatus`: whether a session is active and for how many seconds.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::ChannelClosed`] if the coordinator task is gone.
    pub async fn get_status(&self) -> CoreResult<StatusResponse> {
        self.request("getStatus", |reply| CoordinatorRequest::GetStatus { reply })
            .await
    }

    /// `startRecording`: begin an exclusive session on `target_id`.
    ///
    /// Command failures are reported inside the response, not as `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::ChannelClosed`] if the coordinator task is gone.
    pub async fn start_recording(&self, target_id: TargetId) -> CoreResult<CommandResponse> {
        self.request("startRecording", |reply| {
            CoordinatorRequest::StartRecording { target_id, reply }
        })
        .await
    }

    /// `stopRecording`: end the session and upload to `destination`.
    ///
    /// The session is idle afterwards whatever the upload outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::ChannelClosed`] if the coordinator task is gone.
    pub async fn stop_recording(
        &self,
        destination: impl Into<String>,
    ) -> CoreResult<StopResponse> {
        let destination = destination.into();
        self.request("stopRecording", |reply| CoordinatorRequest::StopRecording {
            destination,
            reply,
        })
        .await
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Watch the recording indicator.
    pub fn indicator(&self) -> watch::Receiver<IndicatorState> {
        self.indicator.clone()
    }

    /// Subscribe to worker notifications such as fallback saves.
    ///
    /// Delivery is best-effort: events published while nobody is subscribed,
    /// or that overflow a lagging receiver, are lost.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkerEvent> {
        self.events.subscribe()
    }

    async fn request<T>(
        &self,
        verb: &str,
        build: impl FnOnce(oneshot::Sender<T>) -> CoordinatorRequest,
    ) -> CoreResult<T> {
        let (reply, rx) = oneshot::channel();

        self.tx
            .send(build(reply))
            .await
            .map_err(|e| CaptureError::ChannelClosed {
                message: format!("Failed to send {}: {}", verb, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        rx.await.map_err(|e| CaptureError::ChannelClosed {
            message: format!("Coordinator dropped {} reply: {}", verb, e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
