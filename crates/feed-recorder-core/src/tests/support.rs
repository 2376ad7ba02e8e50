//! Scripted capture host and mock upload backend shared by the tests.

#![allow(clippy::unwrap_used)]

use crate::{
    CaptureDevice, CaptureError, CaptureHost, CaptureSettings, CoreResult, StreamSourceId,
    TargetId,
};

use std::{
    collections::VecDeque,
    panic::Location,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
};
use error_location::ErrorLocation;
use serde_json::{Value, json};
use tokio::sync::{Mutex, Notify};

pub(crate) const TEST_CHUNK_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) fn test_settings(spool_dir: &Path) -> CaptureSettings {
    CaptureSettings {
        chunk_interval: TEST_CHUNK_INTERVAL,
        upload_timeout: Duration::from_secs(5),
        spool_dir: spool_dir.to_path_buf(),
        ..CaptureSettings::default()
    }
}

/// Host whose devices replay a fixed list of chunks.
pub(crate) struct ScriptedHost {
    chunks: Vec<Vec<u8>>,
    fail_acquire: Option<String>,
    fail_open: Option<String>,
    opened: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl ScriptedHost {
    pub(crate) fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks,
            fail_acquire: None,
            fail_open: None,
            opened: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing_acquire(reason: &str) -> Self {
        Self {
            fail_acquire: Some(reason.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn failing_open(reason: &str) -> Self {
        Self {
            fail_open: Some(reason.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl CaptureHost for ScriptedHost {
    fn acquire_stream_source(&self, target: &TargetId) -> CoreResult<StreamSourceId> {
        match &self.fail_acquire {
            Some(reason) => Err(CaptureError::DeviceUnavailable {
                reason: reason.clone(),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Ok(StreamSourceId::new(format!("stream:{}", target))),
        }
    }

    fn open(&self, _source: &StreamSourceId) -> CoreResult<Box<dyn CaptureDevice>> {
        if let Some(reason) = &self.fail_open {
            return Err(CaptureError::DeviceUnavailable {
                reason: reason.clone(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedDevice {
            pending: self.chunks.iter().cloned().collect(),
            released: Arc::clone(&self.released),
        }))
    }
}

/// Yields one chunk per tick; `finalize` flushes whatever is left.
struct ScriptedDevice {
    pending: VecDeque<Vec<u8>>,
    released: Arc<AtomicUsize>,
}

impl CaptureDevice for ScriptedDevice {
    fn read_chunk(&mut self) -> CoreResult<Option<Vec<u8>>> {
        Ok(self.pending.pop_front())
    }

    fn finalize(&mut self) -> CoreResult<Option<Vec<u8>>> {
        let rest: Vec<u8> = self.pending.drain(..).flatten().collect();
        Ok((!rest.is_empty()).then_some(rest))
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// One multipart field received by the mock backend.
#[derive(Debug, Clone)]
pub(crate) struct ReceivedUpload {
    pub(crate) field: String,
    pub(crate) file_name: Option<String>,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Clone)]
struct BackendState {
    status: StatusCode,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    arrived: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

/// In-process stand-in for the `/upload` endpoint.
pub(crate) struct MockBackend {
    pub(crate) url: String,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    /// Notified when an upload request reaches the handler.
    pub(crate) arrived: Arc<Notify>,
    /// When gated, the handler waits on this before answering.
    pub(crate) gate: Arc<Notify>,
}

impl MockBackend {
    pub(crate) async fn uploads(&self) -> Vec<ReceivedUpload> {
        self.uploads.lock().await.clone()
    }
}

/// Backend answering every upload with `status`.
pub(crate) async fn spawn_backend(status: StatusCode) -> MockBackend {
    start_backend(status, false).await
}

/// Backend that holds each upload until `gate` is notified.
pub(crate) async fn spawn_gated_backend(status: StatusCode) -> MockBackend {
    start_backend(status, true).await
}

async fn start_backend(status: StatusCode, gated: bool) -> MockBackend {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let arrived = Arc::new(Notify::new());
    let gate = Arc::new(Notify::new());

    let state = BackendState {
        status,
        uploads: Arc::clone(&uploads),
        arrived: Arc::clone(&arrived),
        gate: gated.then(|| Arc::clone(&gate)),
    };

    let app = Router::new()
        .route("/upload", post(receive_upload))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        url: format!("http://{}", addr),
        uploads,
        arrived,
        gate,
    }
}

async fn receive_upload(
    State(state): State<BackendState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    state.arrived.notify_one();
    if let Some(gate) = &state.gate {
        gate.notified().await;
    }

    let mut file_name = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let field_file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();

        file_name = field_file_name.clone();
        state.uploads.lock().await.push(ReceivedUpload {
            field: name,
            file_name: field_file_name,
            bytes,
        });
    }

    if state.status.is_success() {
        (
            state.status,
            Json(json!({
                "status": "uploaded",
                "filename": file_name,
                "recording_id": 1,
            })),
        )
    } else {
        (state.status, Json(json!({ "detail": "upload rejected" })))
    }
}

/// Address with nothing listening on it.
pub(crate) async fn unreachable_destination() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Poll `check` until it holds or a second passes.
pub(crate) async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
