use crate::{
    ErrorKind, StreamSourceId,
    capture::WorkerContext,
    tests::support::{ScriptedHost, spawn_backend, test_settings},
};

use std::sync::Arc;

use axum::http::StatusCode;
use tokio::sync::broadcast;

/// WHAT: stopCapture on an idle worker reports NotCapturing without saving
/// WHY: There is no artifact to upload or fall back to
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_idle_worker_when_stop_capture_then_not_capturing() {
    // Given: A fresh worker context
    let spool = tempfile::tempdir().unwrap();
    let (events, _) = broadcast::channel(4);
    let worker = WorkerContext::spawn(
        Arc::new(ScriptedHost::new(Vec::new())),
        test_settings(spool.path()),
        events,
    )
    .unwrap();

    // When: Stopping without a capture
    let response = worker
        .stop_capture("http://127.0.0.1:9".to_string())
        .await
        .unwrap();

    // Then: Failed with NotCapturing, nothing saved
    assert!(!response.success);
    assert_eq!(response.kind, Some(ErrorKind::NotCapturing));
    assert!(!response.saved_locally);
    worker.shutdown().await;
}

/// WHAT: startCapture surfaces the device failure reason
/// WHY: The coordinator passes the worker's error through to the user
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unavailable_device_when_start_capture_then_device_unavailable_with_reason() {
    // Given: A worker whose host cannot open devices
    let spool = tempfile::tempdir().unwrap();
    let (events, _) = broadcast::channel(4);
    let worker = WorkerContext::spawn(
        Arc::new(ScriptedHost::failing_open("no video track")),
        test_settings(spool.path()),
        events,
    )
    .unwrap();

    // When: Starting capture
    let response = worker
        .start_capture(StreamSourceId::new("stream:tab1"))
        .await
        .unwrap();

    // Then: Failed with DeviceUnavailable carrying the reason
    assert!(!response.success);
    assert_eq!(response.kind, Some(ErrorKind::DeviceUnavailable));
    assert!(response.error.unwrap().contains("no video track"));
    worker.shutdown().await;
}

/// WHAT: A full start/stop round trip uploads the artifact
/// WHY: The worker alone owns capture, assembly and upload
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_capturing_worker_when_stop_capture_then_artifact_uploaded() {
    // Given: A capturing worker and a healthy backend
    let backend = spawn_backend(StatusCode::OK).await;
    let spool = tempfile::tempdir().unwrap();
    let (events, _) = broadcast::channel(4);
    let host = Arc::new(ScriptedHost::new(vec![b"ab".to_vec(), b"cd".to_vec()]));
    let worker = WorkerContext::spawn(host.clone(), test_settings(spool.path()), events).unwrap();
    let started = worker
        .start_capture(StreamSourceId::new("stream:tab1"))
        .await
        .unwrap();
    assert!(started.success);

    // When: Stopping with the backend as destination (trailing slash included)
    let response = worker
        .stop_capture(format!("{}/", backend.url))
        .await
        .unwrap();

    // Then: Upload succeeded with the captured bytes
    assert!(response.success);
    let uploads = backend.uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].field, "video");
    assert_eq!(uploads[0].bytes, b"abcd");
    assert_eq!(uploads[0].file_name, response.filename);
    assert_eq!(host.released(), 1);
    worker.shutdown().await;
}
