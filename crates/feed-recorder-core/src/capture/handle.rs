use crate::{
    Artifact, CaptureError, CoreResult, StreamSourceId,
    capture::{CaptureHost, device::DeviceGuard},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex},
    time::Duration,
};

use error_location::ErrorLocation;
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle of a [`CaptureHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No device open.
    Idle,
    /// Device open, chunks being buffered.
    Capturing,
    /// Stop requested, waiting for the last chunk.
    Finalizing,
}

type ChunkBuffer = Arc<Mutex<Vec<Vec<u8>>>>;

/// Shortest interval the pump will tick at.
const MIN_CHUNK_INTERVAL: Duration = Duration::from_millis(1);

/// Device plus chunk buffer for one capture.
///
/// The device is moved into a pump task that drains it once per interval.
/// Dropping the handle closes the stop channel, which makes the pump
/// finalize and release the device.
pub(crate) struct CaptureHandle {
    state: CaptureState,
    chunks: ChunkBuffer,
    stop_tx: Option<oneshot::Sender<()>>,
    pump: Option<JoinHandle<()>>,
}

impl CaptureHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            chunks: Arc::new(Mutex::new(Vec::new())),
            stop_tx: None,
            pump: None,
        }
    }

    pub(crate) fn state(&self) -> CaptureState {
        self.state
    }

    /// Open the device for `source` and begin buffering.
    ///
    /// Returns as soon as the pump is running; does not wait for a chunk.
    #[track_caller]
    #[instrument(skip(self, host))]
    pub(crate) fn start(
        &mut self,
        host: &dyn CaptureHost,
        source: &StreamSourceId,
        chunk_interval: Duration,
    ) -> CoreResult<()> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::DeviceUnavailable {
                reason: "Capture already in progress".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        lock_chunks(&self.chunks).clear();

        // tokio intervals reject a zero period.
        let chunk_interval = chunk_interval.max(MIN_CHUNK_INTERVAL);
        let device = DeviceGuard::new(host.open(source)?);
        let (stop_tx, stop_rx) = oneshot::channel();
        let pump = tokio::spawn(pump(
            device,
            Arc::clone(&self.chunks),
            chunk_interval,
            stop_rx,
        ));

        self.stop_tx = Some(stop_tx);
        self.pump = Some(pump);
        self.state = CaptureState::Capturing;

        info!(chunk_interval_ms = chunk_interval.as_millis(), "Capture started");

        Ok(())
    }

    /// Finalize the device and assemble the buffered chunks into an artifact.
    ///
    /// The device is released before this returns, whatever happens next.
    #[instrument(skip(self))]
    pub(crate) async fn stop(&mut self, name: String) -> CoreResult<Artifact> {
        if self.state != CaptureState::Capturing {
            return Err(CaptureError::NotCapturing {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.state = CaptureState::Finalizing;

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                error!(error = ?e, "Capture pump task panicked");
            }
        }

        let chunks = std::mem::take(&mut *lock_chunks(&self.chunks));
        self.state = CaptureState::Idle;

        let artifact = Artifact::assemble(chunks, name);
        info!(
            artifact = artifact.name(),
            bytes = artifact.len(),
            "Capture stopped"
        );

        Ok(artifact)
    }
}

async fn pump(
    mut device: DeviceGuard,
    chunks: ChunkBuffer,
    chunk_interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(chunk_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            // Fires on an explicit stop or when the handle is dropped.
            _ = &mut stop_rx => break,
            _ = ticker.tick() => match device.device_mut().read_chunk() {
                Ok(Some(chunk)) => append(&chunks, chunk),
                Ok(None) => {}
                Err(e) => warn!(error = ?e, "Failed to read capture chunk"),
            },
        }
    }

    match device.device_mut().finalize() {
        Ok(Some(chunk)) => append(&chunks, chunk),
        Ok(None) => {}
        Err(e) => warn!(error = ?e, "Failed to flush final capture chunk"),
    }

    device.release();
}

fn append(chunks: &ChunkBuffer, chunk: Vec<u8>) {
    let len = chunk.len();
    let mut buf = lock_chunks(chunks);
    buf.push(chunk);
    debug!(chunk_bytes = len, chunk_count = buf.len(), "Chunk buffered");
}

// A poisoned lock still holds valid chunks.
fn lock_chunks(chunks: &ChunkBuffer) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
    chunks.lock().unwrap_or_else(|e| {
        error!("Chunk buffer lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}
