use crate::{CoreResult, StreamSourceId, TargetId};

use tracing::debug;

/// Host capture facility: binds targets to stream sources and opens devices.
pub trait CaptureHost: Send + Sync {
    /// Acquire a stream-source identifier bound to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DeviceUnavailable`](crate::CaptureError::DeviceUnavailable)
    /// if the target cannot be captured.
    fn acquire_stream_source(&self, target: &TargetId) -> CoreResult<StreamSourceId>;

    /// Open the capture device for a previously acquired stream source.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DeviceUnavailable`](crate::CaptureError::DeviceUnavailable)
    /// if the device cannot be opened.
    fn open(&self, source: &StreamSourceId) -> CoreResult<Box<dyn CaptureDevice>>;
}

/// An open capture device producing raw media bytes.
pub trait CaptureDevice: Send {
    /// Return whatever data the device produced since the last call, or
    /// `None` if nothing new is available.
    fn read_chunk(&mut self) -> CoreResult<Option<Vec<u8>>>;

    /// Flush the final chunk. Called once, after the last `read_chunk`.
    fn finalize(&mut self) -> CoreResult<Option<Vec<u8>>>;

    /// Release the device and any underlying tracks.
    fn release(&mut self);
}

/// Releases the wrapped device exactly once: either explicitly through
/// [`DeviceGuard::release`] or on drop.
pub(crate) struct DeviceGuard {
    device: Box<dyn CaptureDevice>,
    released: bool,
}

impl DeviceGuard {
    pub(crate) fn new(device: Box<dyn CaptureDevice>) -> Self {
        Self {
            device,
            released: false,
        }
    }

    pub(crate) fn device_mut(&mut self) -> &mut dyn CaptureDevice {
        self.device.as_mut()
    }

    pub(crate) fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.device.release();
            debug!("Capture device released");
        }
    }
}

impl Drop for DeviceGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}
