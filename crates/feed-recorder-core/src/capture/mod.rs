mod artifact;
mod device;
mod file_source;
pub(crate) mod handle;
mod settings;
mod worker;

pub(crate) use {handle::CaptureHandle, worker::WorkerContext};

pub use {
    artifact::{Artifact, artifact_filename},
    device::{CaptureDevice, CaptureHost},
    file_source::FileCaptureHost,
    handle::CaptureState,
    settings::{CaptureSettings, DEFAULT_CHUNK_INTERVAL, DEFAULT_UPLOAD_TIMEOUT},
};
