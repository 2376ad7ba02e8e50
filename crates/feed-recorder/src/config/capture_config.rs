use crate::config::default_chunk_interval_ms;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Capture source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Directory that capture targets are resolved against.
    pub sources_dir: PathBuf,

    /// Target used by `start` when none is given.
    #[serde(default)]
    pub default_target: Option<String>,

    /// Milliseconds between buffered chunks.
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
}
