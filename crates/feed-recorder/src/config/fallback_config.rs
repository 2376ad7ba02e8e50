use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where recordings go when the upload fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Directory for locally saved recordings.
    pub download_dir: PathBuf,
}
