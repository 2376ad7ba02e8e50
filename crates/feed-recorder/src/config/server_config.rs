use crate::config::default_destination;

use serde::{Deserialize, Serialize};

/// Upload backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base address recordings are uploaded to (`{destination}/upload`).
    #[serde(default = "default_destination")]
    pub destination: String,
}
