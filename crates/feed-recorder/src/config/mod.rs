mod capture_config;
#[allow(clippy::module_inception)]
mod config;
mod fallback_config;
mod server_config;

pub(crate) use {
    capture_config::CaptureConfig, config::Config, fallback_config::FallbackConfig,
    server_config::ServerConfig,
};

pub(crate) const DEFAULT_DESTINATION: &str = "http://localhost:8000";
pub(crate) const DEFAULT_CHUNK_INTERVAL_MS: u64 = 1000;

pub(crate) fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}

pub(crate) fn default_chunk_interval_ms() -> u64 {
    DEFAULT_CHUNK_INTERVAL_MS
}
