//! Configuration management for feed-recorder.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        CaptureConfig, DEFAULT_CHUNK_INTERVAL_MS, DEFAULT_DESTINATION, FallbackConfig,
        ServerConfig,
    },
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::{ProjectDirs, UserDirs};
use error_location::ErrorLocation;
use feed_recorder_core::CaptureSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upload backend settings.
    pub server: ServerConfig,
    /// Capture source settings.
    pub capture: CaptureConfig,
    /// Local fallback settings.
    pub fallback: FallbackConfig,
}

impl Config {
    /// Load configuration from disk, creating default if not found.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config found, creating default");
            let config = Self::default_config()?;
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and parse the configuration file at `config_path`.
    #[track_caller]
    pub fn load_from(config_path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.validate_destination()?;

        info!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to `config_path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        // Atomic write: write to temp file then rename
        let temp_path = config_path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, config_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?config_path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Validate that the destination is an HTTP(S) address.
    #[track_caller]
    pub fn validate_destination(&self) -> AppResult<()> {
        let destination = self.server.destination.trim();
        if !(destination.starts_with("http://") || destination.starts_with("https://")) {
            return Err(AppError::ConfigError {
                reason: format!(
                    "Destination must start with http:// or https://, got {:?}",
                    self.server.destination
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }

    /// Replace the destination after validating it.
    ///
    /// The previous value is kept if the new one is invalid.
    #[track_caller]
    pub fn set_destination(&mut self, destination: &str) -> AppResult<()> {
        let previous = std::mem::replace(&mut self.server.destination, destination.trim().to_string());
        if let Err(e) = self.validate_destination() {
            self.server.destination = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Core capture settings derived from this configuration.
    pub fn capture_settings(&self, spool_dir: PathBuf) -> CaptureSettings {
        CaptureSettings {
            chunk_interval: Duration::from_millis(self.capture.chunk_interval_ms.max(1)),
            spool_dir,
            ..CaptureSettings::default()
        }
    }

    /// Directory for artifacts awaiting a local fallback save.
    #[track_caller]
    pub fn spool_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().join("spool"))
    }

    /// Path of the configuration file, creating its directory if needed.
    #[track_caller]
    pub fn config_path() -> AppResult<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
        let config_dir = proj_dirs.config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        Ok(config_dir.join("config.toml"))
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "feed-recorder", "Feed-Recorder").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn default_config() -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let data_dir = proj_dirs.data_dir();

        let download_dir = UserDirs::new()
            .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
            .unwrap_or_else(|| data_dir.join("recordings"));

        Ok(Config {
            server: ServerConfig {
                destination: DEFAULT_DESTINATION.to_string(),
            },
            capture: CaptureConfig {
                sources_dir: data_dir.join("sources"),
                default_target: None,
                chunk_interval_ms: DEFAULT_CHUNK_INTERVAL_MS,
            },
            fallback: FallbackConfig { download_dir },
        })
    }
}
