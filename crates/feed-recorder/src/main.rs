//! Feed-Recorder: record one capture target at a time and upload the result.

mod app;
mod app_command;
mod config;
mod error;
mod fallback_saver;
mod indicator_display;

pub(crate) use {
    app::App,
    app_command::{AppCommand, HELP},
    error::{AppError, Result as AppResult},
    fallback_saver::FallbackSaver,
};

use crate::config::Config;

use std::{sync::Arc, time::Duration};

use feed_recorder_core::{Coordinator, FileCaptureHost, SystemClock};
use tokio::{io::BufReader, sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "feed_recorder=debug,feed_recorder_core=debug";

/// Application entry point.
#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = match Config::config_path() {
        Ok(path) => path,
        Err(e) => {
            error!("Failed to locate config: {:?}", e);
            std::process::exit(1);
        }
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let spool_dir = match Config::spool_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to locate spool directory: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.capture.sources_dir) {
        error!(sources_dir = ?config.capture.sources_dir, error = ?e, "Failed to create sources directory");
        std::process::exit(1);
    }
    debug!(sources_dir = ?config.capture.sources_dir, "Capture sources directory ready");

    let coordinator = Coordinator::new(
        Arc::new(FileCaptureHost::new(&config.capture.sources_dir)),
        Arc::new(SystemClock),
        config.capture_settings(spool_dir),
    )
    .spawn();

    let saver = tokio::spawn(
        FallbackSaver::new(&config.fallback.download_dir).run(coordinator.subscribe()),
    );
    let display = tokio::spawn(indicator_display::run_indicator_display(
        coordinator.indicator(),
        tokio::io::stdout(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let app = App {
        coordinator,
        config,
        config_path,
    };

    if let Err(e) = app
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown_rx)
        .await
    {
        error!(error = ?e, "App error");
    }

    // The app owned the last handle, so both tasks end once the coordinator
    // has torn down.
    join_with_timeout("Fallback saver", saver).await;
    join_with_timeout("Indicator display", display).await;

    info!("Feed-Recorder exited");
}

async fn join_with_timeout<T>(name: &str, handle: JoinHandle<T>) {
    match tokio::time::timeout(Duration::from_secs(2), handle).await {
        Ok(Ok(_)) => debug!(task = name, "Task stopped cleanly"),
        Ok(Err(e)) => warn!(task = name, error = ?e, "Task panicked"),
        Err(_) => debug!(
            task = name,
            "Task did not stop within timeout, \
                   will be cleaned up on exit"
        ),
    }
}
