use crate::{AppCommand, AppError, AppResult, HELP, config::Config};

use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use feed_recorder_core::{CaptureError, CoordinatorHandle, TargetId};
use serde::Serialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::watch,
};
use tracing::{error, info, instrument, warn};

/// Whether the input loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Interactive control surface.
///
/// Reads commands line by line and talks to the coordinator through its
/// handle. Responses are printed in their message encoding.
pub struct App {
    pub(crate) coordinator: CoordinatorHandle,
    pub(crate) config: Config,
    pub(crate) config_path: PathBuf,
}

impl App {
    /// Run the input loop until `quit`, end of input, or shutdown.
    ///
    /// An active session is stopped before returning so the capture is
    /// uploaded or saved locally. This also happens when reading input or
    /// writing output fails; that error is returned afterwards.
    #[instrument(skip_all)]
    pub(crate) async fn run<R, W>(
        mut self,
        input: R,
        mut output: W,
        shutdown_rx: watch::Receiver<bool>,
    ) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Feed-Recorder starting");

        let outcome = self.read_commands(input, &mut output, shutdown_rx).await;
        if let Err(e) = &outcome {
            error!(error = ?e, "Control surface I/O failed, shutting down");
        }

        let stopped = self.stop_if_active(&mut output).await;
        info!("Feed-Recorder shut down");

        outcome.and(stopped)
    }

    async fn read_commands<R, W>(
        &mut self,
        input: R,
        output: &mut W,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(output, HELP).await?;

        let mut lines = input.lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Shutdown requested");
                    return Ok(());
                }

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        info!("End of input");
                        return Ok(());
                    };

                    let command = match AppCommand::parse(&line) {
                        Ok(Some(command)) => command,
                        Ok(None) => continue,
                        Err(e) => {
                            write_line(output, &format!("error: {}", e)).await?;
                            continue;
                        }
                    };

                    if self.handle_command(command, output).await? == Flow::Quit {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Execute one command, printing its outcome.
    #[instrument(skip(self, output))]
    pub(crate) async fn handle_command<W>(
        &mut self,
        command: AppCommand,
        output: &mut W,
    ) -> AppResult<Flow>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            AppCommand::Status => {
                let status = self.coordinator.get_status().await?;
                write_json(output, &status).await?;
            }
            AppCommand::Start { target } => match self.resolve_target(target) {
                Ok(target_id) => {
                    let response = self.coordinator.start_recording(target_id).await?;
                    write_json(output, &response).await?;
                }
                Err(e) => {
                    warn!(error = ?e, "No target to record");
                    write_line(output, &format!("error: {}", e)).await?;
                }
            },
            AppCommand::Stop => {
                let response = self
                    .coordinator
                    .stop_recording(self.config.server.destination.clone())
                    .await?;
                write_json(output, &response).await?;
            }
            AppCommand::Destination { url: None } => {
                write_line(output, &self.config.server.destination).await?;
            }
            AppCommand::Destination { url: Some(url) } => {
                match self.config.set_destination(&url) {
                    Ok(()) => {
                        if let Err(e) = self.config.save_to(&self.config_path) {
                            error!(error = ?e, "Failed to persist destination");
                        }
                        info!(destination = %self.config.server.destination, "Destination updated");
                        write_line(output, &self.config.server.destination).await?;
                    }
                    Err(e) => write_line(output, &format!("error: {}", e)).await?,
                }
            }
            AppCommand::Help => write_line(output, HELP).await?,
            AppCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    /// The explicit target, else the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoActiveTarget`] when neither is set.
    #[track_caller]
    pub(crate) fn resolve_target(&self, explicit: Option<String>) -> AppResult<TargetId> {
        explicit
            .or_else(|| self.config.capture.default_target.clone())
            .map(|target| target.trim().to_string())
            .filter(|target| !target.is_empty())
            .map(TargetId::new)
            .ok_or_else(|| {
                AppError::from(CaptureError::NoActiveTarget {
                    location: ErrorLocation::from(Location::caller()),
                })
            })
    }

    async fn stop_if_active<W>(&self, output: &mut W) -> AppResult<()>
    where
        W: AsyncWrite + Unpin,
    {
        let Some(session_id) = self.coordinator.session().session_id() else {
            return Ok(());
        };

        info!(session_id = %session_id, "Stopping active recording before exit");
        let response = self
            .coordinator
            .stop_recording(self.config.server.destination.clone())
            .await?;
        write_json(output, &response).await
    }
}

async fn write_line<W>(output: &mut W, text: &str) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

async fn write_json<W, T>(output: &mut W, value: &T) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let text = serde_json::to_string(value).map_err(std::io::Error::other)?;
    write_line(output, &text).await
}
