use crate::{AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;

/// Commands typed at the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Show whether a session is recording and for how long.
    Status,
    /// Start recording, optionally naming the target.
    Start {
        /// Explicit target, overriding the configured default.
        target: Option<String>,
    },
    /// Stop recording and upload to the configured destination.
    Stop,
    /// Show or change the upload destination.
    Destination {
        /// New destination; `None` prints the current one.
        url: Option<String>,
    },
    /// Print the command list.
    Help,
    /// Stop any active session and exit.
    Quit,
}

impl AppCommand {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] for unknown verbs or extra arguments.
    #[track_caller]
    pub fn parse(line: &str) -> AppResult<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let argument = words.next().map(str::to_string);

        if let Some(extra) = words.next() {
            return Err(AppError::InvalidCommand {
                reason: format!("Unexpected argument {:?} after {:?}", extra, verb),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let command = match verb.to_ascii_lowercase().as_str() {
            "start" => return Ok(Some(AppCommand::Start { target: argument })),
            "destination" => return Ok(Some(AppCommand::Destination { url: argument })),
            "status" => AppCommand::Status,
            "stop" => AppCommand::Stop,
            "help" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            _ => {
                return Err(AppError::InvalidCommand {
                    reason: format!("Unknown command {:?}, try \"help\"", verb),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        if let Some(argument) = argument {
            return Err(AppError::InvalidCommand {
                reason: format!("{:?} takes no argument, got {:?}", verb, argument),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(Some(command))
    }
}

/// Text printed by the `help` command.
pub(crate) const HELP: &str = "\
Commands:
  status               show whether a recording is active
  start [target]       start recording target (or the configured default)
  stop                 stop recording and upload
  destination [url]    show or set the upload destination
  help                 show this list
  quit                 stop any recording and exit";
