use crate::{StatusResponse, TargetId};

use std::time::Instant;

use uuid::Uuid;

/// Authoritative record of whether a capture is in progress.
///
/// Target and start time exist only while recording, so a half-initialized
/// session cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// No session holds the capture resource.
    Idle,
    /// A session is active.
    Recording {
        /// Target being captured.
        target_id: TargetId,
        /// When the worker confirmed capture start.
        started_at: Instant,
        /// Unique session ID for log correlation.
        session_id: Uuid,
    },
}

impl Session {
    /// Whether a session is active.
    pub fn is_active(&self) -> bool {
        matches!(self, Session::Recording { .. })
    }

    /// Target of the active session.
    pub fn target_id(&self) -> Option<&TargetId> {
        match self {
            Session::Idle => None,
            Session::Recording { target_id, .. } => Some(target_id),
        }
    }

    /// Start instant of the active session.
    pub fn started_at(&self) -> Option<Instant> {
        match self {
            Session::Idle => None,
            Session::Recording { started_at, .. } => Some(*started_at),
        }
    }

    /// Log correlation ID of the active session.
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Session::Idle => None,
            Session::Recording { session_id, .. } => Some(*session_id),
        }
    }

    /// Whole seconds elapsed at `now`, floored; 0 when idle.
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.started_at()
            .map(|started_at| now.saturating_duration_since(started_at).as_secs())
            .unwrap_or(0)
    }

    /// Status reply as observed at `now`.
    pub fn status(&self, now: Instant) -> StatusResponse {
        StatusResponse {
            is_recording: self.is_active(),
            elapsed: self.elapsed_secs(now),
        }
    }
}
