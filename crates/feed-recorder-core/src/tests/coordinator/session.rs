use crate::{Session, StatusResponse, TargetId};

use std::time::{Duration, Instant};

use uuid::Uuid;

fn recording(started_at: Instant) -> Session {
    Session::Recording {
        target_id: TargetId::new("tab1"),
        started_at,
        session_id: Uuid::new_v4(),
    }
}

/// WHAT: Idle sessions expose no target, start time or elapsed time
/// WHY: Target and start time exist only while active
#[test]
fn given_idle_session_when_inspecting_then_all_fields_empty() {
    // Given: An idle session
    let session = Session::Idle;

    // When/Then: Nothing is set
    assert!(!session.is_active());
    assert_eq!(session.target_id(), None);
    assert_eq!(session.started_at(), None);
    assert_eq!(session.session_id(), None);
    assert_eq!(session.status(Instant::now()), StatusResponse::IDLE);
}

/// WHAT: Elapsed seconds are floored
/// WHY: Status reports whole seconds only
#[test]
fn given_recording_session_when_computing_elapsed_then_whole_seconds_floored() {
    // Given: A session started now
    let started_at = Instant::now();
    let session = recording(started_at);

    // When: Computing elapsed at +2.999s
    let status = session.status(started_at + Duration::from_millis(2999));

    // Then: 2 seconds, recording
    assert_eq!(
        status,
        StatusResponse {
            is_recording: true,
            elapsed: 2
        }
    );
}

/// WHAT: An observation instant before the start yields 0
/// WHY: elapsed must never underflow
#[test]
fn given_instant_before_start_when_computing_elapsed_then_zero() {
    // Given: A session that started one second from the reference instant
    let reference = Instant::now();
    let session = recording(reference + Duration::from_secs(1));

    // When: Computing elapsed at the earlier instant
    let elapsed = session.elapsed_secs(reference);

    // Then: Saturates at 0
    assert_eq!(elapsed, 0);
}
