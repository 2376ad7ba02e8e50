use crate::{CaptureError, CaptureHost, FileCaptureHost, TargetId};

use std::{fs, io::Write};

/// WHAT: A relative target resolves to a file in the sources directory
/// WHY: The control surface names targets, not absolute paths
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_source_file_when_acquiring_then_stream_source_is_canonical_path() {
    // Given: A sources directory with one media file
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("tab1.webm"), b"abc").unwrap();
    let host = FileCaptureHost::new(dir.path());

    // When: Acquiring a stream source for the file name
    let source = host
        .acquire_stream_source(&TargetId::new("tab1.webm"))
        .unwrap();

    // Then: The identifier is the canonical file path
    let expected = dir.path().join("tab1.webm").canonicalize().unwrap();
    assert_eq!(source.as_str(), expected.to_string_lossy());
}

/// WHAT: Missing targets are reported as DeviceUnavailable
/// WHY: Acquisition faults must leave the session idle with a reason
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_source_file_when_acquiring_then_device_unavailable() {
    // Given: An empty sources directory
    let dir = tempfile::tempdir().unwrap();
    let host = FileCaptureHost::new(dir.path());

    // When: Acquiring an unknown target
    let result = host.acquire_stream_source(&TargetId::new("missing.webm"));

    // Then: DeviceUnavailable
    assert!(matches!(
        result,
        Err(CaptureError::DeviceUnavailable { .. })
    ));
}

/// WHAT: A directory is not a valid stream source
/// WHY: Only regular files can be drained as a byte stream
#[test]
#[allow(clippy::unwrap_used)]
fn given_directory_target_when_acquiring_then_device_unavailable() {
    // Given: A target naming a sub-directory
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    let host = FileCaptureHost::new(dir.path());

    // When: Acquiring the directory
    let result = host.acquire_stream_source(&TargetId::new("nested"));

    // Then: DeviceUnavailable
    assert!(matches!(
        result,
        Err(CaptureError::DeviceUnavailable { .. })
    ));
}

/// WHAT: Targets escaping the sources directory are rejected
/// WHY: A target name must not open arbitrary files on the host
#[test]
#[allow(clippy::unwrap_used)]
fn given_target_outside_sources_dir_when_acquiring_then_device_unavailable() {
    // Given: A file next to, not inside, the sources directory
    let dir = tempfile::tempdir().unwrap();
    let sources = dir.path().join("sources");
    fs::create_dir(&sources).unwrap();
    let outside = dir.path().join("secret.webm");
    fs::write(&outside, b"abc").unwrap();
    let host = FileCaptureHost::new(&sources);

    // When: Naming it through `..` and by absolute path
    let relative = host.acquire_stream_source(&TargetId::new("../secret.webm"));
    let absolute =
        host.acquire_stream_source(&TargetId::new(outside.to_string_lossy().into_owned()));

    // Then: Both are DeviceUnavailable
    assert!(matches!(
        relative,
        Err(CaptureError::DeviceUnavailable { reason, .. }) if reason.contains("outside")
    ));
    assert!(matches!(
        absolute,
        Err(CaptureError::DeviceUnavailable { reason, .. }) if reason.contains("outside")
    ));
}

/// WHAT: The device yields only bytes appended since the last read
/// WHY: Chunks must not duplicate data already buffered
#[test]
#[allow(clippy::unwrap_used)]
fn given_growing_file_when_reading_chunks_then_only_new_bytes_returned() {
    // Given: An open device on a file with initial content
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tab1.webm");
    fs::write(&path, b"abc").unwrap();
    let host = FileCaptureHost::new(dir.path());
    let source = host
        .acquire_stream_source(&TargetId::new("tab1.webm"))
        .unwrap();
    let mut device = host.open(&source).unwrap();

    // When: Reading, then appending, then finalizing
    let first = device.read_chunk().unwrap();
    let idle = device.read_chunk().unwrap();
    fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .unwrap()
        .write_all(b"def")
        .unwrap();
    let last = device.finalize().unwrap();
    device.release();

    // Then: Each read sees only the new bytes
    assert_eq!(first, Some(b"abc".to_vec()));
    assert_eq!(idle, None);
    assert_eq!(last, Some(b"def".to_vec()));
    assert_eq!(device.read_chunk().unwrap(), None);
}
