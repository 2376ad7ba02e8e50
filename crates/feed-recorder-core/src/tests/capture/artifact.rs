use crate::{Artifact, artifact_filename};

/// WHAT: Chunks are concatenated in capture order
/// WHY: The uploaded payload must be the exact byte stream the device produced
#[test]
fn given_three_chunks_when_assembling_then_payload_is_ordered_concatenation() {
    // Given: Three distinct chunks
    let chunks = vec![b"c1".to_vec(), b"c2".to_vec(), b"c3".to_vec()];

    // When: Assembling the artifact
    let artifact = Artifact::assemble(chunks, "recording_1.webm".to_string());

    // Then: Payload is c1 || c2 || c3
    assert_eq!(artifact.payload(), b"c1c2c3");
    assert_eq!(artifact.len(), 6);
    assert_eq!(artifact.name(), "recording_1.webm");
}

/// WHAT: Zero chunks produce a valid empty artifact
/// WHY: A capture stopped before the first tick is not an error
#[test]
fn given_no_chunks_when_assembling_then_empty_artifact() {
    // Given: No chunks

    // When: Assembling the artifact
    let artifact = Artifact::assemble(Vec::new(), "recording_1.webm".to_string());

    // Then: Payload is empty but the artifact exists
    assert!(artifact.is_empty());
    assert_eq!(artifact.len(), 0);
}

/// WHAT: Synthesized filename follows recording_{timestamp}.{ext}
/// WHY: The backend only accepts known container extensions
#[test]
fn given_extension_when_synthesizing_filename_then_timestamped_name() {
    // Given/When: A filename for a webm capture
    let name = artifact_filename("webm");

    // Then: Prefix, numeric timestamp and extension are present
    let timestamp = name
        .strip_prefix("recording_")
        .and_then(|rest| rest.strip_suffix(".webm"));
    assert!(
        timestamp.is_some_and(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())),
        "unexpected filename {}",
        name
    );
}
