use chrono::Utc;

/// Finished, immutable output of one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    payload: Vec<u8>,
    name: String,
}

impl Artifact {
    /// Concatenate `chunks` in order. Zero chunks give an empty artifact.
    pub fn assemble(chunks: Vec<Vec<u8>>, name: String) -> Self {
        let payload = chunks.concat();
        Self { payload, name }
    }

    /// Raw artifact bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Synthesized filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// `recording_{unix millis}.{extension}`
pub fn artifact_filename(extension: &str) -> String {
    format!("recording_{}.{}", Utc::now().timestamp_millis(), extension)
}
