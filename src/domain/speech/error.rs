/// Why a document-to-speech run stopped.
///
/// The `Display` output of each variant is the cause string recorded on a
/// failed job, so it must stay readable by end users.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// Unreadable document, no extractable text, or text over the safety limit
    #[error("{0}")]
    Input(String),

    #[error("Synthesis failed for chunk {index}: {cause}")]
    Backend { index: usize, cause: String },

    /// A result slot or segment that should exist is missing
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("Audio assembly failed: {0}")]
    Assembly(String),

    /// Artifact or job store write failure
    #[error("Storage error: {0}")]
    Resource(String),

    /// The run outlived the deadline its host gave it
    #[error("Job timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl PipelineError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Backend { .. } => "backend",
            Self::InternalConsistency(_) => "internal_consistency",
            Self::Assembly(_) => "assembly",
            Self::Resource(_) => "resource",
            Self::Timeout(_) => "timeout",
        }
    }
}
