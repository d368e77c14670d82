//! Error types raised while turning a raw record into a prediction.

/// Coarse classification of a [`PipelineError`], kept for logging at the
/// adapter boundary after the message itself has been flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Scaling,
    Decoding,
    Artifact,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Scaling => "scaling",
            Self::Decoding => "decoding",
            Self::Artifact => "artifact",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request failure of the preprocessing pipeline.
///
/// Every variant is terminal for the request that raised it and has no
/// effect on later requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Malformed or incomplete input record.
    #[error("Invalid record: {0}")]
    Validation(String),

    /// Feature vector length does not match what the scaler was fitted on.
    #[error("Scaler expects {expected} features, got {actual}")]
    Scaling { expected: usize, actual: usize },

    /// Model output is not a position in the outcome category sequence.
    #[error("Class index {index} is outside the {len} known outcome categories")]
    Decoding { index: i64, len: usize },

    /// The model or scaler failed in a way the pipeline does not classify.
    #[error("Artifact failure: {0}")]
    Artifact(String),
}

impl PipelineError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Scaling { .. } => ErrorKind::Scaling,
            Self::Decoding { .. } => ErrorKind::Decoding,
            Self::Artifact(_) => ErrorKind::Artifact,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
