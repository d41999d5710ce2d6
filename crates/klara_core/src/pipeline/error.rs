//! Pipeline error kinds.

use crate::inference::InferenceError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Failure class recorded on degraded results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Detection,
    Extraction,
    UpstreamUnavailable,
}

impl FailureKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Detection => "detection_failure",
            Self::Extraction => "extraction_failure",
            Self::UpstreamUnavailable => "upstream_unavailable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Category detection did not yield a valid label.
    Detection(String),
    /// Output did not conform to the schema or a required field was missing.
    Extraction(String),
    /// The inference collaborator could not be reached or timed out.
    UpstreamUnavailable(String),
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Detection(_) => FailureKind::Detection,
            Self::Extraction(_) => FailureKind::Extraction,
            Self::UpstreamUnavailable(_) => FailureKind::UpstreamUnavailable,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detection(message) => write!(f, "category detection failed: {message}"),
            Self::Extraction(message) => write!(f, "field extraction failed: {message}"),
            Self::UpstreamUnavailable(message) => {
                write!(f, "inference service unavailable: {message}")
            }
        }
    }
}

impl Error for PipelineError {}

impl From<InferenceError> for PipelineError {
    fn from(value: InferenceError) -> Self {
        if value.is_unavailable() {
            Self::UpstreamUnavailable(value.to_string())
        } else {
            Self::Extraction(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_errors_map_to_pipeline_kinds() {
        assert_eq!(
            PipelineError::from(InferenceError::Timeout).kind(),
            FailureKind::UpstreamUnavailable
        );
        assert_eq!(
            PipelineError::from(InferenceError::Http {
                status: 529,
                body: "overloaded".to_string()
            })
            .kind(),
            FailureKind::UpstreamUnavailable
        );
        assert_eq!(
            PipelineError::from(InferenceError::InvalidResponse("eof".to_string())).kind(),
            FailureKind::Extraction
        );
    }
}
