//! Structured-inference collaborator boundary.
//!
//! # Responsibility
//! - Define the contract the pipeline uses to turn a prompt plus a target
//!   schema into a structured JSON value.
//! - Provide the Anthropic Messages API implementation.
//!
//! # Invariants
//! - Implementations return either a JSON object produced for the requested
//!   schema or an error; they never return free text.
//! - Implementations hold no per-request mutable state.

pub mod anthropic;

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use anthropic::AnthropicInference;

pub type InferenceResult<T> = Result<T, InferenceError>;

/// Target schema for one structured call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Identifier of the structured output (used as the tool name).
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema object describing the expected output.
    pub json_schema: serde_json::Value,
}

/// One structured-inference request.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    /// Fixed instruction template already rendered with the current date.
    pub system_prompt: String,
    /// Raw brain-dump text.
    pub user_text: String,
    pub schema: OutputSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    MissingApiKey,
    Network(String),
    Timeout,
    Http { status: u16, body: String },
    InvalidResponse(String),
    /// The response carried no output for the requested schema.
    MissingStructuredOutput(&'static str),
}

impl InferenceError {
    /// Whether the collaborator could not be reached or did not answer.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::MissingApiKey | Self::Network(_) | Self::Timeout | Self::Http { .. } => true,
            Self::InvalidResponse(_) | Self::MissingStructuredOutput(_) => false,
        }
    }
}

impl Display for InferenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(f, "inference API key is not configured"),
            Self::Network(message) => write!(f, "inference request failed: {message}"),
            Self::Timeout => write!(f, "inference request timed out"),
            Self::Http { status, body } => {
                write!(f, "inference service returned HTTP {status}: {body}")
            }
            Self::InvalidResponse(message) => write!(f, "unparseable inference response: {message}"),
            Self::MissingStructuredOutput(name) => {
                write!(f, "inference response has no `{name}` output")
            }
        }
    }
}

impl Error for InferenceError {}

/// Structured-inference collaborator.
#[async_trait]
pub trait StructuredInference: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Runs one call and returns the schema-shaped JSON value.
    async fn infer(&self, request: &InferenceRequest) -> InferenceResult<serde_json::Value>;
}
