//! Brain-dump interpretation pipeline.
//!
//! # Responsibility
//! - Build prompts and target schemas for the inference collaborator.
//! - Detect categories, extract category-specific fields and enforce the
//!   decomposition bounds on whatever the model returns.
//! - Convert every failure into the fallback result at the orchestrator.
//!
//! # Invariants
//! - The current date is always an explicit input; nothing here reads the clock.
//! - Each inference call is bounded by a timeout.
//! - `BrainDumpOrchestrator::process` never returns an error.

pub mod detector;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod orchestrator;
pub mod policy;
pub mod prompt;
pub mod schema;

use crate::inference::{InferenceError, InferenceRequest, InferenceResult, StructuredInference};
use std::time::Duration;

/// Runs one inference call bounded by `timeout`.
pub(crate) async fn invoke_with_timeout(
    inference: &dyn StructuredInference,
    request: &InferenceRequest,
    timeout: Duration,
) -> InferenceResult<serde_json::Value> {
    match tokio::time::timeout(timeout, inference.infer(request)).await {
        Ok(result) => result,
        Err(_) => Err(InferenceError::Timeout),
    }
}
