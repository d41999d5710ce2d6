//! Single-label category detection.

use crate::inference::{InferenceRequest, StructuredInference};
use crate::model::category::CategoryLabel;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::invoke_with_timeout;
use crate::pipeline::prompt::{render, PromptKind};
use crate::pipeline::schema::{category_schema, RawCategory};
use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Classifies a brain dump into exactly one [`CategoryLabel`].
#[derive(Clone)]
pub struct CategoryDetector {
    inference: Arc<dyn StructuredInference>,
    timeout: Duration,
}

impl CategoryDetector {
    pub fn new(inference: Arc<dyn StructuredInference>, timeout: Duration) -> Self {
        Self { inference, timeout }
    }

    /// Detects the single best-fit category.
    ///
    /// # Errors
    /// - `UpstreamUnavailable` when the collaborator is unreachable or slow.
    /// - `Detection` for anything else, including a label outside the set.
    pub async fn detect(&self, text: &str, current_date: NaiveDate) -> PipelineResult<CategoryLabel> {
        let request = InferenceRequest {
            system_prompt: render(PromptKind::Detection, current_date),
            user_text: text.to_string(),
            schema: category_schema(),
        };

        let value = invoke_with_timeout(self.inference.as_ref(), &request, self.timeout)
            .await
            .map_err(|err| {
                if err.is_unavailable() {
                    PipelineError::UpstreamUnavailable(err.to_string())
                } else {
                    PipelineError::Detection(err.to_string())
                }
            })?;

        let raw: RawCategory = serde_json::from_value(value)
            .map_err(|err| PipelineError::Detection(format!("malformed category output: {err}")))?;
        match CategoryLabel::parse(&raw.category) {
            Some(label) => {
                debug!(
                    "event=category_detect module=pipeline status=ok category={}",
                    label
                );
                Ok(label)
            }
            None => {
                warn!(
                    "event=category_detect module=pipeline status=error reason=unknown_label"
                );
                Err(PipelineError::Detection(format!(
                    "unknown category `{}`",
                    raw.category
                )))
            }
        }
    }
}
