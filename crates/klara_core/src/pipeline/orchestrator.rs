//! Brain-dump orchestration with a total fallback policy.
//!
//! # Responsibility
//! - Run either multi-extraction (one call for every category) or
//!   single-label detection followed by one category extractor.
//! - Convert any pipeline failure into the fallback task.
//!
//! # Invariants
//! - `process` always returns an extraction; blank input yields an empty one
//!   without calling inference.
//! - Raw brain-dump text is never written to logs.

use crate::config::{InferenceConfig, PipelineConfig};
use crate::inference::{AnthropicInference, InferenceError, StructuredInference};
use crate::model::category::CategoryLabel;
use crate::model::extraction::BrainDumpExtraction;
use crate::pipeline::detector::CategoryDetector;
use crate::pipeline::error::{FailureKind, PipelineResult};
use crate::pipeline::extractor::FieldExtractor;
use crate::pipeline::fallback::fallback_extraction;
use crate::pipeline::policy::DecompositionPolicy;
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How a brain dump is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    /// One call extracts tasks, shopping items and calendar events together.
    #[default]
    MultiExtraction,
    /// Detect one category, then run that category's extractor.
    SingleLabel,
}

impl OrchestrationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultiExtraction => "multi_extraction",
            Self::SingleLabel => "single_label",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "multi_extraction" | "multi" => Some(Self::MultiExtraction),
            "single_label" | "single" => Some(Self::SingleLabel),
            _ => None,
        }
    }
}

/// Outcome of processing one brain dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub extraction: BrainDumpExtraction,
    /// Detected label; set only in single-label mode.
    pub category: Option<CategoryLabel>,
    /// Set when `extraction` is the fallback task.
    pub degraded: Option<FailureKind>,
}

impl OrchestrationResult {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[derive(Clone)]
pub struct BrainDumpOrchestrator {
    mode: OrchestrationMode,
    detector: CategoryDetector,
    extractor: FieldExtractor,
    provider: &'static str,
}

impl BrainDumpOrchestrator {
    pub fn new(
        inference: Arc<dyn StructuredInference>,
        pipeline: &PipelineConfig,
        timeout: Duration,
    ) -> Self {
        let provider = inference.name();
        Self {
            mode: pipeline.mode,
            detector: CategoryDetector::new(Arc::clone(&inference), timeout),
            extractor: FieldExtractor::new(inference, DecompositionPolicy::from(pipeline), timeout),
            provider,
        }
    }

    /// Builds an orchestrator backed by the Anthropic Messages API.
    pub fn from_config(
        inference: &InferenceConfig,
        pipeline: &PipelineConfig,
    ) -> Result<Self, InferenceError> {
        let timeout = Duration::from_secs(inference.timeout_secs);
        let provider = AnthropicInference::new(inference.clone())?;
        Ok(Self::new(Arc::new(provider), pipeline, timeout))
    }

    pub fn mode(&self) -> OrchestrationMode {
        self.mode
    }

    pub fn detector(&self) -> &CategoryDetector {
        &self.detector
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Runs the configured mode and surfaces failures to the caller.
    pub async fn try_process(
        &self,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<(BrainDumpExtraction, Option<CategoryLabel>)> {
        if text.trim().is_empty() {
            return Ok((BrainDumpExtraction::default(), None));
        }
        match self.mode {
            OrchestrationMode::MultiExtraction => {
                let extraction = self.extractor.extract_all(text, current_date).await?;
                Ok((extraction, None))
            }
            OrchestrationMode::SingleLabel => {
                let label = self.detector.detect(text, current_date).await?;
                let categorized = self
                    .extractor
                    .extract_category(label, text, current_date)
                    .await?;
                Ok((categorized.into(), Some(label)))
            }
        }
    }

    /// Interprets a brain dump, substituting the fallback task on failure.
    pub async fn process(&self, text: &str, current_date: NaiveDate) -> OrchestrationResult {
        let started_at = Instant::now();
        let input_chars = text.chars().count();

        match self.try_process(text, current_date).await {
            Ok((extraction, category)) => {
                info!(
                    "event=brain_dump_process module=pipeline status=ok mode={} provider={} input_chars={} items={} duration_ms={}",
                    self.mode.as_str(),
                    self.provider,
                    input_chars,
                    extraction.item_count(),
                    started_at.elapsed().as_millis()
                );
                OrchestrationResult {
                    extraction,
                    category,
                    degraded: None,
                }
            }
            Err(err) => {
                warn!(
                    "event=brain_dump_process module=pipeline status=fallback mode={} provider={} input_chars={} error_code={} duration_ms={} error={}",
                    self.mode.as_str(),
                    self.provider,
                    input_chars,
                    err.code(),
                    started_at.elapsed().as_millis(),
                    err
                );
                OrchestrationResult {
                    extraction: fallback_extraction(text, err.kind()),
                    category: None,
                    degraded: Some(err.kind()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::OrchestrationMode;

    #[test]
    fn mode_parse_accepts_canonical_and_short_names() {
        assert_eq!(
            OrchestrationMode::parse("multi_extraction"),
            Some(OrchestrationMode::MultiExtraction)
        );
        assert_eq!(
            OrchestrationMode::parse(" Single-Label "),
            Some(OrchestrationMode::SingleLabel)
        );
        assert_eq!(OrchestrationMode::parse("both"), None);
        assert_eq!(
            OrchestrationMode::parse(OrchestrationMode::SingleLabel.as_str()),
            Some(OrchestrationMode::SingleLabel)
        );
    }
}
