#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use klara_core::config::PipelineConfig;
use klara_core::inference::{InferenceError, InferenceRequest, InferenceResult, StructuredInference};
use klara_core::pipeline::orchestrator::{BrainDumpOrchestrator, OrchestrationMode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedInference {
    responses: Mutex<VecDeque<InferenceResult<Value>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedInference {
    pub fn new(responses: Vec<InferenceResult<Value>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn schema_names(&self) -> Vec<&'static str> {
        self.requests()
            .iter()
            .map(|request| request.schema.name)
            .collect()
    }
}

#[async_trait]
impl StructuredInference for ScriptedInference {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn infer(&self, request: &InferenceRequest) -> InferenceResult<Value> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(InferenceError::InvalidResponse("script exhausted".into())))
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledInference;

#[async_trait]
impl StructuredInference for StalledInference {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn infer(&self, _request: &InferenceRequest) -> InferenceResult<Value> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Err(InferenceError::Timeout)
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
}

pub fn orchestrator(
    inference: Arc<dyn StructuredInference>,
    mode: OrchestrationMode,
) -> BrainDumpOrchestrator {
    let pipeline = PipelineConfig {
        mode,
        ..PipelineConfig::default()
    };
    BrainDumpOrchestrator::new(inference, &pipeline, Duration::from_secs(5))
}
