//! Anthropic Messages API implementation of [`StructuredInference`].
//!
//! Schema enforcement uses one forced tool: the target schema becomes the
//! tool's `input_schema` and `tool_choice` names that tool, so the model must
//! answer with a `tool_use` block whose `input` is the structured result.

use super::{InferenceError, InferenceRequest, InferenceResult, StructuredInference};
use crate::config::InferenceConfig;
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::time::{Duration, Instant};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Anthropic-backed structured inference.
pub struct AnthropicInference {
    config: InferenceConfig,
    client: reqwest::Client,
}

impl AnthropicInference {
    /// Builds the client. A missing API key is reported per call, so a
    /// pipeline without credentials still degrades to the fallback result.
    pub fn new(config: InferenceConfig) -> InferenceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| InferenceError::Network(err.to_string()))?;
        Ok(Self { config, client })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or(ANTHROPIC_API_URL)
    }

    fn build_request_body(&self, request: &InferenceRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "system": request.system_prompt,
            "messages": [{
                "role": "user",
                "content": request.user_text,
            }],
            "tools": [{
                "name": request.schema.name,
                "description": request.schema.description,
                "input_schema": request.schema.json_schema,
            }],
            "tool_choice": {
                "type": "tool",
                "name": request.schema.name,
            },
        })
    }
}

#[async_trait]
impl StructuredInference for AnthropicInference {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn infer(&self, request: &InferenceRequest) -> InferenceResult<serde_json::Value> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(InferenceError::MissingApiKey)?;

        let started_at = Instant::now();
        let response = self
            .client
            .post(self.base_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&self.build_request_body(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        debug!(
            "event=inference_call module=inference status=done provider=anthropic schema={} http_status={} duration_ms={}",
            request.schema.name,
            status,
            started_at.elapsed().as_millis()
        );

        if status != 200 {
            warn!(
                "event=inference_call module=inference status=error provider=anthropic schema={} http_status={}",
                request.schema.name, status
            );
            return Err(InferenceError::Http {
                status,
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|err| InferenceError::InvalidResponse(err.to_string()))?;
        extract_structured_output(parsed, request.schema.name)
    }
}

fn map_transport_error(err: reqwest::Error) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Network(err.to_string())
    }
}

fn extract_structured_output(
    response: MessagesResponse,
    schema_name: &'static str,
) -> InferenceResult<serde_json::Value> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == schema_name => Some(input),
            _ => None,
        })
        .ok_or(InferenceError::MissingStructuredOutput(schema_name))
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let mut truncated: String = value.chars().take(max_chars).collect();
    if value.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::OutputSchema;

    fn request() -> InferenceRequest {
        InferenceRequest {
            system_prompt: "Current date: 2025-01-01".to_string(),
            user_text: "buy milk".to_string(),
            schema: OutputSchema {
                name: "record_brain_dump",
                description: "Record extracted items",
                json_schema: serde_json::json!({"type": "object"}),
            },
        }
    }

    #[test]
    fn request_body_forces_the_schema_tool() {
        let provider = AnthropicInference::new(InferenceConfig::default()).unwrap();
        let body = provider.build_request_body(&request());

        assert_eq!(body["model"], crate::config::DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["system"], "Current date: 2025-01-01");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "buy milk");
        assert_eq!(body["tools"][0]["name"], "record_brain_dump");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
        assert_eq!(body["tool_choice"]["type"], "tool");
        assert_eq!(body["tool_choice"]["name"], "record_brain_dump");
    }

    #[test]
    fn structured_output_is_taken_from_matching_tool_use_block() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "Here you go"},
                {"type": "tool_use", "id": "t1", "name": "record_brain_dump",
                 "input": {"tasks": []}}
            ],
            "stop_reason": "tool_use"
        }))
        .unwrap();

        let output = extract_structured_output(response, "record_brain_dump").unwrap();
        assert_eq!(output, serde_json::json!({"tasks": []}));
    }

    #[test]
    fn missing_tool_use_block_is_reported() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [{"type": "text", "text": "no tool"}]
        }))
        .unwrap();

        let err = extract_structured_output(response, "record_brain_dump").unwrap_err();
        assert_eq!(
            err,
            InferenceError::MissingStructuredOutput("record_brain_dump")
        );
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let provider = AnthropicInference::new(InferenceConfig {
            base_url: Some("http://127.0.0.1:9/unreachable".to_string()),
            ..InferenceConfig::default()
        })
        .unwrap();

        let err = provider.infer(&request()).await.unwrap_err();
        assert_eq!(err, InferenceError::MissingApiKey);
        assert!(err.is_unavailable());
    }

    #[test]
    fn truncate_chars_marks_cut_bodies() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
    }
}
