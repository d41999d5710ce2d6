//! Category-specific field extraction.
//!
//! # Responsibility
//! - Issue one structured-inference call per extraction with the matching
//!   prompt and schema.
//! - Normalize wire output into validated model types.
//!
//! # Invariants
//! - Single-category extractors fail on malformed output.
//! - Multi-extraction drops individual malformed items but fails when
//!   nothing usable remains.

use crate::inference::{InferenceRequest, OutputSchema, StructuredInference};
use crate::model::category::CategoryLabel;
use crate::model::datetime::parse_time;
use crate::model::extraction::{
    BrainDumpExtraction, Categorized, ExtractedCalendarEvent, ExtractedShoppingItem,
    ExtractedTask,
};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::invoke_with_timeout;
use crate::pipeline::policy::{optional_date, DecompositionPolicy};
use crate::pipeline::prompt::{render, PromptKind};
use crate::pipeline::schema::{
    brain_dump_schema, calendar_schema, shopping_schema, task_schema, RawBrainDump,
    RawCalendarEvent, RawShoppingItem, RawShoppingList, RawTask,
};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct FieldExtractor {
    inference: Arc<dyn StructuredInference>,
    policy: DecompositionPolicy,
    timeout: Duration,
}

impl FieldExtractor {
    pub fn new(
        inference: Arc<dyn StructuredInference>,
        policy: DecompositionPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            inference,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> &DecompositionPolicy {
        &self.policy
    }

    /// Extracts one task, decomposed when the model judges it worthwhile.
    pub async fn extract_task(
        &self,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<ExtractedTask> {
        let raw: RawTask = self
            .call(text, PromptKind::Task, task_schema(), current_date)
            .await?;
        self.policy.normalize(raw)
    }

    /// Extracts every shopping item; blank entries are discarded.
    pub async fn extract_shopping_items(
        &self,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<Vec<ExtractedShoppingItem>> {
        let raw: RawShoppingList = self
            .call(text, PromptKind::Shopping, shopping_schema(), current_date)
            .await?;
        let items: Vec<_> = raw.items.into_iter().filter_map(normalize_item).collect();
        if items.is_empty() {
            return Err(PipelineError::extraction("no shopping items in output"));
        }
        Ok(items)
    }

    /// Extracts one calendar event; the event date is required.
    pub async fn extract_calendar_event(
        &self,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<ExtractedCalendarEvent> {
        let raw: RawCalendarEvent = self
            .call(text, PromptKind::Calendar, calendar_schema(), current_date)
            .await?;
        normalize_event(raw)
    }

    /// Dispatches to the extractor matching `label`.
    pub async fn extract_category(
        &self,
        label: CategoryLabel,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<Categorized> {
        match label {
            CategoryLabel::Task => self
                .extract_task(text, current_date)
                .await
                .map(Categorized::Task),
            CategoryLabel::ShoppingList => self
                .extract_shopping_items(text, current_date)
                .await
                .map(Categorized::ShoppingList),
            CategoryLabel::CalendarEvent => self
                .extract_calendar_event(text, current_date)
                .await
                .map(Categorized::CalendarEvent),
        }
    }

    /// Extracts items of every category in a single call.
    pub async fn extract_all(
        &self,
        text: &str,
        current_date: NaiveDate,
    ) -> PipelineResult<BrainDumpExtraction> {
        let raw: RawBrainDump = self
            .call(text, PromptKind::BrainDump, brain_dump_schema(), current_date)
            .await?;

        let mut dropped = 0usize;
        let mut extraction = BrainDumpExtraction::default();
        for task in raw.tasks {
            match self.policy.normalize(task) {
                Ok(task) => extraction.tasks.push(task),
                Err(err) => {
                    dropped += 1;
                    warn!("event=item_dropped module=pipeline kind=task reason={err}");
                }
            }
        }
        for item in raw.shopping_items {
            match normalize_item(item) {
                Some(item) => extraction.shopping_items.push(item),
                None => dropped += 1,
            }
        }
        for event in raw.calendar_events {
            match normalize_event(event) {
                Ok(event) => extraction.calendar_events.push(event),
                Err(err) => {
                    dropped += 1;
                    warn!("event=item_dropped module=pipeline kind=calendar_event reason={err}");
                }
            }
        }

        if extraction.is_empty() {
            return Err(PipelineError::extraction(format!(
                "no usable items in output (dropped={dropped})"
            )));
        }
        debug!(
            "event=extract_all module=pipeline status=ok tasks={} shopping_items={} calendar_events={} dropped={}",
            extraction.tasks.len(),
            extraction.shopping_items.len(),
            extraction.calendar_events.len(),
            dropped
        );
        Ok(extraction)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        text: &str,
        kind: PromptKind,
        schema: OutputSchema,
        current_date: NaiveDate,
    ) -> PipelineResult<T> {
        let schema_name = schema.name;
        let request = InferenceRequest {
            system_prompt: render(kind, current_date),
            user_text: text.to_string(),
            schema,
        };
        let value = invoke_with_timeout(self.inference.as_ref(), &request, self.timeout).await?;
        serde_json::from_value(value).map_err(|err| {
            PipelineError::extraction(format!("`{schema_name}` output does not match schema: {err}"))
        })
    }
}

fn normalize_item(raw: RawShoppingItem) -> Option<ExtractedShoppingItem> {
    let description = raw.description.trim();
    (!description.is_empty()).then(|| ExtractedShoppingItem {
        description: description.to_string(),
    })
}

fn normalize_event(raw: RawCalendarEvent) -> PipelineResult<ExtractedCalendarEvent> {
    let description = raw.description.trim().to_string();
    if description.is_empty() {
        return Err(PipelineError::extraction("event description is empty"));
    }
    let event_date = optional_date(raw.event_date.as_deref(), "event_date")?
        .ok_or_else(|| PipelineError::extraction("event_date is required"))?;
    let event_time = match raw.event_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(text) if text.eq_ignore_ascii_case("null") => None,
        Some(text) => Some(
            parse_time(text)
                .ok_or_else(|| PipelineError::extraction(format!("invalid event_time `{text}`")))?,
        ),
    };
    Ok(ExtractedCalendarEvent {
        description,
        event_date,
        event_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn event_requires_a_date_and_accepts_seconds() {
        let err = normalize_event(RawCalendarEvent {
            description: "Dentist".to_string(),
            event_date: None,
            event_time: Some("14:30".to_string()),
        })
        .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));

        let event = normalize_event(RawCalendarEvent {
            description: " Doctor appointment ".to_string(),
            event_date: Some("2025-10-25".to_string()),
            event_time: Some("14:30:00".to_string()),
        })
        .unwrap();
        assert_eq!(event.description, "Doctor appointment");
        assert_eq!(event.event_time, NaiveTime::from_hms_opt(14, 30, 0));
    }

    #[test]
    fn blank_shopping_items_are_discarded() {
        assert!(normalize_item(RawShoppingItem {
            description: "   ".to_string()
        })
        .is_none());
        assert_eq!(
            normalize_item(RawShoppingItem {
                description: " 2 dozen eggs ".to_string()
            })
            .unwrap()
            .description,
            "2 dozen eggs"
        );
    }
}
