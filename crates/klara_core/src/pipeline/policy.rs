//! Post-hoc enforcement of the task decomposition bounds.
//!
//! The decision to decompose is made by the model from prompt instructions;
//! this module only guarantees the shape of what comes back.
//!
//! # Invariants
//! - Output tasks always satisfy `ExtractedTask::validate()`.
//! - Subtasks keep the model's relative order and are renumbered `1..=n`.
//! - More than `max_subtasks` are truncated; fewer than `min_subtasks`
//!   collapse the task to a single non-decomposed item.
//! - A decomposed task's estimate equals the sum of known subtask estimates.

use crate::config::PipelineConfig;
use crate::model::datetime::parse_date;
use crate::model::extraction::{ExtractedSubtask, ExtractedTask};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::schema::{RawSubtask, RawTask};
use chrono::NaiveDate;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompositionPolicy {
    pub min_subtasks: usize,
    pub max_subtasks: usize,
    pub default_estimate_minutes: u32,
}

impl Default for DecompositionPolicy {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for DecompositionPolicy {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_subtasks: config.min_subtasks,
            max_subtasks: config.max_subtasks,
            default_estimate_minutes: config.default_estimate_minutes,
        }
    }
}

impl DecompositionPolicy {
    /// Normalizes a raw task into a validated [`ExtractedTask`].
    ///
    /// # Errors
    /// - `Extraction` when the description is blank or a date is malformed.
    pub fn normalize(&self, raw: RawTask) -> PipelineResult<ExtractedTask> {
        let description = raw.description.trim().to_string();
        if description.is_empty() {
            return Err(PipelineError::extraction("task description is empty"));
        }
        let due_date = optional_date(raw.due_date.as_deref(), "task due_date")?;

        let mut subtasks = if raw.should_decompose {
            self.normalize_subtasks(raw.subtasks)?
        } else {
            Vec::new()
        };
        if subtasks.len() < self.min_subtasks {
            if !subtasks.is_empty() {
                debug!(
                    "event=decomposition_collapsed module=pipeline subtasks={} min={}",
                    subtasks.len(),
                    self.min_subtasks
                );
            }
            subtasks.clear();
        }
        let should_decompose = !subtasks.is_empty();

        let mut task = ExtractedTask {
            description,
            due_date,
            estimated_minutes: to_minutes(raw.estimated_minutes)
                .unwrap_or(self.default_estimate_minutes),
            should_decompose,
            reasoning: raw
                .reasoning
                .map(|reasoning| reasoning.trim().to_string())
                .filter(|reasoning| !reasoning.is_empty()),
            subtasks,
        };
        if let Some(total) = task.subtask_minutes() {
            task.estimated_minutes = total;
        }

        task.validate()
            .map_err(|err| PipelineError::extraction(format!("task shape: {err}")))?;
        Ok(task)
    }

    fn normalize_subtasks(&self, raw: Vec<RawSubtask>) -> PipelineResult<Vec<ExtractedSubtask>> {
        let mut indexed = Vec::with_capacity(raw.len());
        for (index, subtask) in raw.into_iter().enumerate() {
            let description = subtask.description.trim().to_string();
            if description.is_empty() {
                continue;
            }
            let due_date = optional_date(subtask.due_date.as_deref(), "subtask due_date")?;
            let reported_order = subtask
                .order
                .filter(|order| order.is_finite())
                .unwrap_or((index + 1) as f64);
            indexed.push((
                reported_order,
                index,
                description,
                to_minutes(subtask.estimated_minutes),
                due_date,
            ));
        }

        indexed.sort_by(|left, right| left.0.total_cmp(&right.0).then(left.1.cmp(&right.1)));
        if indexed.len() > self.max_subtasks {
            debug!(
                "event=decomposition_truncated module=pipeline subtasks={} max={}",
                indexed.len(),
                self.max_subtasks
            );
            indexed.truncate(self.max_subtasks);
        }

        Ok(indexed
            .into_iter()
            .enumerate()
            .map(
                |(position, (_, _, description, estimated_minutes, due_date))| ExtractedSubtask {
                    description,
                    order: position as u32 + 1,
                    estimated_minutes,
                    due_date,
                },
            )
            .collect())
    }
}

/// Parses an optional model-supplied date; blank or `null`-like strings mean absent.
pub(crate) fn optional_date(value: Option<&str>, field: &str) -> PipelineResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("none") => {
            Ok(None)
        }
        Some(text) => parse_date(text)
            .map(Some)
            .ok_or_else(|| PipelineError::extraction(format!("invalid {field} `{text}`"))),
    }
}

/// Converts a model-supplied estimate to positive whole minutes.
fn to_minutes(value: Option<f64>) -> Option<u32> {
    let minutes = value?.round();
    if minutes.is_finite() && minutes >= 1.0 && minutes <= f64::from(u32::MAX) {
        Some(minutes as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_subtask(description: &str, order: f64, minutes: f64) -> RawSubtask {
        RawSubtask {
            description: description.to_string(),
            order: Some(order),
            estimated_minutes: Some(minutes),
            due_date: None,
        }
    }

    fn raw_decomposed(subtasks: Vec<RawSubtask>) -> RawTask {
        RawTask {
            description: " Plan Noah's birthday party ".to_string(),
            due_date: Some("2025-02-01".to_string()),
            estimated_minutes: Some(60.0),
            should_decompose: true,
            reasoning: Some("Several distinct steps".to_string()),
            subtasks,
        }
    }

    #[test]
    fn simple_task_keeps_estimate_and_has_no_subtasks() {
        let task = DecompositionPolicy::default()
            .normalize(RawTask {
                description: "Call the babysitter".to_string(),
                estimated_minutes: Some(10.0),
                subtasks: vec![raw_subtask("dial", 1.0, 1.0)],
                ..RawTask::default()
            })
            .unwrap();

        assert!(!task.should_decompose);
        assert!(task.subtasks.is_empty());
        assert_eq!(task.estimated_minutes, 10);
    }

    #[test]
    fn decomposed_task_is_reordered_and_summed() {
        let task = DecompositionPolicy::default()
            .normalize(raw_decomposed(vec![
                raw_subtask("Send invitations", 3.0, 20.0),
                raw_subtask("Create guest list", 1.0, 15.0),
                raw_subtask("Book venue", 2.0, 45.0),
            ]))
            .unwrap();

        assert!(task.should_decompose);
        assert_eq!(task.description, "Plan Noah's birthday party");
        let descriptions: Vec<_> = task.subtasks.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(
            descriptions,
            ["Create guest list", "Book venue", "Send invitations"]
        );
        let orders: Vec<_> = task.subtasks.iter().map(|s| s.order).collect();
        assert_eq!(orders, [1, 2, 3]);
        assert_eq!(task.estimated_minutes, 80);
    }

    #[test]
    fn oversized_decomposition_is_truncated() {
        let subtasks = (1..=9)
            .map(|order| raw_subtask(&format!("step {order}"), order as f64, 10.0))
            .collect();
        let task = DecompositionPolicy::default()
            .normalize(raw_decomposed(subtasks))
            .unwrap();

        assert_eq!(task.subtasks.len(), 7);
        assert_eq!(task.subtasks.last().unwrap().description, "step 7");
        assert_eq!(task.estimated_minutes, 70);
    }

    #[test]
    fn undersized_decomposition_collapses_to_simple_task() {
        let task = DecompositionPolicy::default()
            .normalize(raw_decomposed(vec![
                raw_subtask("one", 1.0, 10.0),
                raw_subtask("  ", 2.0, 10.0),
                raw_subtask("two", 3.0, 10.0),
            ]))
            .unwrap();

        assert!(!task.should_decompose);
        assert!(task.subtasks.is_empty());
        assert_eq!(task.estimated_minutes, 60);
    }

    #[test]
    fn duplicate_orders_keep_model_sequence() {
        let task = DecompositionPolicy::default()
            .normalize(raw_decomposed(vec![
                raw_subtask("a", 1.0, 5.0),
                raw_subtask("b", 1.0, 5.0),
                raw_subtask("c", 1.0, 5.0),
            ]))
            .unwrap();
        let descriptions: Vec<_> = task.subtasks.iter().map(|s| s.description.as_str()).collect();
        assert_eq!(descriptions, ["a", "b", "c"]);
    }

    #[test]
    fn missing_estimate_uses_default() {
        let task = DecompositionPolicy::default()
            .normalize(RawTask {
                description: "Renew library books".to_string(),
                estimated_minutes: Some(0.0),
                ..RawTask::default()
            })
            .unwrap();
        assert_eq!(task.estimated_minutes, 15);
    }

    #[test]
    fn blank_description_and_bad_dates_are_extraction_failures() {
        let policy = DecompositionPolicy::default();
        let err = policy.normalize(RawTask::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));

        let err = policy
            .normalize(RawTask {
                description: "Pay the water bill".to_string(),
                due_date: Some("next Friday".to_string()),
                ..RawTask::default()
            })
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
    }

    #[test]
    fn null_like_dates_mean_absent() {
        assert_eq!(optional_date(Some("null"), "due_date").unwrap(), None);
        assert_eq!(optional_date(Some(" "), "due_date").unwrap(), None);
        assert_eq!(optional_date(None, "due_date").unwrap(), None);
    }
}
