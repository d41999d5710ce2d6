//! Persisted records and storage creation requests.
//!
//! # Responsibility
//! - Define the stored shapes of users, tasks, subtasks, shopping items and
//!   calendar events.
//! - Map extraction results into creation requests (`New*` types) that carry
//!   the raw brain-dump text and the owning user.
//!
//! # Invariants
//! - Identifiers, `created_at` and `completed` are assigned by storage only.
//! - Creation requests must pass `validate()` before any SQL mutation.
//! - Subtask orders within one parent form the sequence `1..=n`.

use crate::model::datetime;
use crate::model::extraction::{
    ExtractedCalendarEvent, ExtractedShoppingItem, ExtractedSubtask, ExtractedTask,
};
use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Storage-assigned identifier for every persisted record.
pub type RecordId = Uuid;
/// Storage-assigned identifier for users.
pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub id: RecordId,
    pub parent_task_id: RecordId,
    pub description: String,
    pub order: u32,
    pub estimated_minutes: Option<u32>,
    #[serde(default, with = "datetime::opt_date")]
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub description: String,
    #[serde(default, with = "datetime::opt_date")]
    pub due_date: Option<NaiveDate>,
    pub estimated_minutes: Option<u32>,
    /// Set whenever the task has subtasks.
    pub should_decompose: bool,
    pub reasoning: Option<String>,
    pub completed: bool,
    /// Original brain-dump text, kept for auditability.
    pub raw_input: String,
    pub created_at: i64,
    /// Sorted by `order`.
    pub subtasks: Vec<SubtaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItemRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub description: String,
    pub completed: bool,
    pub raw_input: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub description: String,
    #[serde(with = "datetime::date")]
    pub event_date: NaiveDate,
    #[serde(default, with = "datetime::opt_time")]
    pub event_time: Option<NaiveTime>,
    pub raw_input: String,
    pub created_at: i64,
}

/// Everything persisted for one user (or one brain dump), grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBrainDump {
    pub tasks: Vec<TaskRecord>,
    pub shopping_items: Vec<ShoppingItemRecord>,
    pub calendar_events: Vec<CalendarEventRecord>,
}

/// Creation request for a task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub user_id: UserId,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub estimated_minutes: Option<u32>,
    pub should_decompose: bool,
    pub reasoning: Option<String>,
    pub raw_input: String,
}

/// Creation request for one subtask; the parent id is supplied separately
/// once storage has assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubtask {
    pub description: String,
    pub order: u32,
    pub estimated_minutes: Option<u32>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShoppingItem {
    pub user_id: UserId,
    pub description: String,
    pub raw_input: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCalendarEvent {
    pub user_id: UserId,
    pub description: String,
    pub event_date: NaiveDate,
    pub event_time: Option<NaiveTime>,
    pub raw_input: String,
}

/// Validation failures for creation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyDescription,
    EmptyRawInput,
    NonPositiveEstimate,
    InvalidSubtaskOrder { expected: u32, found: u32 },
    InvalidEmail(String),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::EmptyRawInput => write!(f, "raw input must not be empty"),
            Self::NonPositiveEstimate => write!(f, "estimated minutes must be positive"),
            Self::InvalidSubtaskOrder { expected, found } => write!(
                f,
                "subtask order must run 1..=n: expected {expected}, found {found}"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email `{value}`"),
        }
    }
}

impl Error for RecordValidationError {}

fn require_text(value: &str, error: RecordValidationError) -> Result<(), RecordValidationError> {
    if value.trim().is_empty() {
        return Err(error);
    }
    Ok(())
}

fn require_positive(value: Option<u32>) -> Result<(), RecordValidationError> {
    if value == Some(0) {
        return Err(RecordValidationError::NonPositiveEstimate);
    }
    Ok(())
}

impl NewTask {
    /// Maps an extracted task into a creation request.
    ///
    /// Subtasks are mapped separately with [`NewSubtask::from_extracted`]
    /// because they need the parent id assigned by storage.
    pub fn from_extracted(task: &ExtractedTask, user_id: UserId, raw_input: &str) -> Self {
        Self {
            user_id,
            description: task.description.clone(),
            due_date: task.due_date,
            estimated_minutes: Some(task.estimated_minutes),
            should_decompose: task.should_decompose,
            reasoning: task.reasoning.clone(),
            raw_input: raw_input.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(&self.description, RecordValidationError::EmptyDescription)?;
        require_text(&self.raw_input, RecordValidationError::EmptyRawInput)?;
        require_positive(self.estimated_minutes)
    }
}

impl NewSubtask {
    pub fn from_extracted(subtask: &ExtractedSubtask) -> Self {
        Self {
            description: subtask.description.clone(),
            order: subtask.order,
            estimated_minutes: subtask.estimated_minutes,
            due_date: subtask.due_date,
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(&self.description, RecordValidationError::EmptyDescription)?;
        require_positive(self.estimated_minutes)
    }
}

/// Validates every subtask and checks that orders are exactly `1..=n`.
pub fn validate_subtasks(subtasks: &[NewSubtask]) -> Result<(), RecordValidationError> {
    for (index, subtask) in subtasks.iter().enumerate() {
        subtask.validate()?;
        let expected = index as u32 + 1;
        if subtask.order != expected {
            return Err(RecordValidationError::InvalidSubtaskOrder {
                expected,
                found: subtask.order,
            });
        }
    }
    Ok(())
}

impl NewShoppingItem {
    pub fn from_extracted(item: &ExtractedShoppingItem, user_id: UserId, raw_input: &str) -> Self {
        Self {
            user_id,
            description: item.description.clone(),
            raw_input: raw_input.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(&self.description, RecordValidationError::EmptyDescription)?;
        require_text(&self.raw_input, RecordValidationError::EmptyRawInput)
    }
}

impl NewCalendarEvent {
    pub fn from_extracted(
        event: &ExtractedCalendarEvent,
        user_id: UserId,
        raw_input: &str,
    ) -> Self {
        Self {
            user_id,
            description: event.description.clone(),
            event_date: event.event_date,
            event_time: event.event_time,
            raw_input: raw_input.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        require_text(&self.description, RecordValidationError::EmptyDescription)?;
        require_text(&self.raw_input, RecordValidationError::EmptyRawInput)
    }
}

/// Trims and lowercases an email, rejecting obviously malformed values.
pub fn normalize_email(email: &str) -> Result<String, RecordValidationError> {
    let normalized = email.trim().to_ascii_lowercase();
    if !EMAIL_RE.is_match(&normalized) {
        return Err(RecordValidationError::InvalidEmail(email.trim().to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtask(order: u32) -> NewSubtask {
        NewSubtask {
            description: format!("step {order}"),
            order,
            estimated_minutes: Some(10),
            due_date: None,
        }
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(
            normalize_email("  Parent@Example.COM ").unwrap(),
            "parent@example.com"
        );
        assert!(matches!(
            normalize_email("not-an-email"),
            Err(RecordValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn validate_subtasks_requires_contiguous_orders() {
        validate_subtasks(&[subtask(1), subtask(2), subtask(3)]).unwrap();
        assert_eq!(
            validate_subtasks(&[subtask(1), subtask(1)]),
            Err(RecordValidationError::InvalidSubtaskOrder {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            validate_subtasks(&[subtask(2)]),
            Err(RecordValidationError::InvalidSubtaskOrder {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn new_task_from_extracted_keeps_audit_fields() {
        let user_id = Uuid::new_v4();
        let extracted = ExtractedTask::simple("Call the babysitter", 10);
        let new_task = NewTask::from_extracted(&extracted, user_id, "Call the babysitter and buy milk");

        assert_eq!(new_task.user_id, user_id);
        assert_eq!(new_task.description, "Call the babysitter");
        assert_eq!(new_task.estimated_minutes, Some(10));
        assert_eq!(new_task.raw_input, "Call the babysitter and buy milk");
        assert!(!new_task.should_decompose);
        assert_eq!(new_task.reasoning, None);
        new_task.validate().unwrap();
    }

    #[test]
    fn blank_raw_input_is_rejected() {
        let item = NewShoppingItem {
            user_id: Uuid::new_v4(),
            description: "milk".to_string(),
            raw_input: "  ".to_string(),
        };
        assert_eq!(item.validate(), Err(RecordValidationError::EmptyRawInput));
    }
}
