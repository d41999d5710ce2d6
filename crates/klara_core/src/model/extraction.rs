//! Structured extraction results.
//!
//! # Responsibility
//! - Define the category-specific shapes produced from one brain dump.
//! - Validate the decomposition invariants before results leave the pipeline.
//!
//! # Invariants
//! - `should_decompose == false` implies `subtasks` is empty.
//! - `should_decompose == true` implies 3..=7 subtasks ordered `1..=n`.
//! - Results are transient: produced per request and never mutated afterwards.

use crate::model::category::CategoryLabel;
use crate::model::datetime;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_SUBTASKS: usize = 3;
pub const MAX_SUBTASKS: usize = 7;

/// One step of a decomposed task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSubtask {
    pub description: String,
    /// 1-based position, unique within the parent task.
    pub order: u32,
    pub estimated_minutes: Option<u32>,
    /// Conceptually no later than the parent due date; not enforced.
    #[serde(default, with = "datetime::opt_date")]
    pub due_date: Option<NaiveDate>,
}

/// An actionable item, optionally decomposed into ordered subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTask {
    /// Short imperative description (about ten words).
    pub description: String,
    #[serde(default, with = "datetime::opt_date")]
    pub due_date: Option<NaiveDate>,
    /// For decomposed tasks this is the sum of the subtask estimates.
    pub estimated_minutes: u32,
    pub should_decompose: bool,
    pub reasoning: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<ExtractedSubtask>,
}

/// One purchasable item; quantity phrases stay inline in `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedShoppingItem {
    pub description: String,
}

/// A dated appointment or activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCalendarEvent {
    pub description: String,
    #[serde(with = "datetime::date")]
    pub event_date: NaiveDate,
    #[serde(default, with = "datetime::opt_time")]
    pub event_time: Option<NaiveTime>,
}

/// Every item extracted from one brain dump, grouped by category.
///
/// Any of the lists may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainDumpExtraction {
    #[serde(default)]
    pub tasks: Vec<ExtractedTask>,
    #[serde(default)]
    pub shopping_items: Vec<ExtractedShoppingItem>,
    #[serde(default)]
    pub calendar_events: Vec<ExtractedCalendarEvent>,
}

impl BrainDumpExtraction {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.shopping_items.is_empty() && self.calendar_events.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.tasks.len() + self.shopping_items.len() + self.calendar_events.len()
    }
}

/// Result of single-label dispatch, tagged by the detected category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Categorized {
    Task(ExtractedTask),
    ShoppingList(Vec<ExtractedShoppingItem>),
    CalendarEvent(ExtractedCalendarEvent),
}

impl Categorized {
    pub fn label(&self) -> CategoryLabel {
        match self {
            Self::Task(_) => CategoryLabel::Task,
            Self::ShoppingList(_) => CategoryLabel::ShoppingList,
            Self::CalendarEvent(_) => CategoryLabel::CalendarEvent,
        }
    }
}

impl From<Categorized> for BrainDumpExtraction {
    fn from(value: Categorized) -> Self {
        match value {
            Categorized::Task(task) => Self {
                tasks: vec![task],
                ..Self::default()
            },
            Categorized::ShoppingList(items) => Self {
                shopping_items: items,
                ..Self::default()
            },
            Categorized::CalendarEvent(event) => Self {
                calendar_events: vec![event],
                ..Self::default()
            },
        }
    }
}

/// Violation of an extraction-shape invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionShapeError {
    EmptyDescription,
    NonPositiveEstimate,
    SubtasksWithoutDecomposition(usize),
    SubtaskCountOutOfRange(usize),
    NonContiguousOrder { expected: u32, found: u32 },
}

impl Display for ExtractionShapeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyDescription => write!(f, "description must not be empty"),
            Self::NonPositiveEstimate => write!(f, "estimated minutes must be positive"),
            Self::SubtasksWithoutDecomposition(count) => {
                write!(f, "task is not decomposed but carries {count} subtasks")
            }
            Self::SubtaskCountOutOfRange(count) => write!(
                f,
                "decomposed task needs {MIN_SUBTASKS}..={MAX_SUBTASKS} subtasks, got {count}"
            ),
            Self::NonContiguousOrder { expected, found } => {
                write!(f, "subtask order must be contiguous: expected {expected}, found {found}")
            }
        }
    }
}

impl Error for ExtractionShapeError {}

impl ExtractedTask {
    /// Builds a single-action task with no subtasks.
    pub fn simple(description: impl Into<String>, estimated_minutes: u32) -> Self {
        Self {
            description: description.into(),
            due_date: None,
            estimated_minutes,
            should_decompose: false,
            reasoning: None,
            subtasks: Vec::new(),
        }
    }

    /// Checks the decomposition invariants.
    pub fn validate(&self) -> Result<(), ExtractionShapeError> {
        if self.description.trim().is_empty() {
            return Err(ExtractionShapeError::EmptyDescription);
        }
        if self.estimated_minutes == 0 {
            return Err(ExtractionShapeError::NonPositiveEstimate);
        }

        if !self.should_decompose {
            if !self.subtasks.is_empty() {
                return Err(ExtractionShapeError::SubtasksWithoutDecomposition(
                    self.subtasks.len(),
                ));
            }
            return Ok(());
        }

        let count = self.subtasks.len();
        if !(MIN_SUBTASKS..=MAX_SUBTASKS).contains(&count) {
            return Err(ExtractionShapeError::SubtaskCountOutOfRange(count));
        }
        for (index, subtask) in self.subtasks.iter().enumerate() {
            if subtask.description.trim().is_empty() {
                return Err(ExtractionShapeError::EmptyDescription);
            }
            if subtask.estimated_minutes == Some(0) {
                return Err(ExtractionShapeError::NonPositiveEstimate);
            }
            let expected = index as u32 + 1;
            if subtask.order != expected {
                return Err(ExtractionShapeError::NonContiguousOrder {
                    expected,
                    found: subtask.order,
                });
            }
        }
        Ok(())
    }

    /// Sum of the known subtask estimates, `None` when no subtask has one.
    pub fn subtask_minutes(&self) -> Option<u32> {
        self.subtasks
            .iter()
            .filter_map(|subtask| subtask.estimated_minutes)
            .reduce(|acc, minutes| acc.saturating_add(minutes))
    }
}
