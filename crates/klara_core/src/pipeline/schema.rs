//! Target schemas and the wire shapes decoded from inference output.
//!
//! Wire structs are deliberately permissive (optional fields, float numbers,
//! the legacy `estimated_time_minutes` alias); strict checks happen when they
//! are normalized into model types.

use crate::inference::OutputSchema;
use serde::Deserialize;
use serde_json::{json, Value};

pub const CATEGORY_OUTPUT: &str = "record_category";
pub const TASK_OUTPUT: &str = "record_task";
pub const SHOPPING_OUTPUT: &str = "record_shopping_items";
pub const CALENDAR_OUTPUT: &str = "record_calendar_event";
pub const BRAIN_DUMP_OUTPUT: &str = "record_brain_dump";

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubtask {
    #[serde(default)]
    pub description: String,
    pub order: Option<f64>,
    #[serde(alias = "estimated_time_minutes")]
    pub estimated_minutes: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub description: String,
    pub due_date: Option<String>,
    #[serde(alias = "estimated_time_minutes")]
    pub estimated_minutes: Option<f64>,
    #[serde(default)]
    pub should_decompose: bool,
    pub reasoning: Option<String>,
    #[serde(default)]
    pub subtasks: Vec<RawSubtask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShoppingItem {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawShoppingList {
    #[serde(default)]
    pub items: Vec<RawShoppingItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCalendarEvent {
    #[serde(default)]
    pub description: String,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBrainDump {
    #[serde(default)]
    pub tasks: Vec<RawTask>,
    #[serde(default)]
    pub shopping_items: Vec<RawShoppingItem>,
    #[serde(default)]
    pub calendar_events: Vec<RawCalendarEvent>,
}

fn date_property(description: &str) -> Value {
    json!({
        "type": ["string", "null"],
        "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
        "description": description,
    })
}

fn subtask_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {"type": "string"},
            "order": {"type": "integer", "minimum": 1},
            "estimated_minutes": {"type": "integer", "minimum": 1},
            "due_date": date_property("YYYY-MM-DD, no later than the parent due date"),
        },
        "required": ["description", "order", "estimated_minutes"],
    })
}

fn task_item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {"type": "string", "description": "5-10 words"},
            "due_date": date_property("YYYY-MM-DD when a deadline is mentioned"),
            "estimated_minutes": {"type": "integer", "minimum": 1},
            "should_decompose": {"type": "boolean"},
            "reasoning": {"type": "string"},
            "subtasks": {
                "type": "array",
                "items": subtask_schema(),
                "maxItems": crate::model::extraction::MAX_SUBTASKS,
            },
        },
        "required": ["description", "estimated_minutes", "should_decompose", "subtasks"],
    })
}

fn shopping_item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {"type": "string", "description": "item with inline quantity"},
        },
        "required": ["description"],
    })
}

fn calendar_item_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "description": {"type": "string", "description": "5-10 words"},
            "event_date": {
                "type": "string",
                "pattern": "^\\d{4}-\\d{2}-\\d{2}$",
            },
            "event_time": {
                "type": ["string", "null"],
                "pattern": "^\\d{2}:\\d{2}$",
                "description": "24-hour HH:MM",
            },
        },
        "required": ["description", "event_date"],
    })
}

pub fn category_schema() -> OutputSchema {
    OutputSchema {
        name: CATEGORY_OUTPUT,
        description: "Record the single best-fit category of the brain dump.",
        json_schema: json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "string",
                    "enum": ["task", "shopping_list", "calendar_event"],
                },
            },
            "required": ["category"],
        }),
    }
}

pub fn task_schema() -> OutputSchema {
    OutputSchema {
        name: TASK_OUTPUT,
        description: "Record one task, decomposed into ordered subtasks when warranted.",
        json_schema: task_item_schema(),
    }
}

pub fn shopping_schema() -> OutputSchema {
    OutputSchema {
        name: SHOPPING_OUTPUT,
        description: "Record every shopping item as its own entry.",
        json_schema: json!({
            "type": "object",
            "properties": {
                "items": {"type": "array", "items": shopping_item_schema()},
            },
            "required": ["items"],
        }),
    }
}

pub fn calendar_schema() -> OutputSchema {
    OutputSchema {
        name: CALENDAR_OUTPUT,
        description: "Record one calendar event with a resolved date.",
        json_schema: calendar_item_schema(),
    }
}

pub fn brain_dump_schema() -> OutputSchema {
    OutputSchema {
        name: BRAIN_DUMP_OUTPUT,
        description: "Record all tasks, shopping items and calendar events in the brain dump.",
        json_schema: json!({
            "type": "object",
            "properties": {
                "tasks": {"type": "array", "items": task_item_schema()},
                "shopping_items": {"type": "array", "items": shopping_item_schema()},
                "calendar_events": {"type": "array", "items": calendar_item_schema()},
            },
            "required": ["tasks", "shopping_items", "calendar_events"],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brain_dump_schema_requires_all_three_lists() {
        let schema = brain_dump_schema();
        assert_eq!(schema.name, BRAIN_DUMP_OUTPUT);
        let required = schema.json_schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(
            schema.json_schema["properties"]["tasks"]["items"]["properties"]["subtasks"]
                ["maxItems"],
            7
        );
    }

    #[test]
    fn raw_task_accepts_legacy_estimate_name_and_missing_fields() {
        let raw: RawTask = serde_json::from_value(json!({
            "description": "Call the school",
            "estimated_time_minutes": 10
        }))
        .unwrap();
        assert_eq!(raw.estimated_minutes, Some(10.0));
        assert!(!raw.should_decompose);
        assert!(raw.subtasks.is_empty());
    }

    #[test]
    fn raw_brain_dump_defaults_missing_lists() {
        let raw: RawBrainDump =
            serde_json::from_value(json!({"shopping_items": [{"description": "milk"}]})).unwrap();
        assert!(raw.tasks.is_empty());
        assert_eq!(raw.shopping_items.len(), 1);
        assert!(raw.calendar_events.is_empty());
    }
}
