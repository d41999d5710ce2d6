//! Brain-dump category labels.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One of the three kinds of record a brain dump can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLabel {
    /// Something to do.
    Task,
    /// Something to buy.
    ShoppingList,
    /// Something happening at a specific date.
    CalendarEvent,
}

impl CategoryLabel {
    pub const ALL: [CategoryLabel; 3] = [Self::Task, Self::ShoppingList, Self::CalendarEvent];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::ShoppingList => "shopping_list",
            Self::CalendarEvent => "calendar_event",
        }
    }

    /// Parses a wire label. Surrounding whitespace and case are ignored;
    /// anything outside the enumeration returns `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "shopping_list" => Some(Self::ShoppingList),
            "calendar_event" => Some(Self::CalendarEvent),
            _ => None,
        }
    }
}

impl Display for CategoryLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::CategoryLabel;

    #[test]
    fn parse_accepts_every_wire_label() {
        for label in CategoryLabel::ALL {
            assert_eq!(CategoryLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(
            CategoryLabel::parse("  Shopping_List "),
            Some(CategoryLabel::ShoppingList)
        );
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        assert_eq!(CategoryLabel::parse("note"), None);
        assert_eq!(CategoryLabel::parse("shopping list"), None);
        assert_eq!(CategoryLabel::parse(""), None);
    }
}
