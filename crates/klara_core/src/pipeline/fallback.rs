//! Degraded result used when the pipeline cannot produce an extraction.
//!
//! # Invariants
//! - The fallback is a single non-decomposed task and nothing else.
//! - Its description is the trimmed input, cut to its first 100 characters
//!   (by char, never splitting a code point) and marked with `...` only when
//!   something was cut.

use crate::model::extraction::{BrainDumpExtraction, ExtractedTask};
use crate::pipeline::error::FailureKind;

pub const FALLBACK_MAX_CHARS: usize = 100;
pub const FALLBACK_ESTIMATE_MINUTES: u32 = 15;
const FALLBACK_SUFFIX: &str = "...";

/// Builds the single fallback task for `text`.
pub fn fallback_task(text: &str, failure: FailureKind) -> ExtractedTask {
    let text = text.trim();
    let mut description: String = text.chars().take(FALLBACK_MAX_CHARS).collect();
    if text.chars().count() > FALLBACK_MAX_CHARS {
        description.push_str(FALLBACK_SUFFIX);
    }

    ExtractedTask {
        reasoning: Some(format!(
            "Error occurred during processing ({})",
            failure.code()
        )),
        ..ExtractedTask::simple(description, FALLBACK_ESTIMATE_MINUTES)
    }
}

/// Wraps [`fallback_task`] as a whole extraction.
pub fn fallback_extraction(text: &str, failure: FailureKind) -> BrainDumpExtraction {
    BrainDumpExtraction {
        tasks: vec![fallback_task(text, failure)],
        ..BrainDumpExtraction::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_input_is_truncated_to_one_hundred_chars() {
        let text = "a".repeat(250);
        let task = fallback_task(&text, FailureKind::UpstreamUnavailable);

        assert_eq!(task.description, format!("{}...", "a".repeat(100)));
        assert_eq!(task.estimated_minutes, 15);
        assert!(!task.should_decompose);
        assert!(task.subtasks.is_empty());
        assert_eq!(
            task.reasoning.as_deref(),
            Some("Error occurred during processing (upstream_unavailable)")
        );
        task.validate().unwrap();
    }

    #[test]
    fn short_input_is_kept_without_ellipsis() {
        let task = fallback_task("  Call mom ", FailureKind::Extraction);
        assert_eq!(task.description, "Call mom");
    }

    #[test]
    fn exactly_one_hundred_chars_is_not_marked_truncated() {
        let text = "b".repeat(100);
        assert_eq!(fallback_task(&text, FailureKind::Extraction).description, text);

        let longer = format!("{text}c");
        assert_eq!(
            fallback_task(&longer, FailureKind::Extraction).description,
            format!("{text}...")
        );
    }

    #[test]
    fn surrounding_whitespace_does_not_count_toward_the_limit() {
        let text = format!("   {}   ", "d".repeat(100));
        assert_eq!(
            fallback_task(&text, FailureKind::Detection).description,
            "d".repeat(100)
        );
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let text = "é".repeat(120);
        let task = fallback_task(&text, FailureKind::Detection);
        assert_eq!(task.description.chars().count(), 103);
    }

    #[test]
    fn fallback_extraction_holds_exactly_one_task() {
        let extraction = fallback_extraction("buy milk", FailureKind::Extraction);
        assert_eq!(extraction.tasks.len(), 1);
        assert_eq!(extraction.item_count(), 1);
    }
}
