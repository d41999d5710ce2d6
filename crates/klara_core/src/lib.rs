//! Core domain logic for Klara.
//! Turns free-form brain dumps into tasks, shopping items and calendar
//! events, and owns the record store they are saved to.

pub mod config;
pub mod db;
pub mod inference;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod repo;
pub mod service;

pub use config::{load_config, ConfigError, InferenceConfig, KlaraConfig, PipelineConfig};
pub use inference::{InferenceError, InferenceRequest, OutputSchema, StructuredInference};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::category::CategoryLabel;
pub use model::extraction::{
    BrainDumpExtraction, Categorized, ExtractedCalendarEvent, ExtractedShoppingItem,
    ExtractedSubtask, ExtractedTask,
};
pub use model::record::{PersistedBrainDump, RecordId, User, UserId};
pub use pipeline::error::{FailureKind, PipelineError};
pub use pipeline::orchestrator::{BrainDumpOrchestrator, OrchestrationMode, OrchestrationResult};
pub use repo::{RepoError, RepoResult};
pub use service::brain_dump_service::{
    BrainDumpInput, BrainDumpOutcome, BrainDumpService, BrainDumpServiceError,
};
pub use service::record_service::RecordService;
pub use service::user_service::UserService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
