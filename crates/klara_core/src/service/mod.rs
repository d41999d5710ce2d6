//! Use-case services.
//!
//! # Responsibility
//! - Compose the interpretation pipeline with persistence.
//! - Keep the CLI decoupled from repositories and SQL.

pub mod brain_dump_service;
pub mod record_service;
pub mod user_service;
