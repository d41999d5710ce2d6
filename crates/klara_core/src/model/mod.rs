//! Domain model for brain-dump extraction and persisted records.
//!
//! # Responsibility
//! - Define the transient shapes produced by the interpretation pipeline.
//! - Define the persisted record shapes owned by the storage layer.
//! - Map extraction results into storage creation requests.
//!
//! # Invariants
//! - Dates are `YYYY-MM-DD`, times are 24-hour `HH:MM` on every wire surface.
//! - Extraction results are never mutated after validation.

pub mod category;
pub mod datetime;
pub mod extraction;
pub mod record;
