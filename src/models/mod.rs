//! Data models for the sample app record handlers.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod record;
pub mod secret;

// Re-export commonly used types
pub use query::{QueryParam, Statement};
pub use record::{FLAG_COUNT, FLAG_NAMES, FlagUpdate, RowRecord, UpdateOutcome};
pub use secret::{DEFAULT_DATABASE, DEFAULT_PORT, SecretRecord};
