//! Sample App Records Library
//!
//! Serverless handlers for the sample app's `sampleapp_table`: an
//! IAM-authenticated connection lifecycle (secret → token → TLS connection)
//! shared by the records API and the table bootstrap hook.

pub mod config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod transport;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::RecordsApi;
