//! Transport layer for the record handlers.
//!
//! This module provides the runtime surfaces the handlers are served on:
//! - Lambda: API Gateway proxy events for the records routes
//! - Hook: custom-resource lifecycle events that bootstrap the table
//! - HTTP: a local axum server exposing the records routes

pub mod hook;
pub mod http;
pub mod lambda;

pub use self::http::HttpTransport;
pub use hook::HookTransport;
pub use lambda::LambdaTransport;

use std::future::Future;

/// Error type for runtime-level failures (not request failures).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for transport implementations.
///
/// Transports own the request loop and translate native requests into the
/// shared handler types.
pub trait Transport {
    /// Start the transport and begin handling requests.
    ///
    /// This method should block until the transport is shut down.
    fn run(self) -> impl Future<Output = Result<(), BoxError>>;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}
