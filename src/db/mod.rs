//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection factory (secret → token → TLS connection)
//! - Statement execution on the invocation's single connection
//! - Fixed SQL statements for `sampleapp_table`
//! - Parameter binding

pub mod connector;
pub mod executor;
pub mod params;
pub mod statements;

pub use connector::{ConnectTarget, ConnectionFactory, Connector, DirectConnector};
pub use executor::{PgExecutor, StatementExecutor};
