//! Error types for the sample app record handlers.
//!
//! Every failure on the request path is one of three kinds, mapped to an HTTP
//! status only at the handler boundary (see [`crate::handlers::Route`]).

use serde::Serialize;
use thiserror::Error;

/// Discriminant of [`AppError`], used in JSON error bodies and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Credential,
    Query,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Credential => "credential",
            Self::Query => "query",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad or missing request input.
    #[error("{message}")]
    Validation { message: String },

    /// Secret-store lookup, token signing, or token expiry failure.
    #[error("Credential error: {message}")]
    Credential { message: String },

    #[error("Query error: {message}")]
    Query {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
    },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a credential error.
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Credential { .. } => ErrorKind::Credential,
            Self::Query { .. } => ErrorKind::Query,
        }
    }

    /// SQLSTATE reported by the server, if any.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors to AppError.
///
/// Connection establishment and statement execution both surface as
/// [`AppError::Query`]; the server's SQLSTATE is kept when present.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                AppError::query(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => AppError::query("No rows returned", None),
            sqlx::Error::Io(io_err) => AppError::query(format!("I/O error: {}", io_err), None),
            sqlx::Error::Tls(tls_err) => AppError::query(format!("TLS error: {}", tls_err), None),
            sqlx::Error::Protocol(msg) => {
                AppError::query(format!("Protocol error: {}", msg), None)
            }
            sqlx::Error::ColumnNotFound(col) => {
                AppError::query(format!("Column not found: {}", col), None)
            }
            sqlx::Error::ColumnDecode { index, source } => {
                AppError::query(format!("Failed to decode column {}: {}", index, source), None)
            }
            other => AppError::query(other.to_string(), None),
        }
    }
}

/// Result type alias for request-path operations.
pub type AppResult<T> = Result<T, AppError>;
