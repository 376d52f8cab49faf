//! Configuration handling for the sample app record handlers.
//!
//! Configuration is parsed once at startup from CLI arguments and environment
//! variables, then handed to the connection factory as a [`ConnectionSettings`]
//! value. Lambda deployments set everything through the environment.

use clap::{Parser, ValueEnum};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Runtime surface the binary serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// API Gateway proxy handler for the records routes
    #[default]
    Api,
    /// Infrastructure lifecycle hook (custom resource) that bootstraps the table
    Hook,
    /// Local HTTP server exposing the records routes
    Serve,
}

impl Mode {
    /// Whether this mode runs inside the Lambda execution environment.
    pub fn is_lambda(&self) -> bool {
        matches!(self, Self::Api | Self::Hook)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Hook => write!(f, "hook"),
            Self::Serve => write!(f, "serve"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: set {variable}")]
    Missing { variable: &'static str },

    #[error("Invalid configuration for {variable}: {reason}")]
    Invalid {
        variable: &'static str,
        reason: String,
    },
}

/// Sample app record handlers.
#[derive(Parser, Debug, Clone)]
#[command(name = "sampleapp-records", version, about)]
pub struct Config {
    /// Runtime mode (api, hook, or serve)
    #[arg(long, value_enum, default_value = "api", env = "SAMPLEAPP_MODE")]
    pub mode: Mode,

    /// AWS region for the secret store and token signing
    #[arg(long, env = "REGION")]
    pub region: Option<String>,

    /// Fallback region supplied by the Lambda runtime
    #[arg(long, env = "AWS_REGION", hide = true)]
    pub aws_region: Option<String>,

    /// Database (or RDS Proxy) endpoint to connect to and sign tokens for
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Fallback endpoint name used by proxy-fronted deployments
    #[arg(long, env = "PROXY_ENDPOINT", hide = true)]
    pub proxy_endpoint: Option<String>,

    /// Secret holding the database username, port, and host
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: Option<String>,

    /// Plain PostgreSQL URL; bypasses the secret store and IAM tokens
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Connection establishment timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS,
        env = "SAMPLEAPP_CONNECT_TIMEOUT"
    )]
    pub connect_timeout: u64,

    /// Statement timeout in seconds
    #[arg(
        long,
        default_value_t = DEFAULT_QUERY_TIMEOUT_SECS,
        env = "SAMPLEAPP_QUERY_TIMEOUT"
    )]
    pub query_timeout: u64,

    /// HTTP host to bind to (only used in serve mode)
    #[arg(long, default_value = DEFAULT_HTTP_HOST, env = "SAMPLEAPP_HTTP_HOST")]
    pub http_host: String,

    /// HTTP port to bind to (only used in serve mode)
    #[arg(long, default_value_t = DEFAULT_HTTP_PORT, env = "SAMPLEAPP_HTTP_PORT")]
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SAMPLEAPP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "SAMPLEAPP_JSON_LOGS")]
    pub json_logs: bool,
}

/// Everything the IAM connection factory needs, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub region: String,
    pub host: String,
    pub secret_name: String,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
}

impl Config {
    /// Build the IAM connection settings, failing on the first missing value.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, ConfigError> {
        let region = first_non_empty(&self.region, &self.aws_region)
            .ok_or(ConfigError::Missing {
                variable: "REGION or AWS_REGION",
            })?;
        let host = first_non_empty(&self.host, &self.proxy_endpoint).ok_or(
            ConfigError::Missing {
                variable: "HOST or PROXY_ENDPOINT",
            },
        )?;
        let secret_name = first_non_empty(&self.secret_name, &None).ok_or(
            ConfigError::Missing {
                variable: "SECRET_NAME",
            },
        )?;

        Ok(ConnectionSettings {
            region,
            host,
            secret_name,
            connect_timeout: self.connect_timeout()?,
            query_timeout: self.query_timeout()?,
        })
    }

    /// Direct database URL, if one was configured.
    pub fn direct_database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn connect_timeout(&self) -> Result<Duration, ConfigError> {
        positive_secs(self.connect_timeout, "SAMPLEAPP_CONNECT_TIMEOUT")
    }

    pub fn query_timeout(&self) -> Result<Duration, ConfigError> {
        positive_secs(self.query_timeout, "SAMPLEAPP_QUERY_TIMEOUT")
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn first_non_empty(primary: &Option<String>, fallback: &Option<String>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn positive_secs(secs: u64, variable: &'static str) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid {
            variable,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
