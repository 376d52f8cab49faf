//! Database secret record.
//!
//! The secret store holds a JSON document describing the database cluster and
//! its master user. Only `username` is required to connect; the rest is kept
//! for logging and for the connection defaults.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Deserializer};

/// Default PostgreSQL port when the secret omits one.
pub const DEFAULT_PORT: u16 = 5432;

/// Default database when the secret omits `dbname`.
pub const DEFAULT_DATABASE: &str = "postgres";

/// Structured database secret, parsed verbatim from the secret string.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct SecretRecord {
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    pub username: String,
    /// Contains sensitive data - never log
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<u16>,
    #[serde(default, rename = "masterArn", alias = "masterarn")]
    pub master_arn: Option<String>,
    #[serde(default, rename = "instanceIdentifier", alias = "dbInstanceIdentifier")]
    pub instance_identifier: Option<String>,
    #[serde(default, rename = "clusterIdentifier", alias = "dbClusterIdentifier")]
    pub cluster_identifier: Option<String>,
}

impl SecretRecord {
    /// Parse a secret string into a record.
    pub fn from_json(secret_string: &str) -> AppResult<Self> {
        let record: SecretRecord = serde_json::from_str(secret_string)
            .map_err(|e| AppError::credential(format!("Malformed database secret: {}", e)))?;
        if record.username.trim().is_empty() {
            return Err(AppError::credential("Database secret has an empty username"));
        }
        Ok(record)
    }

    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn database_or_default(&self) -> &str {
        self.dbname
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DATABASE)
    }
}

impl std::fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretRecord")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("dbname", &self.dbname)
            .field("port", &self.port)
            .field("master_arn", &self.master_arn)
            .field("instance_identifier", &self.instance_identifier)
            .field("cluster_identifier", &self.cluster_identifier)
            .finish()
    }
}

/// Accept the port as a JSON number or a numeric string.
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPort {
        Number(u16),
        Text(String),
    }

    match Option::<RawPort>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawPort::Number(port)) => Ok(Some(port)),
        Some(RawPort::Text(text)) => text
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {:?}", text))),
    }
}
