//! Connection factory.
//!
//! [`ConnectionFactory`] is the one place the credential lifecycle lives:
//! resolve the secret, sign a fresh token, open a TLS connection with the
//! token as the password. Nothing is cached between calls.
//!
//! [`DirectConnector`] opens connections from a plain URL instead, for local
//! runs against a database that does not use IAM authentication.

use crate::config::{ConfigError, ConnectionSettings};
use crate::credentials::{AuthToken, SecretResolver, TokenSigner};
use crate::db::executor::{PgExecutor, StatementExecutor, timeout_error};
use crate::error::{AppError, AppResult};
use crate::models::SecretRecord;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{ConnectOptions, Connection, PgConnection};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Opens one database connection per call.
pub trait Connector: Send + Sync {
    type Connection: StatementExecutor;

    fn connect(&self) -> impl Future<Output = AppResult<Self::Connection>> + Send;
}

/// Resolved connection parameters for one invocation.
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub database: String,
    pub token: AuthToken,
}

impl ConnectTarget {
    /// TLS-required connect options with the token as the password.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.token.as_str())
            .database(&self.database)
            .ssl_mode(PgSslMode::Require)
    }
}

/// IAM-authenticated connection factory.
#[derive(Debug, Clone)]
pub struct ConnectionFactory<R, S> {
    resolver: R,
    signer: S,
    settings: ConnectionSettings,
}

impl<R, S> ConnectionFactory<R, S>
where
    R: SecretResolver,
    S: TokenSigner,
{
    pub fn new(resolver: R, signer: S, settings: ConnectionSettings) -> Self {
        Self {
            resolver,
            signer,
            settings,
        }
    }

    /// Fetch the database secret for this invocation.
    pub async fn resolve_secret(&self) -> AppResult<SecretRecord> {
        self.resolver
            .resolve(&self.settings.secret_name, &self.settings.region)
            .await
    }

    /// Sign a token for the secret's user against the configured endpoint.
    pub async fn sign_token(&self, secret: &SecretRecord) -> AppResult<AuthToken> {
        self.signer
            .sign(
                &self.settings.region,
                &secret.username,
                &self.settings.host,
                secret.port_or_default(),
            )
            .await
    }

    /// Resolve, then sign, producing everything needed to connect.
    pub async fn prepare(&self) -> AppResult<ConnectTarget> {
        let secret = self.resolve_secret().await?;
        let token = self.sign_token(&secret).await?;
        Ok(ConnectTarget {
            host: self.settings.host.clone(),
            port: secret.port_or_default(),
            database: secret.database_or_default().to_string(),
            username: secret.username,
            token,
        })
    }

    /// Open the connection; refuses a token that has already lapsed.
    pub async fn open_connection(&self, target: &ConnectTarget) -> AppResult<PgExecutor> {
        if target.token.is_expired() {
            return Err(AppError::credential(
                "Auth token expired before the connection was opened",
            ));
        }

        info!(
            host = %target.host,
            port = target.port,
            username = %target.username,
            database = %target.database,
            token_remaining_secs = target.token.remaining().as_secs(),
            "Opening database connection"
        );

        let conn = connect_with_timeout(&target.connect_options(), self.settings.connect_timeout)
            .await?;
        Ok(PgExecutor::new(conn, self.settings.query_timeout))
    }
}

impl<R, S> Connector for ConnectionFactory<R, S>
where
    R: SecretResolver,
    S: TokenSigner,
{
    type Connection = PgExecutor;

    async fn connect(&self) -> AppResult<PgExecutor> {
        let target = self.prepare().await?;
        self.open_connection(&target).await
    }
}

/// Connects from a fixed `postgres://` URL.
#[derive(Debug, Clone)]
pub struct DirectConnector {
    options: PgConnectOptions,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl DirectConnector {
    pub fn from_url(
        url: &str,
        connect_timeout: Duration,
        query_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let options = PgConnectOptions::from_str(url).map_err(|e| ConfigError::Invalid {
            variable: "DATABASE_URL",
            reason: e.to_string(),
        })?;
        Ok(Self {
            options,
            connect_timeout,
            query_timeout,
        })
    }

    pub fn options(&self) -> &PgConnectOptions {
        &self.options
    }
}

impl Connector for DirectConnector {
    type Connection = PgExecutor;

    async fn connect(&self) -> AppResult<PgExecutor> {
        debug!(
            host = %self.options.get_host(),
            port = self.options.get_port(),
            "Opening direct database connection"
        );
        let conn = connect_with_timeout(&self.options, self.connect_timeout).await?;
        Ok(PgExecutor::new(conn, self.query_timeout))
    }
}

async fn connect_with_timeout(
    options: &PgConnectOptions,
    limit: Duration,
) -> AppResult<PgConnection> {
    let options = options.clone().disable_statement_logging();
    match timeout(limit, PgConnection::connect_with(&options)).await {
        Ok(Ok(conn)) => Ok(conn),
        Ok(Err(e)) => Err(AppError::from(e)),
        Err(_) => Err(timeout_error("connection", limit)),
    }
}
