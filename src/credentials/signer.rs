//! RDS IAM authentication token signing.
//!
//! An auth token is a SigV4 query-string presigned `connect` request for the
//! database endpoint, minus the URL scheme. PostgreSQL receives it in the
//! password field. Tokens are valid for fifteen minutes and are never reused
//! across invocations.

use crate::error::{AppError, AppResult};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_sigv4::http_request::{
    SignableBody, SignableRequest, SignatureLocation, SigningSettings, sign,
};
use aws_sigv4::sign::v4;
use std::future::Future;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;
use url::Url;

/// Validity window RDS grants a presigned connect token.
pub const TOKEN_VALIDITY: Duration = Duration::from_secs(900);

/// SigV4 signing name for database connect requests.
const SIGNING_NAME: &str = "rds-db";

/// Short-lived bearer token used in place of a database password.
#[derive(Clone)]
pub struct AuthToken {
    value: String,
    issued_at: Instant,
    valid_for: Duration,
}

impl AuthToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self::with_validity(value, Instant::now(), TOKEN_VALIDITY)
    }

    pub fn with_validity(value: impl Into<String>, issued_at: Instant, valid_for: Duration) -> Self {
        Self {
            value: value.into(),
            issued_at,
            valid_for,
        }
    }

    /// The raw token. Contains sensitive data - never log.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_expired(&self) -> bool {
        self.issued_at.elapsed() >= self.valid_for
    }

    /// Time left before the database stops accepting the token.
    pub fn remaining(&self) -> Duration {
        self.valid_for.saturating_sub(self.issued_at.elapsed())
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &mask_token(&self.value))
            .field("remaining", &self.remaining())
            .finish()
    }
}

fn mask_token(token: &str) -> String {
    match token.find('?') {
        Some(idx) => format!("{}?***", &token[..idx]),
        None => "***".to_string(),
    }
}

/// Produces auth tokens for a database user.
pub trait TokenSigner: Send + Sync {
    fn sign(
        &self,
        region: &str,
        username: &str,
        hostname: &str,
        port: u16,
    ) -> impl Future<Output = AppResult<AuthToken>> + Send;
}

/// Signs RDS connect tokens with credentials from the default provider chain.
#[derive(Debug, Clone)]
pub struct RdsTokenSigner {
    credentials: SharedCredentialsProvider,
}

impl RdsTokenSigner {
    pub fn new(credentials: SharedCredentialsProvider) -> Self {
        Self { credentials }
    }
}

impl TokenSigner for RdsTokenSigner {
    async fn sign(
        &self,
        region: &str,
        username: &str,
        hostname: &str,
        port: u16,
    ) -> AppResult<AuthToken> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| AppError::credential(format!("Failed to load AWS credentials: {}", e)))?;
        let identity = credentials.into();

        let mut settings = SigningSettings::default();
        settings.expires_in = Some(TOKEN_VALIDITY);
        settings.signature_location = SignatureLocation::QueryParams;

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|e| AppError::credential(format!("Invalid signing parameters: {}", e)))?;

        let mut url = connect_url(hostname, port, username)?;
        let signable = SignableRequest::new(
            "GET",
            url.as_str(),
            std::iter::empty(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|e| AppError::credential(format!("Failed to build signing request: {}", e)))?;

        let (instructions, _signature) = sign(signable, &params.into())
            .map_err(|e| AppError::credential(format!("Failed to sign auth token: {}", e)))?
            .into_parts();

        {
            let mut query = url.query_pairs_mut();
            for (name, value) in instructions.params() {
                query.append_pair(name, value);
            }
        }

        debug!(hostname = %hostname, port, username = %username, "Signed database auth token");

        let token = url
            .as_str()
            .strip_prefix("https://")
            .unwrap_or(url.as_str())
            .to_string();
        Ok(AuthToken::new(token))
    }
}

fn connect_url(hostname: &str, port: u16, username: &str) -> AppResult<Url> {
    let mut url = Url::parse(&format!("https://{}:{}/", hostname, port))
        .map_err(|e| AppError::credential(format!("Invalid database host '{}': {}", hostname, e)))?;
    url.set_query(Some(&format!(
        "Action=connect&DBUser={}",
        sigv4_encode(username)
    )));
    Ok(url)
}

/// Form-encode, then spell spaces as `%20` the way SigV4 canonicalizes them.
/// A literal `+` is already `%2B` at this point.
fn sigv4_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
