//! Credential resolver backed by AWS Secrets Manager.

use crate::error::{AppError, AppResult};
use crate::models::SecretRecord;
use aws_config::{Region, SdkConfig};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use std::future::Future;
use tracing::debug;

/// Fetches the database secret for one invocation.
///
/// Implementations must not cache: every call goes to the secret store.
pub trait SecretResolver: Send + Sync {
    fn resolve(
        &self,
        secret_id: &str,
        region: &str,
    ) -> impl Future<Output = AppResult<SecretRecord>> + Send;
}

/// Resolves secrets with `GetSecretValue`.
#[derive(Debug, Clone)]
pub struct SecretsManagerResolver {
    sdk_config: SdkConfig,
}

impl SecretsManagerResolver {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client_for(&self, region: &str) -> aws_sdk_secretsmanager::Client {
        let config = aws_sdk_secretsmanager::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_secretsmanager::Client::from_conf(config)
    }
}

impl SecretResolver for SecretsManagerResolver {
    async fn resolve(&self, secret_id: &str, region: &str) -> AppResult<SecretRecord> {
        debug!(secret_id = %secret_id, region = %region, "Fetching database secret");

        let output = self
            .client_for(region)
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                AppError::credential(format!(
                    "Failed to retrieve secret '{}': {}",
                    secret_id,
                    DisplayErrorContext(&e)
                ))
            })?;

        let secret_string = output.secret_string().ok_or_else(|| {
            AppError::credential(format!("Secret '{}' has no string value", secret_id))
        })?;

        SecretRecord::from_json(secret_string)
    }
}
