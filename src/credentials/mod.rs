//! Database credential acquisition.
//!
//! - Resolver: reads the database secret from the secret store
//! - Signer: issues the short-lived IAM token used as the password

pub mod resolver;
pub mod signer;

pub use resolver::{SecretResolver, SecretsManagerResolver};
pub use signer::{AuthToken, RdsTokenSigner, TOKEN_VALIDITY, TokenSigner};
