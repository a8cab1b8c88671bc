//! Credential provisioning.
//!
//! Loads a service-account key, binds it to the warehouse scope set, and mints
//! a token eagerly so a bad key or an unreachable token endpoint fails before
//! the agent is built.

pub mod adc;
pub mod service_account;
pub mod token;

pub use adc::{application_default_credentials, AuthorizedUserCredentials, StaticTokenProvider};
pub use service_account::{ServiceAccountCredentials, ServiceAccountKey};
pub use token::AccessToken;

use crate::config::Config;
use crate::infra::secrets::{SecretManagerClient, SecretVersionName};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Scopes granted to the agent's credential: warehouse, platform, generative language.
pub const BIGQUERY_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/bigquery",
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/generative-language",
];

/// Scope used for Secret Manager access through default credentials.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to read key file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credentials from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported credential type '{0}'")]
    InvalidKeyType(String),

    #[error("invalid service account key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned {status}: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    TokenEndpoint {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("no application default credentials found")]
    NoDefaultCredentials,
}

/// Anything that can hand out a bearer token for Google APIs.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A non-expired token, minting a new one if needed.
    async fn access_token(&self) -> Result<AccessToken, AuthError>;
}

/// Load the key file bound to [`BIGQUERY_SCOPES`] and mint a token immediately.
pub async fn provision_credentials(path: impl AsRef<Path>) -> Result<ServiceAccountCredentials, AuthError> {
    let credentials = ServiceAccountCredentials::from_file(path, &BIGQUERY_SCOPES)?;
    credentials.refresh().await?;
    Ok(credentials)
}

/// Provision the agent credential from whichever source the config names.
///
/// The key file is used unless `credentials.secretId` is set, in which case
/// the key JSON is read from Secret Manager using default credentials.
pub async fn provision_from_config(config: &Config) -> Result<Arc<ServiceAccountCredentials>> {
    let credentials = match &config.credentials.secret_id {
        Some(secret_id) => {
            let project = config
                .credentials
                .secret_project
                .as_deref()
                .unwrap_or(&config.secrets.project);
            let name = SecretVersionName::new(secret_id).with_project(project);
            info!("Loading service account key from secret {}", name);

            let adc = application_default_credentials(&[CLOUD_PLATFORM_SCOPE])?;
            let client = SecretManagerClient::new(adc).with_base_url(&config.secrets.base_url);
            let key_json = client
                .access_secret_version(&name)
                .await
                .with_context(|| format!("Failed to read service account key from {name}"))?;

            let credentials = ServiceAccountCredentials::from_json(&key_json, &BIGQUERY_SCOPES)?;
            credentials.refresh().await?;
            credentials
        }
        None => {
            info!(
                "Loading service account key from {}",
                config.credentials.key_file
            );
            provision_credentials(&config.credentials.key_file).await?
        }
    };

    Ok(Arc::new(credentials))
}
