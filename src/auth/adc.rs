//! Application Default Credentials.
//!
//! Used only to authenticate to Secret Manager. Resolution order:
//! 1. `GOOGLE_OAUTH_ACCESS_TOKEN` (a pre-minted token)
//! 2. `GOOGLE_APPLICATION_CREDENTIALS` (a key file path)
//! 3. the gcloud well-known file (`gcloud auth application-default login`)

use super::service_account::{ServiceAccountCredentials, TokenErrorResponse, TokenResponse};
use super::token::AccessToken;
use super::{AuthError, TokenProvider};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const CREDENTIALS_FILE_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Resolve default credentials for the given scopes.
pub fn application_default_credentials(
    scopes: &[&str],
) -> Result<Arc<dyn TokenProvider>, AuthError> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.is_empty() {
            debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(Arc::new(StaticTokenProvider::new(token)));
        }
    }

    if let Ok(path) = std::env::var(CREDENTIALS_FILE_ENV) {
        if !path.is_empty() {
            debug!("Using credentials file from {}", CREDENTIALS_FILE_ENV);
            return load_credentials_file(Path::new(&path), scopes);
        }
    }

    if let Some(path) = well_known_file().filter(|p| p.exists()) {
        debug!("Using gcloud credentials at {}", path.display());
        return load_credentials_file(&path, scopes);
    }

    Err(AuthError::NoDefaultCredentials)
}

fn well_known_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gcloud").join("application_default_credentials.json"))
}

#[derive(Deserialize)]
struct CredentialsFileType {
    #[serde(rename = "type")]
    kind: String,
}

fn load_credentials_file(path: &Path, scopes: &[&str]) -> Result<Arc<dyn TokenProvider>, AuthError> {
    let content = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |source| AuthError::Parse {
        origin: path.display().to_string(),
        source,
    };

    let file_type: CredentialsFileType = serde_json::from_str(&content).map_err(parse_err)?;
    match file_type.kind.as_str() {
        "service_account" => Ok(Arc::new(ServiceAccountCredentials::from_json(&content, scopes)?)),
        "authorized_user" => {
            let user: AuthorizedUserCredentials =
                serde_json::from_str(&content).map_err(parse_err)?;
            Ok(Arc::new(user))
        }
        other => Err(AuthError::InvalidKeyType(other.to_string())),
    }
}

// ============================================================================
// Static Token
// ============================================================================

/// A token minted elsewhere. Never refreshed.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token, "Bearer", 3600),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        Ok(self.token.clone())
    }
}

// ============================================================================
// Authorized User
// ============================================================================

/// End-user credentials written by `gcloud auth application-default login`.
#[derive(Deserialize)]
pub struct AuthorizedUserCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    #[serde(default = "default_user_token_uri")]
    token_uri: String,
    #[serde(skip)]
    token: RwLock<Option<AccessToken>>,
    #[serde(skip)]
    client: Client,
}

fn default_user_token_uri() -> String {
    super::service_account::DEFAULT_TOKEN_URI.to_string()
}

#[async_trait]
impl TokenProvider for AuthorizedUserCredentials {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let current = self.token.read().clone();
        if let Some(token) = current.filter(|t| !t.is_expired()) {
            return Ok(token);
        }

        let resp = self
            .client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body: TokenErrorResponse = resp.json().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status,
                error: body.error,
                description: body.error_description,
            });
        }

        let body: TokenResponse = resp.json().await?;
        let token = AccessToken::new(body.access_token, body.token_type, body.expires_in);
        *self.token.write() = Some(token.clone());
        Ok(token)
    }
}
