//! Service-account credentials.
//!
//! Exchanges a signed JWT assertion for an OAuth access token at the key's
//! `token_uri`. The signing key never leaves this module and is redacted from
//! `Debug` output.

use super::token::AccessToken;
use super::{AuthError, TokenProvider};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::RwLock;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Grant type for the JWT-bearer token exchange.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// ============================================================================
// Key File
// ============================================================================

/// The fields of a service-account JSON key that token minting needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub private_key: String,
    pub client_email: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let key: Self = serde_json::from_str(json).map_err(|source| AuthError::Parse {
            origin: "inline key".to_string(),
            source,
        })?;
        key.check_type()?;
        Ok(key)
    }

    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|source| AuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let key: Self = serde_json::from_str(&content).map_err(|source| AuthError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        key.check_type()?;
        Ok(key)
    }

    fn check_type(&self) -> Result<(), AuthError> {
        if self.key_type != "service_account" {
            return Err(AuthError::InvalidKeyType(self.key_type.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

// ============================================================================
// Token Exchange Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenErrorResponse {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

// ============================================================================
// Credentials
// ============================================================================

/// A service-account identity bound to a fixed scope set.
pub struct ServiceAccountCredentials {
    key: ServiceAccountKey,
    key_path: Option<PathBuf>,
    scopes: Vec<String>,
    client: Client,
    token: RwLock<Option<AccessToken>>,
}

impl ServiceAccountCredentials {
    pub fn new(key: ServiceAccountKey, scopes: &[&str]) -> Self {
        Self {
            key,
            key_path: None,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            client: Client::new(),
            token: RwLock::new(None),
        }
    }

    /// Load credentials from a service-account key file. Does not mint a token.
    pub fn from_file(path: impl AsRef<Path>, scopes: &[&str]) -> Result<Self, AuthError> {
        let path = path.as_ref();
        let key = ServiceAccountKey::from_file(path)?;
        debug!(
            "Loaded service account {} from {}",
            key.client_email,
            path.display()
        );
        let mut credentials = Self::new(key, scopes);
        credentials.key_path = Some(path.to_path_buf());
        Ok(credentials)
    }

    /// Load credentials from key JSON held in memory (e.g. a fetched secret).
    pub fn from_json(json: &str, scopes: &[&str]) -> Result<Self, AuthError> {
        Ok(Self::new(ServiceAccountKey::from_json(json)?, scopes))
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.key.project_id.as_deref()
    }

    pub fn key_path(&self) -> Option<&Path> {
        self.key_path.as_deref()
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The most recently minted token, if any.
    pub fn token(&self) -> Option<AccessToken> {
        self.token.read().clone()
    }

    /// Whether a non-expired token is currently held.
    pub fn is_valid(&self) -> bool {
        self.token
            .read()
            .as_ref()
            .map(|t| !t.is_expired())
            .unwrap_or(false)
    }

    /// Build and sign the JWT assertion sent to the token endpoint.
    pub(crate) fn sign_assertion(&self) -> Result<String, AuthError> {
        let iat = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: self.scopes.join(" "),
            aud: self.key.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(AuthError::InvalidKey)?;
        jsonwebtoken::encode(&header, &claims, &key).map_err(AuthError::InvalidKey)
    }

    /// Mint a fresh access token, replacing any held one.
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.sign_assertion()?;

        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
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

        info!(
            "Minted access token for {} (expires in {}s)",
            self.key.client_email,
            token.remaining_secs()
        );

        *self.token.write() = Some(token.clone());
        Ok(token)
    }
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.key.client_email)
            .field("key_path", &self.key_path)
            .field("scopes", &self.scopes)
            .field("token", &*self.token.read())
            .finish()
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountCredentials {
    async fn access_token(&self) -> Result<AccessToken, AuthError> {
        let current = self.token.read().clone();
        if let Some(token) = current.filter(|t| !t.is_expired()) {
            return Ok(token);
        }
        self.refresh().await
    }
}
