//! Secret Manager REST client.

use super::types::{SecretError, SecretVersionName};
use crate::auth::{application_default_credentials, TokenProvider, CLOUD_PLATFORM_SCOPE};
use crate::config::DEFAULT_SECRET_MANAGER_URL;
use crate::infra::google_api::{resource_url, ApiError};
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Overrides the Secret Manager endpoint used by [`get_secret`].
pub const SECRET_MANAGER_URL_ENV: &str = "PORYGON_SECRET_MANAGER_URL";

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    #[serde(default)]
    name: Option<String>,
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    #[serde(default)]
    data: String,
}

/// Reads secret versions from Secret Manager.
pub struct SecretManagerClient {
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    client: Client,
}

impl SecretManagerClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            tokens,
            base_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Client authenticated with Application Default Credentials.
    pub fn from_default_credentials() -> Result<Self, SecretError> {
        let tokens = application_default_credentials(&[CLOUD_PLATFORM_SCOPE])?;
        Ok(Self::new(tokens))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Fetch one secret version and decode it as UTF-8 text.
    pub async fn access_secret_version(&self, name: &SecretVersionName) -> Result<String, SecretError> {
        let resource = name.resource_name();
        let access = format!("{}:access", name.version);
        let url = resource_url(
            &self.base_url,
            &[
                "v1",
                "projects",
                &name.project,
                "secrets",
                &name.secret,
                "versions",
                &access,
            ],
        )
        .map_err(|e| SecretError::InvalidArgument {
            name: resource.clone(),
            message: e.to_string(),
        })?;
        let token = self.tokens.access_token().await?;

        debug!("Accessing secret {}", resource);

        let resp = self
            .client
            .get(url)
            .header("Authorization", token.header_value())
            .send()
            .await?;

        if !resp.status().is_success() {
            let http_status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(map_api_error(resource, ApiError::from_body(http_status, &body)));
        }

        let body: AccessSecretVersionResponse = resp.json().await?;
        if let Some(resolved) = &body.name {
            debug!("Resolved {} to {}", resource, resolved);
        }

        decode_payload(&resource, &body.payload.data)
    }

    /// Convenience form taking the three address parts separately.
    pub async fn get_secret(
        &self,
        secret_id: &str,
        project_id: Option<&str>,
        version_id: Option<&str>,
    ) -> Result<String, SecretError> {
        let mut name = SecretVersionName::new(secret_id);
        if let Some(project) = project_id {
            name = name.with_project(project);
        }
        if let Some(version) = version_id {
            name = name.with_version(version);
        }
        self.access_secret_version(&name).await
    }
}

/// Fetch a secret using Application Default Credentials.
///
/// `project_id` defaults to `porygon-pipelines`, `version_id` to `latest`.
/// The endpoint can be redirected with `PORYGON_SECRET_MANAGER_URL`.
pub async fn get_secret(
    secret_id: &str,
    project_id: Option<&str>,
    version_id: Option<&str>,
) -> Result<String, SecretError> {
    let mut client = SecretManagerClient::from_default_credentials()?;
    if let Some(url) = std::env::var(SECRET_MANAGER_URL_ENV).ok().filter(|u| !u.is_empty()) {
        client = client.with_base_url(url);
    }
    client.get_secret(secret_id, project_id, version_id).await
}

fn decode_payload(name: &str, data: &str) -> Result<String, SecretError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|_| SecretError::InvalidPayload {
            name: name.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|_| SecretError::InvalidUtf8 {
        name: name.to_string(),
    })
}

fn map_api_error(name: String, err: ApiError) -> SecretError {
    let message = err.message;
    match err.status.as_str() {
        "NOT_FOUND" => SecretError::NotFound { name, message },
        "PERMISSION_DENIED" => SecretError::PermissionDenied { name, message },
        "INVALID_ARGUMENT" => SecretError::InvalidArgument { name, message },
        "FAILED_PRECONDITION" => SecretError::FailedPrecondition { name, message },
        _ => SecretError::Api {
            name,
            status: err.status,
            message,
        },
    }
}
