//! Core types for secret access.

use crate::auth::AuthError;
use crate::config::{DEFAULT_SECRET_PROJECT, DEFAULT_SECRET_VERSION};
use thiserror::Error;

// ============================================================================
// Resource Names
// ============================================================================

/// A fully addressed secret version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretVersionName {
    pub project: String,
    pub secret: String,
    pub version: String,
}

impl SecretVersionName {
    /// Address `secret` in the default project at the `latest` version.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            project: DEFAULT_SECRET_PROJECT.to_string(),
            secret: secret.into(),
            version: DEFAULT_SECRET_VERSION.to_string(),
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The resource path used by the REST API.
    pub fn resource_name(&self) -> String {
        format!(
            "projects/{}/secrets/{}/versions/{}",
            self.project, self.secret, self.version
        )
    }
}

impl std::fmt::Display for SecretVersionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.resource_name())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret {name} not found: {message}")]
    NotFound { name: String, message: String },

    #[error("permission denied on {name}: {message}")]
    PermissionDenied { name: String, message: String },

    #[error("invalid secret request for {name}: {message}")]
    InvalidArgument { name: String, message: String },

    /// The version exists but is disabled or destroyed.
    #[error("secret version {name} is not accessible: {message}")]
    FailedPrecondition { name: String, message: String },

    #[error("secret manager returned {status} for {name}: {message}")]
    Api {
        name: String,
        status: String,
        message: String,
    },

    #[error("secret {name} payload is not valid base64")]
    InvalidPayload { name: String },

    #[error("secret {name} payload is not valid UTF-8")]
    InvalidUtf8 { name: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("secret manager request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl SecretError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretError::NotFound { .. })
    }
}

/// Redact a secret value for display (show first 2 and last 2 chars).
pub fn redact_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_pipeline_project_and_latest() {
        let name = SecretVersionName::new("credentials-sa");
        assert_eq!(
            name.resource_name(),
            "projects/porygon-pipelines/secrets/credentials-sa/versions/latest"
        );
    }

    #[test]
    fn overrides_project_and_version() {
        let name = SecretVersionName::new("db-password")
            .with_project("other-project")
            .with_version("7");
        assert_eq!(
            name.to_string(),
            "projects/other-project/secrets/db-password/versions/7"
        );
    }

    #[test]
    fn redact_short_value() {
        assert_eq!(redact_secret("abc"), "***");
    }

    #[test]
    fn redact_long_value() {
        let redacted = redact_secret("sk-live-1234567890");
        assert_eq!(redacted, "sk…90");
    }

    #[test]
    fn redact_multibyte_value() {
        assert_eq!(redact_secret("ééééééééé"), "éé…éé");
    }
}
