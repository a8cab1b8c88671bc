//! Secret Manager access.
//!
//! Resolves `projects/{project}/secrets/{secret}/versions/{version}` and
//! returns the payload as UTF-8 text. Every call goes to the store; nothing
//! is cached.

pub mod secret_manager;
pub mod types;

pub use secret_manager::{get_secret, SecretManagerClient, SECRET_MANAGER_URL_ENV};
pub use types::{redact_secret, SecretError, SecretVersionName};
