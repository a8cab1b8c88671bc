/// Default configuration constants used across the system.

/// Service-account key file, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "config/credentials/service_account.json";

/// Project holding the secrets read by the secret accessor.
pub const DEFAULT_SECRET_PROJECT: &str = "porygon-pipelines";

/// Secret version resolved when none is given.
pub const DEFAULT_SECRET_VERSION: &str = "latest";

/// Default agent name.
pub const DEFAULT_AGENT_NAME: &str = "root_agent";

/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default agent instruction.
pub const DEFAULT_AGENT_INSTRUCTION: &str =
    "You are a helpful AI assistant designed to provide accurate and useful information.";

/// Secret Manager REST endpoint.
pub const DEFAULT_SECRET_MANAGER_URL: &str = "https://secretmanager.googleapis.com";

/// BigQuery REST endpoint.
pub const DEFAULT_BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Generative Language REST endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Maximum rows returned by a single `execute_sql` call.
pub const DEFAULT_MAX_QUERY_RESULT_ROWS: u32 = 50;
