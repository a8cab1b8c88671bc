use super::defaults::*;
use serde::{Deserialize, Serialize};

// ============================================================================
// Agent Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub instruction: String,
    pub description: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_AGENT_NAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            instruction: DEFAULT_AGENT_INSTRUCTION.to_string(),
            description: None,
        }
    }
}

// ============================================================================
// Credentials Configuration
// ============================================================================

/// Where the service-account key comes from.
///
/// The key file is always the default. Setting `secretId` switches the
/// provisioner to read the key JSON from Secret Manager instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialsConfig {
    pub key_file: String,
    pub secret_id: Option<String>,
    pub secret_project: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            key_file: DEFAULT_KEY_FILE.to_string(),
            secret_id: None,
            secret_project: None,
        }
    }
}

// ============================================================================
// Secrets Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretsConfig {
    pub project: String,
    pub base_url: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_SECRET_PROJECT.to_string(),
            base_url: DEFAULT_SECRET_MANAGER_URL.to_string(),
        }
    }
}

// ============================================================================
// BigQuery Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BigQueryConfig {
    pub base_url: String,
    pub max_query_result_rows: u32,
    /// Project billed for queries when a tool call does not name one.
    pub default_project: Option<String>,
}

impl Default for BigQueryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BIGQUERY_URL.to_string(),
            max_query_result_rows: DEFAULT_MAX_QUERY_RESULT_ROWS,
            default_project: None,
        }
    }
}

// ============================================================================
// Models Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelsConfig {
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiConfig {
    pub base_url: String,
    /// When unset, requests use the service-account bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_URL.to_string(),
            api_key: None,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoggingLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    pub level: LoggingLevel,
    pub format: LogFormat,
}
