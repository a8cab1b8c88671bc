//! BigQuery toolset.
//!
//! Wraps a credential and a [`BigQueryToolConfig`] into the tools the agent
//! can call. The root agent always receives a toolset in
//! [`WriteMode::Blocked`], under which `execute_sql` only runs statements
//! BigQuery classifies as `SELECT`.

mod client;
mod metadata;
mod query;

pub use client::{BigQueryClient, BigQueryError, DryRun, QueryRows};
pub use metadata::{GetDatasetInfoTool, GetTableInfoTool, ListDatasetIdsTool, ListTableIdsTool};
pub use query::ExecuteSqlTool;

use super::{AgentTool, Toolset};
use crate::auth::{ServiceAccountCredentials, TokenProvider};
use crate::config::{BigQueryConfig, DEFAULT_MAX_QUERY_RESULT_ROWS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Tool Configuration
// ============================================================================

/// Whether the toolset may run mutating statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Only `SELECT` statements are executed.
    #[default]
    Blocked,
    /// Any statement is executed.
    Allowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BigQueryToolConfig {
    pub write_mode: WriteMode,
    pub max_query_result_rows: u32,
}

impl BigQueryToolConfig {
    pub fn new(write_mode: WriteMode) -> Self {
        Self {
            write_mode,
            max_query_result_rows: DEFAULT_MAX_QUERY_RESULT_ROWS,
        }
    }

    pub fn with_max_query_result_rows(mut self, rows: u32) -> Self {
        self.max_query_result_rows = rows.max(1);
        self
    }
}

impl Default for BigQueryToolConfig {
    fn default() -> Self {
        Self::new(WriteMode::Blocked)
    }
}

/// The credential the toolset authenticates with.
#[derive(Clone)]
pub struct BigQueryCredentialsConfig {
    pub tokens: Arc<dyn TokenProvider>,
    /// Project billed when a call does not name one.
    pub project_id: Option<String>,
}

impl BigQueryCredentialsConfig {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            tokens,
            project_id: None,
        }
    }

    pub fn from_service_account(credentials: Arc<ServiceAccountCredentials>) -> Self {
        let project_id = credentials.project_id().map(String::from);
        Self {
            tokens: credentials,
            project_id,
        }
    }
}

impl std::fmt::Debug for BigQueryCredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BigQueryCredentialsConfig")
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Toolset
// ============================================================================

/// State shared by every tool in one toolset.
pub(crate) struct BigQueryContext {
    pub client: BigQueryClient,
    pub config: BigQueryToolConfig,
    pub default_project: Option<String>,
}

impl BigQueryContext {
    /// Explicit project, else the toolset default.
    pub fn resolve_project(&self, requested: Option<String>) -> Result<String, String> {
        requested
            .or_else(|| self.default_project.clone())
            .ok_or_else(|| "Missing required parameter: projectId".to_string())
    }
}

pub struct BigQueryToolset {
    context: Arc<BigQueryContext>,
}

impl BigQueryToolset {
    pub fn new(credentials: BigQueryCredentialsConfig, tool_config: BigQueryToolConfig) -> Self {
        Self::with_client(
            BigQueryClient::new(credentials.tokens),
            credentials.project_id,
            tool_config,
        )
    }

    pub fn with_client(
        client: BigQueryClient,
        default_project: Option<String>,
        tool_config: BigQueryToolConfig,
    ) -> Self {
        Self {
            context: Arc::new(BigQueryContext {
                client,
                config: tool_config,
                default_project,
            }),
        }
    }

    pub fn tool_config(&self) -> &BigQueryToolConfig {
        &self.context.config
    }

    pub fn write_mode(&self) -> WriteMode {
        self.context.config.write_mode
    }

    pub fn default_project(&self) -> Option<&str> {
        self.context.default_project.as_deref()
    }
}

impl Toolset for BigQueryToolset {
    fn name(&self) -> &str {
        "bigquery"
    }

    fn tools(&self) -> Vec<Arc<dyn AgentTool>> {
        vec![
            Arc::new(ListDatasetIdsTool::new(self.context.clone())),
            Arc::new(GetDatasetInfoTool::new(self.context.clone())),
            Arc::new(ListTableIdsTool::new(self.context.clone())),
            Arc::new(GetTableInfoTool::new(self.context.clone())),
            Arc::new(ExecuteSqlTool::new(self.context.clone())),
        ]
    }
}

/// Build the agent's toolset: the given credential, writes blocked.
pub fn get_bigquery_toolset(credentials: Arc<ServiceAccountCredentials>) -> BigQueryToolset {
    bigquery_toolset_from_config(credentials, &BigQueryConfig::default())
}

/// Same as [`get_bigquery_toolset`], with endpoint and row limit taken from
/// configuration. The write mode is not configurable here.
pub fn bigquery_toolset_from_config(
    credentials: Arc<ServiceAccountCredentials>,
    config: &BigQueryConfig,
) -> BigQueryToolset {
    let tool_config = BigQueryToolConfig::new(WriteMode::Blocked)
        .with_max_query_result_rows(config.max_query_result_rows);
    let credentials_config = BigQueryCredentialsConfig::from_service_account(credentials);
    let default_project = config
        .default_project
        .clone()
        .or(credentials_config.project_id.clone());

    info!(
        "Building BigQuery toolset (write mode {:?}, max rows {})",
        tool_config.write_mode, tool_config.max_query_result_rows
    );

    BigQueryToolset::with_client(
        BigQueryClient::new(credentials_config.tokens).with_base_url(&config.base_url),
        default_project,
        tool_config,
    )
}
