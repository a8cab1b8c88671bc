use super::{BigQueryContext, WriteMode};
use crate::agents::tools::{
    read_optional_string_param, read_string_param, AgentTool, ToolContext, ToolInfo, ToolResult,
};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const READ_ONLY_REJECTION: &str = "Read-only mode only supports SELECT statements.";

/// Run a GoogleSQL statement.
///
/// With writes blocked the statement is dry-run first and refused unless
/// BigQuery reports it as a `SELECT`. Scripts and DDL are refused as well.
pub struct ExecuteSqlTool {
    context: Arc<BigQueryContext>,
}

impl ExecuteSqlTool {
    pub(crate) fn new(context: Arc<BigQueryContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl AgentTool for ExecuteSqlTool {
    fn info(&self) -> ToolInfo {
        let description = match self.context.config.write_mode {
            WriteMode::Blocked => "Run a read-only GoogleSQL SELECT query in BigQuery",
            WriteMode::Allowed => "Run a GoogleSQL statement in BigQuery",
        };
        ToolInfo {
            name: "bigquery.execute_sql".to_string(),
            description: description.to_string(),
            category: "bigquery".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": {
                        "type": "string",
                        "description": "Project the query job runs in. Defaults to the credential's project."
                    },
                    "query": { "type": "string", "description": "GoogleSQL statement" }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, params: serde_json::Value, context: &ToolContext) -> Result<ToolResult> {
        let sql = read_string_param(&params, "query").map_err(anyhow::Error::msg)?;
        let project = self
            .context
            .resolve_project(read_optional_string_param(&params, "projectId"))
            .map_err(anyhow::Error::msg)?;
        let client = &self.context.client;

        if self.context.config.write_mode == WriteMode::Blocked {
            let dry_run = match client.dry_run(&project, &sql).await {
                Ok(d) => d,
                Err(e) => return Ok(ToolResult::error(e.to_string())),
            };
            if dry_run.statement_type.as_deref() != Some("SELECT") {
                warn!(
                    "Refused {} statement from {} ({})",
                    dry_run.statement_type.as_deref().unwrap_or("unknown"),
                    context.agent_name,
                    context.invocation_id
                );
                return Ok(ToolResult::error(READ_ONLY_REJECTION));
            }
            debug!(
                "Dry run accepted SELECT in {} ({} bytes)",
                project,
                dry_run.total_bytes_processed.unwrap_or(0)
            );
        }

        let max_rows = self.context.config.max_query_result_rows;
        match client.query(&project, &sql, max_rows).await {
            Ok(result) => {
                let returned = result.rows.len() as u64;
                let truncated = result.total_rows.map(|t| t > returned).unwrap_or(false)
                    || (result.total_rows.is_none() && returned >= max_rows as u64);
                info!("Query in {} returned {} row(s)", project, returned);

                let mut response = json!({ "status": "SUCCESS", "rows": result.rows });
                if truncated {
                    response["resultIsLikelyTruncated"] = json!(true);
                }
                Ok(ToolResult::json(response))
            }
            Err(e) => Ok(ToolResult::error(e.to_string())),
        }
    }
}
