use super::BigQueryContext;
use crate::agents::tools::{
    read_optional_string_param, read_string_param, AgentTool, ToolContext, ToolInfo, ToolResult,
};
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

const CATEGORY: &str = "bigquery";

fn project_property() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "Google Cloud project ID. Defaults to the credential's project."
    })
}

/// List dataset IDs in a project.
pub struct ListDatasetIdsTool {
    context: Arc<BigQueryContext>,
}

impl ListDatasetIdsTool {
    pub(crate) fn new(context: Arc<BigQueryContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl AgentTool for ListDatasetIdsTool {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: "bigquery.list_dataset_ids".to_string(),
            description: "List BigQuery dataset IDs in a Google Cloud project".to_string(),
            category: CATEGORY.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "projectId": project_property() }
            }),
        }
    }

    async fn execute(&self, params: serde_json::Value, _context: &ToolContext) -> Result<ToolResult> {
        let project = self
            .context
            .resolve_project(read_optional_string_param(&params, "projectId"))
            .map_err(anyhow::Error::msg)?;

        match self.context.client.list_dataset_ids(&project).await {
            Ok(ids) => Ok(ToolResult::json(json!(ids))),
            Err(e) => {
                warn!("list_dataset_ids failed for {}: {}", project, e);
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}

/// Fetch dataset metadata.
pub struct GetDatasetInfoTool {
    context: Arc<BigQueryContext>,
}

impl GetDatasetInfoTool {
    pub(crate) fn new(context: Arc<BigQueryContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl AgentTool for GetDatasetInfoTool {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: "bigquery.get_dataset_info".to_string(),
            description: "Get metadata for a BigQuery dataset".to_string(),
            category: CATEGORY.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": project_property(),
                    "datasetId": { "type": "string", "description": "Dataset ID" }
                },
                "required": ["datasetId"]
            }),
        }
    }

    async fn execute(&self, params: serde_json::Value, _context: &ToolContext) -> Result<ToolResult> {
        let dataset = read_string_param(&params, "datasetId").map_err(anyhow::Error::msg)?;
        let project = self
            .context
            .resolve_project(read_optional_string_param(&params, "projectId"))
            .map_err(anyhow::Error::msg)?;

        match self.context.client.get_dataset(&project, &dataset).await {
            Ok(info) => Ok(ToolResult::json(info)),
            Err(e) => {
                warn!("get_dataset_info failed for {}.{}: {}", project, dataset, e);
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}

/// List table IDs in a dataset.
pub struct ListTableIdsTool {
    context: Arc<BigQueryContext>,
}

impl ListTableIdsTool {
    pub(crate) fn new(context: Arc<BigQueryContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl AgentTool for ListTableIdsTool {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: "bigquery.list_table_ids".to_string(),
            description: "List table IDs in a BigQuery dataset".to_string(),
            category: CATEGORY.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": project_property(),
                    "datasetId": { "type": "string", "description": "Dataset ID" }
                },
                "required": ["datasetId"]
            }),
        }
    }

    async fn execute(&self, params: serde_json::Value, _context: &ToolContext) -> Result<ToolResult> {
        let dataset = read_string_param(&params, "datasetId").map_err(anyhow::Error::msg)?;
        let project = self
            .context
            .resolve_project(read_optional_string_param(&params, "projectId"))
            .map_err(anyhow::Error::msg)?;

        match self.context.client.list_table_ids(&project, &dataset).await {
            Ok(ids) => Ok(ToolResult::json(json!(ids))),
            Err(e) => {
                warn!("list_table_ids failed for {}.{}: {}", project, dataset, e);
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}

/// Fetch table metadata, including its schema.
pub struct GetTableInfoTool {
    context: Arc<BigQueryContext>,
}

impl GetTableInfoTool {
    pub(crate) fn new(context: Arc<BigQueryContext>) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl AgentTool for GetTableInfoTool {
    fn info(&self) -> ToolInfo {
        ToolInfo {
            name: "bigquery.get_table_info".to_string(),
            description: "Get metadata and schema for a BigQuery table".to_string(),
            category: CATEGORY.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "projectId": project_property(),
                    "datasetId": { "type": "string", "description": "Dataset ID" },
                    "tableId": { "type": "string", "description": "Table ID" }
                },
                "required": ["datasetId", "tableId"]
            }),
        }
    }

    async fn execute(&self, params: serde_json::Value, _context: &ToolContext) -> Result<ToolResult> {
        let dataset = read_string_param(&params, "datasetId").map_err(anyhow::Error::msg)?;
        let table = read_string_param(&params, "tableId").map_err(anyhow::Error::msg)?;
        let project = self
            .context
            .resolve_project(read_optional_string_param(&params, "projectId"))
            .map_err(anyhow::Error::msg)?;

        match self.context.client.get_table(&project, &dataset, &table).await {
            Ok(info) => Ok(ToolResult::json(info)),
            Err(e) => {
                warn!(
                    "get_table_info failed for {}.{}.{}: {}",
                    project, dataset, table, e
                );
                Ok(ToolResult::error(e.to_string()))
            }
        }
    }
}
