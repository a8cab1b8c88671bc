pub mod bigquery;
mod common;

pub use common::*;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Tool System
// ============================================================================

/// Information about an available tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub category: String,
    pub input_schema: serde_json::Value,
}

/// Result from executing a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            json: None,
            is_error: false,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self {
            text: None,
            json: Some(value),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: Some(message.into()),
            json: None,
            is_error: true,
        }
    }

    /// Render as the object handed back to the model.
    pub fn to_response(&self) -> serde_json::Value {
        if self.is_error {
            return serde_json::json!({
                "status": "ERROR",
                "errorDetails": self.text.clone().unwrap_or_default(),
            });
        }
        match (&self.json, &self.text) {
            (Some(serde_json::Value::Object(obj)), _) => serde_json::Value::Object(obj.clone()),
            (Some(value), _) => serde_json::json!({ "result": value }),
            (None, Some(text)) => serde_json::json!({ "result": text }),
            (None, None) => serde_json::json!({}),
        }
    }
}

/// Trait for tool execution.
#[async_trait::async_trait]
pub trait AgentTool: Send + Sync {
    fn info(&self) -> ToolInfo;
    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolResult>;
}

/// A group of tools handed to an agent as a unit.
pub trait Toolset: Send + Sync {
    fn name(&self) -> &str;
    fn tools(&self) -> Vec<Arc<dyn AgentTool>>;
}

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub agent_name: String,
    pub invocation_id: String,
}

impl ToolContext {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            invocation_id: format!("inv-{}", chrono::Utc::now().timestamp_millis()),
        }
    }
}
