pub mod tools;

use crate::auth::{provision_from_config, TokenProvider};
use crate::config::Config;
use crate::providers::{ModelProvider, ProviderMessage, ProviderRequest, ToolDeclaration};
use tools::bigquery::bigquery_toolset_from_config;
use tools::{AgentTool, ToolContext, ToolInfo, ToolResult, Toolset};

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// Agent Definition
// ============================================================================

/// A named model + instruction + tool list.
pub struct Agent {
    pub name: String,
    pub model: String,
    pub instruction: String,
    pub description: Option<String>,
    tools: Vec<Arc<dyn AgentTool>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instruction: instruction.into(),
            description: None,
            tools: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach every tool of a toolset.
    pub fn with_toolset(mut self, toolset: &dyn Toolset) -> Self {
        debug!("Attaching toolset '{}' to agent '{}'", toolset.name(), self.name);
        self.tools.extend(toolset.tools());
        self
    }

    pub fn tools(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| t.info()).collect()
    }

    /// Tool list in the form the model expects.
    pub fn tool_declarations(&self) -> Vec<ToolDeclaration> {
        self.tools
            .iter()
            .map(|t| {
                let info = t.info();
                ToolDeclaration {
                    name: info.name,
                    description: info.description,
                    parameters: info.input_schema,
                }
            })
            .collect()
    }

    /// Dispatch one tool call by name.
    pub async fn call_tool(&self, name: &str, params: serde_json::Value) -> Result<ToolResult> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.info().name == name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        let context = ToolContext::new(&self.name);
        info!("Agent '{}' calling tool {}", self.name, name);
        tool.execute(params, &context).await
    }

    /// Build the single-turn request for `message`.
    pub fn request_for(&self, message: &str) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            system: Some(self.instruction.clone()),
            messages: vec![ProviderMessage::user(message)],
            tools: Some(self.tool_declarations()),
        }
    }
}

/// Construct the root agent: provision the credential, build the write-blocked
/// BigQuery toolset, and attach it.
///
/// Returns the credential alongside so callers can reuse it for the model.
pub async fn build_root_agent(config: &Config) -> Result<(Agent, Arc<dyn TokenProvider>)> {
    let credentials = provision_from_config(config).await?;
    let toolset = bigquery_toolset_from_config(credentials.clone(), &config.bigquery);

    let mut agent = Agent::new(&config.agent.name, &config.agent.model, &config.agent.instruction)
        .with_toolset(&toolset);
    if let Some(description) = &config.agent.description {
        agent = agent.with_description(description);
    }

    info!(
        "Built agent '{}' on {} with {} tool(s)",
        agent.name,
        agent.model,
        agent.tools.len()
    );

    let tokens: Arc<dyn TokenProvider> = credentials;
    Ok((agent, tokens))
}

// ============================================================================
// Agent Runtime
// ============================================================================

/// Outcome of one model turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub text: String,
    /// `(tool name, result)` for every call the model requested.
    pub tool_results: Vec<(String, ToolResult)>,
}

/// Send one message to the model and dispatch any tool calls it requests.
///
/// Tool results are returned, not fed back to the model.
pub async fn run_turn(agent: &Agent, provider: &dyn ModelProvider, message: &str) -> Result<TurnOutput> {
    let response = provider.chat(agent.request_for(message)).await?;

    let mut tool_results = Vec::new();
    for (_id, name, input) in response.tool_calls() {
        let result = match agent.call_tool(name, input.clone()).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                ToolResult::error(e.to_string())
            }
        };
        tool_results.push((name.to_string(), result));
    }

    Ok(TurnOutput {
        text: response.content_text(),
        tool_results,
    })
}

/// Run a single message through the root agent (CLI mode).
pub async fn run_single_message(config: &Config, message: &str) -> Result<TurnOutput> {
    let (agent, credentials) = build_root_agent(config).await?;
    info!("Running agent with model: {}", agent.model);

    let provider = crate::providers::resolve_provider(config, &agent.model, credentials)?;
    run_turn(&agent, provider.as_ref(), message).await
}
