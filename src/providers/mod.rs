mod gemini;

pub use gemini::{GeminiAuth, GeminiProvider};

use crate::auth::TokenProvider;
use crate::config::Config;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Provider Types
// ============================================================================

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

impl ProviderMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: text.into(),
        }
    }
}

/// A function the model may call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A request to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<ProviderMessage>,
    pub tools: Option<Vec<ToolDeclaration>>,
}

/// A response from a model provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: Vec<ContentBlock>,
}

impl ProviderResponse {
    pub fn content_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn tool_calls(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value)> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => Some((id.as_str(), name.as_str(), input)),
            _ => None,
        })
    }
}

/// A content block in a response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ContentBlock {
    Text(String),
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
}

// ============================================================================
// Provider Trait
// ============================================================================

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, request: ProviderRequest) -> Result<ProviderResponse>;
    fn name(&self) -> &str;
}

// ============================================================================
// Provider Resolution
// ============================================================================

/// Pick the provider for `model`.
///
/// Gemini requests use the configured API key when present, otherwise the
/// agent's own credential (which carries the generative-language scope).
pub fn resolve_provider(
    config: &Config,
    model: &str,
    credentials: Arc<dyn TokenProvider>,
) -> Result<Box<dyn ModelProvider>> {
    let lower = model.to_lowercase();
    if !lower.starts_with("gemini") {
        anyhow::bail!("No provider found for model: {}", model);
    }

    let auth = match &config.models.gemini.api_key {
        Some(key) => GeminiAuth::ApiKey(key.clone()),
        None => GeminiAuth::Bearer(credentials),
    };

    Ok(Box::new(
        GeminiProvider::new(auth, model.to_string()).with_base_url(&config.models.gemini.base_url),
    ))
}
