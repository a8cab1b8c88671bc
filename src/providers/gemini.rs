use super::*;
use crate::config::DEFAULT_GEMINI_URL;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// How requests to the Generative Language API are authenticated.
pub enum GeminiAuth {
    ApiKey(String),
    Bearer(Arc<dyn TokenProvider>),
}

pub struct GeminiProvider {
    auth: GeminiAuth,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(auth: GeminiAuth, model: String) -> Self {
        Self {
            auth,
            model,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<ToolDeclaration>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

// ============================================================================
// Helper: Convert ProviderMessages to Gemini format
// ============================================================================

fn text_content(role: String, text: String) -> GeminiContent {
    GeminiContent {
        role,
        parts: vec![GeminiPart {
            text: Some(text),
            ..Default::default()
        }],
    }
}

fn build_request(request: ProviderRequest) -> GeminiRequest {
    GeminiRequest {
        contents: request
            .messages
            .into_iter()
            .map(|m| text_content(m.role, m.content))
            .collect(),
        system_instruction: request.system.map(|text| text_content(String::new(), text)),
        tools: request
            .tools
            .filter(|t| !t.is_empty())
            .map(|function_declarations| vec![GeminiTool { function_declarations }]),
    }
}

fn parse_response(api_resp: GeminiResponse) -> ProviderResponse {
    let mut content = Vec::new();

    let parts = api_resp
        .candidates
        .and_then(|c| c.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    for part in parts {
        if let Some(text) = part.text {
            content.push(ContentBlock::Text(text));
        }
        if let Some(call) = part.function_call {
            content.push(ContentBlock::ToolUse {
                id: format!("call-{}", content.len()),
                name: call.name,
                input: call.args,
            });
        }
    }

    ProviderResponse { content }
}

// ============================================================================
// ModelProvider Implementation
// ============================================================================

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn chat(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let body = build_request(request);

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        req = match &self.auth {
            GeminiAuth::ApiKey(key) => req.header("x-goog-api-key", key),
            GeminiAuth::Bearer(tokens) => {
                req.header("Authorization", tokens.access_token().await?.header_value())
            }
        };

        let resp = req.json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, text);
        }

        let api_resp: GeminiResponse = resp.json().await?;
        Ok(parse_response(api_resp))
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn request_carries_system_instruction_and_declarations() {
        let request = ProviderRequest {
            model: "gemini-2.5-flash".to_string(),
            system: Some("Be helpful.".to_string()),
            messages: vec![ProviderMessage::user("How many rows?")],
            tools: Some(vec![ToolDeclaration {
                name: "bigquery.execute_sql".to_string(),
                description: "Run SQL".to_string(),
                parameters: json!({ "type": "object" }),
            }]),
        };

        let body = serde_json::to_value(build_request(request)).unwrap();
        assert_eq!(
            body["systemInstruction"],
            json!({ "parts": [{ "text": "Be helpful." }] })
        );
        assert_eq!(
            body["contents"],
            json!([{ "role": "user", "parts": [{ "text": "How many rows?" }] }])
        );
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "bigquery.execute_sql"
        );
    }

    #[test]
    fn empty_tool_list_is_omitted() {
        let request = ProviderRequest {
            model: "gemini-2.5-flash".to_string(),
            system: None,
            messages: vec![ProviderMessage::user("hi")],
            tools: Some(vec![]),
        };
        let body = serde_json::to_value(build_request(request)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn function_calls_surface_as_tool_use() {
        let api_resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "Let me check." },
                    { "functionCall": { "name": "bigquery.list_dataset_ids", "args": {} } }
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 3 }
        }))
        .unwrap();

        let response = parse_response(api_resp);
        assert_eq!(response.content_text(), "Let me check.");
        let calls: Vec<_> = response.tool_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "bigquery.list_dataset_ids");
    }

    #[test]
    fn missing_candidates_yield_empty_response() {
        let response = parse_response(serde_json::from_value(json!({})).unwrap());
        assert!(response.content.is_empty());
    }
}
