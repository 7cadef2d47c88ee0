use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{ChatCompletion, ChatRequest, ToolCall};
use crate::core::config::settings::LlmSettings;
use crate::core::errors::ApiError;

/// Provider for any OpenAI-compatible `/v1` API.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "API key not found. Set OPENAI_API_KEY or llm.api_key in secrets.yaml".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ApiError> {
        Self::new(
            &settings.base_url,
            settings.api_key.as_deref().unwrap_or_default(),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "{} returned {}: {}",
                path, status, text
            )));
        }

        res.json().await.map_err(ApiError::upstream)
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallPayload>>,
}

#[derive(Deserialize)]
struct ToolCallPayload {
    function: FunctionPayload,
}

#[derive(Deserialize)]
struct FunctionPayload {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

fn chat_body(request: &ChatRequest, model_id: &str) -> Value {
    let mut body = json!({
        "model": model_id,
        "messages": request.messages,
    });

    let Some(obj) = body.as_object_mut() else {
        return body;
    };
    if let Some(t) = request.temperature {
        obj.insert("temperature".to_string(), json!(t));
    }
    if let Some(t) = request.max_tokens {
        obj.insert("max_tokens".to_string(), json!(t));
    }
    if !request.tools.is_empty() {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|tool| {
                json!({
                    "type": "function",
                    "function": {
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    }
                })
            })
            .collect();
        obj.insert("tools".to_string(), Value::Array(tools));

        let tool_choice = match &request.forced_tool {
            Some(name) => json!({ "type": "function", "function": { "name": name } }),
            None => json!("auto"),
        };
        obj.insert("tool_choice".to_string(), tool_choice);
    }

    body
}

fn parse_completion(payload: Value) -> Result<ChatCompletion, ApiError> {
    let response: CompletionResponse = serde_json::from_value(payload)
        .map_err(|e| ApiError::Upstream(format!("Unexpected completion payload: {}", e)))?;
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Upstream("Completion has no choices".to_string()))?;

    Ok(ChatCompletion {
        content: choice.message.content,
        tool_calls: choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect(),
    })
}

fn parse_embeddings(payload: Value, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    let mut response: EmbeddingResponse = serde_json::from_value(payload)
        .map_err(|e| ApiError::Upstream(format!("Unexpected embedding payload: {}", e)))?;
    if response.data.len() != expected {
        return Err(ApiError::Upstream(format!(
            "Expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|item| item.index);
    Ok(response.data.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.client.get(&url).bearer_auth(&self.api_key).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatCompletion, ApiError> {
        let body = chat_body(&request, model_id);
        tracing::debug!(
            model = model_id,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending chat completion"
        );
        let payload = self.post("/v1/chat/completions", &body).await?;
        parse_completion(payload)
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let body = json!({
            "model": model_id,
            "input": inputs,
        });
        let payload = self.post("/v1/embeddings", &body).await?;
        parse_embeddings(payload, inputs.len())
    }
}
