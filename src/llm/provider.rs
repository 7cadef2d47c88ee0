use async_trait::async_trait;

use super::types::{ChatCompletion, ChatRequest};
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// check if the provider is reachable with the configured credentials
    async fn health_check(&self) -> Result<bool, ApiError>;

    /// chat completion, optionally with tool definitions
    async fn chat(&self, request: ChatRequest, model_id: &str)
        -> Result<ChatCompletion, ApiError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, ApiError>;
}
