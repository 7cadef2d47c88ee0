//! In-process provider used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::provider::LlmProvider;
use super::types::{ChatCompletion, ChatRequest};
use crate::core::errors::ApiError;

const EMBEDDING_DIMS: usize = 64;

/// Replays queued completions in order and records every request it sees.
/// Embeddings are a bag-of-words hash so texts sharing words score as similar.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ChatCompletion, String>>>,
    requests: Mutex<Vec<(String, ChatRequest)>>,
    embedded: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, completion: ChatCompletion) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(completion));
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }

    /// Every text passed to `embed`, in call order.
    pub fn embedded(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }
}

pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIMS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
    {
        let bucket = word
            .to_lowercase()
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
            % EMBEDDING_DIMS;
        vector[bucket] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool, ApiError> {
        Ok(true)
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<ChatCompletion, ApiError> {
        self.requests
            .lock()
            .unwrap()
            .push((model_id.to_string(), request));
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(ApiError::Upstream(message)),
            None => Ok(ChatCompletion::default()),
        }
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embedded.lock().unwrap().extend(inputs.iter().cloned());
        Ok(inputs.iter().map(|text| embed_text(text)).collect())
    }
}
