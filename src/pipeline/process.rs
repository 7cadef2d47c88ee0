//! Per-turn orchestration: score beliefs, retrieve snippets, generate reply.

use std::path::Path;

use serde::Serialize;

use super::templates::PromptTemplates;
use crate::agents::{ChatAgent, ScoreAgent};
use crate::beliefs::{BeliefMap, ScoreRound};
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, Role};
use crate::rag::{DocumentIndex, IngestReport};

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub round: ScoreRound,
    pub belief_prompt: String,
    /// Prompt handed to the chat agent (raw message or RAG-augmented).
    pub prompt: String,
    pub retrieved: usize,
}

pub struct ChatProcess {
    score_agent: ScoreAgent,
    chat_agent: ChatAgent,
    index: DocumentIndex,
    templates: PromptTemplates,
    clear_vectors_on_reset: bool,
}

impl ChatProcess {
    pub fn new(
        score_agent: ScoreAgent,
        chat_agent: ChatAgent,
        index: DocumentIndex,
        templates: PromptTemplates,
        clear_vectors_on_reset: bool,
    ) -> Self {
        Self {
            score_agent,
            chat_agent,
            index,
            templates,
            clear_vectors_on_reset,
        }
    }

    /// Runs one turn. `messages` is the full visible conversation ending with
    /// the new user message.
    pub async fn ask(&self, messages: &[ChatMessage]) -> Result<TurnOutcome, ApiError> {
        let user_query = match messages.last() {
            Some(last) if last.role == Role::User => last.content.as_str(),
            _ => {
                return Err(ApiError::BadRequest(
                    "The last message must come from the user".to_string(),
                ))
            }
        };
        if user_query.trim().is_empty() {
            return Err(ApiError::BadRequest("Message must not be empty".to_string()));
        }

        let assessment = self.score_agent.assess(messages).await?;

        let rag_query = self.templates.render_query(user_query);
        let docs = self.index.similar(&rag_query).await?;
        let prompt = if docs.is_empty() {
            user_query.to_string()
        } else {
            let context = docs
                .iter()
                .map(|doc| doc.chunk.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            self.templates.render_response(user_query, &context)
        };
        tracing::debug!(retrieved = docs.len(), "Composed chat prompt");

        let reply = self
            .chat_agent
            .ask(&prompt, Some(&assessment.belief_prompt))
            .await?;

        Ok(TurnOutcome {
            reply,
            round: assessment.round,
            belief_prompt: assessment.belief_prompt,
            prompt,
            retrieved: docs.len(),
        })
    }

    /// Resets the vector store (if configured), then the score agent, then
    /// the chat agent.
    pub async fn clear(&self) -> Result<(), ApiError> {
        if self.clear_vectors_on_reset {
            self.index.clear().await?;
        }
        self.score_agent.clear().await;
        self.chat_agent.clear().await;
        tracing::info!("Chat process reset");
        Ok(())
    }

    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, ApiError> {
        self.index.ingest(path).await
    }

    pub async fn retrieve_messages(&self) -> Vec<ChatMessage> {
        self.chat_agent.messages().await
    }

    pub async fn retrieve_scores(&self) -> Vec<ScoreRound> {
        self.score_agent.scores().await
    }

    pub fn retrieve_beliefs(&self) -> &BeliefMap {
        self.score_agent.beliefs()
    }

    pub fn chat_agent(&self) -> &ChatAgent {
        &self.chat_agent
    }

    pub fn score_agent(&self) -> &ScoreAgent {
        &self.score_agent
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }
}
