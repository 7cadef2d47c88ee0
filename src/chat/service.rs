//! Session-facing chat service.
//!
//! Owns the single shared conversation and drives `ChatProcess` for it. Turns
//! are serialized by the conversation lock.

use std::path::Path;

use serde::Serialize;
use tokio::sync::Mutex;

use super::conversation::ConversationState;
use crate::beliefs::{BeliefMap, CategoryReport, ScoreRound};
use crate::core::config::settings::FaqEntry;
use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::pipeline::ChatProcess;
use crate::rag::IngestReport;

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub reply: String,
    pub messages: Vec<ChatMessage>,
    pub scores: ScoreRound,
}

pub struct ChatService {
    process: ChatProcess,
    conversation: Mutex<ConversationState>,
    faq: Vec<FaqEntry>,
}

impl ChatService {
    pub fn new(process: ChatProcess, faq: Vec<FaqEntry>) -> Self {
        Self {
            process,
            conversation: Mutex::new(ConversationState::new()),
            faq,
        }
    }

    /// Resets the pipeline and loads the chat agent's seeded messages.
    pub async fn initialize(&self) -> Result<(), ApiError> {
        let mut conversation = self.conversation.lock().await;
        self.process.clear().await?;
        conversation.replace(self.process.retrieve_messages().await);
        tracing::info!(messages = conversation.len(), "Chat session initialized");
        Ok(())
    }

    pub async fn ask(&self, input: &str) -> Result<ChatTurn, ApiError> {
        if input.trim().is_empty() {
            return Err(ApiError::BadRequest("Message must not be empty".to_string()));
        }

        let mut conversation = self.conversation.lock().await;
        let mut messages = conversation.messages().to_vec();
        messages.push(ChatMessage::user(input));

        let outcome = self.process.ask(&messages).await?;

        conversation.push(ChatMessage::user(input));
        conversation.push(ChatMessage::assistant(outcome.reply.clone()));
        tracing::info!(
            turns = conversation.user_turns(),
            retrieved = outcome.retrieved,
            "Chat turn complete"
        );

        Ok(ChatTurn {
            reply: outcome.reply,
            messages: conversation.visible(),
            scores: outcome.round,
        })
    }

    pub async fn reset(&self) -> Result<(), ApiError> {
        self.initialize().await
    }

    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, ApiError> {
        self.process.ingest(path).await
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.conversation.lock().await.visible()
    }

    pub async fn turns(&self) -> usize {
        self.conversation.lock().await.user_turns()
    }

    pub async fn scores(&self) -> Vec<ScoreRound> {
        self.process.retrieve_scores().await
    }

    pub fn beliefs(&self) -> &BeliefMap {
        self.process.retrieve_beliefs()
    }

    pub async fn category_report(&self) -> CategoryReport {
        let rounds = self.scores().await;
        CategoryReport::build(self.beliefs(), &rounds)
    }

    pub fn faq(&self) -> &[FaqEntry] {
        &self.faq
    }

    pub async fn ask_faq(&self, key: &str) -> Result<ChatTurn, ApiError> {
        let entry = self
            .faq
            .iter()
            .find(|entry| entry.key == key)
            .ok_or_else(|| ApiError::NotFound(format!("Unknown FAQ entry: {}", key)))?;
        self.ask(&entry.question).await
    }

    pub async fn system_prompt(&self) -> String {
        self.process.chat_agent().system_prompt().await
    }

    /// Overrides the chat agent's system prompt for this and later sessions.
    pub async fn set_system_prompt(&self, content: &str) -> Result<(), ApiError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::BadRequest(
                "System prompt must not be empty".to_string(),
            ));
        }
        let mut conversation = self.conversation.lock().await;
        self.process.chat_agent().set_system_prompt(content).await;
        conversation.set_system_prompt(content);
        tracing::info!("Chat system prompt replaced");
        Ok(())
    }

    pub async fn document_count(&self) -> Result<usize, ApiError> {
        self.process.index().count().await
    }
}
