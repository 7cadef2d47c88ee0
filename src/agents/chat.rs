use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::config::settings::ChatAgentSettings;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, Role};

struct ChatAgentState {
    system_prompt: String,
    history: Vec<ChatMessage>,
}

/// Reply-generating agent with its own running history.
///
/// The history starts as `[system_prompt, greeting?]` and grows by one
/// user/assistant pair per successful `ask`.
pub struct ChatAgent {
    llm: Arc<dyn LlmProvider>,
    model: String,
    greeting: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
    state: Mutex<ChatAgentState>,
}

impl ChatAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: &ChatAgentSettings) -> Self {
        let greeting = settings.greeting.clone();
        let history = seed(&settings.system_prompt, greeting.as_deref());
        Self {
            llm,
            model: settings.model.clone(),
            greeting,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            state: Mutex::new(ChatAgentState {
                system_prompt: settings.system_prompt.clone(),
                history,
            }),
        }
    }

    /// Sends `prompt` with the belief prompt as a transient system note.
    ///
    /// Only the prompt and the reply are kept in the running history, and only
    /// once the model has answered.
    pub async fn ask(&self, prompt: &str, belief_prompt: Option<&str>) -> Result<String, ApiError> {
        let mut state = self.state.lock().await;

        let mut messages = state.history.clone();
        if let Some(note) = belief_prompt.map(str::trim).filter(|n| !n.is_empty()) {
            messages.push(ChatMessage::system(note));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);
        let completion = self.llm.chat(request, &self.model).await?;

        let reply = completion
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::Upstream("Chat model returned an empty reply".to_string()))?;

        state.history.push(ChatMessage::user(prompt));
        state.history.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }

    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let history = seed(&state.system_prompt, self.greeting.as_deref());
        state.history = history;
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.lock().await.history.clone()
    }

    pub async fn system_prompt(&self) -> String {
        self.state.lock().await.system_prompt.clone()
    }

    /// Replaces the leading system message; later resets keep the new prompt.
    pub async fn set_system_prompt(&self, content: &str) {
        let mut state = self.state.lock().await;
        state.system_prompt = content.to_string();
        let has_system = state
            .history
            .first()
            .is_some_and(|first| first.role == Role::System);
        if has_system {
            state.history[0] = ChatMessage::system(content);
        } else {
            state.history.insert(0, ChatMessage::system(content));
        }
    }
}

fn seed(system_prompt: &str, greeting: Option<&str>) -> Vec<ChatMessage> {
    let mut history = vec![ChatMessage::system(system_prompt)];
    if let Some(greeting) = greeting {
        history.push(ChatMessage::assistant(greeting));
    }
    history
}
