use std::sync::Arc;

use crate::agents::{ChatAgent, ScoreAgent};
use crate::beliefs::BeliefMap;
use crate::chat::ChatService;
use crate::core::config::{AppPaths, AppSettings, ConfigService};
use crate::core::security::{init_session_token, SessionToken};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::pipeline::{ChatProcess, PromptTemplates};
use crate::rag::{DocumentIndex, SqliteRagStore};

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
///
/// `settings` is the snapshot taken at startup; config edits made through
/// the API apply on the next restart.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: AppSettings,
    pub session_token: SessionToken,
    pub llm: Arc<dyn LlmProvider>,
    pub chat: ChatService,
}

impl AppState {
    /// Loads configuration, connects the OpenAI-compatible provider and
    /// starts the chat session. Logging should already be set up for `paths`.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .settings()
            .map_err(|e| InitializationError::Config(e.into()))?;
        let session_token = init_session_token();

        let llm: Arc<dyn LlmProvider> = Arc::new(
            OpenAiProvider::from_settings(&settings.llm)
                .map_err(|e| InitializationError::Llm(e.into()))?,
        );

        Self::build(paths, config, settings, session_token, llm).await
    }

    /// Wires the agents, vector store and chat service around `llm`.
    pub async fn build(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppSettings,
        session_token: SessionToken,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Arc<Self>, InitializationError> {
        let beliefs = match settings.score_agent.beliefs_path.as_deref() {
            Some(raw) => BeliefMap::load(&paths.resolve(raw)),
            None => BeliefMap::builtin(),
        }
        .map_err(|e| InitializationError::Beliefs(e.into()))?;
        tracing::info!(beliefs = beliefs.len(), "Belief map loaded");

        let store = SqliteRagStore::new(paths.as_ref(), &settings.rag.collection)
            .await
            .map_err(|e| InitializationError::Rag(e.into()))?;
        let index = DocumentIndex::new(Arc::new(store), llm.clone(), &settings.rag)
            .map_err(|e| InitializationError::Rag(e.into()))?;

        let process = ChatProcess::new(
            ScoreAgent::new(llm.clone(), Arc::new(beliefs), &settings.score_agent),
            ChatAgent::new(llm.clone(), &settings.chat_agent),
            index,
            PromptTemplates::from_settings(&settings.pipeline),
            settings.rag.clear_on_reset,
        );
        let chat = ChatService::new(process, settings.faq.clone());
        chat.initialize()
            .await
            .map_err(|e| InitializationError::Chat(e.into()))?;

        Ok(Arc::new(AppState {
            paths,
            config,
            settings,
            session_token,
            llm,
            chat,
        }))
    }
}
