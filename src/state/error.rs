use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to load belief map: {0}")]
    Beliefs(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Failed to initialize vector store: {0}")]
    Rag(#[source] anyhow::Error),

    #[error("Failed to start chat session: {0}")]
    Chat(#[source] anyhow::Error),
}
