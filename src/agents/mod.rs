pub mod chat;
pub mod score;

pub use chat::ChatAgent;
pub use score::{Assessment, ScoreAgent, BELIEF_TOOL_NAME};
