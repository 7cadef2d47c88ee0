pub mod conversation;
pub mod service;

pub use conversation::ConversationState;
pub use service::{ChatService, ChatTurn};
