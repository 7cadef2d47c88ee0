use crate::llm::{ChatMessage, Role};

/// The UI-facing conversation: every message, including `system` ones that
/// are hidden when rendered.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages to render; `system` entries are skipped.
    pub fn visible(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect()
    }

    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    /// Replaces the leading system message, or inserts one.
    pub fn set_system_prompt(&mut self, content: &str) {
        let message = ChatMessage::system(content);
        if self.messages.first().is_some_and(|m| m.role == Role::System) {
            self.messages[0] = message;
        } else {
            self.messages.insert(0, message);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn user_turns(&self) -> usize {
        self.messages.iter().filter(|m| m.role == Role::User).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_hides_system_messages_only() {
        let mut conversation = ConversationState::new();
        conversation.replace(vec![
            ChatMessage::system("persona"),
            ChatMessage::assistant("Hello"),
        ]);
        conversation.push(ChatMessage::user("hi"));

        assert_eq!(conversation.len(), 3);
        assert_eq!(
            conversation.visible(),
            vec![ChatMessage::assistant("Hello"), ChatMessage::user("hi")]
        );
        assert_eq!(conversation.user_turns(), 1);
    }

    #[test]
    fn set_system_prompt_replaces_or_inserts_leading_message() {
        let mut conversation = ConversationState::new();
        conversation.push(ChatMessage::assistant("Hello"));

        conversation.set_system_prompt("first");
        assert_eq!(conversation.messages()[0], ChatMessage::system("first"));
        assert_eq!(conversation.len(), 2);

        conversation.set_system_prompt("second");
        assert_eq!(conversation.messages()[0], ChatMessage::system("second"));
        assert_eq!(conversation.len(), 2);
    }
}
