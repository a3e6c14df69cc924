use serde::{Deserialize, Serialize};

/// Who authored a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Accepted on input so callers can seed instructions; never appended by the core
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, ordered log of the messages exchanged in one session.
///
/// Not synchronized: the turn orchestrator holds the session lock while it
/// reads or appends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a persisted message array, keeping its order
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Full ordered history, oldest first
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_arrival_order() {
        let mut store = ConversationStore::new();
        store.append(Message::user("first"));
        store.append(Message::assistant("second"));
        store.append(Message::user("third"));

        let contents: Vec<&str> = store.history().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn last_user_message_skips_assistant_turns() {
        let mut store = ConversationStore::new();
        store.append(Message::user("an app for reviewers"));
        store.append(Message::assistant("Who are the users?"));
        assert_eq!(
            store.last_user_message().map(|m| m.content.as_str()),
            Some("an app for reviewers")
        );
    }

    #[test]
    fn clear_empties_the_log() {
        let mut store = ConversationStore::from_messages(vec![Message::user("hello")]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.last_user_message().is_none());
    }

    #[test]
    fn store_serializes_as_plain_message_array() {
        let store = ConversationStore::from_messages(vec![
            Message::user("hi"),
            Message::assistant("hello"),
        ]);
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ])
        );

        let back: ConversationStore = serde_json::from_value(json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn system_role_is_accepted_on_input() {
        let msg: Message = serde_json::from_str(r#"{"role": "system", "content": "be brief"}"#).unwrap();
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.role.to_string(), "system");
    }

    #[test]
    fn unknown_role_fails() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"role": "tool", "content": "x"}"#);
        assert!(result.is_err());
    }
}
