//! Conversation types and state management

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One question/answer thread as it is kept in history.
///
/// The id and creation time are fixed at construction. Messages only ever
/// grow; the title may be replaced once a lookup names the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    id: Uuid,
    title: String,
    #[serde(rename = "date")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl ConversationRecord {
    /// Start a conversation titled after the first query
    pub fn new(title: &str) -> Self {
        Self::with_created_at(title, Utc::now())
    }

    pub fn with_created_at(title: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: title.to_string(),
            created_at,
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn retitle(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn add_user(&mut self, text: &str) {
        self.messages.push(Message {
            role: Role::User,
            text: text.to_string(),
        });
    }

    pub fn add_assistant(&mut self, text: &str) {
        self.messages.push(Message {
            role: Role::Assistant,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_keep_insertion_order() {
        let mut record = ConversationRecord::new("TACO 0014-SF1");
        record.add_user("TACO 0014-SF1");
        record.add_assistant("[Specs] TACO 0014-SF1");

        assert_eq!(record.title(), "TACO 0014-SF1");
        assert_eq!(record.messages().len(), 2);
        assert_eq!(record.messages()[0].role, Role::User);
        assert_eq!(record.messages()[1].role, Role::Assistant);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ConversationRecord::new("a");
        let b = ConversationRecord::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_persisted_layout() {
        let mut record = ConversationRecord::new("WILO Stratos");
        record.add_user("WILO Stratos");

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("date").is_some());
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["text"], "WILO Stratos");

        let back: ConversationRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
