//! Local conversation model: messages keyed by local ids, with the remote id
//! assigned by the backend.

use parley_api::{ConversationDetail, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Local identifier of a conversation value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Local identifier of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// The conversation bound to the UI.
///
/// `messages` only grows, except that the trailing assistant message is
/// rewritten while a reply streams in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub remote_id: Option<String>,
    pub title: String,
    pub messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation the backend has not seen
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            remote_id: None,
            title: String::new(),
            messages: Vec::new(),
        }
    }

    /// Placeholder shown while a history item's detail is fetched
    pub fn stub(remote_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            remote_id: Some(remote_id.into()),
            title: title.into(),
            messages: Vec::new(),
        }
    }

    /// Assign the backend id. Once set it never changes; a conflicting id is
    /// ignored.
    pub fn set_remote_id(&mut self, remote_id: &str) {
        match &self.remote_id {
            None => self.remote_id = Some(remote_id.to_string()),
            Some(current) if current == remote_id => {}
            Some(current) => {
                tracing::warn!(
                    "Ignoring remote id {} for conversation already bound to {}",
                    remote_id,
                    current
                );
            }
        }
    }

    /// Replace title and messages with the backend's authoritative copy.
    /// Authors other than user and assistant are dropped.
    pub fn replace_from_detail(&mut self, detail: &ConversationDetail) {
        self.set_remote_id(&detail.id);
        self.title = detail.title.clone();
        self.messages = detail
            .messages
            .iter()
            .filter_map(|m| {
                m.role().map(|role| Message {
                    id: MessageId::new(),
                    role,
                    content: m.text(),
                })
            })
            .collect();
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_api::RemoteMessage;

    #[test]
    fn test_remote_id_is_set_once() {
        let mut conv = Conversation::new();
        assert!(conv.remote_id.is_none());

        conv.set_remote_id("r-1");
        conv.set_remote_id("r-2");
        assert_eq!(conv.remote_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn test_replace_from_detail_is_authoritative() {
        let mut conv = Conversation::stub("r-1", "Stub title");
        conv.messages.push(Message::user("stale"));

        let detail = ConversationDetail {
            id: "r-1".into(),
            title: "Real title".into(),
            created_at: Utc::now(),
            messages: vec![
                RemoteMessage {
                    author: parley_api::Author {
                        role: "system".into(),
                    },
                    content: Default::default(),
                },
                RemoteMessage::new(Role::User, "hi"),
                RemoteMessage::new(Role::Assistant, "hello"),
            ],
        };
        conv.replace_from_detail(&detail);

        assert_eq!(conv.title, "Real title");
        let texts: Vec<&str> = conv.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["hi", "hello"]);
        assert_eq!(conv.messages[1].role, Role::Assistant);
    }
}
