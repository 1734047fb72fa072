//! Wire types exchanged with the conversation backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Model slug meaning "let the backend choose"
pub const DEFAULT_MODEL: &str = "auto";

/// Message author roles the session keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Map a backend author role. System and tool authors have no local
    /// counterpart and map to `None`.
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A selectable model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Stable identifier sent back on `send_conversation`
    pub slug: String,
    /// Display label
    pub title: String,
}

impl ModelDescriptor {
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
        }
    }
}

/// Lightweight reference to a conversation stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "id")]
    pub remote_id: String,
    pub title: String,
    #[serde(rename = "create_time")]
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(remote_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

/// Response envelope of `list_models`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// Response envelope of `list_history`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub parts: Vec<String>,
}

/// One message as the backend reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub author: Author,
    #[serde(default)]
    pub content: MessageContent,
}

impl RemoteMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            author: Author {
                role: role.as_str().to_string(),
            },
            content: MessageContent {
                parts: vec![text.into()],
            },
        }
    }

    /// The author role, if it is one the session keeps
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.author.role)
    }

    /// Content parts joined with newlines
    pub fn text(&self) -> String {
        self.content.parts.join("\n")
    }
}

/// Full detail of one conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "create_time")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
}

impl ConversationDetail {
    /// The last message authored by the assistant
    pub fn last_assistant_message(&self) -> Option<&RemoteMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role() == Some(Role::Assistant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::parse("tool"), None);
    }

    #[test]
    fn test_decode_conversation_detail() {
        let raw = r#"{
            "id": "c-42",
            "title": "Greetings",
            "create_time": "2024-05-01T12:00:00Z",
            "messages": [
                {"author": {"role": "system"}, "content": {"parts": []}},
                {"author": {"role": "user"}, "content": {"parts": ["hi"]}},
                {"author": {"role": "assistant"}, "content": {"parts": ["hello", "there"]}}
            ]
        }"#;
        let detail: ConversationDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.id, "c-42");
        assert_eq!(detail.messages.len(), 3);
        assert_eq!(detail.messages[0].role(), None);

        let reply = detail.last_assistant_message().unwrap();
        assert_eq!(reply.text(), "hello\nthere");
    }

    #[test]
    fn test_decode_history_page() {
        let raw = r#"{"items": [
            {"id": "b", "title": "Newer", "create_time": "2024-05-02T00:00:00Z"},
            {"id": "a", "title": "Older", "create_time": "2024-05-01T00:00:00Z"}
        ]}"#;
        let page: HistoryPage = serde_json::from_str(raw).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|e| e.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_missing_envelope_fields_default_to_empty() {
        let models: ModelList = serde_json::from_str("{}").unwrap();
        assert!(models.models.is_empty());
        let page: HistoryPage = serde_json::from_str("{}").unwrap();
        assert!(page.items.is_empty());
    }
}
