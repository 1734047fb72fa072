//! Streaming event types for an in-flight send

use crate::error::OperationError;
use crate::types::ConversationDetail;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while the backend answers a send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssistantEvent {
    /// Incremental text, appended to the reply
    Delta { text: String },
    /// Complete reply text so far, replaces the reply
    Structured { text: String },
    /// The backend renamed the conversation and/or assigned its id
    TitleUpdated {
        title: String,
        conversation_id: String,
    },
    /// Reply finished. Carries the whole conversation in single-shot mode.
    Completed {
        conversation: Option<ConversationDetail>,
    },
    /// Reply failed
    Failed { error: OperationError },
}

impl AssistantEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { text: text.into() }
    }

    pub fn structured(text: impl Into<String>) -> Self {
        Self::Structured { text: text.into() }
    }

    pub fn title_updated(title: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self::TitleUpdated {
            title: title.into(),
            conversation_id: conversation_id.into(),
        }
    }

    /// Completion marker for incremental mode
    pub fn done() -> Self {
        Self::Completed { conversation: None }
    }

    /// Completion carrying the whole conversation
    pub fn whole(conversation: ConversationDetail) -> Self {
        Self::Completed {
            conversation: Some(conversation),
        }
    }

    pub fn failed(error: OperationError) -> Self {
        Self::Failed { error }
    }

    /// Check if this is a terminal event (Completed or Failed)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssistantEvent::Completed { .. } | AssistantEvent::Failed { .. }
        )
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AssistantEvent::Delta { .. } => "delta",
            AssistantEvent::Structured { .. } => "structured",
            AssistantEvent::TitleUpdated { .. } => "title_updated",
            AssistantEvent::Completed { .. } => "completed",
            AssistantEvent::Failed { .. } => "failed",
        }
    }
}

/// A stream of assistant events
pub type AssistantEventStream = Pin<Box<dyn Stream<Item = AssistantEvent> + Send>>;
