//! Session event types

use crate::conversation::ConversationId;
use parley_api::AssistantEvent;
use serde::{Deserialize, Serialize};

/// Change notifications for the presentation layer. Each one means "the
/// snapshot changed in this way"; the current data is always read from
/// `SessionController::snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Authentication state changed
    AuthChanged { authenticated: bool },

    /// The model list was replaced
    ModelsUpdated { count: usize },

    /// The history list was replaced
    HistoryUpdated { count: usize },

    /// A different conversation is bound to the UI
    ConversationActivated { id: ConversationId },

    /// The active conversation's title or messages changed
    ConversationUpdated { id: ConversationId },

    /// An assistant event was applied to the active conversation
    Assistant {
        id: ConversationId,
        event: AssistantEvent,
    },

    /// A send finished, successfully or not; the loading indicator is off
    SendFinished { id: ConversationId, ok: bool },

    /// An operation failed
    Error { message: String },
}
