//! In-memory store for the active conversation, history and models.

use crate::conversation::{Conversation, ConversationId};
use crate::state::SessionState;
use parley_api::{HistoryEntry, ModelDescriptor};
use serde::Serialize;

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub active: Conversation,
    pub history: Vec<HistoryEntry>,
    pub models: Vec<ModelDescriptor>,
}

impl SessionSnapshot {
    /// Whether a reply is streaming into the active conversation
    pub fn is_loading(&self) -> bool {
        self.state.is_loading(self.active.id)
    }
}

/// Owner of all session data. The controller mutates it only through
/// these methods while holding its lock.
#[derive(Debug, Default)]
pub struct ConversationStore {
    active: Conversation,
    history: Vec<HistoryEntry>,
    models: Vec<ModelDescriptor>,
    state: SessionState,
}

impl ConversationStore {
    pub fn new(state: SessionState) -> Self {
        Self {
            active: Conversation::new(),
            history: Vec::new(),
            models: Vec::new(),
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    pub fn active(&self) -> &Conversation {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut Conversation {
        &mut self.active
    }

    /// Whether `id` is still the conversation bound to the UI
    pub fn is_active(&self, id: ConversationId) -> bool {
        self.active.id == id
    }

    /// Bind `conversation` to the UI, discarding the previous one
    pub fn activate(&mut self, conversation: Conversation) {
        let previous = std::mem::replace(&mut self.active, conversation);
        self.state.clear_pending_send(previous.id);
    }

    /// Bind a fresh empty conversation and forget the history selection
    pub fn reset_active(&mut self) -> ConversationId {
        self.activate(Conversation::new());
        self.state.selected_history = None;
        self.active.id
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn replace_models(&mut self, models: Vec<ModelDescriptor>) {
        self.models = models;
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Replace the history list wholesale, keeping backend order
    pub fn replace_history(&mut self, history: Vec<HistoryEntry>) {
        self.history = history;
    }

    /// Title of a history entry, if listed
    pub fn history_title(&self, remote_id: &str) -> Option<&str> {
        self.history
            .iter()
            .find(|e| e.remote_id == remote_id)
            .map(|e| e.title.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            active: self.active.clone(),
            history: self.history.clone(),
            models: self.models.clone(),
        }
    }
}
