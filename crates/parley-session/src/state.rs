//! Session-wide state: authentication, model selection, in-flight work.

use crate::conversation::{ConversationId, MessageId};
use parley_api::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Authentication as last observed by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No check has completed yet. Remote operations are refused.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated,
}

impl AuthState {
    pub fn from_check(authenticated: bool) -> Self {
        if authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated)
    }
}

/// An operation that failed for lack of authentication and may be retried
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingIntent {
    FetchModels,
    FetchHistory,
    LoadConversation { remote_id: String },
    Send {
        conversation: ConversationId,
        text: String,
        /// Assistant message left half-written by the failed attempt
        partial_reply: Option<MessageId>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub auth: AuthState,
    pub selected_model: String,
    pub pending_intents: BTreeSet<PendingIntent>,
    /// Conversations with a reply currently streaming
    pub in_flight: HashSet<ConversationId>,
    /// Loaded conversations whose detail has not arrived yet
    pub awaiting_detail: HashSet<ConversationId>,
    /// History item the active conversation was loaded from
    pub selected_history: Option<String>,
    pub last_error: Option<String>,
    pub debug: bool,
    pub debug_log: VecDeque<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

impl SessionState {
    /// Maximum number of lines kept in the debug log.
    pub const DEBUG_LOG_CAPACITY: usize = 200;

    pub fn new(selected_model: impl Into<String>) -> Self {
        Self {
            auth: AuthState::Unknown,
            selected_model: selected_model.into(),
            pending_intents: BTreeSet::new(),
            in_flight: HashSet::new(),
            awaiting_detail: HashSet::new(),
            selected_history: None,
            last_error: None,
            debug: false,
            debug_log: VecDeque::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Whether a reply is streaming into conversation `id`
    pub fn is_loading(&self, id: ConversationId) -> bool {
        self.in_flight.contains(&id)
    }

    /// Whether conversation `id` is a stub still waiting for its detail
    pub fn is_awaiting_detail(&self, id: ConversationId) -> bool {
        self.awaiting_detail.contains(&id)
    }

    /// The failed send recorded for `conversation`, if any
    pub fn pending_send(&self, conversation: ConversationId) -> Option<&str> {
        self.pending_send_intent(conversation).map(|(text, _)| text)
    }

    /// The partial reply left by the failed send on `conversation`, if any
    pub fn pending_partial_reply(&self, conversation: ConversationId) -> Option<MessageId> {
        self.pending_send_intent(conversation).and_then(|(_, partial)| partial)
    }

    fn pending_send_intent(
        &self,
        conversation: ConversationId,
    ) -> Option<(&str, Option<MessageId>)> {
        self.pending_intents.iter().find_map(|intent| match intent {
            PendingIntent::Send {
                conversation: c,
                text,
                partial_reply,
            } if *c == conversation => Some((text.as_str(), *partial_reply)),
            _ => None,
        })
    }

    /// Drop every send intent recorded for `conversation`
    pub fn clear_pending_send(&mut self, conversation: ConversationId) {
        self.pending_intents.retain(
            |intent| !matches!(intent, PendingIntent::Send { conversation: c, .. } if *c == conversation),
        );
    }

    /// Append a line to the debug log when debug mode is on
    pub fn record_debug(&mut self, line: impl Into<String>) {
        if !self.debug {
            return;
        }
        if self.debug_log.len() >= Self::DEBUG_LOG_CAPACITY {
            self.debug_log.pop_front();
        }
        self.debug_log.push_back(line.into());
    }
}
