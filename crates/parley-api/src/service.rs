//! Collaborator traits the session controller talks to

use crate::error::Result;
use crate::stream::AssistantEventStream;
use crate::types::{ConversationDetail, HistoryEntry, ModelDescriptor};
use async_trait::async_trait;

/// The remote conversational backend.
///
/// Implementations own the transport and may trigger an interactive sign-in
/// as a side effect of any call made while unauthenticated.
#[async_trait]
pub trait RemoteConversationService: Send + Sync {
    /// List the selectable models
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>>;

    /// List stored conversations, most recent first
    async fn list_history(&self, offset: u32, limit: u32) -> Result<Vec<HistoryEntry>>;

    /// Fetch one conversation in full
    async fn get_conversation(&self, remote_id: &str) -> Result<ConversationDetail>;

    /// Send a user message and stream the reply.
    ///
    /// `conversation_id` is `None` for a conversation the backend has not
    /// seen yet. The returned stream ends after its first terminal event.
    async fn send_conversation(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        model: &str,
    ) -> Result<AssistantEventStream>;
}

/// Point-in-time view of the sign-in state
#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn is_authenticated(&self) -> bool;
}
