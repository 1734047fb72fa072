//! Offline backend that answers every message by echoing it back

use async_stream::stream;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use parley_api::{
    AssistantEvent, AssistantEventStream, AuthGateway, ConversationDetail, HistoryEntry,
    ModelDescriptor, OperationError, RemoteConversationService, RemoteMessage, Result, Role,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Sign-in state flipped by `/login` and `/logout`
#[derive(Debug, Default)]
pub struct ToggleAuth {
    signed_in: AtomicBool,
    sign_in_requested: AtomicBool,
}

impl ToggleAuth {
    pub fn new(signed_in: bool) -> Arc<Self> {
        Arc::new(Self {
            signed_in: AtomicBool::new(signed_in),
            sign_in_requested: AtomicBool::new(false),
        })
    }

    pub fn set(&self, signed_in: bool) {
        self.signed_in.store(signed_in, Ordering::SeqCst);
        if signed_in {
            self.sign_in_requested.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    /// Stand-in for the interactive sign-in a real backend would open
    fn request_sign_in(&self) {
        if !self.sign_in_requested.swap(true, Ordering::SeqCst) {
            tracing::info!("Sign-in requested; use /login");
        }
    }

    /// Whether a call asked for sign-in since the last `/login`
    pub fn sign_in_requested(&self) -> bool {
        self.sign_in_requested.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_signed_in() {
            Ok(())
        } else {
            self.request_sign_in();
            Err(OperationError::AuthenticationRequired)
        }
    }
}

#[async_trait]
impl AuthGateway for ToggleAuth {
    async fn is_authenticated(&self) -> bool {
        self.is_signed_in()
    }
}

/// In-memory conversation backend
pub struct EchoService {
    auth: Arc<ToggleAuth>,
    whole_object: bool,
    delta_delay: Duration,
    next_id: AtomicU64,
    conversations: Mutex<HashMap<String, ConversationDetail>>,
    /// Most recent first
    history: Mutex<Vec<HistoryEntry>>,
}

impl EchoService {
    pub fn new(auth: Arc<ToggleAuth>, whole_object: bool) -> Self {
        Self {
            auth,
            whole_object,
            delta_delay: Duration::from_millis(25),
            next_id: AtomicU64::new(1),
            conversations: Mutex::new(HashMap::new()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Set the pause between streamed words
    #[allow(dead_code)]
    pub fn with_delta_delay(mut self, delay: Duration) -> Self {
        self.delta_delay = delay;
        self
    }

    fn reply_to(message: &str) -> String {
        format!("You said: {}", message)
    }

    fn title_for(message: &str) -> String {
        let title: String = message.chars().take(32).collect();
        title.trim().to_string()
    }

    /// Record the exchange and return the updated conversation
    fn record(&self, message: &str, conversation_id: Option<&str>) -> Result<ConversationDetail> {
        let mut conversations = self.conversations.lock();

        let id = match conversation_id {
            Some(id) => {
                if !conversations.contains_key(id) {
                    return Err(OperationError::Unknown(format!(
                        "Conversation not found: {}",
                        id
                    )));
                }
                id.to_string()
            }
            None => {
                let id = format!("echo-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                let detail = ConversationDetail {
                    id: id.clone(),
                    title: Self::title_for(message),
                    created_at: Utc::now(),
                    messages: Vec::new(),
                };
                self.history.lock().insert(
                    0,
                    HistoryEntry {
                        remote_id: id.clone(),
                        title: detail.title.clone(),
                        created_at: detail.created_at,
                    },
                );
                conversations.insert(id.clone(), detail);
                id
            }
        };

        let detail = conversations
            .get_mut(&id)
            .ok_or_else(|| OperationError::malformed("conversation vanished"))?;
        detail.messages.push(RemoteMessage::new(Role::User, message));
        detail
            .messages
            .push(RemoteMessage::new(Role::Assistant, Self::reply_to(message)));
        Ok(detail.clone())
    }
}

#[async_trait]
impl RemoteConversationService for EchoService {
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        self.auth.check()?;
        Ok(vec![
            ModelDescriptor::new(parley_api::DEFAULT_MODEL, "Auto"),
            ModelDescriptor::new("echo-fast", "Echo (fast)"),
            ModelDescriptor::new("echo-slow", "Echo (slow)"),
        ])
    }

    async fn list_history(&self, offset: u32, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.auth.check()?;
        let history = self.history.lock();
        Ok(history
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn get_conversation(&self, remote_id: &str) -> Result<ConversationDetail> {
        self.auth.check()?;
        self.conversations
            .lock()
            .get(remote_id)
            .cloned()
            .ok_or_else(|| OperationError::Unknown(format!("Conversation not found: {}", remote_id)))
    }

    async fn send_conversation(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        model: &str,
    ) -> Result<AssistantEventStream> {
        self.auth.check()?;
        let detail = self.record(message, conversation_id)?;

        if self.whole_object {
            return Ok(Box::pin(tokio_stream::once(AssistantEvent::whole(detail))));
        }

        let reply = Self::reply_to(message);
        let words: Vec<String> = reply.split_inclusive(' ').map(str::to_string).collect();
        let delay = if model == "echo-slow" {
            self.delta_delay * 4
        } else {
            self.delta_delay
        };

        Ok(Box::pin(stream! {
            for word in words {
                tokio::time::sleep(delay).await;
                yield AssistantEvent::delta(word);
            }
            yield AssistantEvent::title_updated(detail.title.clone(), detail.id.clone());
            yield AssistantEvent::done();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn service(whole_object: bool) -> EchoService {
        EchoService::new(ToggleAuth::new(true), whole_object).with_delta_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_streams_words_then_title_then_done() {
        let service = service(false);
        let events: Vec<AssistantEvent> = service
            .send_conversation("hi there", None, "auto")
            .await
            .unwrap()
            .collect()
            .await;

        let text: String = events
            .iter()
            .filter_map(|e| match e {
                AssistantEvent::Delta { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "You said: hi there");
        assert_eq!(
            events[events.len() - 2],
            AssistantEvent::title_updated("hi there", "echo-1")
        );
        assert_eq!(events.last(), Some(&AssistantEvent::done()));
    }

    #[tokio::test]
    async fn test_whole_object_mode_sends_one_completion() {
        let service = service(true);
        let events: Vec<AssistantEvent> = service
            .send_conversation("ping", None, "auto")
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            AssistantEvent::Completed {
                conversation: Some(detail),
            } => {
                assert_eq!(detail.messages.len(), 2);
                assert_eq!(detail.last_assistant_message().unwrap().text(), "You said: ping");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_is_most_recent_first() {
        let service = service(true);
        for text in ["one", "two", "three"] {
            let _ = service.send_conversation(text, None, "auto").await.unwrap();
        }

        let titles: Vec<String> = service
            .list_history(0, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn test_signed_out_requires_authentication() {
        let auth = ToggleAuth::new(false);
        let service = EchoService::new(auth.clone(), false);

        assert_eq!(
            service.list_models().await.unwrap_err(),
            OperationError::AuthenticationRequired
        );
        assert!(auth.sign_in_requested());

        auth.set(true);
        assert!(!auth.sign_in_requested());
        assert_eq!(service.list_models().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_conversation_id_is_rejected() {
        let service = service(false);
        let result = service.send_conversation("hi", Some("missing"), "auto").await;
        assert!(matches!(result, Err(OperationError::Unknown(_))));
    }
}
