//! Session controller: auth gating, remote dispatch, and reconciliation of
//! results into the conversation store.

use futures::StreamExt;
use parking_lot::Mutex;
use parley_api::{
    AssistantEvent, AssistantEventStream, AuthGateway, ConversationDetail, HistoryEntry,
    ModelDescriptor, OperationError, RemoteConversationService, models,
};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    aggregator::{Progress, StreamAggregator},
    config::SessionConfig,
    conversation::{Conversation, ConversationId, Message},
    error::{Error, Result},
    events::SessionEvent,
    poller::PollHandle,
    state::{AuthState, PendingIntent, SessionState},
    store::{ConversationStore, SessionSnapshot},
};

struct Inner {
    service: Arc<dyn RemoteConversationService>,
    gateway: Arc<dyn AuthGateway>,
    config: SessionConfig,
    store: Mutex<ConversationStore>,
    event_tx: broadcast::Sender<SessionEvent>,
    poller: Mutex<Option<PollHandle>>,
}

/// Mediates between the presentation layer and the remote service.
///
/// Cloning is cheap; all clones share one store. Every state mutation runs
/// under the store lock and no lock is held across an await, so results
/// from concurrent remote calls are applied one at a time.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Create a controller. Nothing runs until [`initialize`](Self::initialize).
    pub fn new(
        service: Arc<dyn RemoteConversationService>,
        gateway: Arc<dyn AuthGateway>,
        config: SessionConfig,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let store = ConversationStore::new(SessionState::new(config.default_model.clone()));
        Self {
            inner: Arc::new(Inner {
                service,
                gateway,
                config,
                store: Mutex::new(store),
                event_tx,
                poller: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Copy of everything the presentation layer renders
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.store.lock().snapshot()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Check authentication now, then keep polling at the configured
    /// interval until [`shutdown`](Self::shutdown).
    pub async fn initialize(&self) {
        self.recheck_auth().await;
        self.start_polling();
    }

    fn start_polling(&self) {
        let weak = Arc::downgrade(&self.inner);
        let handle = PollHandle::spawn(self.inner.config.poll_interval, move || {
            let inner = weak.upgrade()?;
            Some(async move {
                SessionController { inner }.recheck_auth().await;
            })
        });
        if let Some(previous) = self.inner.poller.lock().replace(handle) {
            previous.stop();
        }
    }

    /// Stop the auth poll loop
    pub fn shutdown(&self) {
        if let Some(poller) = self.inner.poller.lock().take() {
            poller.stop();
        }
    }

    /// Read the gateway and apply the result. A false-to-true transition
    /// (including from the first check) refreshes models and history.
    ///
    /// The poll never signs the session out on its own: only a call failing
    /// with `AuthenticationRequired` does that.
    pub async fn recheck_auth(&self) -> bool {
        let reported = self.inner.gateway.is_authenticated().await;

        let (previous, next) = {
            let mut store = self.inner.store.lock();
            let previous = store.state().auth;
            let next = match (previous, reported) {
                (AuthState::Authenticated, false) => AuthState::Authenticated,
                _ => AuthState::from_check(reported),
            };
            store.state_mut().auth = next;
            (previous, next)
        };

        if previous == AuthState::Authenticated && !reported {
            tracing::debug!("Auth check reports signed out; keeping session until a call fails");
        }

        if previous != next {
            tracing::debug!("Auth state {:?} -> {:?}", previous, next);
            self.emit(SessionEvent::AuthChanged {
                authenticated: next.is_authenticated(),
            });
            if next.is_authenticated() {
                self.refresh_on_auth().await;
            }
        }

        next.is_authenticated()
    }

    /// Fetch models and the first history page concurrently
    pub async fn refresh_on_auth(&self) {
        let page_size = self.inner.config.history_page_size;
        let (models, history) = tokio::join!(self.fetch_models(), self.fetch_history(0, page_size));

        if let Err(e) = models {
            tracing::warn!("Model refresh after sign-in failed: {}", e);
        }
        if let Err(e) = history {
            tracing::warn!("History refresh after sign-in failed: {}", e);
        }
    }

    /// Replace the model list from the backend. No retry on failure.
    pub async fn fetch_models(&self) -> Result<Vec<ModelDescriptor>> {
        self.ensure_initialized()?;

        match self.inner.service.list_models().await {
            Ok(models) => {
                let count = models.len();
                {
                    let mut store = self.inner.store.lock();
                    store.replace_models(models.clone());
                    let state = store.state_mut();
                    state.pending_intents.remove(&PendingIntent::FetchModels);
                    state.last_error = None;
                }
                self.emit(SessionEvent::ModelsUpdated { count });
                Ok(models)
            }
            Err(e) => Err(self.fail(e, PendingIntent::FetchModels)),
        }
    }

    /// Replace the history list from the backend. No retry on failure.
    pub async fn fetch_history(&self, offset: u32, limit: u32) -> Result<Vec<HistoryEntry>> {
        self.ensure_initialized()?;

        match self.inner.service.list_history(offset, limit).await {
            Ok(history) => {
                let count = history.len();
                {
                    let mut store = self.inner.store.lock();
                    store.replace_history(history.clone());
                    let state = store.state_mut();
                    state.pending_intents.remove(&PendingIntent::FetchHistory);
                    state.last_error = None;
                }
                self.emit(SessionEvent::HistoryUpdated { count });
                Ok(history)
            }
            Err(e) => Err(self.fail(e, PendingIntent::FetchHistory)),
        }
    }

    /// Activate a stub for `remote_id` right away, then fill it from the
    /// backend. The detail replaces the stub's title and messages unless
    /// another conversation was activated in the meantime, in which case it
    /// is returned but not applied.
    pub async fn load_conversation(&self, remote_id: &str) -> Result<Conversation> {
        self.ensure_initialized()?;

        let stub_id = {
            let mut store = self.inner.store.lock();
            let title = store.history_title(remote_id).unwrap_or_default().to_string();
            let stub = Conversation::stub(remote_id, title);
            let id = stub.id;
            store.activate(stub);
            let state = store.state_mut();
            state.selected_history = Some(remote_id.to_string());
            state.awaiting_detail.insert(id);
            id
        };
        self.emit(SessionEvent::ConversationActivated { id: stub_id });

        let fetched = self.inner.service.get_conversation(remote_id).await;
        self.inner
            .store
            .lock()
            .state_mut()
            .awaiting_detail
            .remove(&stub_id);

        let detail = match fetched {
            Ok(detail) => detail,
            Err(e) => {
                let intent = PendingIntent::LoadConversation {
                    remote_id: remote_id.to_string(),
                };
                return Err(self.fail(e, intent));
            }
        };

        let applied = {
            let mut store = self.inner.store.lock();
            if store.is_active(stub_id) && !store.state().is_loading(stub_id) {
                store.active_mut().replace_from_detail(&detail);
                store
                    .state_mut()
                    .pending_intents
                    .remove(&PendingIntent::LoadConversation {
                        remote_id: remote_id.to_string(),
                    });
                Some(store.active().clone())
            } else {
                None
            }
        };

        match applied {
            Some(conversation) => {
                self.emit(SessionEvent::ConversationUpdated { id: stub_id });
                Ok(conversation)
            }
            None => {
                tracing::debug!(
                    "Discarding detail for {}: conversation no longer active",
                    remote_id
                );
                Ok(detached(remote_id, &detail))
            }
        }
    }

    /// Bind a fresh, empty conversation
    pub fn create_new_conversation(&self) -> ConversationId {
        let id = self.inner.store.lock().reset_active();
        self.emit(SessionEvent::ConversationActivated { id });
        id
    }

    /// Choose the model used by subsequent sends
    pub fn select_model(&self, slug: &str) -> Result<()> {
        let mut store = self.inner.store.lock();
        if !models::is_selectable(store.models(), slug) {
            return Err(Error::UnknownModel(slug.to_string()));
        }
        store.state_mut().selected_model = slug.to_string();
        Ok(())
    }

    /// Flip debug mode; returns the new value
    pub fn toggle_debug(&self) -> bool {
        let mut store = self.inner.store.lock();
        let state = store.state_mut();
        state.debug = !state.debug;
        if !state.debug {
            state.debug_log.clear();
        }
        state.debug
    }

    /// Send `text` in the active conversation and stream the reply into it.
    ///
    /// Applied reply events are re-broadcast as [`SessionEvent::Assistant`].
    /// A second send on a conversation whose reply is still streaming is
    /// rejected with [`Error::SendInProgress`], and a send on a loaded
    /// conversation whose detail has not arrived with
    /// [`Error::LoadInProgress`].
    pub async fn send_conversation(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.submit(text.to_string(), true).await
    }

    /// Re-submit the failed send recorded for the active conversation. The
    /// user message already shown is reused, not appended again, and a
    /// partial reply left by the failed attempt is overwritten.
    pub async fn retry_send(&self) -> Result<()> {
        let text = {
            let store = self.inner.store.lock();
            store
                .state()
                .pending_send(store.active().id)
                .map(str::to_string)
        };
        let text = text.ok_or(Error::NothingToRetry)?;
        self.submit(text, false).await
    }

    async fn submit(&self, text: String, append_user: bool) -> Result<()> {
        self.ensure_initialized()?;

        let (id, remote_id, model, mut aggregator) = {
            let mut store = self.inner.store.lock();
            let id = store.active().id;
            if store.state().is_loading(id) {
                return Err(Error::SendInProgress);
            }
            if store.state().is_awaiting_detail(id) {
                return Err(Error::LoadInProgress);
            }
            let aggregator = match store.state().pending_partial_reply(id) {
                Some(partial) if !append_user => StreamAggregator::resuming(partial),
                _ => StreamAggregator::new(),
            };
            if append_user {
                store.active_mut().messages.push(Message::user(text.clone()));
            }
            let state = store.state_mut();
            state.clear_pending_send(id);
            state.in_flight.insert(id);
            (
                id,
                store.active().remote_id.clone(),
                store.state().selected_model.clone(),
                aggregator,
            )
        };
        self.emit(SessionEvent::ConversationUpdated { id });

        let outcome = match self
            .inner
            .service
            .send_conversation(&text, remote_id.as_deref(), &model)
            .await
        {
            Ok(stream) => self.drive_stream(id, stream, &mut aggregator).await,
            Err(e) => Err(e),
        };

        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                let auth_required = e.is_auth_required();
                {
                    let mut store = self.inner.store.lock();
                    if store.is_active(id) {
                        let partial_reply = aggregator.reply_id().filter(|reply| {
                            store.active().last_message().is_some_and(|m| m.id == *reply)
                        });
                        store.state_mut().pending_intents.insert(PendingIntent::Send {
                            conversation: id,
                            text,
                            partial_reply,
                        });
                    }
                }
                Some((self.fail_untracked(e), auth_required))
            }
        };

        {
            let mut store = self.inner.store.lock();
            let state = store.state_mut();
            state.in_flight.remove(&id);
            if error.is_none() {
                state.last_error = None;
            }
        }
        self.emit(SessionEvent::SendFinished {
            id,
            ok: error.is_none(),
        });

        match error {
            None => Ok(()),
            Some((err, auth_required)) => {
                if auth_required {
                    // Listing models prompts the gateway to sign in again.
                    // The message itself is left for the caller to retry.
                    tracing::info!("Send requires sign-in; refreshing models");
                    if let Err(e) = self.fetch_models().await {
                        tracing::debug!("Model refresh after failed send: {}", e);
                    }
                }
                Err(err)
            }
        }
    }

    /// Feed the reply stream through an aggregator into conversation `id`.
    /// Once `id` is no longer active, events are drained but not applied.
    async fn drive_stream(
        &self,
        id: ConversationId,
        mut stream: AssistantEventStream,
        aggregator: &mut StreamAggregator,
    ) -> std::result::Result<(), OperationError> {
        let mut discarding = false;

        while let Some(event) = stream.next().await {
            let applied = {
                let mut store = self.inner.store.lock();
                if store.state().debug {
                    let raw =
                        serde_json::to_string(&event).unwrap_or_else(|_| format!("{:?}", event));
                    store.state_mut().record_debug(format!("[{}] {}", id, raw));
                }
                if store.is_active(id) {
                    Some(aggregator.apply(&event, store.active_mut()))
                } else {
                    None
                }
            };

            match applied {
                Some(Ok(progress)) => {
                    self.emit(SessionEvent::Assistant { id, event });
                    if progress == Progress::Completed {
                        return Ok(());
                    }
                }
                Some(Err(e)) => {
                    self.emit(SessionEvent::Assistant { id, event });
                    return Err(e);
                }
                None => {
                    if !discarding {
                        tracing::debug!("Discarding reply events for inactive conversation {}", id);
                        discarding = true;
                    }
                    match event {
                        AssistantEvent::Failed { error } => return Err(error),
                        AssistantEvent::Completed { .. } => return Ok(()),
                        _ => {}
                    }
                }
            }
        }

        if aggregator.is_finished() {
            Ok(())
        } else {
            Err(OperationError::transport(
                "reply stream ended before completion",
            ))
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.inner.store.lock().state().auth == AuthState::Unknown {
            return Err(Error::Uninitialized);
        }
        Ok(())
    }

    /// Record a failed remote call. `AuthenticationRequired` signs the
    /// session out and remembers `intent`.
    fn fail(&self, error: OperationError, intent: PendingIntent) -> Error {
        if error.is_auth_required() {
            self.inner.store.lock().state_mut().pending_intents.insert(intent);
        }
        self.fail_untracked(error)
    }

    fn fail_untracked(&self, error: OperationError) -> Error {
        tracing::warn!("Remote operation failed: {}", error);

        let signed_out = {
            let mut store = self.inner.store.lock();
            let state = store.state_mut();
            state.last_error = Some(error.to_string());
            state.record_debug(format!("error: {:?}", error));
            if error.is_auth_required() && state.auth != AuthState::Unauthenticated {
                state.auth = AuthState::Unauthenticated;
                true
            } else {
                false
            }
        };

        if signed_out {
            self.emit(SessionEvent::AuthChanged {
                authenticated: false,
            });
        }
        self.emit(SessionEvent::Error {
            message: error.to_string(),
        });
        Error::Remote(error)
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.inner.event_tx.send(event);
    }
}

/// A loaded conversation that was not applied to the store
fn detached(remote_id: &str, detail: &ConversationDetail) -> Conversation {
    let mut conversation = Conversation::stub(remote_id, String::new());
    conversation.replace_from_detail(detail);
    conversation
}
