//! Folds a send's assistant events into the conversation's trailing reply.
//!
//! Two delivery modes are accepted on the same event type: incremental
//! deltas closed by a bare completion marker, or a single completion event
//! carrying the whole conversation. Events are applied strictly in arrival
//! order.

use crate::conversation::{Conversation, Message, MessageId};
use parley_api::{AssistantEvent, ConversationDetail, OperationError};

/// Outcome of applying one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More events expected
    Continue,
    /// The stream reached its terminal event
    Completed,
}

/// Per-send aggregation state
#[derive(Debug, Default)]
pub struct StreamAggregator {
    /// The assistant message this send writes into
    reply: Option<MessageId>,
    /// `reply` holds an abandoned partial reply, cleared on first write
    resuming: bool,
    finished: bool,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a retried send into the partial reply `reply` left by the
    /// failed attempt. Its old content is dropped on the first write.
    pub fn resuming(reply: MessageId) -> Self {
        Self {
            reply: Some(reply),
            resuming: true,
            finished: false,
        }
    }

    /// The assistant message this send writes into, if any
    pub fn reply_id(&self) -> Option<MessageId> {
        self.reply
    }

    /// Whether a terminal event has been applied
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Apply one event to `conversation`.
    ///
    /// A `Failed` event, or a malformed completion, is returned as `Err` and
    /// ends the stream. Events arriving after the end are ignored.
    pub fn apply(
        &mut self,
        event: &AssistantEvent,
        conversation: &mut Conversation,
    ) -> Result<Progress, OperationError> {
        if self.finished {
            tracing::debug!("Ignoring {} event after stream completion", event.kind());
            return Ok(Progress::Completed);
        }

        match event {
            AssistantEvent::Delta { text } => {
                if !text.is_empty() {
                    self.reply_mut(conversation).content.push_str(text);
                }
                Ok(Progress::Continue)
            }
            AssistantEvent::Structured { text } => {
                if !text.is_empty() || self.reply.is_some() {
                    self.reply_mut(conversation).content = text.clone();
                }
                Ok(Progress::Continue)
            }
            AssistantEvent::TitleUpdated {
                title,
                conversation_id,
            } => {
                if !title.is_empty() {
                    conversation.title = title.clone();
                }
                if !conversation_id.is_empty() {
                    conversation.set_remote_id(conversation_id);
                }
                Ok(Progress::Continue)
            }
            AssistantEvent::Completed { conversation: None } => {
                self.finished = true;
                Ok(Progress::Completed)
            }
            AssistantEvent::Completed {
                conversation: Some(detail),
            } => {
                self.finished = true;
                self.apply_whole(detail, conversation)?;
                Ok(Progress::Completed)
            }
            AssistantEvent::Failed { error } => {
                self.finished = true;
                Err(error.clone())
            }
        }
    }

    fn apply_whole(
        &mut self,
        detail: &ConversationDetail,
        conversation: &mut Conversation,
    ) -> Result<(), OperationError> {
        if detail.messages.is_empty() {
            return Err(OperationError::malformed(
                "completed conversation carries no messages",
            ));
        }
        let reply = detail.last_assistant_message().ok_or_else(|| {
            OperationError::malformed("completed conversation has no assistant message")
        })?;

        self.reply_mut(conversation).content = reply.text();
        if !detail.title.is_empty() {
            conversation.title = detail.title.clone();
        }
        if !detail.id.is_empty() {
            conversation.set_remote_id(&detail.id);
        }
        Ok(())
    }

    /// The assistant message owned by this send, appended on first use.
    /// A trailing assistant message from an earlier send is never reused,
    /// and a reply that is no longer the last message is never written.
    fn reply_mut<'a>(&mut self, conversation: &'a mut Conversation) -> &'a mut Message {
        let owned = self.reply.filter(|id| {
            conversation
                .messages
                .last()
                .is_some_and(|m| m.id == *id && !m.is_user())
        });

        if owned.is_none() {
            if self.reply.is_some() {
                tracing::debug!("Reply is no longer the trailing message; starting a new one");
            }
            let message = Message::assistant("");
            self.reply = Some(message.id);
            self.resuming = false;
            conversation.messages.push(message);
        }

        let len = conversation.messages.len();
        let reply = &mut conversation.messages[len - 1];
        if self.resuming {
            reply.content.clear();
            self.resuming = false;
        }
        reply
    }
}
