//! parley-session: Client-side session controller
//!
//! This crate tracks authentication, dispatches remote operations through a
//! [`parley_api::RemoteConversationService`], folds streamed replies into the
//! active conversation, and exposes a snapshot plus change events to the
//! presentation layer.

pub mod aggregator;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;
pub mod poller;
pub mod state;
pub mod store;

pub use aggregator::{Progress, StreamAggregator};
pub use config::SessionConfig;
pub use controller::SessionController;
pub use conversation::{Conversation, ConversationId, Message, MessageId};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use state::{AuthState, PendingIntent, SessionState};
pub use store::{ConversationStore, SessionSnapshot};
