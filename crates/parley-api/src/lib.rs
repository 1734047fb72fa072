//! parley-api: Backend contract for the conversation session controller
//!
//! This crate defines the wire types, the streamed reply events, the error
//! taxonomy, and the service traits a transport implements. It contains no
//! transport of its own.

pub mod error;
pub mod models;
pub mod service;
pub mod stream;
pub mod types;

pub use error::{OperationError, Result};
pub use service::{AuthGateway, RemoteConversationService};
pub use stream::{AssistantEvent, AssistantEventStream};
pub use types::*;
