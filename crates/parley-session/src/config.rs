//! Session controller configuration

use parley_api::DEFAULT_MODEL;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the auth gateway is polled
    pub poll_interval: Duration,
    /// Model selected at startup
    pub default_model: String,
    /// Page size used by the refresh that follows sign-in
    pub history_page_size: u32,
    /// Capacity of the session event channel
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            default_model: DEFAULT_MODEL.to_string(),
            history_page_size: 20,
            event_capacity: 256,
        }
    }
}
