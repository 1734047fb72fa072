//! Configuration file support

use parley_session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for parley
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model selected at startup
    pub model: Option<String>,
    /// Seconds between authentication checks
    pub poll_interval_secs: Option<u64>,
    /// Number of history entries fetched after sign-in
    pub history_page_size: Option<u32>,
    /// Have the echo backend answer with one whole-object completion
    pub whole_object: Option<bool>,
    /// Whether the echo backend starts signed in
    pub start_signed_in: Option<bool>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PARLEY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            model: Some(parley_api::DEFAULT_MODEL.to_string()),
            poll_interval_secs: Some(2),
            history_page_size: Some(20),
            whole_object: Some(false),
            start_signed_in: Some(true),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Session settings, falling back to the controller defaults
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            poll_interval: self
                .poll_interval_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            default_model: self.model.clone().unwrap_or(defaults.default_model),
            history_page_size: self.history_page_size.unwrap_or(defaults.history_page_size),
            event_capacity: defaults.event_capacity,
        }
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# parley configuration file
# Place at ~/.config/parley/config.toml (Linux/Mac) or %APPDATA%\parley\config.toml (Windows)

# Model selected at startup ("auto" lets the backend choose)
model = "auto"

# Seconds between authentication checks
poll_interval_secs = 2

# History entries fetched after sign-in
history_page_size = 20

# Echo backend: answer with a single whole-object completion instead of deltas
whole_object = false

# Echo backend: start signed in
start_signed_in = true
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert_eq!(config.model.as_deref(), Some("auto"));
        assert_eq!(config.poll_interval_secs, Some(2));
        assert_eq!(config.whole_object, Some(false));
    }

    #[test]
    fn test_session_config_falls_back_to_defaults() {
        let config = Config {
            poll_interval_secs: Some(0),
            history_page_size: Some(5),
            ..Default::default()
        };
        let session = config.session_config();
        assert_eq!(session.poll_interval, Duration::from_secs(2));
        assert_eq!(session.history_page_size, 5);
        assert_eq!(session.default_model, "auto");
    }
}
