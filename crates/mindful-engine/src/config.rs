//! Configuration types for the mindful client.
//!
//! Every field is optional in the JSON file; missing fields fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that overrides [`ClientConfig::api_base_url`].
pub const API_URL_ENV: &str = "MINDFUL_API_URL";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the chat backend (endpoints are appended to it).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Soft cap on message length, shown in the character counter.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Typing indicator animation hint, in milliseconds per cycle.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Scroll the transcript to the newest message on every append.
    #[serde(default = "default_auto_scroll")]
    pub auto_scroll: bool,

    /// Local store key holding the theme preference.
    #[serde(default = "default_theme_key")]
    pub theme_key: String,

    /// Local store key holding the backend session cookie.
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Upper bound for a single request round trip, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Number of history entries fetched on start-up.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Preset prompts offered as quick actions.
    #[serde(default = "default_quick_actions")]
    pub quick_actions: Vec<String>,
}

fn default_api_base_url() -> String {
    "http://localhost:5000/api".into()
}

fn default_max_message_length() -> usize {
    1000
}

fn default_typing_delay_ms() -> u64 {
    1000
}

fn default_auto_scroll() -> bool {
    true
}

fn default_theme_key() -> String {
    "mindful-theme".into()
}

fn default_session_key() -> String {
    "mindful-session".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_history_limit() -> usize {
    20
}

fn default_quick_actions() -> Vec<String> {
    vec![
        "Tôi đang cảm thấy căng thẳng".into(),
        "Tôi bị mất ngủ mấy hôm nay".into(),
        "Gợi ý cho tôi một bài tập thở".into(),
    ]
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            max_message_length: default_max_message_length(),
            typing_delay_ms: default_typing_delay_ms(),
            auto_scroll: default_auto_scroll(),
            theme_key: default_theme_key(),
            session_key: default_session_key(),
            request_timeout_secs: default_request_timeout_secs(),
            history_limit: default_history_limit(),
            quick_actions: default_quick_actions(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file, using defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply the `MINDFUL_API_URL` override, if set and non-empty.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        let url = std::env::var(API_URL_ENV).ok();
        self.with_api_url_override(url)
    }

    /// Replace the backend URL when an override is given.
    #[must_use]
    pub fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        self
    }

    /// Backend URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Request timeout as a [`std::time::Duration`].
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
