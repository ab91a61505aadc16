//! Configuration Management Module
//!
//! File-based configuration for budgets, streaming, providers and the
//! demo pathway. All ceilings live here, not in code, so they can be
//! tuned together from one `sketchpilot.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable holding the operator-held demo credential
pub const DEMO_KEY_ENV: &str = "SKETCHPILOT_DEMO_API_KEY";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Request budget ceilings
///
/// Enforced by the budget validator before any provider call. Defaults
/// match the deployed limits; every field is independently tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum decoded bytes for a single image
    pub max_image_bytes: usize,
    /// Maximum combined decoded bytes across all images in a request
    pub max_total_image_bytes: usize,
    /// Maximum image count across current message and history tail
    pub max_images: usize,
    /// Maximum number of history messages kept in the tail
    pub max_history_messages: usize,
    /// Maximum cumulative text bytes across the history tail
    pub max_history_text_bytes: usize,
    /// Maximum text bytes for any single message
    pub max_message_text_bytes: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 10 * 1024 * 1024,
            max_total_image_bytes: 20 * 1024 * 1024,
            max_images: 12,
            max_history_messages: 20,
            max_history_text_bytes: 250_000,
            max_message_text_bytes: 100_000,
        }
    }
}

/// Streaming settings for one conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Wall-clock ceiling per turn, in seconds, measured from turn start
    pub turn_timeout_secs: u64,
    /// Per-request HTTP connect/read timeout handed to the transport
    pub http_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            turn_timeout_secs: 300,
            http_timeout_secs: 300,
        }
    }
}

/// Operator-hosted demo pathway settings
///
/// The credential is never stored in the config file; it is resolved from
/// `SKETCHPILOT_DEMO_API_KEY` at selection time. A missing credential is a
/// hard configuration error surfaced to the user, not retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Base URL of the OpenAI-compatible backend serving demo traffic
    pub base_url: String,
    /// Pinned model id used for every demo turn
    pub model: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Provider base URLs (credentials always arrive with the request)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// Server bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8700,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub budget: BudgetConfig,
    pub stream: StreamConfig,
    pub demo: DemoConfig,
    pub providers: ProviderEndpoints,
    /// Path the history ledger is persisted to (JSONL, best-effort)
    pub history_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults (this is the normal first-run
    /// path); an unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the operator-held demo credential from the environment
    ///
    /// Returns `None` when unset or empty; callers must treat that as a
    /// configuration failure for demo selections.
    pub fn demo_credential(&self) -> Option<String> {
        match std::env::var(DEMO_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => {
                warn!("{} is not set; demo provider is unavailable", DEMO_KEY_ENV);
                None
            }
        }
    }
}
