//! Configuration for the play screen.
//!
//! Maps directly to `numeron.toml`. Every section and field is optional;
//! missing values fall back to the defaults the game server ships with.

use serde::{Deserialize, Serialize};

use crate::types::items;

/// Top-level play-screen configuration, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Game Server endpoints.
    #[serde(default)]
    pub server: ServerConfig,
    /// Memo persistence settings.
    #[serde(default)]
    pub memo: MemoConfig,
    /// Item activation settings.
    #[serde(default)]
    pub items: ItemConfig,
}

impl PlayConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `NumeronError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::NumeronError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level filter: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Where the Game Server lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Game Server.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Item activation endpoint.
    #[serde(default = "default_use_item_path")]
    pub use_item_path: String,
    /// DOUBLE follow-up call status endpoint.
    #[serde(default = "default_double_call_path")]
    pub double_call_path: String,
    /// Authoritative state snapshot endpoint.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// HTTP timeout for any single request in milliseconds.
    #[serde(default = "default_5000")]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            use_item_path: default_use_item_path(),
            double_call_path: default_double_call_path(),
            snapshot_path: default_snapshot_path(),
            request_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Join `base_url` and an endpoint path without doubling slashes.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Memo persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoConfig {
    /// Storage key holding the serialized memo record.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Address query parameter that requests a memo reset.
    #[serde(default = "default_reset_param")]
    pub reset_param: String,
    /// Backend: "memory" or "sqlite".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Database file for the "sqlite" backend.
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    /// Store and verify a CRC-32 next to every record.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            reset_param: default_reset_param(),
            backend: default_backend(),
            sqlite_path: default_sqlite_path(),
            checksum_enabled: true,
        }
    }
}

/// Item activation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Items that need a target digit before they can be used.
    #[serde(default = "default_digit_items")]
    pub digit_items: Vec<String>,
    /// Message shown when the server reports success without an effect.
    #[serde(default = "default_fallback_effect")]
    pub fallback_effect: String,
    /// Upper bound on one activation round trip, in milliseconds.
    #[serde(default = "default_5000")]
    pub request_timeout_ms: u64,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            digit_items: default_digit_items(),
            fallback_effect: default_fallback_effect(),
            request_timeout_ms: 5000,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_base_url() -> String { "http://localhost:3000".to_string() }
fn default_use_item_path() -> String { "/use-item".to_string() }
fn default_double_call_path() -> String { "/check-double-call".to_string() }
fn default_snapshot_path() -> String { "/state".to_string() }
fn default_storage_key() -> String { "numeronMemoData".to_string() }
fn default_reset_param() -> String { "memo_reset".to_string() }
fn default_backend() -> String { "memory".to_string() }
fn default_sqlite_path() -> String { "numeron_memo.db".to_string() }
fn default_digit_items() -> Vec<String> { vec![items::TARGET.to_string()] }
fn default_fallback_effect() -> String { "Item effect applied".to_string() }
fn default_5000() -> u64 { 5000 }
