//! Search configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default search relay
pub const DEFAULT_SEARCH_RELAY: &str = "wss://nostr.wine";

/// Default bound on how long a search subscription may live
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 3_500;

/// Default result limit
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Configuration for the relay query engine
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Relay to search on; `None` means searches resolve empty without a
    /// connection attempt (no networked context)
    pub search_relay: Option<String>,
    /// Subscription resolve timeout in milliseconds
    ///
    /// Bounds only the subscription lifecycle, not a hung initial connect.
    pub resolve_timeout_ms: u64,
    /// Result limit used when the caller does not pass one
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_relay: Some(DEFAULT_SEARCH_RELAY.to_string()),
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
            default_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchConfig {
    /// Configuration pointing at a specific relay
    pub fn with_relay(url: impl Into<String>) -> Self {
        Self {
            search_relay: Some(url.into()),
            ..Default::default()
        }
    }

    /// Configuration for a context with no network access
    pub fn offline() -> Self {
        Self {
            search_relay: None,
            ..Default::default()
        }
    }

    /// Get the resolve timeout as a Duration
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.resolve_timeout_ms == 0 {
            return Err("resolve_timeout_ms must be > 0".to_string());
        }
        if self.default_limit == 0 {
            return Err("default_limit must be > 0".to_string());
        }
        if let Some(url) = &self.search_relay {
            if !url.starts_with("ws://") && !url.starts_with("wss://") {
                return Err(format!("search_relay must be a websocket url, got '{url}'"));
            }
        }
        Ok(())
    }
}
