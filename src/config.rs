use std::env;

use tracing::info;

use crate::util::trim_base;

pub const DEFAULT_RELAY_BASE: &str = "https://unfold2024mlinks.vercel.app";
pub const DEFAULT_METADATA_URL: &str = "https://api.1inch.dev/token/v1.2";

/// Deployment settings, read once at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Relay that wraps every generated link (`<relay>/dapp/nav1?url=...`).
    pub relay_base: String,
    /// Public origin of this service, used for frame redirect links.
    pub public_base: String,
    pub token_ttl_ms: u64,
    pub history_table: String,
    pub metadata_url: String,
    pub metadata_api_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            relay_base: DEFAULT_RELAY_BASE.to_string(),
            public_base: DEFAULT_RELAY_BASE.to_string(),
            token_ttl_ms: 5 * 60 * 1000,
            history_table: "blink-history".to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            metadata_api_key: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();

        let relay_base = env::var("RELAY_BASE")
            .map(|s| trim_base(&s))
            .unwrap_or(defaults.relay_base);
        let public_base = env::var("PUBLIC_BASE")
            .map(|s| trim_base(&s))
            .unwrap_or_else(|_| relay_base.clone());
        let token_ttl_ms = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .and_then(|secs| secs.checked_mul(1000))
            .unwrap_or(defaults.token_ttl_ms);
        let history_table = env::var("HISTORY_TABLE").unwrap_or(defaults.history_table);
        let metadata_url = env::var("TOKEN_METADATA_URL")
            .map(|s| trim_base(&s))
            .unwrap_or(defaults.metadata_url);
        let metadata_api_key = env::var("TOKEN_METADATA_API_KEY")
            .ok()
            .filter(|s| !s.is_empty());

        info!(%relay_base, %public_base, token_ttl_ms, %history_table, "settings loaded");

        Self {
            relay_base,
            public_base,
            token_ttl_ms,
            history_table,
            metadata_url,
            metadata_api_key,
        }
    }
}
