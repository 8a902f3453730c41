//! Environment-driven client configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `OPENAI_API_KEY` | `???` (accepted by most local proxies) |
//! | `OPENAI_BASE_URL` | `http://localhost:1234/v1` |
//! | `OPENAI_MODEL` | `gpt-4o` |
//! | `OPENAI_TIMEOUT_SECS` | `60` |
//!
//! A `.env` file in the working directory is loaded once by [`load_env`].

use std::sync::OnceLock;
use std::time::Duration;

use tracing::debug;

use crate::chat::ChatClient;
use crate::core::{HttpClientConfig, LlmError};

pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV_VAR: &str = "OPENAI_MODEL";
pub const TIMEOUT_ENV_VAR: &str = "OPENAI_TIMEOUT_SECS";

pub const DEFAULT_API_KEY: &str = "???";
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_key: String,
    /// Base URL up to and including the version segment, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    pub http: HttpClientConfig,
}

impl ClientConfig {
    /// Read the process environment. Call [`load_env`] first to pick up `.env`.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let http = match lookup(TIMEOUT_ENV_VAR) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    LlmError::ProviderConfiguration(format!(
                        "{TIMEOUT_ENV_VAR} must be a whole number of seconds, got '{raw}': {e}"
                    ))
                })?;
                HttpClientConfig {
                    timeout: Duration::from_secs(secs),
                }
            }
            None => HttpClientConfig::default(),
        };

        Ok(Self {
            api_key: lookup(API_KEY_ENV_VAR).unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            base_url: lookup(BASE_URL_ENV_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: lookup(MODEL_ENV_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http,
        })
    }
}

/// Load `.env` once per process. A missing file is not an error.
pub fn load_env() {
    static LOADED: OnceLock<()> = OnceLock::new();
    LOADED.get_or_init(|| {
        if let Ok(path) = dotenv::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
    });
}

/// Process-wide client built from `.env` and the environment on first use.
pub fn shared_client() -> Result<&'static ChatClient, LlmError> {
    static CLIENT: OnceLock<ChatClient> = OnceLock::new();
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }

    load_env();
    let client = ChatClient::new(ClientConfig::from_env()?)?;
    Ok(CLIENT.get_or_init(|| client))
}

/// Redact an API key for display.
pub fn mask_key(key: Option<&str>) -> String {
    let Some(key) = key.filter(|key| !key.is_empty()) else {
        return "<missing>".to_string();
    };

    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        let tail: String = chars[chars.len().saturating_sub(2)..].iter().collect();
        return format!("***{tail}");
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.api_key, "???");
        assert_eq!(config.base_url, "http://localhost:1234/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.http, HttpClientConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-live-abcdef123456"),
            ("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-live-abcdef123456");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.http.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_bad_timeout_is_configuration_error() {
        let result = ClientConfig::from_lookup(lookup_from(&[("OPENAI_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(LlmError::ProviderConfiguration(_))));
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key(None), "<missing>");
        assert_eq!(mask_key(Some("")), "<missing>");
        assert_eq!(mask_key(Some("???")), "***??");
        assert_eq!(mask_key(Some("x")), "***x");
        assert_eq!(mask_key(Some("abcdefgh")), "***gh");
        assert_eq!(mask_key(Some("sk-proj-1234567890")), "sk-p...7890");
    }
}
