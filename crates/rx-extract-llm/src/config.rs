//! Generation service configuration.
//!
//! Values come from the process environment. The binary loads a local `.env`
//! first, so the historical `key=...` entry keeps working.

use std::fmt;

use thiserror::Error;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Fallback variable name used by older `.env` files.
pub const LEGACY_API_KEY_VAR: &str = "key";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "RX_EXTRACT_TIMEOUT_SECS";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No API key configured (set GEMINI_API_KEY, or `key` in .env)")]
    MissingApiKey,

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Connection settings for the hosted generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Whole-request timeout applied by the HTTP transport
    pub timeout_secs: u64,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR)
            .or_else(|| non_empty(LEGACY_API_KEY_VAR))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key.trim());

        if let Some(model) = non_empty(MODEL_VAR) {
            config.model = model.trim().to_string();
        }
        if let Some(base_url) = non_empty(BASE_URL_VAR) {
            config = config.with_base_url(&base_url);
        }
        if let Some(timeout) = non_empty(TIMEOUT_VAR) {
            config.timeout_secs = timeout.trim().parse().map_err(|_| ConfigError::Invalid {
                name: TIMEOUT_VAR,
                value: timeout.clone(),
            })?;
        }

        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GeminiConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "abc")])).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_legacy_key_fallback() {
        let config = GeminiConfig::from_lookup(lookup_from(&[("key", "legacy")])).unwrap();
        assert_eq!(config.api_key, "legacy");

        let config =
            GeminiConfig::from_lookup(lookup_from(&[("key", "legacy"), (API_KEY_VAR, "new")]))
                .unwrap();
        assert_eq!(config.api_key, "new");
    }

    #[test]
    fn test_missing_key() {
        let err = GeminiConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn test_overrides() {
        let config = GeminiConfig::from_lookup(lookup_from(&[
            (API_KEY_VAR, "abc"),
            (MODEL_VAR, "gemini-1.5-pro"),
            (BASE_URL_VAR, "http://localhost:8080/"),
            (TIMEOUT_VAR, "30"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(
            config.generate_url(),
            "http://localhost:8080/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_invalid_timeout() {
        let err = GeminiConfig::from_lookup(lookup_from(&[(API_KEY_VAR, "abc"), (TIMEOUT_VAR, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == TIMEOUT_VAR));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GeminiConfig::new("super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
