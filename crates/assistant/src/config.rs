//! Model configuration loaded from the environment.
//!
//! Configuration is an owned value on the session, not process-wide state;
//! callers construct it once (usually via [`ModelConfig::from_env`]) and
//! mutate it only through explicit updates. There is no fallback credential:
//! a missing API key is a hard configuration error before any network
//! attempt.

use log::warn;
use std::time::Duration;

use crate::error::AssistantError;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
/// Legacy fallback variable for the API key.
pub const ENV_API_KEY_FALLBACK: &str = "API_KEY";
/// Environment variable selecting the model.
pub const ENV_MODEL: &str = "GEMINI_MODEL";
/// Environment variable for sampling temperature.
pub const ENV_TEMPERATURE: &str = "GEMINI_TEMPERATURE";
/// Environment variable for nucleus sampling.
pub const ENV_TOP_P: &str = "GEMINI_TOP_P";
/// Environment variable for top-k sampling.
pub const ENV_TOP_K: &str = "GEMINI_TOP_K";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 0.9;
pub const DEFAULT_TOP_K: u32 = 40;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the assistant's model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Upper bound on each remote call. A timeout is treated as a transient
    /// failure, eligible for the same retry policy as rate limiting.
    pub request_timeout: Duration,
}

impl ModelConfig {
    /// Build a config with defaults around an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, AssistantError> {
        let config = Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from the process environment with documented fallback defaults.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load via an arbitrary variable lookup. Tests drive this with a map
    /// instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .or_else(|| lookup(ENV_API_KEY_FALLBACK))
            .unwrap_or_default();

        let config = Self {
            api_key,
            model: lookup(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse_or(lookup(ENV_TEMPERATURE), ENV_TEMPERATURE, DEFAULT_TEMPERATURE),
            top_p: parse_or(lookup(ENV_TOP_P), ENV_TOP_P, DEFAULT_TOP_P),
            top_k: parse_or(lookup(ENV_TOP_K), ENV_TOP_K, DEFAULT_TOP_K),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject a blank API key before any network attempt.
    pub fn validate(&self) -> Result<(), AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::Config(format!(
                "API key is required; set {} or {}",
                ENV_API_KEY, ENV_API_KEY_FALLBACK
            )));
        }
        Ok(())
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, name: &str, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!("Unparseable value for {}: {:?}, using default", name, value);
            default
        }),
    }
}

/// Partial override of [`ModelConfig`].
///
/// Every field is optional; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ModelConfigUpdate {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub request_timeout: Option<Duration>,
}

impl ModelConfigUpdate {
    /// Validate the update without applying it.
    ///
    /// A supplied API key must be non-blank; an absent key is fine (the
    /// current one is kept).
    pub fn validate(&self) -> Result<(), AssistantError> {
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(AssistantError::Config(
                    "API key must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Apply over `base`, returning the merged config.
    pub fn merged_over(&self, base: &ModelConfig) -> ModelConfig {
        ModelConfig {
            api_key: self
                .api_key
                .clone()
                .unwrap_or_else(|| base.api_key.clone()),
            model: self.model.clone().unwrap_or_else(|| base.model.clone()),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            top_k: self.top_k.unwrap_or(base.top_k),
            request_timeout: self.request_timeout.unwrap_or(base.request_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_from_lookup_uses_defaults() {
        let config =
            ModelConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.top_p, DEFAULT_TOP_P);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = ModelConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, "gemini-2.5-pro"),
            (ENV_TEMPERATURE, "0.2"),
            (ENV_TOP_P, "0.5"),
            (ENV_TOP_K, "10"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.5);
        assert_eq!(config.top_k, 10);
    }

    #[test]
    fn test_from_lookup_falls_back_to_legacy_key_var() {
        let config =
            ModelConfig::from_lookup(lookup_from(&[(ENV_API_KEY_FALLBACK, "legacy")])).unwrap();
        assert_eq!(config.api_key, "legacy");
    }

    #[test]
    fn test_missing_api_key_is_hard_error() {
        let result = ModelConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn test_blank_api_key_is_hard_error() {
        let result = ModelConfig::from_lookup(lookup_from(&[(ENV_API_KEY, "   ")]));
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn test_unparseable_numeric_falls_back() {
        let config = ModelConfig::from_lookup(lookup_from(&[
            (ENV_API_KEY, "secret"),
            (ENV_TEMPERATURE, "hot"),
            (ENV_TOP_K, "-3"),
        ]))
        .unwrap();
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_builder_helpers() {
        let config = ModelConfig::new("secret")
            .unwrap()
            .with_model("gemini-2.5-pro")
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_update_merges_over_base() {
        let base = ModelConfig::new("secret").unwrap();
        let update = ModelConfigUpdate {
            temperature: Some(0.1),
            model: Some("gemini-2.5-pro".to_string()),
            ..Default::default()
        };

        let merged = update.merged_over(&base);
        assert_eq!(merged.api_key, "secret");
        assert_eq!(merged.model, "gemini-2.5-pro");
        assert_eq!(merged.temperature, 0.1);
        assert_eq!(merged.top_p, base.top_p);
    }

    #[test]
    fn test_update_rejects_blank_api_key() {
        let update = ModelConfigUpdate {
            api_key: Some("".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update.validate(),
            Err(AssistantError::Config(_))
        ));
    }

    #[test]
    fn test_update_with_no_key_is_valid() {
        let update = ModelConfigUpdate {
            temperature: Some(0.9),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
