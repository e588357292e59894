//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use lifeguard_core::loader::RetryPolicy;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    /// Base URL of an external LifeGuard collaborator. When present it serves
    /// health data, chat replies and PDFs.
    pub backend_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    /// Upper bound on one built-in chat request.
    pub chat_timeout: Duration,
    pub survey_flags_path: PathBuf,
    pub fetch_max_attempts: u32,
    pub fetch_backoff: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        // --- Collaborators ---
        let backend_url = lookup("LIFEGUARD_BACKEND_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.is_empty());
        if backend_url.is_none() && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar(
                "LIFEGUARD_BACKEND_URL or OPENAI_API_KEY".to_string(),
            ));
        }
        let chat_model = lookup("CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let chat_timeout_secs = match lookup("CHAT_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "CHAT_TIMEOUT_SECS".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ))
                }
            },
            None => 60,
        };

        let survey_flags_path = lookup("SURVEY_FLAGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./survey_flags.json"));

        // --- Chart Fetch Retries ---
        let fetch_max_attempts = match lookup("FETCH_MAX_ATTEMPTS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "FETCH_MAX_ATTEMPTS".to_string(),
                        format!("'{}' is not a positive integer", raw),
                    ))
                }
            },
            None => 3,
        };
        let fetch_backoff_ms = match lookup("FETCH_BACKOFF_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue("FETCH_BACKOFF_MS".to_string(), e.to_string())
            })?,
            None => 500,
        };

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            backend_url,
            openai_api_key,
            chat_model,
            chat_timeout: Duration::from_secs(chat_timeout_secs),
            survey_flags_path,
            fetch_max_attempts,
            fetch_backoff: Duration::from_millis(fetch_backoff_ms),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch_max_attempts,
            initial_backoff: self.fetch_backoff,
            ..RetryPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_a_key_is_set() {
        let config = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:8000");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.backend_url, None);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.chat_timeout, Duration::from_secs(60));
        assert_eq!(config.survey_flags_path, PathBuf::from("./survey_flags.json"));
        assert_eq!(config.retry_policy().max_attempts, 3);
        assert_eq!(config.retry_policy().initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn a_chat_source_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn backend_url_loses_its_trailing_slash() {
        let config = load(&[("LIFEGUARD_BACKEND_URL", "http://localhost:9000/")]).unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = load(&[("OPENAI_API_KEY", "k"), ("RUST_LOG", "chatty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "RUST_LOG"));

        let err = load(&[("OPENAI_API_KEY", "k"), ("FETCH_MAX_ATTEMPTS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "FETCH_MAX_ATTEMPTS"));

        let err = load(&[("OPENAI_API_KEY", "k"), ("CHAT_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "CHAT_TIMEOUT_SECS"));

        let err = load(&[("OPENAI_API_KEY", "k"), ("BIND_ADDRESS", "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "BIND_ADDRESS"));
    }
}
