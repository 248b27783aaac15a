//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
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
    pub database_url: String,
    pub log_level: Level,
    pub llm_api_key: Option<String>,
    pub llm_api_base: String,
    pub draft_model: String,
    pub chat_model: String,
    pub llm_timeout: Duration,
    /// An empty list allows every origin.
    pub allowed_origins: Vec<String>,
    pub enforce_auth: bool,
    pub strict_min_notice_chars: usize,
    pub identity_timeout: Duration,
    pub session_ttl_days: i64,
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

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:3000"))?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- LLM Gateway Settings ---
        let llm_api_key = lookup("LLM_API_KEY").filter(|k| !k.trim().is_empty());
        let llm_api_base = var_or("LLM_API_BASE", "https://ai.gateway.lovable.dev/v1");
        let draft_model = var_or("DRAFT_MODEL", "google/gemini-2.5-flash");
        let chat_model = var_or("CHAT_MODEL", "google/gemini-2.5-flash");
        let llm_timeout = Duration::from_secs(parse_var(
            "LLM_TIMEOUT_SECS",
            &var_or("LLM_TIMEOUT_SECS", "120"),
        )?);

        // --- Access Control ---
        let allowed_origins = var_or("ALLOWED_ORIGINS", "")
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        let enforce_auth = parse_flag("ENFORCE_AUTH", &var_or("ENFORCE_AUTH", "false"))?;

        // --- Drafting and Identity Settings ---
        let strict_min_notice_chars =
            parse_var("STRICT_MIN_NOTICE_CHARS", &var_or("STRICT_MIN_NOTICE_CHARS", "200"))?;
        let identity_timeout = Duration::from_millis(parse_var(
            "IDENTITY_TIMEOUT_MS",
            &var_or("IDENTITY_TIMEOUT_MS", "3000"),
        )?);
        let session_ttl_days = parse_var("SESSION_TTL_DAYS", &var_or("SESSION_TTL_DAYS", "30"))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            llm_api_key,
            llm_api_base,
            draft_model,
            chat_model,
            llm_timeout,
            allowed_origins,
            enforce_auth,
            strict_min_notice_chars,
            identity_timeout,
            session_ttl_days,
        })
    }

    /// Whether a browser `Origin` may call the API.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty()
            || self
                .allowed_origins
                .iter()
                .any(|o| o == "*" || o == origin.trim_end_matches('/'))
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/compliance")]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.strict_min_notice_chars, 200);
        assert_eq!(config.identity_timeout, Duration::from_secs(3));
        assert!(!config.enforce_auth);
        assert!(config.allowed_origins.is_empty());
        assert!(config.origin_allowed("https://anything.example"));
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn origin_list_is_parsed_and_enforced() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/compliance"),
            ("ALLOWED_ORIGINS", "https://app.example.in/, https://staging.example.in"),
            ("ENFORCE_AUTH", "true"),
        ])
        .unwrap();
        assert!(config.enforce_auth);
        assert!(config.origin_allowed("https://app.example.in"));
        assert!(!config.origin_allowed("https://evil.example"));
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/compliance"),
            ("STRICT_MIN_NOTICE_CHARS", "lots"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(k, _) if k == "STRICT_MIN_NOTICE_CHARS"));
    }
}
