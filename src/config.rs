//! Client configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:4000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_STORAGE_PATH: &str = ".admin-session.json";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
}

/// Which backend the admin surface talks to. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    Http,
    Mock,
}

impl std::str::FromStr for ApiMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::Parse(format!("unknown ADMIN_API_MODE '{other}' (expected 'http' or 'mock')"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: ClientTimeouts,
    pub mode: ApiMode,
    pub storage_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeouts: ClientTimeouts::default(),
            mode: ApiMode::Http,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `ADMIN_API_BASE_URL`: default `http://127.0.0.1:4000/api`
    /// - `ADMIN_API_TIMEOUT_SECS`: default 10
    /// - `ADMIN_API_CONNECT_TIMEOUT_SECS`: default 5
    /// - `ADMIN_API_MODE`: `http` (default) or `mock`
    /// - `ADMIN_STORAGE_PATH`: default `.admin-session.json`
    ///
    /// # Errors
    ///
    /// Returns an error if `ADMIN_API_MODE` names an unknown backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(
            &std::env::var("ADMIN_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
        );
        let mode = match std::env::var("ADMIN_API_MODE") {
            Ok(raw) => raw.parse()?,
            Err(_) => ApiMode::Http,
        };
        let timeouts = ClientTimeouts {
            request_secs: env_parse_u64("ADMIN_API_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("ADMIN_API_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let storage_path = std::env::var("ADMIN_STORAGE_PATH")
            .map_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);

        Ok(Self { base_url, timeouts, mode, storage_path })
    }
}

/// Trim whitespace and trailing slashes so paths can be appended verbatim.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
