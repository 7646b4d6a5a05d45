//! Configuration module for the records console.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the records backend, without trailing slash
    pub base_url: String,
    /// CSRF token to send on mutating requests; scraped from the backend page when unset
    pub csrf_token: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Path to the local settings file (theme preference)
    pub settings_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Values that could not be used and fell back to a default; reported
    /// once logging is up
    pub fallbacks: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let base_url = env::var("RECORDS_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
            .trim_end_matches('/')
            .to_string();

        let csrf_token = env::var("RECORDS_CSRF_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let mut fallbacks = Vec::new();

        let request_timeout = match env::var("RECORDS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                fallbacks.push(format!(
                    "Invalid RECORDS_REQUEST_TIMEOUT_SECS {:?}, using {}s",
                    raw, DEFAULT_TIMEOUT_SECS
                ));
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }),
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let settings_path = env::var("RECORDS_SETTINGS_PATH")
            .unwrap_or_else(|_| "./data/settings.json".to_string())
            .into();

        let log_level = env::var("RECORDS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = match env::var("RECORDS_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("text") | Err(_) => LogFormat::Text,
            Ok(other) => {
                fallbacks.push(format!("Unknown RECORDS_LOG_FORMAT {:?}, using text", other));
                LogFormat::Text
            }
        };

        Self {
            base_url,
            csrf_token,
            request_timeout,
            settings_path,
            log_level,
            log_format,
            fallbacks,
        }
    }

    /// Join a path onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Whole positive seconds.
fn parse_timeout(raw: &str) -> Option<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("RECORDS_BASE_URL");
        env::remove_var("RECORDS_CSRF_TOKEN");
        env::remove_var("RECORDS_REQUEST_TIMEOUT_SECS");
        env::remove_var("RECORDS_SETTINGS_PATH");
        env::remove_var("RECORDS_LOG_LEVEL");
        env::remove_var("RECORDS_LOG_FORMAT");

        let config = Config::from_env();

        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert!(config.csrf_token.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.settings_path, PathBuf::from("./data/settings.json"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.url("/api/students"), "http://127.0.0.1:8000/api/students");
        assert!(config.fallbacks.is_empty());

        // Unusable values fall back and are kept for reporting
        env::set_var("RECORDS_REQUEST_TIMEOUT_SECS", "soon");
        env::set_var("RECORDS_LOG_FORMAT", "yaml");
        let config = Config::from_env();
        env::remove_var("RECORDS_REQUEST_TIMEOUT_SECS");
        env::remove_var("RECORDS_LOG_FORMAT");

        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.fallbacks.len(), 2);
        assert!(config.fallbacks[0].contains("RECORDS_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout(" 30 "), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("soon"), None);
        assert_eq!(parse_timeout("-5"), None);
    }
}
