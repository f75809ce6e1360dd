//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Rows per page when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the notebook server hosting the scheduler API.
    pub base_url: String,
    /// Optional token sent as `Authorization: token <value>`.
    pub token: Option<SecretString>,
    /// Rows requested per listing page.
    pub page_size: usize,
    /// Timezone used for new job definitions when the environment allows it.
    pub local_timezone: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8888".to_string(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            local_timezone: "UTC".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Build from `NOTEBOOK_JOBS_*` environment variables, falling back to defaults.
    ///
    /// The local timezone comes from `NOTEBOOK_JOBS_TIMEZONE`, then `TZ`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = std::env::var("NOTEBOOK_JOBS_URL").unwrap_or(defaults.base_url);
        let token = std::env::var("NOTEBOOK_JOBS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretString::from);

        let page_size = match std::env::var("NOTEBOOK_JOBS_PAGE_SIZE") {
            Ok(raw) => parse_page_size(&raw)?,
            Err(_) => defaults.page_size,
        };

        let local_timezone = std::env::var("NOTEBOOK_JOBS_TIMEZONE")
            .or_else(|_| std::env::var("TZ"))
            .ok()
            .map(|tz| tz.trim().trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or(defaults.local_timezone);

        let request_timeout = match std::env::var("NOTEBOOK_JOBS_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    key: "NOTEBOOK_JOBS_TIMEOUT_SECS".to_string(),
                    message: format!("expected whole seconds, got '{raw}'"),
                }
            })?),
            Err(_) => defaults.request_timeout,
        };

        Ok(Self {
            base_url,
            token,
            page_size,
            local_timezone,
            request_timeout,
        })
    }
}

fn parse_page_size(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            key: "NOTEBOOK_JOBS_PAGE_SIZE".to_string(),
            message: format!("expected a positive integer, got '{raw}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.local_timezone, "UTC");
        assert!(config.token.is_none());
    }

    #[test]
    fn page_size_must_be_positive() {
        assert_eq!(parse_page_size(" 10 ").unwrap(), 10);
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("ten").is_err());
    }
}
