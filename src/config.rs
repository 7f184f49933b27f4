use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::UploadError;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_NOTIFICATION_TTL_MS: u64 = 3000;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UploadConfig {
    pub server_url: String,
    pub request_timeout_secs: u64, // Per-request timeout, a timed out transfer counts as a failed file
    pub notification_ttl_ms: u64,  // How long a toast stays before it is dismissed
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            notification_ttl_ms: DEFAULT_NOTIFICATION_TTL_MS,
        }
    }
}

impl UploadConfig {
    /// Load configuration from `HOMEHUB_*` environment variables, keeping the
    /// default for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_url: std::env::var("HOMEHUB_SERVER_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.server_url),
            request_timeout_secs: std::env::var("HOMEHUB_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            notification_ttl_ms: std::env::var("HOMEHUB_NOTIFICATION_TTL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.notification_ttl_ms),
        }
    }

    pub fn validate(&self) -> Result<(), UploadError> {
        if self.server_url.trim().is_empty() {
            return Err(UploadError::Config("server_url must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(UploadError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = UploadConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:8000");
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.notification_ttl(), Duration::from_millis(3000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_url_and_zero_timeout() {
        let config = UploadConfig {
            server_url: "  ".to_string(),
            ..UploadConfig::default()
        };
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));

        let config = UploadConfig {
            request_timeout_secs: 0,
            ..UploadConfig::default()
        };
        assert!(matches!(config.validate(), Err(UploadError::Config(_))));
    }

    // the only test touching HOMEHUB_* variables, so nothing races on them
    #[test]
    fn from_env_trims_url_and_falls_back_on_bad_values() {
        std::env::set_var("HOMEHUB_SERVER_URL", " http://x:1/ ");
        std::env::set_var("HOMEHUB_REQUEST_TIMEOUT_SECS", "abc");
        std::env::set_var("HOMEHUB_NOTIFICATION_TTL_MS", "750");
        let config = UploadConfig::from_env();
        std::env::remove_var("HOMEHUB_SERVER_URL");
        std::env::remove_var("HOMEHUB_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("HOMEHUB_NOTIFICATION_TTL_MS");

        assert_eq!(config.server_url, "http://x:1");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.notification_ttl_ms, 750);

        let unset = UploadConfig::from_env();
        assert_eq!(unset, UploadConfig::default());
    }

    #[test]
    fn deserializes_from_json() {
        let config: UploadConfig = serde_json::from_str(
            r#"{"server_url":"http://nas.local:8000","request_timeout_secs":10,"notification_ttl_ms":500}"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://nas.local:8000");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.notification_ttl_ms, 500);
    }
}
