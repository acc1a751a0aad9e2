use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JD router endpoint all signed API calls are POSTed to.
pub const DEFAULT_ROUTER_URL: &str = "https://api.jd.com/routerjson";

/// JD OAuth authorization endpoint.
pub const DEFAULT_OAUTH_URL: &str = "https://open-oauth.jd.com/oauth2/to_login";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default)]
    pub endpoints: EndpointSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            endpoints: EndpointSettings::default(),
            http: HttpSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    crate::db::default_database_path().unwrap_or_else(|| {
        PathBuf::from(".jdl-ldop")
            .join("data")
            .join("jdl-ldop.db")
    })
}

/// Overrides for the fixed JD URLs, mainly for stub servers in tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSettings {
    #[serde(default = "default_router_url")]
    pub router_url: String,
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
}

fn default_router_url() -> String {
    DEFAULT_ROUTER_URL.to_string()
}

fn default_oauth_url() -> String {
    DEFAULT_OAUTH_URL.to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            router_url: default_router_url(),
            oauth_url: default_oauth_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.database_path.ends_with("jdl-ldop.db"));
        assert_eq!(settings.endpoints.router_url, DEFAULT_ROUTER_URL);
        assert_eq!(settings.endpoints.oauth_url, DEFAULT_OAUTH_URL);
        assert_eq!(settings.http.connect_timeout_secs, 10);
        assert_eq!(settings.http.request_timeout_secs, 30);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }
}
