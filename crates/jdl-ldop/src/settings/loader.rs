use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::error::SettingsError;
use crate::settings::schema::Settings;

/// Loads settings from a YAML (or JSON) file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, SettingsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

/// Parses settings. JSON is accepted since it is valid YAML.
pub fn load_settings_from_str(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yaml::from_str(content)?
    };

    validate_settings(&settings)?;

    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    for (name, value) in [
        ("endpoints.router_url", &settings.endpoints.router_url),
        ("endpoints.oauth_url", &settings.endpoints.oauth_url),
    ] {
        if let Err(e) = url::Url::parse(value) {
            return Err(SettingsError::Validation {
                message: format!("{} is not a valid URL '{}': {}", name, value, e),
            });
        }
    }

    if settings.http.connect_timeout_secs == 0 || settings.http.request_timeout_secs == 0 {
        return Err(SettingsError::Validation {
            message: "HTTP timeouts must be greater than 0".to_string(),
        });
    }

    if let Err(e) = EnvFilter::try_new(&settings.logging.level) {
        return Err(SettingsError::Validation {
            message: format!("Invalid log level '{}': {}", settings.logging.level, e),
        });
    }

    if settings.database_path.as_os_str().is_empty() {
        return Err(SettingsError::Validation {
            message: "database_path must not be empty".to_string(),
        });
    }

    Ok(())
}
