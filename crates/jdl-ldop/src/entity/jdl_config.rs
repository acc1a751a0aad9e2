//! Per-merchant JD integration config.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Audit;
use crate::error::ValidationError;
use crate::sign::SignMethod;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.jdl.com";
pub const DEFAULT_API_VERSION: &str = "2.0";

/// Body format JD is asked to answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Json => "json",
            ResponseFormat::Xml => "xml",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ResponseFormat::Json),
            "xml" => Ok(ResponseFormat::Xml),
            other => Err(ValidationError::new(
                "format",
                format!("must be one of json, xml (got '{}')", other),
            )),
        }
    }
}

/// One merchant integration with JD.
///
/// Only the lowest-id active row is consulted as the default config.
/// The app secret never appears in `Debug` output.
#[derive(Clone)]
pub struct JdlConfig {
    pub id: Option<i64>,
    pub active: bool,
    pub customer_code: String,
    pub app_key: String,
    pub app_secret: SecretString,
    pub api_endpoint: String,
    pub version: String,
    pub format: ResponseFormat,
    /// Selectable in the admin UI but not used on the wire, which always signs with MD5.
    pub sign_method: SignMethod,
    pub redirect_uri: String,
    pub remark: Option<String>,
    pub audit: Audit,
}

impl JdlConfig {
    pub fn new(
        customer_code: impl Into<String>,
        app_key: impl Into<String>,
        app_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            active: true,
            customer_code: customer_code.into(),
            app_key: app_key.into(),
            app_secret: SecretString::from(app_secret.into()),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            format: ResponseFormat::Json,
            sign_method: SignMethod::Md5,
            redirect_uri: redirect_uri.into(),
            remark: None,
            audit: Audit::default(),
        }
    }

    pub fn app_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }

    /// Checks the constraints the admin form enforces on save.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("customer_code", &self.customer_code, 32)?;
        require_text("app_key", &self.app_key, 32)?;
        require_text("app_secret", self.app_secret(), 64)?;
        require_text("api_endpoint", &self.api_endpoint, 255)?;
        require_text("version", &self.version, 10)?;
        require_text("redirect_uri", &self.redirect_uri, 255)?;
        require_url("api_endpoint", &self.api_endpoint)?;
        require_url("redirect_uri", &self.redirect_uri)?;
        Ok(())
    }
}

impl fmt::Debug for JdlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JdlConfig")
            .field("id", &self.id)
            .field("active", &self.active)
            .field("customer_code", &self.customer_code)
            .field("app_key", &self.app_key)
            .field("app_secret", &"[REDACTED]")
            .field("api_endpoint", &self.api_endpoint)
            .field("version", &self.version)
            .field("format", &self.format)
            .field("sign_method", &self.sign_method)
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

pub(crate) fn require_text(
    field: &str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    check_length(field, value, max_chars)
}

pub(crate) fn check_length(
    field: &str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_chars),
        ));
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> Result<(), ValidationError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ValidationError::new(field, format!("invalid URL: {}", e)))
}
