use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the signing, gateway and workflow layers.
///
/// The workflows wrap every failure of their gateway call into a single
/// [`JdlError::Api`] whose `source` holds the original error, so callers that
/// need the precise failure kind should walk the source chain.
#[derive(Error, Debug)]
pub enum JdlError {
    /// No active integration config could be resolved.
    #[error("{0}")]
    ConfigMissing(String),

    /// No access token record is available.
    #[error("{0}")]
    TokenMissing(String),

    /// OAuth authorization code retrieval failed.
    #[error("{0}")]
    Auth(String),

    /// The request never produced a JD response (connect, timeout, TLS, body read).
    #[error("{message}: {source}")]
    ApiTransport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// JD answered with a failure envelope, or a workflow wrapped an inner failure.
    #[error("{message}")]
    Api {
        message: String,
        code: i64,
        #[source]
        source: Option<Box<JdlError>>,
    },

    /// Malformed parameters, e.g. a non-scalar value handed to the signer.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    /// The response body could not be decoded in the configured format.
    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

impl JdlError {
    /// Builds a JD failure-envelope error.
    pub fn api(message: impl Into<String>, code: i64) -> Self {
        JdlError::Api {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Wraps `inner` as an [`JdlError::Api`] prefixed with `prefix`.
    ///
    /// The numeric code of the inner error is carried over unchanged.
    pub fn wrap(prefix: &str, inner: JdlError) -> Self {
        JdlError::Api {
            message: format!("{}{}", prefix, inner),
            code: inner.code(),
            source: Some(Box::new(inner)),
        }
    }

    /// JD's numeric code for [`JdlError::Api`], 0 for every other kind.
    pub fn code(&self) -> i64 {
        match self {
            JdlError::Api { code, .. } => *code,
            _ => 0,
        }
    }

    /// Short name of the error kind, used as the `exception` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            JdlError::ConfigMissing(_) => "ConfigMissing",
            JdlError::TokenMissing(_) => "TokenMissing",
            JdlError::Auth(_) => "AuthError",
            JdlError::ApiTransport { .. } => "ApiTransportError",
            JdlError::Api { .. } => "ApiError",
            JdlError::InvalidInput(_) => "InvalidInput",
            JdlError::Validation(_) => "ValidationError",
            JdlError::Database(_) => "DatabaseError",
            JdlError::Decode(_) => "DecodeError",
        }
    }

    /// The wrapped inner error of a workflow failure, if any.
    pub fn inner(&self) -> Option<&JdlError> {
        match self {
            JdlError::Api {
                source: Some(inner),
                ..
            } => Some(inner),
            _ => None,
        }
    }
}

/// A field of untrusted input failed a constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Settings validation failed: {message}")]
    Validation { message: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, JdlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_keeps_inner_code_and_source() {
        let inner = JdlError::api("签名错误", 27);
        let wrapped = JdlError::wrap("创建取件订单失败: ", inner);

        assert_eq!(wrapped.to_string(), "创建取件订单失败: 签名错误");
        assert_eq!(wrapped.code(), 27);
        assert!(matches!(
            wrapped.inner(),
            Some(JdlError::Api { code: 27, .. })
        ));
    }

    #[test]
    fn test_wrap_non_api_error_has_zero_code() {
        let wrapped = JdlError::wrap(
            "获取物流信息失败: ",
            JdlError::TokenMissing("Failed to get access token".to_string()),
        );

        assert_eq!(wrapped.code(), 0);
        assert_eq!(
            wrapped.to_string(),
            "获取物流信息失败: Failed to get access token"
        );
        assert_eq!(wrapped.inner().map(JdlError::kind), Some("TokenMissing"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;

        let wrapped = JdlError::wrap("x: ", JdlError::Auth("no code".to_string()));
        let source = wrapped.source().expect("wrapped error has a source");
        assert_eq!(source.to_string(), "no code");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("weight", "重量必须大于0");
        assert_eq!(err.to_string(), "weight: 重量必须大于0");
        assert_eq!(JdlError::from(err).kind(), "ValidationError");
    }
}
