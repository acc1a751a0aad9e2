//! OAuth access token used to authorize every router call.

use chrono::{Duration, NaiveDateTime};

use super::Audit;

/// Maximum buffer we accept (1 year in seconds).
/// This prevents overflow when casting u64 to i64.
const MAX_BUFFER_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Identifier of the token row every gateway call reads.
///
/// Tokens are not scoped to a config; the gateway always looks up this id.
pub const DEFAULT_TOKEN_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub id: Option<i64>,
    pub access_token: String,
    pub refresh_token: String,
    pub scope: Option<String>,
    pub expire_time: Option<NaiveDateTime>,
    pub audit: Audit,
}

impl AccessToken {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            id: None,
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            scope: None,
            expire_time: None,
            audit: Audit::default(),
        }
    }

    /// Checks if the token expires within `buffer_seconds` of `now`.
    ///
    /// A token without an expiry time is treated as not expired.
    pub fn is_expired_at(&self, now: NaiveDateTime, buffer_seconds: u64) -> bool {
        let Some(expire_time) = self.expire_time else {
            return false;
        };
        let buffer = Duration::seconds(buffer_seconds.min(MAX_BUFFER_SECONDS) as i64);
        expire_time <= now + buffer
    }

    pub fn is_expired(&self, buffer_seconds: u64) -> bool {
        self.is_expired_at(crate::time::now(), buffer_seconds)
    }

    /// Checks if the token can be refreshed.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}
