//! OAuth authorization-code helpers.

use url::Url;
use uuid::Uuid;

use crate::entity::JdlConfig;
use crate::error::{JdlError, Result};

/// Random `state` value: MD5 hex of a fresh UUID.
pub fn new_state() -> String {
    format!("{:x}", md5::compute(Uuid::new_v4().to_string()))
}

/// Query parameters of the `to_login` call.
pub fn auth_query(config: &JdlConfig, state: &str) -> Vec<(&'static str, String)> {
    vec![
        ("app_key", config.app_key.clone()),
        ("response_type", "code".to_string()),
        ("redirect_uri", config.redirect_uri.clone()),
        ("state", state.to_string()),
        ("scope", "snsapi_base".to_string()),
    ]
}

/// Pulls the `code` query parameter out of a redirect target.
///
/// `location` may be relative; it is resolved against `base`.
pub fn extract_auth_code(location: Option<&str>, base: &Url) -> Result<String> {
    let parse_failed = || JdlError::Auth("Failed to parse redirect URL".to_string());

    let location = location.filter(|l| !l.is_empty()).ok_or_else(parse_failed)?;
    let redirect = base.join(location).map_err(|_| parse_failed())?;
    if redirect.query().is_none() {
        return Err(parse_failed());
    }

    redirect
        .query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| JdlError::Auth("Failed to get auth code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://open-oauth.jd.com/oauth2/to_login").unwrap()
    }

    #[test]
    fn test_extracts_code() {
        let code = extract_auth_code(
            Some("https://merchant.example.com/cb?code=abc123&state=xyz"),
            &base(),
        )
        .unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn test_relative_location() {
        let code = extract_auth_code(Some("/oauth2/done?code=R1"), &base()).unwrap();
        assert_eq!(code, "R1");
    }

    #[test]
    fn test_failures() {
        let cases = [
            (None, "Failed to parse redirect URL"),
            (Some(""), "Failed to parse redirect URL"),
            (Some("https://merchant.example.com/cb"), "Failed to parse redirect URL"),
            (Some("https://merchant.example.com/cb?state=x"), "Failed to get auth code"),
            (Some("https://merchant.example.com/cb?code="), "Failed to get auth code"),
        ];
        for (location, message) in cases {
            let err = extract_auth_code(location, &base()).unwrap_err();
            assert!(matches!(err, JdlError::Auth(_)), "{:?}", location);
            assert_eq!(err.to_string(), message, "{:?}", location);
        }
    }

    #[test]
    fn test_state_is_md5_hex() {
        let state = new_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, new_state());
    }

    #[test]
    fn test_auth_query() {
        let config = JdlConfig::new("C1", "K1", "S1", "https://merchant.example.com/cb");
        let query = auth_query(&config, "st");
        let keys: Vec<_> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["app_key", "response_type", "redirect_uri", "state", "scope"]
        );
        assert_eq!(query[0].1, "K1");
        assert_eq!(query[4].1, "snsapi_base");
    }
}
