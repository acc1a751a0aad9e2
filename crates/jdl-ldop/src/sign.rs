//! Request signature for the JD router.
//!
//! Keys are sorted by byte order and the signing string is
//! `secret + key1 + value1 + ... + secret`, skipping the `sign` key and any
//! null or empty value. The digest is returned as upper-case hex.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{JdlError, Result, ValidationError};

/// Parameter excluded from its own signature.
pub const SIGN_KEY: &str = "sign";

/// Digest algorithm for the signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMethod {
    #[default]
    Md5,
    Sha1,
    Sha256,
}

impl SignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignMethod::Md5 => "md5",
            SignMethod::Sha1 => "sha1",
            SignMethod::Sha256 => "sha256",
        }
    }

    fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            SignMethod::Md5 => format!("{:X}", md5::compute(data)),
            SignMethod::Sha1 => format!("{:X}", Sha1::digest(data)),
            SignMethod::Sha256 => format!("{:X}", Sha256::digest(data)),
        }
    }
}

impl fmt::Display for SignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "md5" => Ok(SignMethod::Md5),
            "sha1" => Ok(SignMethod::Sha1),
            "sha256" => Ok(SignMethod::Sha256),
            other => Err(ValidationError::new(
                "sign_method",
                format!("must be one of md5, sha1, sha256 (got '{}')", other),
            )),
        }
    }
}

/// Signs `params` with MD5, the only digest the router accepts.
pub fn sign(params: &BTreeMap<String, Value>, secret: &str) -> Result<String> {
    sign_with(params, secret, SignMethod::Md5)
}

/// Signs `params` with the given digest.
///
/// Fails with [`JdlError::InvalidInput`] when a value is an array or object.
pub fn sign_with(
    params: &BTreeMap<String, Value>,
    secret: &str,
    method: SignMethod,
) -> Result<String> {
    let mut plain = String::from(secret);
    for (key, value) in params {
        if key == SIGN_KEY {
            continue;
        }
        let Some(text) = scalar_to_string(key, value)? else {
            continue;
        };
        if text.is_empty() {
            continue;
        }
        plain.push_str(key);
        plain.push_str(&text);
    }
    plain.push_str(secret);

    Ok(method.hex_digest(plain.as_bytes()))
}

/// String form of a scalar parameter, `None` for null.
///
/// Booleans render as `"1"`/`""` and integral floats without a fraction,
/// matching how the router stringifies form values.
pub(crate) fn scalar_to_string(key: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(true) => Ok(Some("1".to_string())),
        Value::Bool(false) => Ok(Some(String::new())),
        Value::Number(n) => Ok(Some(number_to_string(n))),
        Value::Array(_) | Value::Object(_) => Err(JdlError::InvalidInput(format!(
            "signature parameter '{}' must be a scalar",
            key
        ))),
    }
}

fn number_to_string(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        Some(f) => format!("{}", f),
        None => n.to_string(),
    }
}
