//! Helpers for JD's response envelope conventions.

use serde_json::Value;

/// `error_response.code` JD uses for an expired access token.
pub const TOKEN_EXPIRED_CODE: &str = "19";

/// The `error_response` object of a failed call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: Option<String>,
    pub zh_desc: Option<String>,
}

impl ErrorEnvelope {
    /// The code as an integer, or `default` when absent.
    pub fn numeric_code(&self, default: i64) -> i64 {
        self.code.as_deref().map(int_prefix).unwrap_or(default)
    }
}

/// Reads `error_response`, if the body carries one.
pub fn error_response(body: &Value) -> Option<ErrorEnvelope> {
    let envelope = body.get("error_response").filter(|v| !v.is_null())?;
    Some(ErrorEnvelope {
        code: envelope.get("code").and_then(code_string),
        zh_desc: envelope
            .get("zh_desc")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

pub fn is_token_expired(body: &Value) -> bool {
    error_response(body).and_then(|e| e.code).as_deref() == Some(TOKEN_EXPIRED_CODE)
}

/// Walks nested object keys. `None` if any step is missing or null.
pub fn lookup_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    (!current.is_null()).then_some(current)
}

/// String form of a code field given as a string or a number.
pub fn code_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integer form of a code field; non-numeric text counts as 0.
pub fn code_number(value: Option<&Value>, default: i64) -> i64 {
    match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => int_prefix(s),
        Some(Value::Bool(b)) => i64::from(*b),
        Some(_) => default,
    }
}

/// Leading integer of a string (`"19abc"` is 19, `"abc"` is 0).
fn int_prefix(text: &str) -> i64 {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}
