//! Canonical parameter set for one router call.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::entity::JdlConfig;
use crate::error::{JdlError, Result};
use crate::sign::{self, SIGN_KEY};
use crate::time;

/// Protocol version sent on every call.
pub const API_VERSION: &str = "2.0";

/// `sign_method` on the wire. Always MD5, whatever the config selects.
pub const WIRE_SIGN_METHOD: &str = "md5";

/// Form field carrying the serialized business parameters.
pub const PARAM_JSON_KEY: &str = "360buy_param_json";

const REDACTED: &str = "[HIDDEN]";

/// Compact JSON with `\uXXXX` escapes for non-ASCII text and `\/` for
/// slashes, matching what JD's reference clients put in the signed string.
struct AsciiJsonFormatter;

impl Formatter for AsciiJsonFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            match ch {
                '/' => writer.write_all(b"\\/")?,
                c if c.is_ascii() => writer.write_all(&[c as u8])?,
                c => {
                    for unit in c.encode_utf16(&mut units) {
                        write!(writer, "\\u{:04x}", unit)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn param_json_error(e: impl std::fmt::Display) -> JdlError {
    JdlError::InvalidInput(format!("failed to serialize business params: {}", e))
}

/// Serializes business parameters the way they are signed and sent.
pub fn encode_param_json(business_params: &Map<String, Value>) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiJsonFormatter);
    business_params
        .serialize(&mut serializer)
        .map_err(param_json_error)?;
    String::from_utf8(out).map_err(param_json_error)
}

/// A fully signed router request, ready to be posted as a form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    params: BTreeMap<String, String>,
}

impl SignedRequest {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn method(&self) -> &str {
        self.get("method").unwrap_or_default()
    }

    pub fn signature(&self) -> &str {
        self.get(SIGN_KEY).unwrap_or_default()
    }

    /// Form body fields in key order.
    pub fn form_fields(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Parameters with the signature masked, for logging.
    pub fn redacted(&self) -> BTreeMap<String, String> {
        let mut params = self.params.clone();
        if let Some(sign) = params.get_mut(SIGN_KEY) {
            *sign = REDACTED.to_string();
        }
        params
    }
}

/// Builds signed requests for one config and access token.
pub struct RequestBuilder<'a> {
    config: Option<&'a JdlConfig>,
    access_token: &'a str,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: Option<&'a JdlConfig>, access_token: &'a str) -> Self {
        Self {
            config,
            access_token,
        }
    }

    /// Builds the request stamped with the current local time.
    pub fn build(&self, method: &str, business_params: &Map<String, Value>) -> Result<SignedRequest> {
        self.build_at(method, business_params, time::now())
    }

    /// Builds the request with an explicit timestamp.
    pub fn build_at(
        &self,
        method: &str,
        business_params: &Map<String, Value>,
        timestamp: NaiveDateTime,
    ) -> Result<SignedRequest> {
        let config = self.config.ok_or_else(|| {
            JdlError::ConfigMissing("未找到京东配置".to_string())
        })?;

        let param_json = encode_param_json(business_params)?;

        let mut params: BTreeMap<String, Value> = BTreeMap::new();
        params.insert("method".to_string(), Value::from(method));
        params.insert("access_token".to_string(), Value::from(self.access_token));
        params.insert("app_key".to_string(), Value::from(config.app_key.as_str()));
        params.insert(
            "timestamp".to_string(),
            Value::from(time::format_datetime(&timestamp)),
        );
        params.insert("v".to_string(), Value::from(API_VERSION));
        params.insert("sign_method".to_string(), Value::from(WIRE_SIGN_METHOD));
        params.insert(PARAM_JSON_KEY.to_string(), Value::from(param_json));

        let signature = sign::sign(&params, config.app_secret())?;

        let mut fields = BTreeMap::new();
        for (key, value) in &params {
            let text = sign::scalar_to_string(key, value)?.unwrap_or_default();
            fields.insert(key.clone(), text);
        }
        fields.insert(SIGN_KEY.to_string(), signature);

        Ok(SignedRequest { params: fields })
    }
}
