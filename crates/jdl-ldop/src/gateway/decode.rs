//! Response body decoding into `serde_json::Value`.
//!
//! XML bodies are mapped onto the shape the JSON format produces: the root
//! element becomes the single top-level key, elements with children become
//! objects, repeated children become arrays and leaf elements become
//! strings. Attributes are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::entity::ResponseFormat;
use crate::error::{JdlError, Result};

pub fn decode_body(body: &str, format: ResponseFormat) -> Result<Value> {
    let value = match format {
        ResponseFormat::Json => serde_json::from_str::<Value>(body)
            .map_err(|e| JdlError::Decode(format!("invalid JSON: {}", e)))?,
        ResponseFormat::Xml => decode_xml(body)?,
    };
    if !value.is_object() {
        return Err(JdlError::Decode(format!(
            "expected an object at the top level, got {}",
            type_name(&value)
        )));
    }
    Ok(value)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> (String, Value) {
        let value = if self.children.is_empty() {
            Value::String(self.text.trim().to_string())
        } else {
            Value::Object(self.children)
        };
        (self.name, value)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            None => {
                self.children.insert(name, value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

pub fn decode_xml(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(Element::new(element_name(e.local_name().as_ref())));
            }
            Ok(Event::Empty(ref e)) => {
                let name = element_name(e.local_name().as_ref());
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, Value::String(String::new())),
                    None => root = Some((name, Value::String(String::new()))),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| JdlError::Decode("unbalanced XML end tag".to_string()))?;
                let (name, value) = element.into_value();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => root = Some((name, value)),
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = e
                        .decode()
                        .map_err(|e| JdlError::Decode(format!("invalid XML text: {}", e)))?;
                    current.text.push_str(&decoded);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&resolve_reference(&e)?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(JdlError::Decode(format!("XML parsing error: {}", e)));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(JdlError::Decode("unclosed XML element".to_string()));
    }
    let (name, value) =
        root.ok_or_else(|| JdlError::Decode("XML body has no root element".to_string()))?;

    let mut object = Map::new();
    object.insert(name, value);
    Ok(Value::Object(object))
}

fn resolve_reference(reference: &quick_xml::events::BytesRef<'_>) -> Result<String> {
    let invalid = |e: &dyn std::fmt::Display| JdlError::Decode(format!("invalid XML reference: {}", e));

    if let Some(ch) = reference.resolve_char_ref().map_err(|e| invalid(&e))? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(|e| invalid(&e))?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| JdlError::Decode(format!("unknown XML entity '&{};'", name)))
}
