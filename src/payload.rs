//! Normalisation of raw callback bodies into a generic [`Payload`].
//!
//! SNS posts JSON, but the endpoint also accepts flat form posts. Either way the rest of the
//! crate only ever sees an ordered string-keyed map.

use crate::error::CallbackError;
use serde_json::{Map, Value};

/// Ordered key/value view of one callback body (or of a decoded inner `Message`).
pub type Payload = Map<String, Value>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub fn is_form_encoded(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Build a [`Payload`] from the request content type and raw body.
pub fn normalize(content_type: Option<&str>, body: &str) -> Result<Payload, CallbackError> {
    if is_form_encoded(content_type) {
        return parse_form(body);
    }
    parse_json(body)
}

/// Parse a JSON document whose root must be an object.
pub fn parse_json(body: &str) -> Result<Payload, CallbackError> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CallbackError::MalformedPayload(
            "JSON root is not an object".to_string(),
        )),
        Err(e) => Err(CallbackError::MalformedPayload(e.to_string())),
    }
}

/// Decode a form body. Repeated keys keep the last value.
fn parse_form(body: &str) -> Result<Payload, CallbackError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(body)
        .map_err(|e| CallbackError::MalformedPayload(e.to_string()))?;
    Ok(pairs
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}

/// View a raw request body as text. Bytes that are not UTF-8 make the payload malformed.
pub fn body_text(body: &[u8]) -> Result<&str, CallbackError> {
    std::str::from_utf8(body)
        .map_err(|e| CallbackError::MalformedPayload(format!("body is not valid UTF-8: {e}")))
}

// ============================================================================
// Lookup helpers
// ============================================================================

/// Walk nested objects by key. Returns `None` as soon as a segment is missing or not an object.
pub fn lookup<'a>(payload: &'a Payload, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = payload.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// String at `path`, ignoring values of any other JSON type.
pub fn lookup_str<'a>(payload: &'a Payload, path: &[&str]) -> Option<&'a str> {
    lookup(payload, path).and_then(Value::as_str)
}

/// Objects inside the array at `path`. Non-object entries are skipped.
pub fn lookup_objects<'a>(payload: &'a Payload, path: &[&str]) -> Vec<&'a Payload> {
    lookup(payload, path)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}
