//! The `mail` block shared by bounce and complaint envelopes.

use crate::error::CallbackError;
use crate::payload::{Payload, lookup, lookup_objects, lookup_str};
use email_address::EmailAddress;
use serde_json::Value;
use std::str::FromStr;

/// Header stamped on every outgoing message to tie callbacks back to the original send.
pub const CORRELATION_HEADER: &str = "X-EMAIL-ID";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MailMetadata {
    pub message_id: Option<String>,
    /// `mail.sourceIp`, or `mail.tags["ses:source-ip"]` for SNS-relayed event publishing.
    pub source_ip: String,
    pub correlation_id: Option<String>,
}

impl MailMetadata {
    pub fn from_payload(payload: &Payload) -> Self {
        Self {
            message_id: lookup_str(payload, &["mail", "messageId"]).map(str::to_string),
            source_ip: source_ip(payload),
            correlation_id: correlation_id(payload),
        }
    }
}

fn source_ip(payload: &Payload) -> String {
    if let Some(ip) = lookup_str(payload, &["mail", "sourceIp"]) {
        return ip.to_string();
    }
    // Event publishing tags are lists of strings.
    match lookup(payload, &["mail", "tags", "ses:source-ip"]) {
        Some(Value::String(ip)) => ip.clone(),
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Value of the `X-EMAIL-ID` header in `mail.headers`; the last occurrence wins.
pub fn correlation_id(payload: &Payload) -> Option<String> {
    lookup_objects(payload, &["mail", "headers"])
        .into_iter()
        .filter(|header| header.get("name").and_then(Value::as_str) == Some(CORRELATION_HEADER))
        .filter_map(|header| header.get("value").and_then(Value::as_str))
        .last()
        .map(str::to_string)
}

/// Bare address out of a possibly display-name-qualified recipient (`"Jane <jane@example.com>"`).
pub fn normalize_address(raw: &str) -> Option<String> {
    EmailAddress::from_str(raw.trim())
        .ok()
        .map(|address| address.email())
}

/// [`normalize_address`] for a recipient that is about to be suppressed: failure is an error.
pub fn recipient_address(raw: &str) -> Result<String, CallbackError> {
    normalize_address(raw).ok_or_else(|| CallbackError::InvalidRecipientAddress(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_json;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        parse_json(&value.to_string()).unwrap()
    }

    #[test]
    fn source_ip_is_read_directly_when_present() {
        let p = payload(json!({"mail": {"sourceIp": "192.0.2.1", "tags": {"ses:source-ip": ["10.0.0.1"]}}}));
        assert_eq!(MailMetadata::from_payload(&p).source_ip, "192.0.2.1");
    }

    #[test]
    fn source_ip_falls_back_to_tags() {
        let p = payload(json!({"mail": {"tags": {"ses:source-ip": ["10.0.0.1"]}}}));
        assert_eq!(MailMetadata::from_payload(&p).source_ip, "10.0.0.1");

        let p = payload(json!({"mail": {"tags": {"ses:source-ip": "10.0.0.2"}}}));
        assert_eq!(MailMetadata::from_payload(&p).source_ip, "10.0.0.2");
    }

    #[test]
    fn source_ip_defaults_to_empty() {
        let p = payload(json!({"mail": {}}));
        assert_eq!(MailMetadata::from_payload(&p).source_ip, "");
    }

    #[test]
    fn correlation_header_is_case_sensitive() {
        let p = payload(json!({"mail": {"headers": [
            {"name": "x-email-id", "value": "lower"},
            {"name": "Subject", "value": "Hello"}
        ]}}));
        assert_eq!(correlation_id(&p), None);
    }

    #[test]
    fn last_correlation_header_wins() {
        let p = payload(json!({"mail": {"headers": [
            {"name": "X-EMAIL-ID", "value": "first"},
            {"name": "X-EMAIL-ID", "value": "second"}
        ]}}));
        assert_eq!(correlation_id(&p).as_deref(), Some("second"));
    }

    #[test]
    fn display_name_is_stripped_from_address() {
        assert_eq!(
            normalize_address("Jane Doe <jane@example.com>").as_deref(),
            Some("jane@example.com")
        );
        assert_eq!(
            normalize_address("bob@example.com").as_deref(),
            Some("bob@example.com")
        );
        assert_eq!(normalize_address("not-an-email"), None);
    }

    #[test]
    fn unparseable_recipient_is_an_error() {
        assert_eq!(
            recipient_address(" Jane <jane@example.com> ").unwrap(),
            "jane@example.com"
        );
        assert!(matches!(
            recipient_address("not-an-email"),
            Err(CallbackError::InvalidRecipientAddress(ref raw)) if raw == "not-an-email"
        ));
    }
}
