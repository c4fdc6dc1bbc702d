//! SES bounce extraction.
//!
//! Turns a bounce envelope (delivered directly, or unwrapped from an SNS `Notification`) into
//! per-recipient records. Only permanent bounces lead to suppression; transient and
//! undetermined bounces are read and then dropped.
//!
//! See: https://docs.aws.amazon.com/ses/latest/dg/notification-contents.html#bounce-object

use crate::error::CallbackError;
use crate::mail::{MailMetadata, recipient_address};
use crate::payload::{Payload, lookup_objects, lookup_str};
use crate::suppression::{SuppressionAction, SuppressionKind};
use serde_json::Value;
use std::fmt;

const PERMANENT: &str = "Permanent";
const UNKNOWN_DIAGNOSTIC: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceRecord {
    pub email_address: String,
    pub action: String,
    pub status: String,
    pub diagnostic_code: String,
    pub bounce_sub_type: String,
    pub is_permanent: bool,
}

impl BounceRecord {
    /// Reason handed to the suppression sink.
    pub fn reason(&self) -> String {
        format!(
            "{} AWS bounce type: {}",
            self.diagnostic_code, self.bounce_sub_type
        )
    }
}

impl fmt::Display for BounceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} as bounced, reason: {}",
            self.email_address, self.diagnostic_code
        )
    }
}

/// Everything read from one bounce envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BounceEnvelope {
    pub bounce_type: String,
    pub bounce_sub_type: String,
    pub mail: MailMetadata,
    pub records: Vec<BounceRecord>,
}

impl BounceEnvelope {
    pub fn is_permanent(&self) -> bool {
        self.bounce_type == PERMANENT
    }

    /// Suppression actions for this envelope; empty unless the bounce is permanent.
    ///
    /// One unparseable recipient address fails the whole envelope, so nothing is suppressed
    /// until the provider redelivers.
    pub fn suppression_actions(&self) -> Result<Vec<SuppressionAction>, CallbackError> {
        self.records
            .iter()
            .filter(|record| record.is_permanent)
            .map(|record| {
                Ok(SuppressionAction {
                    address: recipient_address(&record.email_address)?,
                    reason: record.reason(),
                    kind: SuppressionKind::Bounced,
                    correlation_id: self.mail.correlation_id.clone(),
                })
            })
            .collect()
    }
}

/// Read the bounce block of `payload`. Only a missing `bounce` key is an error.
pub fn extract_bounce(payload: &Payload) -> Result<BounceEnvelope, CallbackError> {
    if !payload.contains_key("bounce") {
        return Err(CallbackError::MissingBounceBlock);
    }

    let bounce_type = lookup_str(payload, &["bounce", "bounceType"])
        .unwrap_or_default()
        .to_string();
    let bounce_sub_type = lookup_str(payload, &["bounce", "bounceSubType"])
        .unwrap_or_default()
        .to_string();
    let is_permanent = bounce_type == PERMANENT;

    let records = lookup_objects(payload, &["bounce", "bouncedRecipients"])
        .into_iter()
        .map(|recipient| BounceRecord {
            email_address: field(recipient, "emailAddress").unwrap_or_default(),
            action: field(recipient, "action").unwrap_or_default(),
            status: field(recipient, "status").unwrap_or_default(),
            diagnostic_code: field(recipient, "diagnosticCode")
                .unwrap_or_else(|| UNKNOWN_DIAGNOSTIC.to_string()),
            bounce_sub_type: bounce_sub_type.clone(),
            is_permanent,
        })
        .collect();

    Ok(BounceEnvelope {
        bounce_type,
        bounce_sub_type,
        mail: MailMetadata::from_payload(payload),
        records,
    })
}

fn field(recipient: &Payload, key: &str) -> Option<String> {
    recipient.get(key).and_then(Value::as_str).map(str::to_string)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::parse_json;
    use serde_json::json;

    fn bounce(bounce_type: &str, emails: &[&str]) -> Payload {
        let recipients: Vec<_> = emails
            .iter()
            .map(|e| {
                json!({
                    "emailAddress": e,
                    "action": "failed",
                    "status": "5.1.1",
                    "diagnosticCode": "smtp; 550 5.1.1 user unknown"
                })
            })
            .collect();
        parse_json(
            &json!({
                "notificationType": "Bounce",
                "bounce": {
                    "bounceType": bounce_type,
                    "bounceSubType": "General",
                    "bouncedRecipients": recipients
                },
                "mail": {
                    "messageId": "0100018e-abc",
                    "sourceIp": "192.0.2.10",
                    "headers": [
                        {"name": "From", "value": "news@example.org"},
                        {"name": "X-EMAIL-ID", "value": "42"}
                    ]
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn permanent_bounce_yields_one_action_per_recipient() {
        let envelope = extract_bounce(&bounce("Permanent", &["a@example.com", "b@example.com"]))
            .unwrap();
        let actions = envelope.suppression_actions().unwrap();

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| a.kind == SuppressionKind::Bounced));
        assert!(actions.iter().all(|a| a.correlation_id.as_deref() == Some("42")));
        assert_eq!(
            actions[0].reason,
            "smtp; 550 5.1.1 user unknown AWS bounce type: General"
        );
    }

    #[test]
    fn transient_bounce_yields_no_actions() {
        let envelope = extract_bounce(&bounce(
            "Transient",
            &["a@example.com", "b@example.com", "c@example.com"],
        ))
        .unwrap();

        assert_eq!(envelope.records.len(), 3);
        assert!(envelope.records.iter().all(|r| !r.is_permanent));
        assert!(envelope.suppression_actions().unwrap().is_empty());
    }

    #[test]
    fn missing_diagnostic_code_defaults_to_unknown() {
        let payload = parse_json(
            &json!({
                "bounce": {
                    "bounceType": "Permanent",
                    "bounceSubType": "NoEmail",
                    "bouncedRecipients": [{"emailAddress": "a@example.com"}]
                }
            })
            .to_string(),
        )
        .unwrap();
        let envelope = extract_bounce(&payload).unwrap();

        assert_eq!(envelope.records[0].diagnostic_code, "unknown");
        assert_eq!(envelope.records[0].action, "");
        assert_eq!(envelope.mail.correlation_id, None);
        assert_eq!(
            envelope.suppression_actions().unwrap()[0].reason,
            "unknown AWS bounce type: NoEmail"
        );
    }

    #[test]
    fn sparse_bounce_block_still_extracts() {
        let payload = parse_json(r#"{"bounce": {}}"#).unwrap();
        let envelope = extract_bounce(&payload).unwrap();
        assert!(envelope.records.is_empty());
        assert!(!envelope.is_permanent());
        assert_eq!(envelope.mail.source_ip, "");
    }

    #[test]
    fn missing_bounce_block_is_an_error() {
        let payload = parse_json(r#"{"notificationType": "Bounce", "mail": {}}"#).unwrap();
        assert!(matches!(
            extract_bounce(&payload),
            Err(CallbackError::MissingBounceBlock)
        ));
    }

    #[test]
    fn display_named_recipient_is_normalized() {
        let envelope =
            extract_bounce(&bounce("Permanent", &["Jane Doe <jane@example.com>"])).unwrap();
        assert_eq!(envelope.suppression_actions().unwrap()[0].address, "jane@example.com");
    }

    #[test]
    fn invalid_recipient_fails_the_envelope() {
        let envelope =
            extract_bounce(&bounce("Permanent", &["ok@example.com", "not-an-email"])).unwrap();
        let err = envelope.suppression_actions().unwrap_err();
        assert!(matches!(err, CallbackError::InvalidRecipientAddress(ref a) if a == "not-an-email"));
    }

    #[test]
    fn invalid_recipient_in_transient_bounce_is_ignored() {
        let envelope = extract_bounce(&bounce("Transient", &["not-an-email"])).unwrap();
        assert!(envelope.suppression_actions().unwrap().is_empty());
    }

    #[test]
    fn duplicate_recipients_are_not_deduplicated() {
        let envelope =
            extract_bounce(&bounce("Permanent", &["dup@example.com", "dup@example.com"])).unwrap();
        assert_eq!(envelope.suppression_actions().unwrap().len(), 2);
    }

    #[test]
    fn extraction_is_repeatable() {
        let payload = bounce("Permanent", &["a@example.com"]);
        assert_eq!(extract_bounce(&payload).unwrap(), extract_bounce(&payload).unwrap());
    }

    #[test]
    fn record_display_matches_log_format() {
        let envelope = extract_bounce(&bounce("Permanent", &["a@example.com"])).unwrap();
        assert_eq!(
            envelope.records[0].to_string(),
            "a@example.com as bounced, reason: smtp; 550 5.1.1 user unknown"
        );
    }
}
