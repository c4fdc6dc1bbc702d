//! SES complaint extraction.
//!
//! Complaints have no severity filter: every complained recipient is unsubscribed. The
//! feedback type is a property of the complaint and is shared by all its recipients.
//!
//! See: https://docs.aws.amazon.com/ses/latest/dg/notification-contents.html#complaint-object

use crate::error::CallbackError;
use crate::mail::{MailMetadata, recipient_address};
use crate::payload::{Payload, lookup_objects, lookup_str};
use crate::suppression::{SuppressionAction, SuppressionKind};
use serde_json::Value;
use std::fmt;

/// Why a recipient complained, from the provider's feedback-type vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplaintReason {
    Abuse,
    AuthFailure,
    Fraud,
    NotSpam,
    Other,
    Virus,
    Unknown,
    /// No feedback type was given but SES supplied a complaint subtype.
    SubType(String),
}

impl ComplaintReason {
    /// Classify a complaint from its feedback type, falling back to the subtype.
    pub fn classify(feedback_type: Option<&str>, sub_type: Option<&str>) -> Self {
        match feedback_type {
            Some("abuse") => Self::Abuse,
            Some("auth-failure") => Self::AuthFailure,
            Some("fraud") => Self::Fraud,
            Some("not-spam") => Self::NotSpam,
            Some("other") => Self::Other,
            Some("virus") => Self::Virus,
            Some(_) => Self::Unknown,
            None => match sub_type.filter(|s| !s.is_empty()) {
                Some(sub_type) => Self::SubType(sub_type.to_string()),
                None => Self::Unknown,
            },
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Abuse => "abuse",
            Self::AuthFailure => "auth-failure",
            Self::Fraud => "fraud",
            Self::NotSpam => "not-spam",
            Self::Other => "other",
            Self::Virus => "virus",
            Self::Unknown => "unknown",
            Self::SubType(sub_type) => sub_type,
        }
    }
}

impl fmt::Display for ComplaintReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    pub email_address: String,
    /// Empty when SES did not report a feedback type.
    pub feedback_type: String,
    pub reason: ComplaintReason,
}

/// Everything read from one complaint envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintEnvelope {
    pub feedback_type: Option<String>,
    pub sub_type: Option<String>,
    pub mail: MailMetadata,
    pub records: Vec<ComplaintRecord>,
}

impl ComplaintEnvelope {
    /// One `Unsubscribed` action per complained recipient. Any unparseable address is an error.
    pub fn suppression_actions(&self) -> Result<Vec<SuppressionAction>, CallbackError> {
        self.records
            .iter()
            .map(|record| {
                Ok(SuppressionAction {
                    address: recipient_address(&record.email_address)?,
                    reason: record.reason.label().to_string(),
                    kind: SuppressionKind::Unsubscribed,
                    correlation_id: self.mail.correlation_id.clone(),
                })
            })
            .collect()
    }
}

/// Read the complaint block of `payload`. Only a missing `complaint` key is an error.
pub fn extract_complaint(payload: &Payload) -> Result<ComplaintEnvelope, CallbackError> {
    if !payload.contains_key("complaint") {
        return Err(CallbackError::MissingComplaintBlock);
    }

    let feedback_type = lookup_str(payload, &["complaint", "complaintFeedbackType"]);
    let sub_type = lookup_str(payload, &["complaint", "complaintSubType"]);
    let reason = ComplaintReason::classify(feedback_type, sub_type);

    let records = lookup_objects(payload, &["complaint", "complainedRecipients"])
        .into_iter()
        .map(|recipient| ComplaintRecord {
            email_address: recipient
                .get("emailAddress")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            feedback_type: feedback_type.unwrap_or_default().to_string(),
            reason: reason.clone(),
        })
        .collect();

    Ok(ComplaintEnvelope {
        feedback_type: feedback_type.map(str::to_string),
        sub_type: sub_type.map(str::to_string),
        mail: MailMetadata::from_payload(payload),
        records,
    })
}

// ============================================================================
// Tests
// ============================================================================
