//! Notification type resolution.

use crate::payload::Payload;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// Keys that may carry the notification type, highest priority first.
///
/// SNS envelopes use `Type`, SES event publishing uses `eventType`, and SES notifications
/// use `notificationType`. The first key present wins, whatever the others say.
pub const TYPE_ALIAS_KEYS: [&str; 3] = ["Type", "eventType", "notificationType"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationType {
    SubscriptionConfirmation,
    Notification,
    Bounce,
    Complaint,
    Unrecognized(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SubscriptionConfirmation => "SubscriptionConfirmation",
            Self::Notification => "Notification",
            Self::Bounce => "Bounce",
            Self::Complaint => "Complaint",
            Self::Unrecognized(other) => other,
        }
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        match s {
            "SubscriptionConfirmation" => Self::SubscriptionConfirmation,
            "Notification" => Self::Notification,
            "Bounce" => Self::Bounce,
            "Complaint" => Self::Complaint,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the first alias key present in `payload`.
///
/// A key holding something other than a string still wins the tie-break; its JSON text is
/// returned so it surfaces as an unrecognized type rather than falling through to the next key.
pub fn resolve_type(payload: &Payload) -> Option<Cow<'_, str>> {
    TYPE_ALIAS_KEYS
        .iter()
        .find_map(|key| payload.get(*key))
        .map(|value| match value {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        })
}
