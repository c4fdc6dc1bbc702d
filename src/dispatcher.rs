//! Routes a resolved notification to its handler.
//!
//! A `Notification` envelope wraps another message as a JSON string in `Message`. When that
//! inner message is a bounce or complaint the dispatcher calls itself with the inner type and
//! payload; anything else inside a `Notification` is informational and only logged.

use crate::bounce::extract_bounce;
use crate::complaint::extract_complaint;
use crate::error::CallbackError;
use crate::notification::NotificationType;
use crate::payload::{Payload, lookup_str, parse_json};
use crate::subscription::{HttpClient, confirm_subscription};
use crate::suppression::{SuppressionAction, SuppressionSink};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Inner types of a `Notification` envelope that are dispatched again.
pub const RECURSIVE_TYPES: [NotificationType; 2] =
    [NotificationType::Bounce, NotificationType::Complaint];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    SubscriptionConfirmed,
    /// A `Notification` whose inner message needs no action.
    Informational,
    /// Number of suppression actions handed to the sink.
    Suppressed(usize),
}

/// Run one notification through the state machine, applying side effects as it goes.
pub async fn dispatch<S, H>(
    sink: &S,
    http: &H,
    kind: NotificationType,
    payload: &Payload,
) -> Result<DispatchOutcome, CallbackError>
where
    S: SuppressionSink,
    H: HttpClient,
{
    match kind {
        NotificationType::SubscriptionConfirmation => {
            confirm_subscription(http, payload).await?;
            Ok(DispatchOutcome::SubscriptionConfirmed)
        }
        NotificationType::Notification => {
            let inner = decode_message(payload)?;
            let inner_kind = lookup_str(&inner, &["notificationType"]).map(NotificationType::from);

            match inner_kind {
                Some(inner_kind) if RECURSIVE_TYPES.contains(&inner_kind) => {
                    Box::pin(dispatch(sink, http, inner_kind, &inner)).await
                }
                _ => {
                    info!(
                        subject = lookup_str(payload, &["Subject"]).unwrap_or_default(),
                        message = lookup_str(payload, &["Message"]).unwrap_or_default(),
                        "Informational SNS notification — no action"
                    );
                    Ok(DispatchOutcome::Informational)
                }
            }
        }
        NotificationType::Bounce => {
            let envelope = extract_bounce(payload)?;
            if !envelope.is_permanent() {
                info!(
                    bounce_type = %envelope.bounce_type,
                    recipients = ?envelope.records.iter().map(|r| &r.email_address).collect::<Vec<_>>(),
                    "Non-permanent bounce — ignoring"
                );
                return Ok(DispatchOutcome::Suppressed(0));
            }
            let actions = envelope.suppression_actions()?;
            for record in &envelope.records {
                debug!("Mark email '{}' as bounced, reason: {}", record.email_address, record.reason());
            }
            let count = apply(sink, actions).await;
            Ok(DispatchOutcome::Suppressed(count))
        }
        NotificationType::Complaint => {
            let envelope = extract_complaint(payload)?;
            let actions = envelope.suppression_actions()?;
            for action in &actions {
                debug!("Unsubscribe email '{}'", action.address);
            }
            let count = apply(sink, actions).await;
            Ok(DispatchOutcome::Suppressed(count))
        }
        NotificationType::Unrecognized(kind) => {
            warn!(notification_type = %kind, "Received SES webhook but couldn't understand payload");
            let dump = serde_json::Value::Object(payload.clone()).to_string();
            debug!(payload = %dump, "SES webhook payload");
            Err(CallbackError::UnknownNotificationType {
                kind,
                payload: payload.clone(),
            })
        }
    }
}

/// Decode the JSON string in `Message`. An already-decoded object is accepted as is.
fn decode_message(payload: &Payload) -> Result<Payload, CallbackError> {
    let invalid = || CallbackError::MalformedPayload("Invalid Notification JSON Payload".to_string());
    match payload.get("Message") {
        Some(Value::String(raw)) => parse_json(raw).map_err(|_| invalid()),
        Some(Value::Object(inner)) => Ok(inner.clone()),
        _ => Err(invalid()),
    }
}

/// Hand every action to the sink. A failed write is logged and the rest still go through.
async fn apply<S: SuppressionSink>(sink: &S, actions: Vec<SuppressionAction>) -> usize {
    let mut applied = 0;
    for action in &actions {
        match sink.add_failure(action).await {
            Ok(()) => {
                info!(email = %action.address, kind = %action.kind, "Address suppressed");
                applied += 1;
            }
            Err(e) => warn!(email = %action.address, error = %e, "Failed to record suppression"),
        }
    }
    applied
}

// ============================================================================
// Tests
// ============================================================================
