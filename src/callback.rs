//! Webhook request handling.
//!
//! Framework-agnostic: accepts `CallbackRequest`, returns `CallbackResponse`. The Lambda entry
//! point in `src/bin/webhook.rs` adapts `lambda_http` types to/from these and calls `handle`.

use crate::dispatcher::{DispatchOutcome, dispatch};
use crate::error::CallbackError;
use crate::notification::NotificationType;
use crate::payload::{Payload, body_text, normalize};
use crate::subscription::HttpClient;
use crate::suppression::SuppressionSink;
use crate::transport::{Admitted, MailTransport, admit};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

const LOG_PREFIX: &str = "AmazonCallback";

// ============================================================================
// Request / Response types
// ============================================================================

pub struct CallbackRequest {
    pub content_type: Option<String>,
    /// Raw body bytes, decoded as UTF-8 only once the transport is known to be SES.
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum CallbackResponse {
    Text { status: u16, body: String },
    /// The configured transport is not SES; the host should fall back to its default handling.
    NotApplicable,
}

impl CallbackResponse {
    fn ok(body: String) -> Self {
        Self::Text { status: 200, body }
    }

    fn bad_request(body: String) -> Self {
        Self::Text { status: 400, body }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Text { status, .. } => Some(*status),
            Self::NotApplicable => None,
        }
    }

    pub fn body_contains(&self, s: &str) -> bool {
        match self {
            Self::Text { body, .. } => body.contains(s),
            Self::NotApplicable => false,
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

pub struct AppState<S, H> {
    pub(crate) sink: Arc<S>,
    pub(crate) http: H,
    pub(crate) transport: MailTransport,
}

impl<S, H> AppState<S, H> {
    pub fn new(sink: Arc<S>, http: H, transport: MailTransport) -> Self {
        Self {
            sink,
            http,
            transport,
        }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub fn http(&self) -> &H {
        &self.http
    }
}

// ============================================================================
// Handling
// ============================================================================

/// Process one provider callback end to end. Never fails: every error becomes a 400.
pub async fn handle<S, H>(request: &CallbackRequest, state: &AppState<S, H>) -> CallbackResponse
where
    S: SuppressionSink,
    H: HttpClient,
{
    if !state.transport.is_amazon_ses() {
        return CallbackResponse::NotApplicable;
    }

    let body = match request.body.as_deref().map(body_text).transpose() {
        Ok(body) => body.unwrap_or(""),
        Err(e) => return reject(&e),
    };
    let payload = if body.trim().is_empty() {
        None
    } else {
        match normalize(request.content_type.as_deref(), body) {
            Ok(p) => Some(p),
            Err(e) => return reject(&e),
        }
    };

    let (payload, kind) = match admit(payload.as_ref()) {
        Ok(Admitted { payload, kind }) => (payload, NotificationType::from(&*kind)),
        Err(e) => return reject(&e),
    };

    match dispatch(state.sink.as_ref(), &state.http, kind.clone(), payload).await {
        Ok(outcome) => {
            info!(notification_type = %kind, outcome = ?outcome, "Callback processed");
            CallbackResponse::ok(format!("Callback processed: {kind}"))
        }
        Err(e) => reject(&e),
    }
}

/// Process a message delivered by an SNS Lambda subscription.
///
/// SNS hands Lambda the bare message, so it is re-wrapped as a `Notification` envelope and
/// takes the same path as an HTTP delivery. Errors are logged and returned to the caller.
pub async fn handle_sns_message<S, H>(
    state: &AppState<S, H>,
    subject: Option<&str>,
    message: &str,
) -> Result<Option<DispatchOutcome>, CallbackError>
where
    S: SuppressionSink,
    H: HttpClient,
{
    if !state.transport.is_amazon_ses() {
        info!(scheme = %state.transport.scheme(), "Mail transport is not SES — skipping SNS message");
        return Ok(None);
    }

    let mut envelope = Payload::new();
    envelope.insert("Type".to_string(), Value::from("Notification"));
    if let Some(subject) = subject {
        envelope.insert("Subject".to_string(), Value::from(subject));
    }
    envelope.insert("Message".to_string(), Value::from(message));

    dispatch(
        state.sink.as_ref(),
        &state.http,
        NotificationType::Notification,
        &envelope,
    )
    .await
    .map(Some)
    .inspect_err(|e| error!("{LOG_PREFIX}: {e}"))
}

fn reject(e: &CallbackError) -> CallbackResponse {
    let message = format!("{LOG_PREFIX}: {e}");
    error!(validation = e.is_validation(), "{message}");
    CallbackResponse::bad_request(message)
}

// ============================================================================
// Tests
// ============================================================================
