//! SNS subscription handshake.
//!
//! When a topic subscription is created SNS posts a `SubscriptionConfirmation` carrying a
//! `SubscribeURL`; fetching that URL once confirms the subscription. There is no retry here,
//! SNS resends the confirmation request on its own.

use crate::error::CallbackError;
use crate::payload::{Payload, lookup_str};
use anyhow::Result;
use reqwest::Url;
use tracing::info;

// ============================================================================
// HttpClient trait
// ============================================================================

#[allow(async_fn_in_trait)]
pub trait HttpClient: Send + Sync {
    /// Issue a GET and return the response status code.
    async fn get(&self, url: &Url) -> Result<u16>;
}

// ============================================================================
// ReqwestHttpClient
// ============================================================================

pub struct ReqwestHttpClient {
    http_client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &Url) -> Result<u16> {
        let response = self.http_client.get(url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}

// ============================================================================
// Confirmation
// ============================================================================

/// Parse `SubscribeURL` as an absolute http(s) URL. Runs before any network call.
pub fn subscribe_url(payload: &Payload) -> Result<Url, CallbackError> {
    let raw = lookup_str(payload, &["SubscribeURL"])
        .ok_or_else(|| CallbackError::InvalidSubscribeUrl("SubscribeURL is missing".to_string()))?;

    let url = Url::parse(raw)
        .map_err(|e| CallbackError::InvalidSubscribeUrl(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(CallbackError::InvalidSubscribeUrl(format!(
            "{raw}: not an http(s) URL"
        )));
    }
    Ok(url)
}

/// Confirm the SNS subscription described by `payload`.
pub async fn confirm_subscription<H: HttpClient>(
    http: &H,
    payload: &Payload,
) -> Result<(), CallbackError> {
    let url = subscribe_url(payload)?;

    let status = http
        .get(&url)
        .await
        .map_err(|e| CallbackError::SubscriptionConfirmationFailed(e.to_string()))?;

    if !(200..300).contains(&status) {
        return Err(CallbackError::SubscriptionConfirmationFailed(format!(
            "SubscribeURL responded with HTTP {status}"
        )));
    }

    info!(status, "Callback to SubscribeURL from Amazon SNS successfully");
    Ok(())
}

// ============================================================================
// Test utilities
// ============================================================================

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use std::sync::Mutex;

    pub(crate) struct FakeHttpClient {
        response: std::result::Result<u16, String>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeHttpClient {
        pub(crate) fn status(status: u16) -> Self {
            Self {
                response: Ok(status),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn error(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.requested.lock().unwrap().len()
        }

        pub(crate) fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl HttpClient for FakeHttpClient {
        async fn get(&self, url: &Url) -> anyhow::Result<u16> {
            self.requested.lock().unwrap().push(url.to_string());
            match &self.response {
                Ok(status) => Ok(*status),
                Err(message) => Err(anyhow::anyhow!("{message}")),
            }
        }
    }
}
