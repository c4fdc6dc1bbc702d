//! Suppression actions and the sink that records them.

use anyhow::Result;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionKind {
    Bounced,
    Unsubscribed,
}

impl SuppressionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bounced => "BOUNCED",
            Self::Unsubscribed => "UNSUBSCRIBED",
        }
    }
}

impl fmt::Display for SuppressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One address to stop sending to, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressionAction {
    pub address: String,
    pub reason: String,
    pub kind: SuppressionKind,
    pub correlation_id: Option<String>,
}

// ============================================================================
// SuppressionSink trait
// ============================================================================

/// Where suppression actions end up. Implementations should be idempotent: SNS redelivers.
#[allow(async_fn_in_trait)]
pub trait SuppressionSink: Send + Sync {
    async fn add_failure(&self, action: &SuppressionAction) -> Result<()>;
}

// ============================================================================
// Test utilities
// ============================================================================

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        actions: Mutex<Vec<SuppressionAction>>,
        fail: bool,
    }

    impl RecordingSink {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn actions(&self) -> Vec<SuppressionAction> {
            self.actions.lock().unwrap().clone()
        }

        pub(crate) fn count(&self) -> usize {
            self.actions.lock().unwrap().len()
        }
    }

    impl SuppressionSink for RecordingSink {
        async fn add_failure(&self, action: &SuppressionAction) -> Result<()> {
            self.actions.lock().unwrap().push(action.clone());
            if self.fail {
                anyhow::bail!("sink unavailable");
            }
            Ok(())
        }
    }
}
