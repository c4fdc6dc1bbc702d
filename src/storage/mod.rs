use crate::suppression::SuppressionAction;
use chrono::{DateTime, Utc};

pub mod dynamo;
pub use dynamo::DynamoSuppressionSink;

pub(crate) const SUPPRESSION_PARTITION_KEY: &str = "SUPPRESSION";

/// Flat attribute list for one suppression item, keyed by address so redelivery overwrites.
pub(crate) fn suppression_attributes(
    action: &SuppressionAction,
    suppressed_at: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let mut attributes = vec![
        ("PK", SUPPRESSION_PARTITION_KEY.to_string()),
        ("SK", action.address.to_lowercase()),
        ("email", action.address.clone()),
        ("reason", action.reason.clone()),
        ("kind", action.kind.to_string()),
        ("suppressed_at", suppressed_at.to_rfc3339()),
    ];
    if let Some(correlation_id) = &action.correlation_id {
        attributes.push(("correlation_id", correlation_id.clone()));
    }
    attributes
}
