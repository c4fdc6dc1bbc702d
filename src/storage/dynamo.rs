use super::suppression_attributes;
use crate::suppression::{SuppressionAction, SuppressionSink};
use anyhow::{Context, Result};
use aws_sdk_dynamodb::{Client, types::AttributeValue};
use chrono::Utc;
use std::collections::HashMap;

// ============================================================================
// DynamoSuppressionSink — DynamoDB-backed SuppressionSink implementation
// ============================================================================

pub struct DynamoSuppressionSink {
    client: Client,
    table_name: String,
}

impl DynamoSuppressionSink {
    pub fn new(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

impl SuppressionSink for DynamoSuppressionSink {
    async fn add_failure(&self, action: &SuppressionAction) -> Result<()> {
        let item: HashMap<String, AttributeValue> = suppression_attributes(action, Utc::now())
            .into_iter()
            .map(|(name, value)| (name.to_string(), AttributeValue::S(value)))
            .collect();

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .context(format!("Failed to record suppression for {}", action.address))?;

        Ok(())
    }
}
