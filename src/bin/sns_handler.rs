//! SNS-triggered Lambda entrypoint for SES bounce and complaint handling.
//!
//! Architecture: SES -> SNS -> this Lambda
//!
//! Delegates each record to `sescallback::callback::handle_sns_message`.

use aws_config::BehaviorVersion;
use aws_lambda_events::event::sns::SnsEvent;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use sescallback::callback::{self, AppState};
use sescallback::config::Config;
use sescallback::storage::DynamoSuppressionSink;
use sescallback::subscription::ReqwestHttpClient;
use std::sync::Arc;
use tracing::info;

type State = AppState<DynamoSuppressionSink, ReqwestHttpClient>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env().map_err(|e| Error::from(e.to_string()))?;

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&aws_config);
    let sink = Arc::new(DynamoSuppressionSink::new(
        dynamodb_client,
        config.suppression_table,
    ));
    let state = Arc::new(AppState::new(
        sink,
        ReqwestHttpClient::new(),
        config.transport,
    ));

    lambda_runtime::run(service_fn(|event| handler(event, state.clone()))).await?;
    Ok(())
}

async fn handler(event: LambdaEvent<SnsEvent>, state: Arc<State>) -> Result<(), Error> {
    for record in &event.payload.records {
        let outcome = callback::handle_sns_message(
            state.as_ref(),
            record.sns.subject.as_deref(),
            &record.sns.message,
        )
        .await
        .map_err(|e| Error::from(e.to_string()))?;
        info!(message_id = %record.sns.message_id, outcome = ?outcome, "SNS record processed");
    }
    Ok(())
}
