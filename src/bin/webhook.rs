//! HTTP Lambda receiving SES/SNS delivery callbacks.
//!
//! Adapts `lambda_http` requests into `CallbackRequest` and the `CallbackResponse` back.
//! Classification and suppression live in `sescallback::callback`.

use aws_config::BehaviorVersion;
use lambda_http::{Body, Error, Request, Response, run, service_fn};
use sescallback::callback::{self, AppState, CallbackRequest, CallbackResponse};
use sescallback::config::Config;
use sescallback::storage::DynamoSuppressionSink;
use sescallback::subscription::ReqwestHttpClient;
use std::sync::Arc;
use tracing::info;

type State = AppState<DynamoSuppressionSink, ReqwestHttpClient>;

// ============================================================================
// HTTP Response Helpers
// ============================================================================

fn text_response(status_code: u16, message: String) -> Response<Body> {
    Response::builder()
        .status(status_code)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from(message))
        .expect("Failed to build response")
}

// ============================================================================
// Lambda Handler
// ============================================================================

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

    run(service_fn(|event| handler(event, state.clone()))).await
}

async fn handler(event: Request, state: Arc<State>) -> Result<Response<Body>, Error> {
    let content_type = event
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = match event.body() {
        Body::Text(s) => Some(s.clone().into_bytes()),
        Body::Binary(b) => Some(b.clone()),
        _ => None,
    };

    info!(method = %event.method(), path = %event.uri().path(), "Handling callback");

    let request = CallbackRequest { content_type, body };
    match callback::handle(&request, state.as_ref()).await {
        CallbackResponse::Text { status, body } => Ok(text_response(status, body)),
        CallbackResponse::NotApplicable => Ok(text_response(404, "Not Found".to_string())),
    }
}
