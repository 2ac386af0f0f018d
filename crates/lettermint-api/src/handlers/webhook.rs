//! Webhook receiver: verify, parse, dispatch.
//!
//! The raw body is authenticated before it is parsed. Nothing is emitted to
//! the event handler unless verification, parsing and decoding all succeed.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use lettermint_core::{
    Dispatcher, EventHandler, WebhookError, WebhookProcessor, DELIVERY_HEADER, SIGNATURE_HEADER,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::{UnknownEventPolicy, WebhookConfig};

/// Shared state of the webhook route.
#[derive(Debug, Clone)]
pub struct WebhookState {
    processor: Arc<WebhookProcessor>,
    unknown_events: UnknownEventPolicy,
}

impl WebhookState {
    /// Wraps a processor.
    pub fn new(processor: WebhookProcessor, unknown_events: UnknownEventPolicy) -> Self {
        Self { processor: Arc::new(processor), unknown_events }
    }

    /// Builds the verifier and dispatcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns `SecretNotConfigured` when no signing secret is set.
    pub fn from_config(
        config: &WebhookConfig,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Self, WebhookError> {
        let processor = WebhookProcessor::new(config.verifier()?, Dispatcher::new(handler));
        Ok(Self::new(processor, config.unknown_events))
    }
}

/// Body of successful and ignored deliveries.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// `ok` or `ignored`.
    pub status: &'static str,
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description
    pub error: String,
    /// Error code (E1000-E1003), omitted for signature failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

/// Receives one signed webhook delivery.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 401: Missing, malformed or stale signature, or digest mismatch
/// - 400: Body or data record does not decode
/// - 422: Unknown event type, unless the ignore policy is configured
/// - 500: No signing secret
#[instrument(
    name = "receive_webhook",
    skip_all,
    fields(
        delivery_id = headers.get(DELIVERY_HEADER).and_then(|v| v.to_str().ok()).unwrap_or("none"),
        body_size = body.len(),
    )
)]
pub async fn receive_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match state.processor.process(signature, &body).await {
        Ok(envelope) => {
            info!(
                event_id = %envelope.id(),
                event_type = %envelope.event(),
                "webhook delivery processed"
            );
            (StatusCode::OK, Json(StatusResponse { status: "ok" })).into_response()
        },
        Err(WebhookError::UnknownEventType { event })
            if state.unknown_events == UnknownEventPolicy::Ignore =>
        {
            info!(event = %event, "ignoring webhook with unknown event type");
            (StatusCode::OK, Json(StatusResponse { status: "ignored" })).into_response()
        },
        Err(e) => {
            if !matches!(e, WebhookError::SignatureInvalid) {
                warn!(code = e.code(), error = %e, "webhook delivery rejected");
            }
            create_error_response(&e)
        },
    }
}

/// Maps a pipeline error onto its status code.
pub fn status_for(error: &WebhookError) -> StatusCode {
    match error {
        WebhookError::SecretNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        WebhookError::SignatureInvalid => StatusCode::UNAUTHORIZED,
        WebhookError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
        WebhookError::UnknownEventType { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn create_error_response(error: &WebhookError) -> Response {
    let body = match error {
        WebhookError::SignatureInvalid => {
            ErrorResponse { error: "Invalid signature".to_string(), code: None }
        },
        _ => ErrorResponse { error: error.to_string(), code: Some(error.code()) },
    };

    (status_for(error), Json(body)).into_response()
}
