//! Integration tests for the webhook endpoint.
//!
//! Drives the full router in-process with signed and tampered deliveries and
//! checks both the HTTP answer and what reached the event handler.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    Router,
};
use lettermint_api::{create_router, webhook_router, Config, UnknownEventPolicy, WebhookConfig};
use lettermint_core::{
    Clock, EventType, LettermintEvent, RealClock, WebhookError, DELIVERY_HEADER, SIGNATURE_HEADER,
};
use lettermint_testing::{
    fixtures::{delivered_scenario_body, unknown_event_body},
    RecordingEventHandler, TestSigner, WebhookBuilder, TEST_SECRET,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn config() -> Config {
    Config { webhook_secret: Some(TEST_SECRET.to_string()), ..Config::default() }
}

fn app(config: &Config, handler: &RecordingEventHandler) -> Router {
    create_router(config, Arc::new(handler.clone())).unwrap()
}

fn now() -> i64 {
    RealClock::new().unix_timestamp()
}

async fn post(
    app: Router,
    uri: &str,
    body: Vec<u8>,
    signature: Option<String>,
) -> (StatusCode, HeaderMap, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(DELIVERY_HEADER, "dlv-1");
    if let Some(signature) = signature {
        request = request.header(SIGNATURE_HEADER, signature);
    }

    let response = app.oneshot(request.body(Body::from(body)).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, json)
}

#[tokio::test]
async fn signed_delivery_is_dispatched() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, json) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ok"}));

    match handler.single().await {
        LettermintEvent::MessageDelivered(event) => {
            assert_eq!(event.envelope().id(), "wh-1");
            assert_eq!(event.data().message_id, "m-1");
            assert_eq!(event.data().recipient, "a@b.com");
            assert_eq!(event.data().response.status_code, 250);
        },
        other => panic!("expected delivered event, got {other:?}"),
    }
}

#[tokio::test]
async fn wrong_secret_is_unauthorized() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();
    let signature = TestSigner::with_secret("some_other_secret").header_at(now(), &body);

    let (status, _, json) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({"error": "Invalid signature"}));
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn stale_timestamp_is_unauthorized() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now() - 600, &body);

    let (status, _, json) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, json!({"error": "Invalid signature"}));
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn missing_or_garbled_signature_is_unauthorized() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();

    for signature in [None, Some(String::new()), Some("t=abc,v1=zz".to_string())] {
        let (status, _, json) =
            post(app(&config(), &handler), "/lettermint/webhook", body.clone(), signature).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json, json!({"error": "Invalid signature"}));
    }
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn tampered_body_is_unauthorized() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now(), &body);
    let tampered = String::from_utf8(body).unwrap().replace("m-1", "m-2").into_bytes();

    let (status, _, _) =
        post(app(&config(), &handler), "/lettermint/webhook", tampered, Some(signature)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn inbound_attachment_reaches_handler() {
    let handler = RecordingEventHandler::new();
    let body = WebhookBuilder::new(EventType::MessageInbound).build();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, _) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::OK);
    match handler.single().await {
        LettermintEvent::MessageInbound(event) => {
            let attachment = &event.data().attachments[0];
            assert_eq!(
                attachment.decoded_content().unwrap(),
                lettermint_testing::fixtures::SAMPLE_ATTACHMENT_CONTENT
            );
        },
        other => panic!("expected inbound event, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_event_is_rejected_by_default() {
    let handler = RecordingEventHandler::new();
    let body = unknown_event_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, json) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "E1003");
    assert!(json["error"].as_str().unwrap().contains("message.teleported"));
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn unknown_event_is_acknowledged_under_ignore_policy() {
    let handler = RecordingEventHandler::new();
    let config = Config { webhook_unknown_events: UnknownEventPolicy::Ignore, ..config() };
    let body = unknown_event_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, json) =
        post(app(&config, &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"status": "ignored"}));
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let handler = RecordingEventHandler::new();

    let cases = [
        b"not json at all".to_vec(),
        WebhookBuilder::new(EventType::MessageDelivered).without_data().build(),
        WebhookBuilder::new(EventType::MessageSent).timestamp("yesterday").build(),
    ];

    for body in cases {
        let signature = TestSigner::new().header_at(now(), &body);
        let (status, _, json) =
            post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "E1002");
    }
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn custom_prefix_moves_route() {
    let handler = RecordingEventHandler::new();
    let config = Config { webhook_prefix: "hooks/mail".to_string(), ..config() };
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, _) = post(
        app(&config, &handler),
        "/lettermint/webhook",
        body.clone(),
        Some(signature.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) =
        post(app(&config, &handler), "/hooks/mail/webhook", body, Some(signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(handler.count().await, 1);
}

#[tokio::test]
async fn router_requires_secret() {
    let handler = RecordingEventHandler::new();

    let result = create_router(&Config::default(), Arc::new(handler.clone()));
    assert_eq!(result.err(), Some(WebhookError::SecretNotConfigured));

    let blank = WebhookConfig { secret: Some("   ".to_string()), ..WebhookConfig::default() };
    assert!(webhook_router(&blank, Arc::new(handler)).is_err());
}

#[tokio::test]
async fn responses_carry_request_id() {
    let handler = RecordingEventHandler::new();
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (_, headers, _) =
        post(app(&config(), &handler), "/lettermint/webhook", body, Some(signature)).await;

    let request_id = headers.get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let handler = RecordingEventHandler::new();
    let config = Config { max_body_bytes: 64, ..config() };
    let body = delivered_scenario_body();
    let signature = TestSigner::new().header_at(now(), &body);

    let (status, _, _) =
        post(app(&config, &handler), "/lettermint/webhook", body, Some(signature)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(handler.count().await, 0);
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let handler = RecordingEventHandler::new();
    let response = app(&config(), &handler)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
}
