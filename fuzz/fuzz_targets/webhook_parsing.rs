#![no_main]

//! Fuzz target for webhook body parsing and data decoding.
//!
//! Arbitrary bytes must either parse into an envelope and decode through
//! the registry or fail with a typed error; neither step may panic.

use lettermint_core::{EventTypeRegistry, WebhookError, WebhookPayload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let payload = match WebhookPayload::parse(data) {
        Ok(payload) => payload,
        Err(WebhookError::MalformedPayload { .. } | WebhookError::UnknownEventType { .. }) => {
            return;
        },
        Err(other) => panic!("unexpected parse error: {other}"),
    };

    let _ = payload.message_id();
    let _ = payload.tag();
    let _ = payload.metadata();

    match EventTypeRegistry::new().decode_payload(payload) {
        Ok(event) => {
            let _ = event.is_delivery_issue();
        },
        Err(WebhookError::MalformedPayload { .. }) => {},
        Err(other) => panic!("unexpected decode error: {other}"),
    }
});
