//! Webhook body builders and sample data for every event type.
//!
//! Sample data mirrors what Lettermint sends in production, including the
//! loosely typed corners (`tag: null`, empty metadata).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lettermint_core::EventType;
use serde_json::{json, Value};

/// Timestamp used by fixtures unless overridden.
pub const DEFAULT_TIMESTAMP: &str = "2024-01-15T10:30:00Z";

/// Plain-text content of the inbound sample attachment.
pub const SAMPLE_ATTACHMENT_CONTENT: &[u8] = b"Invoice #1001\nTotal: 42.00 EUR\n";

/// Builder for webhook request bodies.
#[derive(Debug, Clone)]
pub struct WebhookBuilder {
    id: String,
    event: String,
    timestamp: String,
    data: Option<Value>,
}

impl WebhookBuilder {
    /// Starts a body for `event_type` with its sample data.
    pub fn new(event_type: EventType) -> Self {
        Self {
            id: format!("wh-{}", event_type.as_str().replace('.', "-")),
            event: event_type.as_str().to_string(),
            timestamp: DEFAULT_TIMESTAMP.to_string(),
            data: Some(sample_data(event_type)),
        }
    }

    /// Starts a body with an arbitrary event string and empty data.
    pub fn raw_event(event: impl Into<String>) -> Self {
        Self {
            id: "wh-raw".to_string(),
            event: event.into(),
            timestamp: DEFAULT_TIMESTAMP.to_string(),
            data: Some(json!({})),
        }
    }

    /// Sets the delivery id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the envelope timestamp string.
    #[must_use]
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Replaces the data object.
    #[must_use]
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Omits the `data` key entirely.
    #[must_use]
    pub fn without_data(mut self) -> Self {
        self.data = None;
        self
    }

    /// Builds the body as JSON.
    pub fn build_value(&self) -> Value {
        let mut body = json!({
            "id": self.id,
            "event": self.event,
            "timestamp": self.timestamp,
        });
        if let (Some(data), Some(map)) = (&self.data, body.as_object_mut()) {
            map.insert("data".to_string(), data.clone());
        }
        body
    }

    /// Builds the body as the bytes a sender would put on the wire.
    pub fn build(&self) -> Vec<u8> {
        self.build_value().to_string().into_bytes()
    }
}

/// Sample `data` object for an event type.
pub fn sample_data(event_type: EventType) -> Value {
    match event_type {
        EventType::MessageCreated => json!({
            "message_id": "msg-created-1",
            "from": {"email": "sender@example.com", "name": "Sender"},
            "to": ["user@example.com"],
            "cc": [],
            "bcc": [],
            "reply_to": ["support@example.com"],
            "subject": "Welcome aboard",
            "metadata": {"user_id": "42"},
            "tag": "welcome"
        }),
        EventType::MessageSent => json!({
            "message_id": "msg-sent-1",
            "recipient": "user@example.com",
            "metadata": {"user_id": "42"},
            "tag": "welcome"
        }),
        EventType::MessageDelivered => json!({
            "message_id": "msg-delivered-1",
            "recipient": "user@example.com",
            "response": {"status_code": 250, "enhanced_status_code": "2.0.0", "content": "OK"},
            "metadata": {},
            "tag": null
        }),
        EventType::MessageHardBounced => json!({
            "message_id": "msg-hard-1",
            "recipient": "nobody@example.com",
            "response": {
                "status_code": 550,
                "enhanced_status_code": "5.1.1",
                "content": "Mailbox does not exist"
            },
            "metadata": {},
            "tag": "newsletter"
        }),
        EventType::MessageSoftBounced => json!({
            "message_id": "msg-soft-1",
            "recipient": "full@example.com",
            "response": {
                "status_code": 452,
                "enhanced_status_code": "4.2.2",
                "content": "Mailbox full"
            },
            "metadata": {},
            "tag": null
        }),
        EventType::MessageSpamComplaint => json!({
            "message_id": "msg-spam-1",
            "recipient": "angry@example.com",
            "metadata": {},
            "tag": "newsletter"
        }),
        EventType::MessageFailed => json!({
            "message_id": "msg-failed-1",
            "recipient": "user@example.com",
            "reason": "Connection refused",
            "response": {"status_code": 421, "content": "Service not available"},
            "metadata": {},
            "tag": null
        }),
        EventType::MessageSuppressed => json!({
            "message_id": "msg-suppressed-1",
            "recipient": "bounced-before@example.com",
            "reason": "hard_bounce",
            "metadata": {},
            "tag": null
        }),
        EventType::MessageUnsubscribed => json!({
            "message_id": "msg-unsub-1",
            "recipient": "leaver@example.com",
            "unsubscribed_at": "2024-01-15T10:29:00Z",
            "metadata": {"list": "weekly"},
            "tag": "newsletter"
        }),
        EventType::MessageInbound => sample_inbound_data(),
        EventType::WebhookTest => json!({
            "message": "This is a test webhook from Lettermint",
            "webhook_id": "webhook-abc",
            "timestamp": 1_705_314_600
        }),
    }
}

/// Inbound sample with one base64 encoded attachment.
pub fn sample_inbound_data() -> Value {
    json!({
        "route": "support",
        "message_id": "msg-inbound-1",
        "from": {"email": "customer@example.net", "name": "Customer", "subaddress": null},
        "to": [{"email": "support+billing@example.com", "name": "Support", "subaddress": "billing"}],
        "cc": [],
        "recipient": "support+billing@example.com",
        "subaddress": "billing",
        "reply_to": null,
        "subject": "Question about my invoice",
        "date": "2024-01-15T10:28:00Z",
        "body": {"text": "Hi, see attached.", "html": "<p>Hi, see attached.</p>"},
        "tag": null,
        "headers": [
            {"name": "Message-ID", "value": "<abc@example.net>"},
            {"name": "X-Priority", "value": "3"}
        ],
        "attachments": [{
            "filename": "invoice.txt",
            "content": STANDARD.encode(SAMPLE_ATTACHMENT_CONTENT),
            "content_type": "text/plain",
            "size": SAMPLE_ATTACHMENT_CONTENT.len(),
            "content_id": null
        }],
        "is_spam": false,
        "spam_score": 0.4,
        "spam_symbols": [
            {"name": "DKIM_VALID", "score": -0.1, "options": [], "description": "Message has a valid DKIM signature"}
        ]
    })
}

/// Delivered body used by the end-to-end scenarios.
pub fn delivered_scenario_body() -> Vec<u8> {
    WebhookBuilder::new(EventType::MessageDelivered)
        .id("wh-1")
        .data(json!({
            "message_id": "m-1",
            "recipient": "a@b.com",
            "response": {"status_code": 250},
            "metadata": {},
            "tag": null
        }))
        .build()
}

/// Body with an event string outside the known set.
pub fn unknown_event_body() -> Vec<u8> {
    WebhookBuilder::raw_event("message.teleported").id("wh-unknown").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_includes_envelope_fields() {
        let body = WebhookBuilder::new(EventType::MessageSent).id("wh-9").build_value();

        assert_eq!(body["id"], json!("wh-9"));
        assert_eq!(body["event"], json!("message.sent"));
        assert_eq!(body["timestamp"], json!(DEFAULT_TIMESTAMP));
        assert_eq!(body["data"]["message_id"], json!("msg-sent-1"));
    }

    #[test]
    fn without_data_omits_key() {
        let body = WebhookBuilder::new(EventType::WebhookTest).without_data().build_value();
        assert!(body.get("data").is_none());
    }
}
