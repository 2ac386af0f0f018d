//! Parsing of verified webhook bodies into an envelope plus raw data.
//!
//! The parser only understands the event-agnostic envelope. Decoding the
//! `data` object into a typed record is left to the
//! [`EventTypeRegistry`](crate::registry::EventTypeRegistry), so this module
//! does not depend on any data record shape.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::{Result, WebhookError},
    event_type::EventType,
    fields::Fields,
};

/// Event-type agnostic wrapper common to every webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookEnvelope {
    id: String,
    event: EventType,
    timestamp: DateTime<Utc>,
}

impl WebhookEnvelope {
    /// Creates an envelope.
    pub fn new(id: impl Into<String>, event: EventType, timestamp: DateTime<Utc>) -> Self {
        Self { id: id.into(), event, timestamp }
    }

    /// Unique id of this delivery, usable for deduplication.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Type of the event.
    pub fn event(&self) -> EventType {
        self.event
    }

    /// When the event occurred according to the sender.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Verified webhook body split into envelope and untyped data.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookPayload {
    envelope: WebhookEnvelope,
    data: Value,
    raw: Value,
}

impl WebhookPayload {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// - `MalformedPayload` if the body is not a JSON object, `id`, `event`
    ///   or `timestamp` is missing or mistyped, or `data` is not an object
    /// - `UnknownEventType` if `event` is not a known wire string
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::malformed(format!("body is not valid JSON: {e}")))?;
        Self::from_value(raw)
    }

    /// Parses an already decoded JSON document.
    ///
    /// # Errors
    ///
    /// See [`WebhookPayload::parse`].
    pub fn from_value(raw: Value) -> Result<Self> {
        let fields = Fields::new(&raw, "")
            .map_err(|_| WebhookError::malformed("body must be a JSON object"))?;

        let id = fields.required_str("id")?;
        let event: EventType = fields.required_str("event")?.parse()?;
        let timestamp = fields.required_datetime("timestamp")?;

        let data = match raw.get("data") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(Value::Array(items)) if items.is_empty() => Value::Object(Map::new()),
            Some(data @ Value::Object(_)) => data.clone(),
            Some(_) => return Err(WebhookError::malformed_field("data", "must be an object")),
        };

        Ok(Self { envelope: WebhookEnvelope::new(id, event, timestamp), data, raw })
    }

    /// The parsed envelope.
    pub fn envelope(&self) -> &WebhookEnvelope {
        &self.envelope
    }

    /// Type of the event.
    pub fn event_type(&self) -> EventType {
        self.envelope.event()
    }

    /// The `data` object, empty when the body had none.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The whole decoded body.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// `data.message_id` when present as a string.
    pub fn message_id(&self) -> Option<&str> {
        self.data.get("message_id").and_then(Value::as_str)
    }

    /// `data.tag` when present as a string.
    pub fn tag(&self) -> Option<&str> {
        self.data.get("tag").and_then(Value::as_str)
    }

    /// `data.metadata`, empty when absent or not an object.
    pub fn metadata(&self) -> Map<String, Value> {
        self.data.get("metadata").and_then(Value::as_object).cloned().unwrap_or_default()
    }

    /// Splits into envelope and data.
    pub fn into_parts(self) -> (WebhookEnvelope, Value) {
        (self.envelope, self.data)
    }
}
