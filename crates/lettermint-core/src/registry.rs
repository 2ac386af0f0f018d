//! Mapping from event type to data record decoder.

use std::collections::HashMap;

use serde_json::Value;

use crate::{
    data::DecodeData,
    error::{Result, WebhookError},
    event_type::EventType,
    events::{Event, LettermintEvent},
    payload::{WebhookEnvelope, WebhookPayload},
};

type Decoder = fn(WebhookEnvelope, &Value) -> Result<LettermintEvent>;

/// Total mapping from every [`EventType`] to the decoder producing its
/// [`LettermintEvent`] variant.
///
/// The table is built once from [`EventType::ALL`] through an exhaustive
/// match, so adding an event type without a decoder does not compile.
#[derive(Debug, Clone)]
pub struct EventTypeRegistry {
    decoders: HashMap<EventType, Decoder>,
}

impl EventTypeRegistry {
    /// Creates a registry covering every event type.
    pub fn new() -> Self {
        let decoders = EventType::ALL.into_iter().map(|t| (t, decoder_for(t))).collect();
        Self { decoders }
    }

    /// Whether a decoder is registered for `event_type`.
    pub fn supports(&self, event_type: EventType) -> bool {
        self.decoders.contains_key(&event_type)
    }

    /// Number of registered event types.
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Always false for a registry built with [`EventTypeRegistry::new`].
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decodes `data` as the record for the envelope's event type.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` naming the first bad field.
    pub fn decode(&self, envelope: WebhookEnvelope, data: &Value) -> Result<LettermintEvent> {
        let event_type = envelope.event();
        let decoder = self
            .decoders
            .get(&event_type)
            .ok_or_else(|| WebhookError::UnknownEventType { event: event_type.to_string() })?;
        decoder(envelope, data)
    }

    /// Decodes a parsed payload.
    ///
    /// # Errors
    ///
    /// See [`EventTypeRegistry::decode`].
    pub fn decode_payload(&self, payload: WebhookPayload) -> Result<LettermintEvent> {
        let (envelope, data) = payload.into_parts();
        self.decode(envelope, &data)
    }
}

impl Default for EventTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn decoder_for(event_type: EventType) -> Decoder {
    match event_type {
        EventType::MessageCreated => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageCreated)
        },
        EventType::MessageSent => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageSent)
        },
        EventType::MessageDelivered => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageDelivered)
        },
        EventType::MessageHardBounced => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageHardBounced)
        },
        EventType::MessageSoftBounced => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageSoftBounced)
        },
        EventType::MessageSpamComplaint => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageSpamComplaint)
        },
        EventType::MessageFailed => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageFailed)
        },
        EventType::MessageSuppressed => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageSuppressed)
        },
        EventType::MessageUnsubscribed => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageUnsubscribed)
        },
        EventType::MessageInbound => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::MessageInbound)
        },
        EventType::WebhookTest => |envelope: WebhookEnvelope, data: &Value| {
            event(envelope, data).map(LettermintEvent::WebhookTest)
        },
    }
}

fn event<D: DecodeData>(envelope: WebhookEnvelope, data: &Value) -> Result<Event<D>> {
    Ok(Event::new(envelope, D::decode(data)?))
}
