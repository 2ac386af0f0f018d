//! Typed webhook events and the handler traits that receive them.
//!
//! A verified and decoded delivery becomes one [`LettermintEvent`]. The
//! dispatcher hands it to an [`EventHandler`], which is the seam where the
//! host application subscribes.
//!
//! ```text
//! ┌────────────┐   LettermintEvent   ┌───────────────────────┐
//! │ Dispatcher │ ───────────────────▶│ MulticastEventHandler │
//! └────────────┘                     └───────────────────────┘
//!                                         │            │
//!                                         ▼            ▼
//!                                  ┌────────────┐ ┌─────────────────┐
//!                                  │ Logging    │ │ Broadcast       │
//!                                  │ handler    │ │ (tokio channel) │
//!                                  └────────────┘ └─────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    data::{
        Metadata, MessageCreatedData, MessageDeliveredData, MessageFailedData,
        MessageHardBouncedData, MessageInboundData, MessageSentData, MessageSoftBouncedData,
        MessageSpamComplaintData, MessageSuppressedData, MessageUnsubscribedData,
        WebhookTestData,
    },
    event_type::EventType,
    payload::WebhookEnvelope,
};

/// Envelope plus typed data for one event type.
///
/// Only the registry constructs events, which guarantees the envelope's
/// event type matches the data record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event<D> {
    envelope: WebhookEnvelope,
    data: D,
}

impl<D> Event<D> {
    pub(crate) fn new(envelope: WebhookEnvelope, data: D) -> Self {
        Self { envelope, data }
    }

    /// The delivery envelope.
    pub fn envelope(&self) -> &WebhookEnvelope {
        &self.envelope
    }

    /// The typed data record.
    pub fn data(&self) -> &D {
        &self.data
    }

    /// Splits into envelope and data.
    pub fn into_parts(self) -> (WebhookEnvelope, D) {
        (self.envelope, self.data)
    }
}

/// One decoded webhook delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LettermintEvent {
    /// `message.created`
    MessageCreated(Event<MessageCreatedData>),
    /// `message.sent`
    MessageSent(Event<MessageSentData>),
    /// `message.delivered`
    MessageDelivered(Event<MessageDeliveredData>),
    /// `message.hard_bounced`
    MessageHardBounced(Event<MessageHardBouncedData>),
    /// `message.soft_bounced`
    MessageSoftBounced(Event<MessageSoftBouncedData>),
    /// `message.spam_complaint`
    MessageSpamComplaint(Event<MessageSpamComplaintData>),
    /// `message.failed`
    MessageFailed(Event<MessageFailedData>),
    /// `message.suppressed`
    MessageSuppressed(Event<MessageSuppressedData>),
    /// `message.unsubscribed`
    MessageUnsubscribed(Event<MessageUnsubscribedData>),
    /// `message.inbound`
    MessageInbound(Event<MessageInboundData>),
    /// `webhook.test`
    WebhookTest(Event<WebhookTestData>),
}

impl LettermintEvent {
    /// The delivery envelope.
    pub fn envelope(&self) -> &WebhookEnvelope {
        match self {
            Self::MessageCreated(e) => e.envelope(),
            Self::MessageSent(e) => e.envelope(),
            Self::MessageDelivered(e) => e.envelope(),
            Self::MessageHardBounced(e) => e.envelope(),
            Self::MessageSoftBounced(e) => e.envelope(),
            Self::MessageSpamComplaint(e) => e.envelope(),
            Self::MessageFailed(e) => e.envelope(),
            Self::MessageSuppressed(e) => e.envelope(),
            Self::MessageUnsubscribed(e) => e.envelope(),
            Self::MessageInbound(e) => e.envelope(),
            Self::WebhookTest(e) => e.envelope(),
        }
    }

    /// Type of the event.
    pub fn event_type(&self) -> EventType {
        self.envelope().event()
    }

    /// Delivery id.
    pub fn id(&self) -> &str {
        self.envelope().id()
    }

    /// Message id the event refers to; `None` for test deliveries.
    pub fn message_id(&self) -> Option<&str> {
        let id = match self {
            Self::MessageCreated(e) => &e.data().message_id,
            Self::MessageSent(e) | Self::MessageSpamComplaint(e) => &e.data().message_id,
            Self::MessageDelivered(e)
            | Self::MessageHardBounced(e)
            | Self::MessageSoftBounced(e) => &e.data().message_id,
            Self::MessageFailed(e) => &e.data().message_id,
            Self::MessageSuppressed(e) => &e.data().message_id,
            Self::MessageUnsubscribed(e) => &e.data().message_id,
            Self::MessageInbound(e) => &e.data().message_id,
            Self::WebhookTest(_) => return None,
        };
        Some(id.as_str())
    }

    /// Tag set when the message was sent, if any.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::MessageCreated(e) => e.data().tag.as_deref(),
            Self::MessageSent(e) | Self::MessageSpamComplaint(e) => e.data().tag.as_deref(),
            Self::MessageDelivered(e)
            | Self::MessageHardBounced(e)
            | Self::MessageSoftBounced(e) => e.data().tag.as_deref(),
            Self::MessageFailed(e) => e.data().tag.as_deref(),
            Self::MessageSuppressed(e) => e.data().tag.as_deref(),
            Self::MessageUnsubscribed(e) => e.data().tag.as_deref(),
            Self::MessageInbound(e) => e.data().tag.as_deref(),
            Self::WebhookTest(_) => None,
        }
    }

    /// Metadata set when the message was sent; `None` for events without it.
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::MessageCreated(e) => Some(&e.data().metadata),
            Self::MessageSent(e) | Self::MessageSpamComplaint(e) => Some(&e.data().metadata),
            Self::MessageDelivered(e)
            | Self::MessageHardBounced(e)
            | Self::MessageSoftBounced(e) => Some(&e.data().metadata),
            Self::MessageFailed(e) => Some(&e.data().metadata),
            Self::MessageSuppressed(e) => Some(&e.data().metadata),
            Self::MessageUnsubscribed(e) => Some(&e.data().metadata),
            Self::MessageInbound(_) | Self::WebhookTest(_) => None,
        }
    }

    /// Hard or soft bounce.
    pub fn is_bounce(&self) -> bool {
        self.event_type().is_bounce()
    }

    /// Bounce, failure or suppression.
    pub fn is_delivery_issue(&self) -> bool {
        self.event_type().is_delivery_issue()
    }
}

/// Receives decoded webhook events.
///
/// Handlers run inside the HTTP request, so the sender only gets its
/// acknowledgement once `handle_event` returns. Long-running work should be
/// moved off the request, for example through [`BroadcastEventHandler`].
/// Handlers cannot fail the delivery; errors are theirs to log.
#[async_trait::async_trait]
pub trait EventHandler: Send + Sync + std::fmt::Debug {
    /// Handles one event.
    async fn handle_event(&self, event: LettermintEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NoOpEventHandler;

impl NoOpEventHandler {
    /// Creates a new no-op event handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EventHandler for NoOpEventHandler {
    async fn handle_event(&self, _event: LettermintEvent) {}
}

/// Forwards each event to every subscriber concurrently.
#[derive(Debug, Clone)]
pub struct MulticastEventHandler {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl MulticastEventHandler {
    /// Creates a new multicast handler with no subscribers.
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Adds a subscriber.
    pub fn add_subscriber(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for MulticastEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EventHandler for MulticastEventHandler {
    async fn handle_event(&self, event: LettermintEvent) {
        let futures = self.handlers.iter().map(|handler| {
            let event = event.clone();
            async move {
                handler.handle_event(event).await;
            }
        });

        futures::future::join_all(futures).await;
    }
}

/// Publishes events on a tokio broadcast channel.
///
/// Lets application tasks consume events outside the request. Events sent
/// while nobody is subscribed are dropped; lagging receivers lose the oldest
/// events.
#[derive(Debug, Clone)]
pub struct BroadcastEventHandler {
    sender: broadcast::Sender<LettermintEvent>,
}

impl BroadcastEventHandler {
    /// Creates a channel buffering up to `capacity` events per receiver.
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Opens a new receiver that sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LettermintEvent> {
        self.sender.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait::async_trait]
impl EventHandler for BroadcastEventHandler {
    async fn handle_event(&self, event: LettermintEvent) {
        let event_id = event.id().to_string();
        if self.sender.send(event).is_err() {
            debug!(event_id = %event_id, "no broadcast receivers, event dropped");
        }
    }
}

/// Logs each event; the default handler of the standalone receiver.
#[derive(Debug, Default)]
pub struct LoggingEventHandler;

impl LoggingEventHandler {
    /// Creates a new logging handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl EventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: LettermintEvent) {
        let event_id = event.id();
        let event_type = event.event_type();
        let message_id = event.message_id().unwrap_or("-");

        if event.is_delivery_issue() {
            warn!(event_id, %event_type, message_id, "lettermint delivery issue");
        } else {
            info!(event_id, %event_type, message_id, "lettermint event received");
        }
    }
}
