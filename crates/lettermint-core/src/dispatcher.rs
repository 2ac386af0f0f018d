//! Turns verified webhook bodies into typed events and emits them.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    error::Result,
    events::EventHandler,
    payload::{WebhookEnvelope, WebhookPayload},
    registry::EventTypeRegistry,
    signature::SignatureVerifier,
};

/// Decodes parsed payloads through the registry and hands the resulting
/// event to the configured handler.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<EventTypeRegistry>,
    handler: Arc<dyn EventHandler>,
}

impl Dispatcher {
    /// Creates a dispatcher with the full event type registry.
    pub fn new(handler: Arc<dyn EventHandler>) -> Self {
        Self::with_registry(Arc::new(EventTypeRegistry::new()), handler)
    }

    /// Creates a dispatcher sharing an existing registry.
    pub fn with_registry(registry: Arc<EventTypeRegistry>, handler: Arc<dyn EventHandler>) -> Self {
        Self { registry, handler }
    }

    /// Decodes and emits one event.
    ///
    /// Returns the envelope of the emitted event. Nothing is emitted when
    /// decoding fails.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` when the data record does not decode.
    #[instrument(
        name = "dispatch_webhook",
        skip_all,
        fields(event_id = %payload.envelope().id(), event_type = %payload.event_type())
    )]
    pub async fn dispatch(&self, payload: WebhookPayload) -> Result<WebhookEnvelope> {
        let event = self.registry.decode_payload(payload)?;
        let envelope = event.envelope().clone();

        self.handler.handle_event(event).await;
        debug!("webhook event dispatched");

        Ok(envelope)
    }
}

/// Verify, parse and dispatch in one call, for hosts that bring their own
/// HTTP layer.
#[derive(Debug, Clone)]
pub struct WebhookProcessor {
    verifier: SignatureVerifier,
    dispatcher: Dispatcher,
}

impl WebhookProcessor {
    /// Creates a processor from its two stages.
    pub fn new(verifier: SignatureVerifier, dispatcher: Dispatcher) -> Self {
        Self { verifier, dispatcher }
    }

    /// The signature verifier.
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.verifier
    }

    /// Processes one delivery.
    ///
    /// `signature_header` is the raw `X-Lettermint-Signature` header value and
    /// `body` the unparsed request body. The body is only parsed after the
    /// signature verifies.
    ///
    /// # Errors
    ///
    /// - `SignatureInvalid` when verification fails
    /// - `MalformedPayload` when the body or its data does not decode
    /// - `UnknownEventType` when the event string is not recognized
    pub async fn process(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> Result<WebhookEnvelope> {
        self.verifier.verify(signature_header, body)?;
        let payload = WebhookPayload::parse(body)?;
        self.dispatcher.dispatch(payload).await
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;
    use crate::{error::WebhookError, events::LettermintEvent, event_type::EventType};

    #[derive(Debug, Default)]
    struct CountingHandler {
        count: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: LettermintEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    const SENT: &[u8] = br#"{"id":"evt-1","event":"message.sent","timestamp":"2024-01-15T10:30:00Z","data":{"message_id":"msg-1","recipient":"user@example.com"}}"#;

    fn processor() -> (WebhookProcessor, Arc<CountingHandler>) {
        let handler = Arc::new(CountingHandler::default());
        let verifier = SignatureVerifier::new(Some("secret"), Duration::from_secs(300)).unwrap();
        (WebhookProcessor::new(verifier, Dispatcher::new(handler.clone())), handler)
    }

    fn now() -> i64 {
        use crate::time::{Clock, RealClock};
        RealClock::new().unix_timestamp()
    }

    #[tokio::test]
    async fn dispatch_emits_exactly_one_event() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());

        let envelope = dispatcher.dispatch(WebhookPayload::parse(SENT).unwrap()).await.unwrap();

        assert_eq!(envelope.id(), "evt-1");
        assert_eq!(envelope.event(), EventType::MessageSent);
        assert_eq!(handler.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_decode_emits_nothing() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());
        let payload = WebhookPayload::parse(
            br#"{"id":"evt-2","event":"message.delivered","timestamp":"2024-01-15T10:30:00Z","data":{"message_id":"msg-1"}}"#,
        )
        .unwrap();

        let err = dispatcher.dispatch(payload).await.unwrap_err();

        assert!(matches!(err, WebhookError::MalformedPayload { .. }));
        assert_eq!(handler.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn processor_verifies_before_parsing() {
        let (processor, handler) = processor();

        let err = processor.process(Some("t=1,v1=00"), b"not even json").await.unwrap_err();

        assert_eq!(err, WebhookError::SignatureInvalid);
        assert_eq!(handler.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn processor_dispatches_signed_delivery() {
        let (processor, handler) = processor();
        let header = processor.verifier().signature_header(now(), SENT);

        let envelope = processor.process(Some(&header), SENT).await.unwrap();

        assert_eq!(envelope.id(), "evt-1");
        assert_eq!(handler.count.load(Ordering::SeqCst), 1);
    }
}
