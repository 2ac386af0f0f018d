//! Lettermint webhook verification, parsing and typed event dispatch.
//!
//! A delivery flows through three stages, each usable on its own:
//! [`SignatureVerifier`] authenticates the raw body, [`WebhookPayload`]
//! parses the envelope, and [`Dispatcher`] decodes the data record through
//! the [`EventTypeRegistry`] and emits a [`LettermintEvent`] to an
//! [`EventHandler`]. [`WebhookProcessor`] chains all three for hosts that
//! bring their own HTTP layer.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod data;
pub mod dispatcher;
pub mod error;
pub mod event_type;
pub mod events;
pub mod fields;
pub mod payload;
pub mod registry;
pub mod signature;
pub mod time;

pub use dispatcher::{Dispatcher, WebhookProcessor};
pub use error::{Result, WebhookError};
pub use event_type::EventType;
pub use events::{
    BroadcastEventHandler, Event, EventHandler, LettermintEvent, LoggingEventHandler,
    MulticastEventHandler, NoOpEventHandler,
};
pub use payload::{WebhookEnvelope, WebhookPayload};
pub use registry::EventTypeRegistry;
pub use signature::{
    SignatureRejection, SignatureVerifier, DEFAULT_TOLERANCE_SECS, DELIVERY_HEADER,
    SIGNATURE_HEADER,
};
pub use time::{Clock, RealClock, TestClock};
