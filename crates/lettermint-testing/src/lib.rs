//! Test fixtures for Lettermint webhook handling.
//!
//! Provides body builders with realistic sample data for every event type,
//! a signer producing valid signature headers, and an event handler that
//! records dispatched events.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod events;
pub mod fixtures;
pub mod signing;

pub use events::RecordingEventHandler;
pub use fixtures::{sample_data, WebhookBuilder};
pub use lettermint_core::TestClock;
pub use signing::{TestSigner, TEST_SECRET};
