//! HTTP request handlers.
//!
//! - `webhook` - signed Lettermint webhook deliveries
//! - `health` - liveness probe
//!
//! Only this layer translates [`WebhookError`](lettermint_core::WebhookError)
//! values into status codes. Error bodies carry the stable error code next to
//! the message, except signature failures which answer a fixed body.

pub mod health;
pub mod webhook;

pub use health::health_check;
pub use webhook::{receive_webhook, WebhookState};
