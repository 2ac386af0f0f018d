//! Lettermint webhook HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod server;

pub use config::{Config, UnknownEventPolicy, WebhookConfig};
pub use server::{create_router, start_server, webhook_router, REQUEST_ID_HEADER};
