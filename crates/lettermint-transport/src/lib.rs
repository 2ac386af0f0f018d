//! Outbound mail transport for the Lettermint sending API.
//!
//! Maps a generic [`MailMessage`] onto a [`SendEmailRequest`]: custom
//! headers, tag and metadata headers, inline attachments, routing and
//! idempotency keys. The HTTP call itself goes through the [`EmailApi`]
//! trait so any client can be plugged in.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod idempotency;
pub mod message;
pub mod transport;

pub use api::{AttachmentPayload, EmailApi, SendEmailRequest, SendEmailResponse};
pub use config::TransportConfig;
pub use error::{ApiError, Result, TransportError};
pub use message::{Address, Attachment, MailMessage};
pub use transport::{LettermintTransport, SentMessage};

/// Header carrying the message tag.
pub const TAG_HEADER: &str = "X-Tag";

/// Older tag header, read when [`TAG_HEADER`] is absent.
pub const LEGACY_TAG_HEADER: &str = "X-LM-Tag";

/// Prefix of headers carrying metadata entries, `X-Metadata-<key>`.
pub const METADATA_HEADER_PREFIX: &str = "X-Metadata-";

/// Header carrying an explicit idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";
