//! Error types and result handling for webhook processing.
//!
//! Defines the failure taxonomy of the verification and dispatch pipeline
//! with stable codes for client disambiguation. Translation into HTTP
//! status codes happens only at the HTTP entrypoint.

use thiserror::Error;

/// Result type alias using `WebhookError`.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Webhook pipeline errors with codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// No webhook signing secret is configured (E1000).
    ///
    /// This is a startup error, never a per-request rejection.
    #[error(
        "[E1000] No Lettermint webhook secret was found. Please set the LETTERMINT_WEBHOOK_SECRET variable in your environment."
    )]
    SecretNotConfigured,

    /// Signature header missing or malformed, digest mismatch, or stale
    /// timestamp (E1001).
    #[error("[E1001] Invalid signature")]
    SignatureInvalid,

    /// Body is not valid JSON or a field is missing or has the wrong shape
    /// (E1002).
    #[error("[E1002] Malformed payload: {message}")]
    MalformedPayload {
        /// Dotted path of the offending field, if one could be named.
        field: Option<String>,
        /// Description of the problem.
        message: String,
    },

    /// Event string outside the known set (E1003).
    #[error("[E1003] Unknown event type: {event}")]
    UnknownEventType {
        /// The event string as received.
        event: String,
    },
}

impl WebhookError {
    /// Creates a malformed payload error naming the offending field.
    pub fn malformed_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("field `{field}` {}", message.into());
        Self::MalformedPayload { field: Some(field), message }
    }

    /// Creates a malformed payload error not tied to a single field.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload { field: None, message: message.into() }
    }

    /// Returns the error code (E1000-E1003).
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SecretNotConfigured => "E1000",
            Self::SignatureInvalid => "E1001",
            Self::MalformedPayload { .. } => "E1002",
            Self::UnknownEventType { .. } => "E1003",
        }
    }

    /// Whether the request itself is at fault rather than the receiver.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::SecretNotConfigured)
    }

    /// Returns the offending field for malformed payloads.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedPayload { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}
