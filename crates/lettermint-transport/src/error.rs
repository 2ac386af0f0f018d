//! Error types for outbound sends.

use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Boxed error returned by an [`EmailApi`](crate::api::EmailApi)
/// implementation.
pub type ApiError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures of the outbound transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No API token is configured.
    #[error(
        "No Lettermint API token was found. Please set the LETTERMINT_TOKEN variable in your environment."
    )]
    ApiTokenNotConfigured,

    /// The message cannot be mapped to a send request.
    #[error("invalid message: {message}")]
    InvalidMessage {
        /// What is wrong with the message
        message: String,
    },

    /// The sending API rejected the request or could not be reached.
    #[error("Sending email via Lettermint API failed: {message}")]
    SendFailed {
        /// Display of the underlying error
        message: String,
        /// The underlying error
        #[source]
        source: ApiError,
    },
}

impl TransportError {
    /// Creates an invalid message error.
    pub fn invalid_message(message: impl Into<String>) -> Self {
        Self::InvalidMessage { message: message.into() }
    }

    /// Wraps an API error, keeping it as the source.
    pub fn send_failed(source: ApiError) -> Self {
        Self::SendFailed { message: source.to_string(), source }
    }
}
