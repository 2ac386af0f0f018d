//! Wire shapes of the sending API and the client seam.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Attachment as sent to the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentPayload {
    /// File name.
    pub filename: String,
    /// Base64 encoded content.
    pub content: String,
    /// Inline content id, without `<>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_id: Option<String>,
}

/// Body of a send request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendEmailRequest {
    /// Sender mailbox.
    pub from: String,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Reply-to addresses.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reply_to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// Plain-text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Custom headers passed through to the message.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Attachments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentPayload>,
    /// Route id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Tag used for filtering in the dashboard and in webhooks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Metadata echoed back in webhook events.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Sent as the `Idempotency-Key` request header, not in the body.
    #[serde(skip)]
    pub idempotency_key: Option<String>,
}

/// Body of a successful send response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendEmailResponse {
    /// Provider message id; may be empty.
    #[serde(default)]
    pub message_id: String,
    /// Provider status such as `pending`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for the sending API.
///
/// The HTTP client lives outside this crate; implementations perform the
/// request and report any failure as an [`ApiError`].
#[async_trait::async_trait]
pub trait EmailApi: Send + Sync + std::fmt::Debug {
    /// Sends one message.
    async fn send(&self, request: SendEmailRequest) -> Result<SendEmailResponse, ApiError>;
}
