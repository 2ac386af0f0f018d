//! Typed data records carried by each webhook event type.
//!
//! Records are plain structs decoded from the `data` object of a webhook
//! body through [`DecodeData`]. Serializing a record produces the same wire
//! field names it was decoded from.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{error::Result, fields::Fields};

/// Free-form metadata attached to a message when it was sent.
pub type Metadata = Map<String, Value>;

/// Decoding of one data record from the raw `data` object.
pub trait DecodeData: Sized {
    /// Decodes the record from the fields of an object.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` naming the first field that is missing or
    /// has the wrong shape.
    fn from_fields(fields: Fields<'_>) -> Result<Self>;

    /// Decodes the record from a raw `data` value.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` when `data` is not an object or a field
    /// fails to decode.
    fn decode(data: &Value) -> Result<Self> {
        Self::from_fields(Fields::new(data, "data")?)
    }
}

/// Sender address on outbound messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailAddress {
    /// Address part, `local@domain`.
    pub email: String,
    /// Display name, when the sender set one.
    pub name: Option<String>,
}

impl DecodeData for EmailAddress {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self { email: f.required_str("email")?, name: f.optional_str("name")? })
    }
}

/// Response returned by the receiving mail server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerResponse {
    /// SMTP reply code, e.g. 250 or 550.
    pub status_code: u16,
    /// Enhanced status code, e.g. `5.1.1`.
    pub enhanced_status_code: Option<String>,
    /// Reply text.
    pub content: Option<String>,
}

impl DecodeData for ServerResponse {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            status_code: f.required_u16("status_code")?,
            enhanced_status_code: f.optional_str("enhanced_status_code")?,
            content: f.optional_str("content")?,
        })
    }
}

/// Data for `message.created`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageCreatedData {
    /// Lettermint message id.
    pub message_id: String,
    /// Sender of the message.
    pub from: EmailAddress,
    /// Primary recipients.
    pub to: Vec<String>,
    /// Carbon copy recipients.
    pub cc: Vec<String>,
    /// Blind carbon copy recipients.
    pub bcc: Vec<String>,
    /// Reply-to addresses; `null` on the wire decodes as empty.
    pub reply_to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageCreatedData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            from: f.required_object("from", EmailAddress::from_fields)?,
            to: f.string_list("to")?,
            cc: f.string_list("cc")?,
            bcc: f.string_list("bcc")?,
            reply_to: f.string_list("reply_to")?,
            subject: f.required_str("subject")?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Data for events that only identify a message and its recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecipientData {
    /// Lettermint message id.
    pub message_id: String,
    /// Recipient the event applies to.
    pub recipient: String,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageRecipientData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            recipient: f.required_str("recipient")?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Data for `message.sent`.
pub type MessageSentData = MessageRecipientData;

/// Data for `message.spam_complaint`.
pub type MessageSpamComplaintData = MessageRecipientData;

/// Data for events that carry the receiving server's response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResponseData {
    /// Lettermint message id.
    pub message_id: String,
    /// Recipient the event applies to.
    pub recipient: String,
    /// Reply of the receiving server for this recipient.
    pub response: ServerResponse,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageResponseData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            recipient: f.required_str("recipient")?,
            response: f.required_object("response", ServerResponse::from_fields)?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Data for `message.delivered`.
pub type MessageDeliveredData = MessageResponseData;

/// Data for `message.hard_bounced`.
pub type MessageHardBouncedData = MessageResponseData;

/// Data for `message.soft_bounced`.
pub type MessageSoftBouncedData = MessageResponseData;

/// Data for `message.failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageFailedData {
    /// Lettermint message id.
    pub message_id: String,
    /// Recipient the event applies to.
    pub recipient: String,
    /// Human readable failure reason.
    pub reason: String,
    /// Last reply of the receiving server.
    pub response: ServerResponse,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageFailedData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            recipient: f.required_str("recipient")?,
            reason: f.required_str("reason")?,
            response: f.required_object("response", ServerResponse::from_fields)?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Data for `message.suppressed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageSuppressedData {
    /// Lettermint message id.
    pub message_id: String,
    /// Suppressed recipient.
    pub recipient: String,
    /// Why the recipient is on the suppression list, e.g. a prior hard bounce.
    pub reason: String,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageSuppressedData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            recipient: f.required_str("recipient")?,
            reason: f.required_str("reason")?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Data for `message.unsubscribed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageUnsubscribedData {
    /// Lettermint message id.
    pub message_id: String,
    /// Recipient that unsubscribed.
    pub recipient: String,
    /// When the unsubscribe was recorded.
    pub unsubscribed_at: DateTime<Utc>,
    /// Metadata supplied when the message was sent.
    pub metadata: Metadata,
    /// Tag supplied when the message was sent.
    pub tag: Option<String>,
}

impl DecodeData for MessageUnsubscribedData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message_id: f.required_str("message_id")?,
            recipient: f.required_str("recipient")?,
            unsubscribed_at: f.required_datetime("unsubscribed_at")?,
            metadata: f.metadata("metadata")?,
            tag: f.optional_str("tag")?,
        })
    }
}

/// Address on an inbound message, with the `+subaddress` split out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboundEmailAddress {
    /// Full address, including any `+subaddress`.
    pub email: String,
    /// Display name from the header, if any.
    pub name: Option<String>,
    /// Part after `+` in the local part, e.g. `orders` for `shop+orders@example.com`.
    pub subaddress: Option<String>,
}

impl DecodeData for InboundEmailAddress {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            email: f.required_str("email")?,
            name: f.optional_str("name")?,
            subaddress: f.optional_str("subaddress")?,
        })
    }
}

/// Text and HTML bodies of an inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailBody {
    /// Plain text part.
    pub text: Option<String>,
    /// HTML part.
    pub html: Option<String>,
}

impl DecodeData for EmailBody {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self { text: f.optional_str("text")?, html: f.optional_str("html")? })
    }
}

/// Raw header line of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailHeader {
    /// Header name as sent, case preserved.
    pub name: String,
    /// Unfolded header value.
    pub value: String,
}

impl DecodeData for EmailHeader {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self { name: f.required_str("name")?, value: f.required_str("value")? })
    }
}

/// Attachment of an inbound message.
///
/// The content stays base64 encoded as delivered; call
/// [`EmailAttachment::decoded_content`] when the bytes are needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailAttachment {
    /// File name declared by the sender.
    pub filename: String,
    /// Base64 encoded content.
    pub content: String,
    /// MIME type declared by the sender.
    pub content_type: String,
    /// Size in bytes of the decoded content.
    pub size: u64,
    /// Content id for inline parts.
    pub content_id: Option<String>,
}

impl EmailAttachment {
    /// Decodes the base64 content into raw bytes.
    ///
    /// Line breaks inside the encoded content are ignored.
    ///
    /// # Errors
    ///
    /// Returns the decode error when the content is not valid base64.
    pub fn decoded_content(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        if self.content.bytes().any(|b| b.is_ascii_whitespace()) {
            let compact: String =
                self.content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD.decode(compact)
        } else {
            STANDARD.decode(&self.content)
        }
    }
}

impl DecodeData for EmailAttachment {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            filename: f.required_str("filename")?,
            content: f.required_str("content")?,
            content_type: f.required_str("content_type")?,
            size: f.required_u64("size")?,
            content_id: f.optional_str("content_id")?,
        })
    }
}

/// Spam filter rule that matched an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpamSymbol {
    /// Rule name, e.g. `DMARC_POLICY_ALLOW`.
    pub name: String,
    /// Score the rule contributed; negative values lower the total.
    pub score: f64,
    /// Rule specific details reported by the filter. Kept as raw JSON since
    /// the shape differs from rule to rule.
    pub options: Vec<Value>,
    /// Human readable rule description.
    pub description: String,
}

impl DecodeData for SpamSymbol {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            name: f.required_str("name")?,
            score: f.required_f64("score")?,
            options: f.value_list("options")?,
            description: f.required_str("description")?,
        })
    }
}

/// Data for `message.inbound`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageInboundData {
    /// Id of the inbound route that accepted the message.
    pub route: String,
    /// Lettermint message id.
    pub message_id: String,
    /// Sender of the message.
    pub from: InboundEmailAddress,
    /// Addresses from the `To` header.
    pub to: Vec<InboundEmailAddress>,
    /// Addresses from the `Cc` header.
    pub cc: Vec<InboundEmailAddress>,
    /// Envelope recipient the route matched, which may differ from `to`.
    pub recipient: String,
    /// Subaddress of `recipient`, the part after `+`, when present.
    pub subaddress: Option<String>,
    /// Raw `Reply-To` header value.
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Date the sender put on the message.
    pub date: DateTime<Utc>,
    /// Text and HTML bodies; both empty when the message had none.
    pub body: EmailBody,
    /// Tag configured on the route.
    pub tag: Option<String>,
    /// All headers in delivery order.
    pub headers: Vec<EmailHeader>,
    /// Attachments, content still base64 encoded.
    pub attachments: Vec<EmailAttachment>,
    /// Whether the spam filter classified the message as spam.
    pub is_spam: bool,
    /// Total spam score; `0.0` when not reported.
    pub spam_score: f64,
    /// Rules that contributed to `spam_score`.
    pub spam_symbols: Vec<SpamSymbol>,
}

impl MessageInboundData {
    /// Returns the first header with the given name, compared
    /// case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }
}

impl DecodeData for MessageInboundData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            route: f.required_str("route")?,
            message_id: f.required_str("message_id")?,
            from: f.required_object("from", InboundEmailAddress::from_fields)?,
            to: f.object_list("to", InboundEmailAddress::from_fields)?,
            cc: f.object_list("cc", InboundEmailAddress::from_fields)?,
            recipient: f.required_str("recipient")?,
            subaddress: f.optional_str("subaddress")?,
            reply_to: f.optional_str("reply_to")?,
            subject: f.required_str("subject")?,
            date: f.required_datetime("date")?,
            body: f.optional_object("body", EmailBody::from_fields)?,
            tag: f.optional_str("tag")?,
            headers: f.object_list("headers", EmailHeader::from_fields)?,
            attachments: f.object_list("attachments", EmailAttachment::from_fields)?,
            is_spam: f.bool_or("is_spam", false)?,
            spam_score: f.f64_or("spam_score", 0.0)?,
            spam_symbols: f.object_list("spam_symbols", SpamSymbol::from_fields)?,
        })
    }
}

/// Data for `webhook.test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookTestData {
    /// Message text of the test delivery.
    pub message: String,
    /// Id of the webhook being tested.
    pub webhook_id: String,
    /// Unix seconds at which the test was triggered.
    pub timestamp: i64,
}

impl DecodeData for WebhookTestData {
    fn from_fields(f: Fields<'_>) -> Result<Self> {
        Ok(Self {
            message: f.required_str("message")?,
            webhook_id: f.required_str("webhook_id")?,
            timestamp: f.required_i64("timestamp")?,
        })
    }
}
