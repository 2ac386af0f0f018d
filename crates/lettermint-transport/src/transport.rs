//! Mapping of [`MailMessage`]s onto send requests.

use std::{collections::BTreeMap, sync::Arc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use lettermint_core::{Clock, RealClock};
use tracing::{debug, instrument, warn};

use crate::{
    api::{AttachmentPayload, EmailApi, SendEmailRequest},
    config::TransportConfig,
    error::{Result, TransportError},
    idempotency,
    message::{Address, MailMessage},
    IDEMPOTENCY_KEY_HEADER, LEGACY_TAG_HEADER, METADATA_HEADER_PREFIX, TAG_HEADER,
};

/// Domain appended to provider message ids lacking one.
pub const MESSAGE_ID_DOMAIN: &str = "lmta.net";

/// Headers carried by dedicated request fields instead of `headers`.
const BYPASS_HEADERS: [&str; 10] = [
    "from",
    "to",
    "cc",
    "bcc",
    "subject",
    "content-type",
    "sender",
    "reply-to",
    "idempotency-key",
    "x-lm-tag",
];

/// Outcome of a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// RFC 5322 style message id, when the provider returned one.
    pub message_id: Option<String>,
}

/// Sends [`MailMessage`]s through an [`EmailApi`].
#[derive(Debug, Clone)]
pub struct LettermintTransport {
    api: Arc<dyn EmailApi>,
    config: TransportConfig,
    clock: Arc<dyn Clock>,
}

impl LettermintTransport {
    /// Creates a transport using the system clock for idempotency windows.
    pub fn new(api: Arc<dyn EmailApi>, config: TransportConfig) -> Self {
        Self { api, config, clock: Arc::new(RealClock::new()) }
    }

    /// Replaces the clock used for idempotency windows.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// - `InvalidMessage` when the message has no sender or no recipient
    /// - `SendFailed` wrapping any error reported by the API
    #[instrument(name = "lettermint_send", skip_all, fields(subject = message.subject.as_deref().unwrap_or("")))]
    pub async fn send(&self, message: &MailMessage) -> Result<SentMessage> {
        let request = self.build_request(message)?;

        let response = self.api.send(request).await.map_err(|e| {
            warn!(error = %e, "lettermint send failed");
            TransportError::send_failed(e)
        })?;

        let message_id = format_message_id(&response.message_id);
        debug!(message_id = message_id.as_deref().unwrap_or("-"), "lettermint send accepted");

        Ok(SentMessage { message_id })
    }

    /// Builds the API request for `message` without sending it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMessage` when the message has no sender or no
    /// recipient.
    pub fn build_request(&self, message: &MailMessage) -> Result<SendEmailRequest> {
        let sender = message
            .sender
            .as_ref()
            .or_else(|| message.from.first())
            .ok_or_else(|| TransportError::invalid_message("message has no sender"))?;

        let to = recipients(message);
        if to.is_empty() && message.cc.is_empty() && message.bcc.is_empty() {
            return Err(TransportError::invalid_message("message has no recipients"));
        }

        let (tag, metadata) = tag_and_metadata(message);

        Ok(SendEmailRequest {
            from: sender.to_string(),
            to: stringify(&to),
            cc: stringify(&message.cc),
            bcc: stringify(&message.bcc),
            reply_to: stringify(&message.reply_to),
            subject: message.subject.clone().unwrap_or_default(),
            html: message.html.clone(),
            text: message.text.clone(),
            headers: custom_headers(message),
            attachments: message
                .attachments
                .iter()
                .map(|attachment| AttachmentPayload {
                    filename: attachment.filename.clone(),
                    content: STANDARD.encode(&attachment.content),
                    content_id: attachment
                        .content_id
                        .as_deref()
                        .map(|id| id.trim_matches(|c| c == '<' || c == '>').to_string()),
                })
                .collect(),
            route: self.config.route_id.clone(),
            tag,
            metadata,
            idempotency_key: self.idempotency_key(message),
        })
    }

    fn idempotency_key(&self, message: &MailMessage) -> Option<String> {
        if let Some(explicit) = message.header_value(IDEMPOTENCY_KEY_HEADER) {
            return Some(explicit.to_string());
        }
        if !self.config.idempotency {
            return None;
        }
        Some(idempotency::derive_key(
            message,
            self.config.idempotency_window,
            self.clock.unix_timestamp(),
        ))
    }
}

/// Envelope recipients minus copies, or the `To` list when no envelope is set.
fn recipients(message: &MailMessage) -> Vec<Address> {
    if message.envelope_recipients.is_empty() {
        return message.to.clone();
    }

    message
        .envelope_recipients
        .iter()
        .filter(|address| {
            !message.cc.iter().chain(&message.bcc).any(|copy| copy.same_mailbox(address))
        })
        .cloned()
        .collect()
}

fn stringify(addresses: &[Address]) -> Vec<String> {
    addresses.iter().map(ToString::to_string).collect()
}

fn is_tag_or_metadata(name: &str) -> bool {
    name.eq_ignore_ascii_case(TAG_HEADER) || metadata_key(name).is_some()
}

fn metadata_key(name: &str) -> Option<&str> {
    let prefix_len = METADATA_HEADER_PREFIX.len();
    let prefix = name.get(..prefix_len)?;
    prefix
        .eq_ignore_ascii_case(METADATA_HEADER_PREFIX)
        .then(|| &name[prefix_len..])
        .filter(|key| !key.is_empty())
}

fn custom_headers(message: &MailMessage) -> BTreeMap<String, String> {
    message
        .headers
        .iter()
        .filter(|(name, _)| {
            !BYPASS_HEADERS.iter().any(|bypass| name.eq_ignore_ascii_case(bypass))
                && !is_tag_or_metadata(name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn tag_and_metadata(message: &MailMessage) -> (Option<String>, BTreeMap<String, String>) {
    let mut tag = None;
    let mut metadata = BTreeMap::new();

    for (name, value) in &message.headers {
        if name.eq_ignore_ascii_case(TAG_HEADER) {
            tag = Some(value.clone());
        } else if let Some(key) = metadata_key(name) {
            metadata.insert(key.to_string(), value.clone());
        }
    }

    let tag = tag.or_else(|| message.header_value(LEGACY_TAG_HEADER).map(str::to_string));
    (tag, metadata)
}

/// Makes a provider id usable as a `Message-ID`.
pub fn format_message_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        None
    } else if raw.contains('@') {
        Some(raw.to_string())
    } else {
        Some(format!("{raw}@{MESSAGE_ID_DOMAIN}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_gain_domain() {
        assert_eq!(format_message_id("abc123").as_deref(), Some("abc123@lmta.net"));
        assert_eq!(format_message_id("abc@example.com").as_deref(), Some("abc@example.com"));
        assert_eq!(format_message_id(""), None);
    }

    #[test]
    fn metadata_key_requires_prefix_and_key() {
        assert_eq!(metadata_key("X-Metadata-user_id"), Some("user_id"));
        assert_eq!(metadata_key("x-metadata-Plan"), Some("Plan"));
        assert_eq!(metadata_key("X-Metadata-"), None);
        assert_eq!(metadata_key("X-Meta"), None);
        assert_eq!(metadata_key("X-Priority"), None);
    }

    #[test]
    fn envelope_recipients_exclude_copies() {
        let message = MailMessage::new()
            .to("a@example.com")
            .cc("b@example.com")
            .bcc("c@example.com")
            .envelope_recipient("a@example.com")
            .envelope_recipient("B@example.com")
            .envelope_recipient("c@example.com")
            .envelope_recipient("d@example.com");

        let to: Vec<_> = recipients(&message).into_iter().map(|a| a.email).collect();
        assert_eq!(to, vec!["a@example.com", "d@example.com"]);
    }
}
