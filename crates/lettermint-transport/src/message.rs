//! Generic outgoing mail message.

use std::fmt;

use bytes::Bytes;

/// Mailbox with optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Address part, `local@domain`.
    pub email: String,
    /// Display name.
    pub name: Option<String>,
}

impl Address {
    /// Address without a display name.
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into(), name: None }
    }

    /// Address with a display name.
    pub fn named(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self { email: email.into(), name: Some(name.into()) }
    }

    /// Compares the address part case-insensitively, ignoring the name.
    pub fn same_mailbox(&self, other: &Address) -> bool {
        self.email.eq_ignore_ascii_case(&other.email)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => write!(f, "\"{}\" <{}>", name.replace('"', "\\\""), self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Raw content.
    pub content: Bytes,
    /// MIME type.
    pub content_type: String,
    /// Content id for inline parts, with or without surrounding `<>`.
    pub content_id: Option<String>,
}

impl Attachment {
    /// Regular attachment.
    pub fn new(
        filename: impl Into<String>,
        content: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: content_type.into(),
            content_id: None,
        }
    }

    /// Marks the attachment as inline with the given content id.
    #[must_use]
    pub fn inline(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }
}

/// Message handed to the transport.
///
/// `sender` and `envelope_recipients` describe the SMTP envelope; when
/// unset they are derived from the headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    /// `From` addresses.
    pub from: Vec<Address>,
    /// Envelope sender, overriding the first `From` address.
    pub sender: Option<Address>,
    /// `To` recipients.
    pub to: Vec<Address>,
    /// `Cc` recipients.
    pub cc: Vec<Address>,
    /// `Bcc` recipients.
    pub bcc: Vec<Address>,
    /// `Reply-To` addresses.
    pub reply_to: Vec<Address>,
    /// Envelope recipients; empty means all header recipients.
    pub envelope_recipients: Vec<Address>,
    /// Subject line.
    pub subject: Option<String>,
    /// Plain-text body.
    pub text: Option<String>,
    /// HTML body.
    pub html: Option<String>,
    /// Header lines in insertion order.
    pub headers: Vec<(String, String)>,
    /// Attachments in order.
    pub attachments: Vec<Attachment>,
}

impl MailMessage {
    /// Empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `From` address.
    #[must_use]
    pub fn from(mut self, address: impl Into<Address>) -> Self {
        self.from.push(address.into());
        self
    }

    /// Sets the envelope sender.
    #[must_use]
    pub fn sender(mut self, address: impl Into<Address>) -> Self {
        self.sender = Some(address.into());
        self
    }

    /// Adds a `To` recipient.
    #[must_use]
    pub fn to(mut self, address: impl Into<Address>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Adds a `Cc` recipient.
    #[must_use]
    pub fn cc(mut self, address: impl Into<Address>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Adds a `Bcc` recipient.
    #[must_use]
    pub fn bcc(mut self, address: impl Into<Address>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Adds a `Reply-To` address.
    #[must_use]
    pub fn reply_to(mut self, address: impl Into<Address>) -> Self {
        self.reply_to.push(address.into());
        self
    }

    /// Adds an envelope recipient.
    #[must_use]
    pub fn envelope_recipient(mut self, address: impl Into<Address>) -> Self {
        self.envelope_recipients.push(address.into());
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Appends a header line.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the tag header.
    #[must_use]
    pub fn tag(self, tag: impl Into<String>) -> Self {
        self.header(crate::TAG_HEADER, tag)
    }

    /// Adds a metadata header for `key`.
    #[must_use]
    pub fn metadata(self, key: &str, value: impl Into<String>) -> Self {
        self.header(format!("{}{key}", crate::METADATA_HEADER_PREFIX), value)
    }

    /// Adds an attachment.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// First header value named `name`, compared case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
