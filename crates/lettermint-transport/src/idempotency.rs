//! Deterministic idempotency keys for outgoing messages.
//!
//! The same message content always yields the same key, so a queue worker
//! retrying a send cannot deliver twice. With a window shorter than a day
//! the key also includes the current window number, allowing an identical
//! message again once the window has passed.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::message::{Address, MailMessage};

/// Windows of at least this length deduplicate for the API's full retention.
pub const FULL_RETENTION: Duration = Duration::from_secs(86_400);

/// Derives the idempotency key for `message` at unix time `now`.
pub fn derive_key(message: &MailMessage, window: Duration, now: i64) -> String {
    let mut parts = vec![
        message.subject.clone().unwrap_or_default(),
        join(&message.to),
        join(&message.cc),
        join(&message.bcc),
        message.html.clone().or_else(|| message.text.clone()).unwrap_or_default(),
        message.from.first().map(ToString::to_string).unwrap_or_default(),
    ];

    if window < FULL_RETENTION {
        let window_secs = i64::try_from(window.as_secs().max(1)).unwrap_or(i64::MAX);
        parts.push(now.div_euclid(window_secs).to_string());
    }

    parts.retain(|part| !part.is_empty());
    hex::encode(Sha256::digest(parts.join("|").as_bytes()))
}

fn join(addresses: &[Address]) -> String {
    addresses.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}
