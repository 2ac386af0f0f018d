//! Webhook signature verification.
//!
//! Lettermint signs every delivery with HMAC-SHA256 over
//! `"<timestamp>.<raw body>"` and sends the result in the
//! `X-Lettermint-Signature` header as `t=<unix seconds>,v1=<hex digest>`.
//! A delivery is authentic when one of the `v1` digests matches and the
//! timestamp lies within the configured tolerance of the receiver's clock.

use std::{fmt, sync::Arc, time::Duration};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    error::{Result, WebhookError},
    time::{Clock, RealClock},
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "x-lettermint-signature";

/// Header carrying the delivery id, informational only.
pub const DELIVERY_HEADER: &str = "x-lettermint-delivery";

/// Default freshness window in seconds.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Why a signature was rejected.
///
/// Only logged. Callers see the uniform [`WebhookError::SignatureInvalid`]
/// so rejections do not reveal which check failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureRejection {
    /// Header absent or blank.
    #[error("signature header missing")]
    MissingHeader,

    /// Header present but not in `t=<int>,v1=<hex>` form.
    #[error("malformed signature header: {0}")]
    MalformedHeader(String),

    /// No `v1` digest matched.
    #[error("signature digest mismatch")]
    DigestMismatch,

    /// Signed timestamp outside the tolerance window.
    #[error("stale signature timestamp {timestamp} (now {now}, tolerance {tolerance_secs}s)")]
    StaleTimestamp {
        /// Timestamp from the header.
        timestamp: i64,
        /// Receiver's clock.
        now: i64,
        /// Allowed skew in seconds.
        tolerance_secs: u64,
    },
}

/// Decoded contents of a signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSignature {
    /// Signed unix timestamp.
    pub timestamp: i64,
    /// Candidate digests, raw bytes.
    pub signatures: Vec<Vec<u8>>,
}

/// Parses `t=<unix>,v1=<hex>[,v1=<hex>...]`.
///
/// Keys other than `t` and `v1` are ignored.
///
/// # Errors
///
/// Returns `MissingHeader` for a blank header and `MalformedHeader` when
/// `t` is missing, repeated or not an integer, when no `v1` is present, or
/// when a `v1` value is not valid hex.
pub fn parse_signature_header(
    header: &str,
) -> std::result::Result<ParsedSignature, SignatureRejection> {
    let header = header.trim();
    if header.is_empty() {
        return Err(SignatureRejection::MissingHeader);
    }

    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(SignatureRejection::MalformedHeader(format!(
                "expected key=value pair, got {:?}",
                part.trim()
            )));
        };

        match key.trim() {
            "t" => {
                if timestamp.is_some() {
                    return Err(SignatureRejection::MalformedHeader(
                        "timestamp given more than once".to_string(),
                    ));
                }
                let parsed = value.trim().parse::<i64>().map_err(|_| {
                    SignatureRejection::MalformedHeader(format!(
                        "timestamp is not an integer: {:?}",
                        value.trim()
                    ))
                })?;
                timestamp = Some(parsed);
            },
            "v1" => {
                let digest = hex::decode(value.trim()).map_err(|e| {
                    SignatureRejection::MalformedHeader(format!("v1 is not valid hex: {e}"))
                })?;
                signatures.push(digest);
            },
            _ => {},
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| SignatureRejection::MalformedHeader("timestamp missing".to_string()))?;
    if signatures.is_empty() {
        return Err(SignatureRejection::MalformedHeader("no v1 signature".to_string()));
    }

    Ok(ParsedSignature { timestamp, signatures })
}

/// Verifies webhook signatures against a shared secret.
///
/// Construct once at startup. Construction fails without a secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    mac: HmacSha256,
    tolerance: Duration,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"***")
            .field("tolerance", &self.tolerance)
            .field("clock", &self.clock)
            .finish()
    }
}

impl SignatureVerifier {
    /// Creates a verifier using the system clock.
    ///
    /// # Errors
    ///
    /// Returns `SecretNotConfigured` when `secret` is `None` or blank.
    pub fn new(secret: Option<&str>, tolerance: Duration) -> Result<Self> {
        // Blank secrets are rejected, but the key itself is used exactly as configured.
        let Some(secret) = secret.filter(|s| !s.trim().is_empty()) else {
            return Err(WebhookError::SecretNotConfigured);
        };

        // HMAC accepts keys of any length; the error arm is unreachable in practice.
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| WebhookError::SecretNotConfigured)?;

        Ok(Self { mac, tolerance, clock: Arc::new(RealClock::new()) })
    }

    /// Replaces the clock used for freshness checks.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Allowed skew between the signed timestamp and the local clock.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies a delivery.
    ///
    /// `signature_header` is the raw `X-Lettermint-Signature` value and `body`
    /// the exact bytes received, before any JSON parsing.
    ///
    /// # Errors
    ///
    /// Returns `SignatureInvalid` for every rejection reason. The reason is
    /// logged at `warn` level.
    pub fn verify(&self, signature_header: Option<&str>, body: &[u8]) -> Result<()> {
        match self.check(signature_header, body) {
            Ok(timestamp) => {
                debug!(timestamp, "webhook signature verified");
                Ok(())
            },
            Err(rejection) => {
                warn!(reason = %rejection, "webhook signature rejected");
                Err(WebhookError::SignatureInvalid)
            },
        }
    }

    /// Verifies a delivery and reports the precise rejection reason.
    ///
    /// Returns the signed timestamp on success.
    ///
    /// # Errors
    ///
    /// Returns the first check that failed. Digests are compared before the
    /// timestamp, so a forged signature is reported as a mismatch even when
    /// its timestamp is also stale.
    pub fn check(
        &self,
        signature_header: Option<&str>,
        body: &[u8],
    ) -> std::result::Result<i64, SignatureRejection> {
        let header = signature_header.ok_or(SignatureRejection::MissingHeader)?;
        let parsed = parse_signature_header(header)?;

        let matched = parsed
            .signatures
            .iter()
            .any(|candidate| self.digest(parsed.timestamp, body).verify_slice(candidate).is_ok());
        if !matched {
            return Err(SignatureRejection::DigestMismatch);
        }

        let now = self.clock.unix_timestamp();
        let tolerance_secs = self.tolerance.as_secs();
        if now.abs_diff(parsed.timestamp) > tolerance_secs {
            return Err(SignatureRejection::StaleTimestamp {
                timestamp: parsed.timestamp,
                now,
                tolerance_secs,
            });
        }

        Ok(parsed.timestamp)
    }

    /// Computes the hex digest Lettermint would send for `body` at `timestamp`.
    pub fn sign(&self, timestamp: i64, body: &[u8]) -> String {
        hex::encode(self.digest(timestamp, body).finalize().into_bytes())
    }

    /// Builds a complete `t=...,v1=...` header value.
    pub fn signature_header(&self, timestamp: i64, body: &[u8]) -> String {
        format!("t={timestamp},v1={}", self.sign(timestamp, body))
    }

    fn digest(&self, timestamp: i64, body: &[u8]) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        mac
    }
}
