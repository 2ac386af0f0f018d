//! Signature header construction for tests.

use std::time::Duration;

use lettermint_core::{Clock, RealClock, SignatureVerifier, DEFAULT_TOLERANCE_SECS};

/// Secret shared by test senders and receivers.
pub const TEST_SECRET: &str = "whsec_test_secret_for_lettermint";

/// Signs bodies the way Lettermint does.
#[derive(Debug, Clone)]
pub struct TestSigner {
    verifier: SignatureVerifier,
}

impl TestSigner {
    /// Signer using [`TEST_SECRET`].
    pub fn new() -> Self {
        Self::with_secret(TEST_SECRET)
    }

    /// Signer using a custom secret.
    ///
    /// # Panics
    ///
    /// Panics when `secret` is blank.
    pub fn with_secret(secret: &str) -> Self {
        let verifier =
            SignatureVerifier::new(Some(secret), Duration::from_secs(DEFAULT_TOLERANCE_SECS))
                .unwrap_or_else(|e| panic!("test signer needs a non-blank secret: {e}"));
        Self { verifier }
    }

    /// Header value for `body` signed at `timestamp`.
    pub fn header_at(&self, timestamp: i64, body: &[u8]) -> String {
        self.verifier.signature_header(timestamp, body)
    }

    /// Header value for `body` signed at the current time.
    pub fn header_now(&self, body: &[u8]) -> String {
        self.header_at(RealClock::new().unix_timestamp(), body)
    }

    /// Hex digest for `body` at `timestamp`.
    pub fn digest_at(&self, timestamp: i64, body: &[u8]) -> String {
        self.verifier.sign(timestamp, body)
    }
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::new()
    }
}
