#![no_main]

//! Fuzz target for webhook signature validation.
//!
//! Splits the input into a header and a body and checks that verification
//! never panics and only accepts what the verifier itself signed.

use std::{sync::Arc, time::Duration};

use lettermint_core::{signature::parse_signature_header, SignatureVerifier, TestClock};
use libfuzzer_sys::fuzz_target;

const NOW: i64 = 1_705_314_600;

fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
    let (header, body) = data.split_at(split);
    let Ok(header) = std::str::from_utf8(header) else {
        return;
    };

    let _ = parse_signature_header(header);

    let Ok(verifier) = SignatureVerifier::new(Some("fuzz_secret"), Duration::from_secs(300))
    else {
        return;
    };
    let verifier = verifier.with_clock(Arc::new(TestClock::at_unix(NOW)));

    if verifier.verify(Some(header), body).is_ok() {
        let parsed = parse_signature_header(header).unwrap();
        let expected = verifier.sign(parsed.timestamp, body);
        assert!(parsed.signatures.iter().any(|sig| hex::encode(sig) == expected));
    }

    let signed = verifier.signature_header(NOW, body);
    assert!(verifier.verify(Some(&signed), body).is_ok());
});
