//! Performance benchmarks for the webhook pipeline.
//!
//! Tracks the per-request CPU work: signature verification, envelope
//! parsing, data decoding, and the full verify-parse-dispatch path.

use std::{hint::black_box, sync::Arc, time::Duration};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lettermint_core::{
    Clock, Dispatcher, EventType, EventTypeRegistry, NoOpEventHandler, SignatureVerifier,
    TestClock, WebhookPayload, WebhookProcessor,
};
use lettermint_testing::{TestSigner, WebhookBuilder, TEST_SECRET};
use serde_json::json;
use tokio::runtime::Runtime;

const NOW: i64 = 1_705_314_600;

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(Some(TEST_SECRET), Duration::from_secs(300))
        .unwrap()
        .with_clock(Arc::new(TestClock::at_unix(NOW)))
}

/// Delivered body whose metadata is padded to roughly `size` bytes.
fn padded_body(size: usize) -> Vec<u8> {
    WebhookBuilder::new(EventType::MessageDelivered)
        .data(json!({
            "message_id": "m-1",
            "recipient": "a@b.com",
            "response": {"status_code": 250},
            "metadata": {"padding": "x".repeat(size)},
            "tag": "bench"
        }))
        .build()
}

/// Benchmarks HMAC verification across body sizes.
fn bench_signature_verification(c: &mut Criterion) {
    let verifier = verifier();
    let signer = TestSigner::new();

    let mut group = c.benchmark_group("signature");
    for size in [100, 10_000, 1_000_000] {
        let body = padded_body(size);
        let header = signer.header_at(NOW, &body);

        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("verify", size), &body, |b, body| {
            b.iter(|| verifier.verify(black_box(Some(header.as_str())), black_box(body)));
        });
    }

    let body = padded_body(100);
    let bad = signer.header_at(NOW - 3600, &body);
    group.bench_function("reject_stale", |b| {
        b.iter(|| verifier.verify(black_box(Some(bad.as_str())), black_box(&body)));
    });

    group.finish();
}

/// Benchmarks parsing and decoding of every event type.
fn bench_parsing(c: &mut Criterion) {
    let registry = EventTypeRegistry::new();

    let mut group = c.benchmark_group("parsing");
    for event_type in EventType::ALL {
        let body = WebhookBuilder::new(event_type).build();

        group.bench_with_input(
            BenchmarkId::new("parse_and_decode", event_type.as_str()),
            &body,
            |b, body| {
                b.iter(|| {
                    let payload = WebhookPayload::parse(black_box(body)).unwrap();
                    registry.decode_payload(payload).unwrap()
                });
            },
        );
    }
    group.finish();
}

/// Benchmarks the complete verify, parse and dispatch path.
fn bench_processing(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let processor =
        WebhookProcessor::new(verifier(), Dispatcher::new(Arc::new(NoOpEventHandler::new())));
    let body = WebhookBuilder::new(EventType::MessageInbound).build();
    let header = TestSigner::new().header_at(TestClock::at_unix(NOW).unix_timestamp(), &body);

    c.bench_function("process_inbound", |b| {
        b.iter(|| rt.block_on(processor.process(Some(header.as_str()), black_box(&body))).unwrap());
    });
}

criterion_group!(benches, bench_signature_verification, bench_parsing, bench_processing);
criterion_main!(benches);
