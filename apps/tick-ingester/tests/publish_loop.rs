//! Publish Loop Integration Tests
//!
//! Drives the ingester against the in-memory stream and checks what a
//! downstream reader would see.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use price_stream::{Cursor, EntryId, EventStream, MemoryStream, PriceTick};
use proptest::prelude::*;
use tick_ingester::generator::{DEFAULT_PRICE_RANGE, DEFAULT_SYMBOLS};
use tick_ingester::{Ingester, TickGenerator};
use tokio_util::sync::CancellationToken;

fn universe() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn reader_sees_every_published_tick_in_order() {
    let stream = MemoryStream::new();
    let generator = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 99).unwrap();
    let mut ingester = Ingester::new(stream.clone(), generator, "event", Duration::from_secs(1));

    let mut published = Vec::new();
    for _ in 0..5 {
        published.push(ingester.tick().await.unwrap());
    }

    let batch = stream
        .read(&Cursor::After(EntryId::MIN), Duration::from_millis(10), 100)
        .await
        .unwrap();

    assert_eq!(batch.len(), published.len());
    for (entry, sent) in batch.iter().zip(&published) {
        assert_eq!(entry.id(), sent.entry_id);
        assert_eq!(entry.decode_tick("event").unwrap(), sent.tick);
    }
}

#[tokio::test]
async fn published_payload_is_plain_json() {
    let stream = MemoryStream::new();
    let generator = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 5).unwrap();
    let mut ingester = Ingester::new(stream.clone(), generator, "event", Duration::from_secs(1));

    ingester.tick().await.unwrap();

    let entry = &stream.entries()[0];
    let payload = entry.payload("event").unwrap();
    let value: serde_json::Value = serde_json::from_str(payload).unwrap();
    let object = value.as_object().unwrap();
    assert!(object["symbol"].is_string());
    assert!(object["price"].is_number());
    assert!(object["timestamp"].is_i64());
}

#[tokio::test]
async fn tailing_reader_receives_live_ticks() {
    let stream = MemoryStream::new();
    let generator = TickGenerator::with_seed(universe(), DEFAULT_PRICE_RANGE, 17).unwrap();
    let ingester = Ingester::new(stream.clone(), generator, "event", Duration::from_millis(20));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(ingester.run(cancel.clone()));

    let batch = stream
        .read(&Cursor::After(EntryId::MIN), Duration::from_secs(2), 10)
        .await
        .unwrap();
    cancel.cancel();
    handle.await.unwrap();

    assert!(!batch.is_empty());
    let tick: PriceTick = batch[0].decode_tick("event").unwrap();
    assert!(DEFAULT_SYMBOLS.contains(&tick.symbol()));
}

proptest! {
    #[test]
    fn any_seed_yields_ticks_inside_bounds(
        seed in any::<u64>(),
        min in 1.0_f64..1_000.0,
        width in 0.01_f64..1_000.0,
    ) {
        let range = min..min + width;
        let mut generator = TickGenerator::with_seed(universe(), range.clone(), seed).unwrap();
        for _ in 0..20 {
            let tick = generator.next_tick().unwrap();
            prop_assert!(range.contains(&tick.price()));
            prop_assert!(DEFAULT_SYMBOLS.contains(&tick.symbol()));
            let decoded = PriceTick::decode(&tick.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded, tick);
        }
    }
}
