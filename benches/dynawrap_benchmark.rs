use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use dynawrap::backend::{Backend, MemoryBackend};
use dynawrap::message::{self, Message};
use dynawrap::types::{KeySchemaElement, SecondaryIndex};
use dynawrap::DynamoDb;

const TABLE: &str = "messages_bench";

fn sample() -> Message {
    serde_json::json!({
        "school_email": "Mail@Mail.cl",
        "school_id": 22,
        "contact_type": "parent",
        "message": "Hello",
        "country": "Chile",
        "parent_id": "1",
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn format(c: &mut Criterion) {
    let message = sample();

    c.bench_function("format_message", |b| {
        b.iter(|| message::format_message(&message, true, None));
    });

    let items = (0..100)
        .map(|_| message::format_message(&message, true, None).item)
        .collect::<Vec<_>>();
    c.bench_function("unformat_message", |b| {
        b.iter(|| message::unformat_message(&items).unwrap());
    });
}

pub fn post_and_search(c: &mut Criterion) {
    const NUM_POST: usize = 100;

    let rt = rt();
    let dynamo = rt.block_on(async {
        let backend = MemoryBackend::new();
        backend
            .create_table(
                TABLE,
                vec![
                    KeySchemaElement::hash("message_id"),
                    KeySchemaElement::range("timestamp"),
                ],
                vec![SecondaryIndex::new(
                    dynawrap::client::index_name("school_id"),
                    vec![KeySchemaElement::hash("school_id")],
                )],
            )
            .await
            .unwrap();
        let backend: Arc<dyn Backend> = Arc::new(backend);
        DynamoDb::new(TABLE, Some("chile".to_owned()), backend).unwrap()
    });
    let message = sample();

    c.bench_function("post_message", |b| {
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..NUM_POST {
                    dynamo.post_message(&message, None, true).await.unwrap();
                }
            });
        });
    });

    c.bench_function("search_on_index", |b| {
        b.iter(|| {
            rt.block_on(async {
                dynamo.search_on_index("school_id", "22").await.unwrap();
            });
        });
    });
}

fn rt() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

criterion_group!(benches, format, post_and_search);
criterion_main!(benches);
