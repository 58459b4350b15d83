use std::sync::Arc;

use dynawrap::backend::{Backend, MemoryBackend};
use dynawrap::message::Message;
use dynawrap::types::{KeySchemaElement, SecondaryIndex};

pub const MESSAGES: &str = "messages_staging";
pub const SCHOOLS: &str = "schools_staging";

pub const SEARCH_INDEXES: &[&str] = &["school_id", "parent_id", "country"];

/// Backend with a messages table shaped like the production one and a
/// schools table keyed by `school_id`.
pub async fn backend(page_size: usize) -> Arc<dyn Backend> {
    let backend = MemoryBackend::new().with_page_size(page_size);

    backend
        .create_table(
            MESSAGES,
            vec![
                KeySchemaElement::hash("message_id"),
                KeySchemaElement::range("timestamp"),
            ],
            SEARCH_INDEXES
                .iter()
                .map(|attribute| {
                    SecondaryIndex::new(
                        dynawrap::client::index_name(attribute),
                        vec![KeySchemaElement::hash(*attribute)],
                    )
                })
                .collect(),
        )
        .await
        .unwrap();

    backend
        .create_table(SCHOOLS, vec![KeySchemaElement::hash("school_id")], vec![])
        .await
        .unwrap();

    Arc::new(backend)
}

pub fn message(school_id: &str, country: &str) -> Message {
    serde_json::json!({
        "school_email": "Mail@Mail.cl",
        "school_id": school_id,
        "school_name": "School Andes",
        "contact_type": "parent",
        "position": "Director",
        "message_title": "Enrollment",
        "message": "Hello",
        "country": country,
        "phone": "+569123456789",
        "parent_id": "1",
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn object(value: serde_json::Value) -> Message {
    value.as_object().cloned().unwrap()
}
