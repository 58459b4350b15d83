//! Converting plain json messages to and from stored items.
//!
//! Messages are flattened into string attributes so that every field can be
//! used as a secondary index key. Reads convert items back with their native
//! types.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::common::Time;
use crate::types::{convert, AttributeValue, Item};
use crate::{DynamoError, Result};

pub const MESSAGE_ID: &str = "message_id";
pub const TIMESTAMP: &str = "timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Json object as exchanged with callers.
pub type Message = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct FormattedMessage {
    pub message_id: Uuid,
    pub item: Item,
}

/// Render the current local time the way stored timestamps look.
pub fn now_timestamp() -> String {
    format_time(chrono::Local::now())
}

pub(crate) fn format_time(time: Time) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Build an item ready to be put.
///
/// A fresh message id is always generated, but only stored when
/// `include_message_id` is set. Message fields with the same name as the
/// generated attributes take precedence.
pub fn format_message(
    message: &Message,
    include_message_id: bool,
    timestamp: Option<&str>,
) -> FormattedMessage {
    let message_id = Uuid::new_v4();
    let timestamp = timestamp.map(str::to_owned).unwrap_or_else(now_timestamp);

    let mut item = Item::with_capacity(message.len() + 2);
    if include_message_id {
        item.insert(MESSAGE_ID.to_owned(), AttributeValue::S(message_id.to_string()));
    }
    item.insert(TIMESTAMP.to_owned(), AttributeValue::S(timestamp));

    for (key, value) in message {
        item.insert(key.clone(), AttributeValue::S(stringify(value)));
    }

    FormattedMessage { message_id, item }
}

/// Convert stored items back to json objects.
pub fn unformat_message(items: &[Item]) -> Result<Vec<Message>> {
    items
        .iter()
        .map(|item| convert::item_to_json(item).map_err(DynamoError::from))
        .collect()
}

// null becomes an empty string, everything else its lowercased text.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}
