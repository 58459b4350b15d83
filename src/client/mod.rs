//! Table handles wrapping the storage backend.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::backend::{Backend, QueryRequest, ScanRequest, Select, MAX_BATCH_WRITE_ITEMS};
use crate::common::{debug, error, info, warn, DynamoError};
use crate::expression::Condition;
use crate::message::{self, FormattedMessage, Message};
use crate::types::{Item, KeySchemaElement, TableName};
use crate::Result;

mod resource;
pub use self::resource::{ItemKey, Resource};

const INDEX_SUFFIX: &str = "-index";
const COUNTRY_ATTRIBUTE: &str = "country";

// Spelling of the country given to a handle.
const COUNTRY_ALIASES: &[(&str, &str)] = &[("newhaven", "new haven")];
// Search values arrive url encoded.
const SEARCH_ALIASES: &[(&str, &str)] = &[("new+haven", "new haven")];

fn normalize_place<'a>(aliases: &[(&'static str, &'static str)], value: &'a str) -> &'a str {
    aliases
        .iter()
        .find(|(alias, _)| *alias == value)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(value)
}

/// Name of the secondary index keyed by `attribute`.
pub fn index_name(attribute: &str) -> String {
    format!("{}{}", attribute, INDEX_SUFFIX)
}

/// Handle bound to one table, optionally scoped to a country.
#[derive(Clone)]
pub struct DynamoDb {
    table_name: TableName,
    country: Option<String>,
    backend: Arc<dyn Backend>,
}

impl fmt::Debug for DynamoDb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Dynamo({})", self.table_name)
    }
}

impl fmt::Display for DynamoDb {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.table_name)
    }
}

impl DynamoDb {
    pub fn new(
        table_name: impl Into<String>,
        country: Option<String>,
        backend: Arc<dyn Backend>,
    ) -> Result<Self> {
        Ok(Self {
            table_name: TableName::new(table_name)?,
            country: country.map(|c| normalize_place(COUNTRY_ALIASES, &c).to_owned()),
            backend,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Build an item from `message`. See [`message::format_message`].
    pub fn format_message(
        &self,
        message: &Message,
        include_message_id: bool,
        timestamp: Option<&str>,
    ) -> FormattedMessage {
        message::format_message(message, include_message_id, timestamp)
    }

    pub fn unformat_message(&self, items: &[Item]) -> Result<Vec<Message>> {
        message::unformat_message(items).map_err(|err| {
            error!(table_name=%self.table_name, country=?self.country, %err, "Unformat message");
            err
        })
    }

    /// Format and put `message`, returning its message id.
    pub async fn post_message(
        &self,
        message: &Message,
        timestamp: Option<&str>,
        include_message_id: bool,
    ) -> Result<Uuid> {
        let FormattedMessage { message_id, item } =
            self.format_message(message, include_message_id, timestamp);

        self.backend
            .put_item(&self.table_name, item)
            .await
            .map_err(|err| self.failed(err, &self.table_name))?;

        info!(
            table_name=%self.table_name,
            country=?self.country,
            message_uuid=%message_id,
            "Message {} saved successfully on table {}",
            message_id,
            self.table_name
        );
        Ok(message_id)
    }

    /// Every item of the table, over all scan pages.
    pub async fn get_all_messages_from_index(
        &self,
        table_name: Option<&str>,
    ) -> Result<Vec<Message>> {
        let table_name = self.target(table_name)?;
        let items = scan_all(self.backend.as_ref(), ScanRequest::new(&*table_name))
            .await
            .map_err(|err| self.failed(err, &table_name))?;

        self.unformat_message(&items)
    }

    /// Number of items evaluated by a count query on `<index>-index`.
    pub async fn get_column_count(&self, index: &str, value: &str) -> Result<usize> {
        let index_name = index_name(index);
        let mut request = QueryRequest::new(&*self.table_name, Condition::eq(index, value));
        request.index_name = Some(index_name.clone());
        request.select = Select::Count;

        let mut scanned = 0;
        loop {
            let page = self
                .backend
                .query(request.clone())
                .await
                .map_err(|err| self.failed(err, &index_name))?;
            scanned += page.scanned_count;
            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }
        Ok(scanned)
    }

    /// Approximate item count reported by the table description.
    pub async fn get_index_count(&self, table_name: Option<&str>) -> Result<i64> {
        let table_name = self.target(table_name)?;
        let description = self
            .backend
            .describe_table(&table_name)
            .await
            .map_err(|err| self.failed(err, &table_name))?;
        Ok(description.item_count)
    }

    pub async fn get_index_key_schema(
        &self,
        table_name: Option<&str>,
    ) -> Result<Vec<KeySchemaElement>> {
        let table_name = self.target(table_name)?;
        let description = self
            .backend
            .describe_table(&table_name)
            .await
            .map_err(|err| self.failed(err, &table_name))?;
        Ok(description.key_schema)
    }

    /// Secondary index names mapped to their key schema.
    pub async fn get_index_secondary_indexes(
        &self,
        table_name: Option<&str>,
    ) -> Result<BTreeMap<String, Vec<KeySchemaElement>>> {
        let table_name = self.target(table_name)?;
        let description = self
            .backend
            .describe_table(&table_name)
            .await
            .map_err(|err| self.failed(err, &table_name))?;

        Ok(description
            .global_secondary_indexes
            .into_iter()
            .map(|index| (index.name, index.key_schema))
            .collect())
    }

    /// Items whose `index` attribute equals `value`.
    ///
    /// `index` may be given with or without its `-index` suffix. When the
    /// handle has a country, results are restricted to it unless the country
    /// index itself is searched. Fails with `NotFound` when nothing matches.
    pub async fn search_on_index(&self, index: &str, value: &str) -> Result<Vec<Message>> {
        let attribute = if index.contains(INDEX_SUFFIX) {
            index.split('-').next().unwrap_or(index)
        } else {
            index
        };
        let value = normalize_place(SEARCH_ALIASES, value);
        let index_name = index_name(attribute);

        let mut request = QueryRequest::new(&*self.table_name, Condition::eq(attribute, value));
        request.index_name = Some(index_name.clone());
        if let Some(country) = self.country.as_deref() {
            if attribute != COUNTRY_ATTRIBUTE {
                request.filter = vec![Condition::eq(COUNTRY_ATTRIBUTE, country)];
            }
        }

        let mut items = Vec::new();
        loop {
            let page = self.backend.query(request.clone()).await.map_err(|err| {
                let err = err.classify(&index_name);
                error!(
                    table_name=%self.table_name,
                    index=%index_name,
                    value,
                    %err,
                    "Search on index"
                );
                err
            })?;
            items.extend(page.items);
            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        if items.is_empty() {
            return Err(DynamoError::NotFound {
                resource: format!("{} = {:?} on {}", attribute, value, index_name),
            });
        }
        self.unformat_message(&items)
    }

    /// Post every entry of `data["_source"]`, returning how many were posted.
    ///
    /// Entries are json objects, or strings holding a json object.
    pub async fn upload_table(&self, data: &Value, timestamp: Option<&str>) -> Result<usize> {
        let source = data
            .get("_source")
            .and_then(Value::as_array)
            .ok_or_else(|| DynamoError::invalid("upload data requires a `_source` array"))?;

        let mut counter = 0;
        for entry in source {
            let message = match entry {
                Value::Object(message) => message.clone(),
                Value::String(s) => match serde_json::from_str::<Value>(s) {
                    Ok(Value::Object(message)) => message,
                    _ => {
                        return Err(DynamoError::invalid(format!(
                            "entry {} is not a json object",
                            counter
                        )))
                    }
                },
                _ => {
                    return Err(DynamoError::invalid(format!(
                        "entry {} is not a json object",
                        counter
                    )))
                }
            };
            self.post_message(&message, timestamp, true).await?;
            counter += 1;
        }

        info!(table_name=%self.table_name, counter, "{} items uploaded", counter);
        Ok(counter)
    }

    /// Delete every item of the table, returning how many were deleted.
    pub async fn truncate_table(&self) -> Result<usize> {
        let description = self
            .backend
            .describe_table(&self.table_name)
            .await
            .map_err(|err| self.failed(err, &self.table_name))?;

        let mut request = ScanRequest::new(&*self.table_name);
        request.projection = description.key_attributes();
        let keys = scan_all(self.backend.as_ref(), request)
            .await
            .map_err(|err| self.failed(err, &self.table_name))?;

        let mut deleted = 0;
        for chunk in keys.chunks(MAX_BATCH_WRITE_ITEMS) {
            let unprocessed = self
                .backend
                .batch_delete(&self.table_name, chunk.to_vec())
                .await
                .map_err(|err| self.failed(err, &self.table_name))?;
            if !unprocessed.is_empty() {
                warn!(
                    table_name=%self.table_name,
                    unprocessed = unprocessed.len(),
                    "Some keys were not deleted"
                );
            }
            deleted += chunk.len().saturating_sub(unprocessed.len());
        }

        debug!(table_name=%self.table_name, deleted, "Truncate table");
        Ok(deleted)
    }

    // Validated table name, defaulting to the bound table.
    fn target(&self, table_name: Option<&str>) -> Result<TableName> {
        match table_name {
            Some(table_name) => TableName::new(table_name).map_err(|err| {
                error!(table_name, country=?self.country, %err, "Invalid table name");
                err
            }),
            None => Ok(self.table_name.clone()),
        }
    }

    fn failed(&self, err: DynamoError, resource: &str) -> DynamoError {
        let err = err.classify(resource);
        error!(table_name=%resource, country=?self.country, %err, "Request failed");
        err
    }
}

/// Follow `last_evaluated_key` until the scan is exhausted.
pub(crate) async fn scan_all(backend: &dyn Backend, mut request: ScanRequest) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    loop {
        let page = backend.scan(request.clone()).await?;
        items.extend(page.items);
        match page.last_evaluated_key {
            Some(key) => request.exclusive_start_key = Some(key),
            None => return Ok(items),
        }
    }
}
