use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::sync::RwLock;

use crate::backend::{Backend, Page, QueryRequest, ScanRequest, Select, MAX_BATCH_WRITE_ITEMS};
use crate::common::{debug, DynamoError};
use crate::error::{ServiceError, RESOURCE_NOT_FOUND, VALIDATION};
use crate::expression::matches_all;
use crate::types::{
    partition_key, AttributeValue, Item, KeySchemaElement, KeyType, SecondaryIndex,
    TableDescription, TableName,
};
use crate::Result;

const RESOURCE_IN_USE: &str = "ResourceInUseException";
// Separates key components inside the primary key string.
const KEY_SEPARATOR: &str = "\u{1f}";

/// Process local tables answering requests the way the service does.
///
/// Items are kept in primary key order and scans/queries are paged with
/// `page_size` items per page.
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, MemoryTable>>,
    page_size: usize,
}

struct MemoryTable {
    key_schema: Vec<KeySchemaElement>,
    indexes: Vec<SecondaryIndex>,
    items: BTreeMap<String, Item>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            page_size: MemoryBackend::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = std::cmp::max(page_size, 1);
        self
    }

    pub async fn create_table(
        &self,
        name: &str,
        key_schema: Vec<KeySchemaElement>,
        indexes: Vec<SecondaryIndex>,
    ) -> Result<()> {
        let name = TableName::new(name)?;
        validate_key_schema(&key_schema)?;
        for index in indexes.iter() {
            validate_key_schema(&index.key_schema)?;
        }

        let mut tables = self.tables.write().await;
        if tables.contains_key(&*name) {
            return Err(ServiceError::new(RESOURCE_IN_USE, format!("Table already exists: {}", name))
                .with_status(400)
                .into());
        }
        debug!(table=%name, "Create table");
        tables.insert(
            name.into_string(),
            MemoryTable {
                key_schema,
                indexes,
                items: BTreeMap::new(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table_name).ok_or_else(not_found)?;

        let primary_key = table.primary_key(&item)?;
        table.validate_index_keys(&item)?;
        table.items.insert(primary_key, item);

        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        let tables = self.tables.read().await;
        let table = tables.get(table_name).ok_or_else(not_found)?;

        let primary_key = table.exact_key(&key)?;
        Ok(table.items.get(&primary_key).cloned())
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page> {
        let tables = self.tables.read().await;
        let table = tables.get(&request.table_name).ok_or_else(not_found)?;

        let candidates = table.items.iter().collect();
        let (evaluated, last_evaluated_key) =
            table.paginate(candidates, request.exclusive_start_key.as_ref(), self.page_size)?;

        let scanned_count = evaluated.len();
        let items = evaluated
            .into_iter()
            .filter(|item| matches_all(&request.filter, item))
            .map(|item| project(item, &request.projection))
            .collect::<Vec<_>>();

        Ok(Page {
            count: items.len(),
            items,
            scanned_count,
            last_evaluated_key,
        })
    }

    async fn query(&self, request: QueryRequest) -> Result<Page> {
        let tables = self.tables.read().await;
        let table = tables.get(&request.table_name).ok_or_else(not_found)?;

        let key_schema = match request.index_name.as_deref() {
            Some(index_name) => {
                &table
                    .indexes
                    .iter()
                    .find(|index| index.name == index_name)
                    .ok_or_else(|| {
                        validation(format!(
                            "The table does not have the specified index: {}",
                            index_name
                        ))
                    })?
                    .key_schema
            }
            None => &table.key_schema,
        };

        let hash_key = partition_key(key_schema)
            .ok_or_else(|| DynamoError::Internal("key schema without hash key".to_owned()))?;
        if request.key_condition.attribute != hash_key {
            return Err(validation(format!(
                "Query condition missed key schema element: {}",
                hash_key
            )));
        }
        key_component(hash_key, &request.key_condition.value)?;

        let candidates = table
            .items
            .iter()
            .filter(|(_, item)| request.key_condition.matches(item))
            .collect();
        let (evaluated, last_evaluated_key) =
            table.paginate(candidates, request.exclusive_start_key.as_ref(), self.page_size)?;

        let scanned_count = evaluated.len();
        let matched = evaluated
            .into_iter()
            .filter(|item| matches_all(&request.filter, item))
            .collect::<Vec<_>>();
        let count = matched.len();

        let items = match request.select {
            Select::Count => Vec::new(),
            Select::AllAttributes => matched.into_iter().cloned().collect(),
        };

        Ok(Page {
            items,
            count,
            scanned_count,
            last_evaluated_key,
        })
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let tables = self.tables.read().await;
        let table = tables.get(table_name).ok_or_else(not_found)?;

        Ok(TableDescription {
            name: table_name.to_owned(),
            item_count: table.items.len() as i64,
            key_schema: table.key_schema.clone(),
            global_secondary_indexes: table.indexes.clone(),
        })
    }

    async fn batch_delete(&self, table_name: &str, keys: Vec<Item>) -> Result<Vec<Item>> {
        if keys.is_empty() || keys.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(validation(format!(
                "Too many items requested for the BatchWriteItem call. requested: {} max: {}",
                keys.len(),
                MAX_BATCH_WRITE_ITEMS
            )));
        }

        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table_name).ok_or_else(not_found)?;

        // Validate the whole batch before mutating anything.
        let primary_keys = keys
            .iter()
            .map(|key| table.exact_key(key))
            .collect::<Result<Vec<_>>>()?;
        for primary_key in primary_keys {
            table.items.remove(&primary_key);
        }

        Ok(Vec::new())
    }
}

impl MemoryTable {
    fn primary_key(&self, item: &Item) -> Result<String> {
        let mut parts = Vec::with_capacity(self.key_schema.len());
        for element in self.key_schema.iter() {
            let value = item.get(&element.attribute_name).ok_or_else(|| {
                validation(format!(
                    "One or more parameter values were invalid: Missing the key {} in the item",
                    element.attribute_name
                ))
            })?;
            parts.push(key_component(&element.attribute_name, value)?);
        }
        Ok(parts.join(KEY_SEPARATOR))
    }

    // Key given to get/delete must consist of exactly the key attributes.
    fn exact_key(&self, key: &Item) -> Result<String> {
        if key.len() != self.key_schema.len() {
            return Err(validation(
                "The provided key element does not match the schema",
            ));
        }
        self.primary_key(key)
    }

    fn validate_index_keys(&self, item: &Item) -> Result<()> {
        for index in self.indexes.iter() {
            for element in index.key_schema.iter() {
                if let Some(value) = item.get(&element.attribute_name) {
                    key_component(&element.attribute_name, value).map_err(|_| {
                        validation(format!(
                            "One or more parameter values are not valid. A value specified for a secondary index key is not supported. IndexName: {}, IndexKey: {}",
                            index.name, element.attribute_name
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }

    fn key_of(&self, item: &Item) -> Item {
        self.key_schema
            .iter()
            .filter_map(|element| {
                item.get(&element.attribute_name)
                    .map(|value| (element.attribute_name.clone(), value.clone()))
            })
            .collect()
    }

    // Candidates must be in primary key order.
    fn paginate<'a>(
        &self,
        candidates: Vec<(&'a String, &'a Item)>,
        exclusive_start_key: Option<&Item>,
        limit: usize,
    ) -> Result<(Vec<&'a Item>, Option<Item>)> {
        let start = match exclusive_start_key {
            Some(key) => Some(self.primary_key(key)?),
            None => None,
        };

        let remaining = candidates
            .into_iter()
            .filter(|(primary_key, _)| match &start {
                Some(start) => primary_key.as_str() > start.as_str(),
                None => true,
            })
            .collect::<Vec<_>>();

        let more = remaining.len() > limit;
        let page = remaining
            .into_iter()
            .take(limit)
            .map(|(_, item)| item)
            .collect::<Vec<_>>();

        let last_evaluated_key = if more {
            page.last().map(|item| self.key_of(item))
        } else {
            None
        };

        Ok((page, last_evaluated_key))
    }
}

fn validate_key_schema(key_schema: &[KeySchemaElement]) -> Result<()> {
    let hash_keys = key_schema
        .iter()
        .filter(|element| element.key_type == KeyType::Hash)
        .count();
    if hash_keys != 1 || key_schema.len() > 2 {
        return Err(validation(
            "Invalid KeySchema: exactly one HASH key and at most one RANGE key are required",
        ));
    }
    Ok(())
}

fn key_component(name: &str, value: &AttributeValue) -> Result<String> {
    let empty = || {
        validation(format!(
            "One or more parameter values are not valid. The AttributeValue for a key attribute cannot contain an empty string value. Key: {}",
            name
        ))
    };
    match value {
        AttributeValue::S(s) | AttributeValue::N(s) if s.is_empty() => Err(empty()),
        AttributeValue::B(b) if b.is_empty() => Err(empty()),
        AttributeValue::S(s) => Ok(format!("S{}", s)),
        AttributeValue::N(n) => Ok(format!("N{}", n)),
        AttributeValue::B(b) => Ok(format!("B{}", STANDARD.encode(b))),
        other => Err(validation(format!(
            "One or more parameter values were invalid: Type mismatch for key {} expected: S actual: {}",
            name,
            other.type_descriptor()
        ))),
    }
}

fn project(item: &Item, projection: &[String]) -> Item {
    if projection.is_empty() {
        return item.clone();
    }
    item.iter()
        .filter(|(name, _)| projection.contains(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

fn validation(message: impl Into<String>) -> DynamoError {
    ServiceError::new(VALIDATION, message).with_status(400).into()
}

fn not_found() -> DynamoError {
    ServiceError::new(RESOURCE_NOT_FOUND, "Requested resource not found")
        .with_status(400)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Condition;

    fn item(id: &str, country: &str) -> Item {
        [
            ("id".to_owned(), AttributeValue::from(id)),
            ("country".to_owned(), AttributeValue::from(country)),
        ]
        .into_iter()
        .collect()
    }

    async fn backend(page_size: usize) -> MemoryBackend {
        let backend = MemoryBackend::new().with_page_size(page_size);
        backend
            .create_table(
                "schools",
                vec![KeySchemaElement::hash("id")],
                vec![SecondaryIndex::new(
                    "country-index",
                    vec![KeySchemaElement::hash("country")],
                )],
            )
            .await
            .unwrap();
        backend
    }

    #[test]
    fn scan_pages() {
        tokio_test::block_on(async move {
            let backend = backend(2).await;
            for i in 0..5 {
                backend
                    .put_item("schools", item(&i.to_string(), "chile"))
                    .await
                    .unwrap();
            }

            let mut request = ScanRequest::new("schools");
            let mut seen = 0;
            let mut pages = 0;
            loop {
                let page = backend.scan(request.clone()).await.unwrap();
                seen += page.items.len();
                pages += 1;
                match page.last_evaluated_key {
                    Some(key) => request.exclusive_start_key = Some(key),
                    None => break,
                }
            }
            assert_eq!(seen, 5);
            assert_eq!(pages, 3);
        })
    }

    #[test]
    fn scan_filter_and_projection() {
        tokio_test::block_on(async move {
            let backend = backend(10).await;
            backend.put_item("schools", item("1", "chile")).await.unwrap();
            backend.put_item("schools", item("2", "peru")).await.unwrap();

            let mut request = ScanRequest::new("schools");
            request.filter = vec![Condition::eq("country", "peru")];
            request.projection = vec!["id".to_owned()];

            let page = backend.scan(request).await.unwrap();
            assert_eq!(page.scanned_count, 2);
            assert_eq!(page.count, 1);
            assert_eq!(page.items[0].len(), 1);
            assert_eq!(page.items[0]["id"], AttributeValue::from("2"));
        })
    }

    #[test]
    fn query_index() {
        tokio_test::block_on(async move {
            let backend = backend(10).await;
            backend.put_item("schools", item("1", "chile")).await.unwrap();
            backend.put_item("schools", item("2", "chile")).await.unwrap();
            backend.put_item("schools", item("3", "peru")).await.unwrap();

            let mut request = QueryRequest::new("schools", Condition::eq("country", "chile"));
            request.index_name = Some("country-index".to_owned());
            let page = backend.query(request.clone()).await.unwrap();
            assert_eq!(page.count, 2);

            request.select = Select::Count;
            let page = backend.query(request.clone()).await.unwrap();
            assert!(page.items.is_empty());
            assert_eq!(page.scanned_count, 2);

            request.index_name = Some("missing-index".to_owned());
            let err = backend.query(request.clone()).await.unwrap_err();
            assert_eq!(err.code(), Some(VALIDATION));

            request.index_name = Some("country-index".to_owned());
            request.key_condition = Condition::eq("country", "");
            let err = backend.query(request).await.unwrap_err();
            assert_eq!(err.code(), Some(VALIDATION));
        })
    }

    #[test]
    fn put_validation() {
        tokio_test::block_on(async move {
            let backend = backend(10).await;

            let err = backend.put_item("missing", item("1", "x")).await.unwrap_err();
            assert_eq!(err.code(), Some(RESOURCE_NOT_FOUND));

            let mut no_key = item("1", "chile");
            no_key.remove("id");
            let err = backend.put_item("schools", no_key).await.unwrap_err();
            assert_eq!(err.code(), Some(VALIDATION));

            let err = backend.put_item("schools", item("1", "")).await.unwrap_err();
            assert_eq!(err.code(), Some(VALIDATION));
        })
    }

    #[test]
    fn batch_delete_limits() {
        tokio_test::block_on(async move {
            let backend = backend(10).await;
            backend.put_item("schools", item("1", "chile")).await.unwrap();

            let key: Item = [("id".to_owned(), AttributeValue::from("1"))]
                .into_iter()
                .collect();
            let too_many = vec![key.clone(); MAX_BATCH_WRITE_ITEMS + 1];
            assert!(backend.batch_delete("schools", too_many).await.is_err());

            let unprocessed = backend.batch_delete("schools", vec![key]).await.unwrap();
            assert!(unprocessed.is_empty());
            assert_eq!(
                backend.describe_table("schools").await.unwrap().item_count,
                0
            );
        })
    }

    #[test]
    fn duplicate_table() {
        tokio_test::block_on(async move {
            let backend = backend(10).await;
            let err = backend
                .create_table("schools", vec![KeySchemaElement::hash("id")], vec![])
                .await
                .unwrap_err();
            assert_eq!(err.code(), Some(RESOURCE_IN_USE));
        })
    }
}
