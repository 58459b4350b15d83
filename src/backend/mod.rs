//! Request primitives the wrapper needs from the storage service.

use async_trait::async_trait;

use crate::expression::Condition;
use crate::types::{Item, TableDescription};
use crate::Result;

mod aws;
pub use self::aws::AwsBackend;

mod memory;
pub use self::memory::MemoryBackend;

mod logger;
pub use self::logger::Logger;

/// Maximum number of write requests accepted by a single batch write.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Select {
    #[default]
    AllAttributes,
    Count,
}

#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub table_name: String,
    // Empty means every attribute.
    pub projection: Vec<String>,
    pub filter: Vec<Condition>,
    pub exclusive_start_key: Option<Item>,
}

impl ScanRequest {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub table_name: String,
    // Query the base table when None.
    pub index_name: Option<String>,
    pub key_condition: Condition,
    pub filter: Vec<Condition>,
    pub select: Select,
    pub exclusive_start_key: Option<Item>,
}

impl QueryRequest {
    pub fn new(table_name: impl Into<String>, key_condition: Condition) -> Self {
        Self {
            table_name: table_name.into(),
            index_name: None,
            key_condition,
            filter: Vec::new(),
            select: Select::default(),
            exclusive_start_key: None,
        }
    }
}

/// One page of a scan or query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    // Items returned after filtering.
    pub count: usize,
    // Items evaluated before filtering.
    pub scanned_count: usize,
    pub last_evaluated_key: Option<Item>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn put_item(&self, table_name: &str, item: Item) -> Result<()>;
    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>>;
    async fn scan(&self, request: ScanRequest) -> Result<Page>;
    async fn query(&self, request: QueryRequest) -> Result<Page>;
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;
    // Return keys the service did not process.
    async fn batch_delete(&self, table_name: &str, keys: Vec<Item>) -> Result<Vec<Item>>;
}
