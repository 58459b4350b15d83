use std::future::Future;

use async_trait::async_trait;
use tracing_futures::Instrument;

use crate::backend::{Backend, Page, QueryRequest, ScanRequest};
use crate::common::{debug, warn};
use crate::types::{Item, TableDescription};
use crate::Result;

/// Logs every request issued to the wrapped backend.
pub struct Logger<B> {
    next: B,
}

impl<B> Logger<B> {
    pub fn new(next: B) -> Self {
        Self { next }
    }

    pub fn into_inner(self) -> B {
        self.next
    }
}

async fn logged<T, F>(operation: &'static str, table: &str, request: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let span = tracing::debug_span!("dynamodb", operation, table);
    let start = tokio::time::Instant::now();

    let result = request.instrument(span).await;

    match &result {
        Ok(_) => debug!(operation, table, elapsed=?start.elapsed(), "Request done"),
        Err(err) => warn!(operation, table, elapsed=?start.elapsed(), %err, "Request failed"),
    }

    result
}

#[async_trait]
impl<B> Backend for Logger<B>
where
    B: Backend,
{
    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        logged("PutItem", table_name, self.next.put_item(table_name, item)).await
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        logged("GetItem", table_name, self.next.get_item(table_name, key)).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page> {
        let table = request.table_name.clone();
        logged("Scan", &table, self.next.scan(request)).await
    }

    async fn query(&self, request: QueryRequest) -> Result<Page> {
        let table = request.table_name.clone();
        logged("Query", &table, self.next.query(request)).await
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        logged("DescribeTable", table_name, self.next.describe_table(table_name)).await
    }

    async fn batch_delete(&self, table_name: &str, keys: Vec<Item>) -> Result<Vec<Item>> {
        logged(
            "BatchWriteItem",
            table_name,
            self.next.batch_delete(table_name, keys),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::types::{AttributeValue, KeySchemaElement};

    #[test]
    fn delegates_to_next() {
        tokio_test::block_on(async move {
            let memory = MemoryBackend::new();
            memory
                .create_table("logged", vec![KeySchemaElement::hash("id")], vec![])
                .await
                .unwrap();
            let backend = Logger::new(memory);

            let item: Item = [("id".to_owned(), AttributeValue::from("1"))]
                .into_iter()
                .collect();
            backend.put_item("logged", item.clone()).await.unwrap();

            let got = backend.get_item("logged", item.clone()).await.unwrap();
            assert_eq!(got, Some(item));

            let err = backend.describe_table("unknown").await.unwrap_err();
            assert_eq!(err.code(), Some(crate::error::RESOURCE_NOT_FOUND));
        })
    }
}
