use std::sync::Arc;

use crate::backend::{Backend, ScanRequest};
use crate::client::{scan_all, DynamoDb};
use crate::common::{error, info, warn, DynamoError};
use crate::expression::Condition;
use crate::message::Message;
use crate::types::{convert, AttributeValue, Item, TableDescription, TableName};
use crate::Result;

/// Key identifying a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemKey {
    // Value of the partition key, whose name is looked up from the table.
    Partition(String),
    // Every key attribute, as json.
    Attributes(Message),
}

/// Handle for items of any table, storing values with their native types.
#[derive(Clone)]
pub struct Resource {
    country: Option<String>,
    backend: Arc<dyn Backend>,
}

impl Resource {
    pub fn new(backend: Arc<dyn Backend>, country: Option<String>) -> Self {
        Self { country, backend }
    }

    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.backend)
    }

    /// Handle bound to `table_name` sharing this resource's backend.
    pub fn table(&self, table_name: impl Into<String>) -> Result<DynamoDb> {
        DynamoDb::new(table_name, self.country.clone(), self.backend())
    }

    /// Put `message` as is, keeping json types.
    pub async fn post_item(&self, table_name: &str, message: &Message) -> Result<()> {
        let table_name = TableName::new(table_name)?;
        let item = convert::to_item(message);

        self.backend
            .put_item(&table_name, item)
            .await
            .map_err(|err| self.failed(err, &table_name))?;

        info!(
            table_name=%table_name,
            country=?self.country,
            "Message saved successfully on table {}",
            table_name
        );
        Ok(())
    }

    /// Fetch a single item. `None` when no item has the key.
    pub async fn get_item(&self, table_name: &str, key: ItemKey) -> Result<Option<Message>> {
        let table_name = TableName::new(table_name)?;

        let key: Item = match key {
            ItemKey::Partition(value) => {
                let description = self.describe(&table_name).await?;
                let partition_key = partition_key_of(&description)?;
                [(partition_key.to_owned(), AttributeValue::S(value))]
                    .into_iter()
                    .collect()
            }
            ItemKey::Attributes(attributes) => convert::to_item(&attributes),
        };

        let item = self
            .backend
            .get_item(&table_name, key.clone())
            .await
            .map_err(|err| self.failed(err, &table_name))?;

        match item {
            Some(item) => Ok(Some(convert::item_to_json(&item)?)),
            None => {
                warn!(table_name=%table_name, ?key, "Item not found");
                Ok(None)
            }
        }
    }

    /// Values of `attr_name` for every item, paired with the partition key.
    ///
    /// `filters` restricts the scan to items whose attributes equal the given
    /// values.
    pub async fn get_column(
        &self,
        table_name: &str,
        attr_name: &str,
        filters: Option<&Message>,
    ) -> Result<Vec<Message>> {
        let table_name = TableName::new(table_name)?;
        let description = self.describe(&table_name).await?;
        let partition_key = partition_key_of(&description)?;

        let mut request = ScanRequest::new(&*table_name);
        request.projection = vec![partition_key.to_owned()];
        if attr_name != partition_key {
            request.projection.push(attr_name.to_owned());
        }
        if let Some(filters) = filters {
            request.filter = filters
                .iter()
                .map(|(k, v)| Condition::eq(k.as_str(), convert::to_attribute(v)))
                .collect();
        }

        let items = scan_all(self.backend.as_ref(), request)
            .await
            .map_err(|err| self.failed(err, &table_name))?;

        let lens = items.iter().map(|item| item.len()).collect::<Vec<_>>();
        match (lens.iter().min(), lens.iter().max()) {
            (None, _) | (_, None) => {
                return Err(DynamoError::MissingAttribute {
                    description: format!(
                        "{} contains no items that match these criteria",
                        table_name
                    ),
                })
            }
            (_, Some(1)) if attr_name != partition_key => {
                return Err(DynamoError::MissingAttribute {
                    description: format!("{} object has no attribute '{}'", table_name, attr_name),
                })
            }
            (Some(1), _) if attr_name != partition_key => {
                warn!(
                    table_name=%table_name,
                    attr_name,
                    "Some items are missing the '{}' attribute",
                    attr_name
                );
            }
            _ => {}
        }

        items
            .iter()
            .map(|item| convert::item_to_json(item).map_err(DynamoError::from))
            .collect()
    }

    async fn describe(&self, table_name: &TableName) -> Result<TableDescription> {
        self.backend
            .describe_table(table_name)
            .await
            .map_err(|err| self.failed(err, table_name))
    }

    fn failed(&self, err: DynamoError, resource: &str) -> DynamoError {
        let err = err.classify(resource);
        error!(table=%resource, country=?self.country, %err, "Request failed");
        err
    }
}

fn partition_key_of(description: &TableDescription) -> Result<&str> {
    description.partition_key().ok_or_else(|| {
        DynamoError::Internal(format!("table {} has no partition key", description.name))
    })
}

impl<'a> From<&'a str> for ItemKey {
    fn from(value: &'a str) -> Self {
        ItemKey::Partition(value.to_owned())
    }
}
