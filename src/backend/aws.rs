use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::http::HttpResponse;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{
    AttributeValue as AwsValue, DeleteRequest, KeySchemaElement as AwsKeySchemaElement,
    KeyType as AwsKeyType, Select as AwsSelect, WriteRequest,
};
use aws_sdk_dynamodb::Client;

use crate::backend::{Backend, Page, QueryRequest, ScanRequest, Select};
use crate::common::{debug, DynamoError};
use crate::config::ClientConfig;
use crate::error::ServiceError;
use crate::expression::ExpressionBuilder;
use crate::types::{
    AttributeValue, Item, KeySchemaElement, KeyType, SecondaryIndex, TableDescription,
};
use crate::Result;

/// Backend talking to the service through the official sdk.
#[derive(Debug, Clone)]
pub struct AwsBackend {
    client: Client,
}

impl AwsBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve credentials from the environment and build a client for `config`.
    pub async fn from_config(config: &ClientConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region().to_owned()));
        if let Some(endpoint_url) = config.endpoint_url() {
            loader = loader.endpoint_url(endpoint_url);
        }
        if let Some(profile) = config.profile() {
            loader = loader.profile_name(profile);
        }
        debug!(region = config.region(), endpoint_url = ?config.endpoint_url(), "Load sdk config");

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl Backend for AwsBackend {
    async fn put_item(&self, table_name: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(to_aws_item(item)))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn get_item(&self, table_name: &str, key: Item) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table_name)
            .set_key(Some(to_aws_item(key)))
            .send()
            .await
            .map_err(sdk_error)?;

        output.item.map(from_aws_item).transpose()
    }

    async fn scan(&self, request: ScanRequest) -> Result<Page> {
        let ScanRequest {
            table_name,
            projection,
            filter,
            exclusive_start_key,
        } = request;

        let mut expressions = ExpressionBuilder::new();
        let projection = expressions.projection(&projection);
        let filter = expressions.conditions(&filter);
        let (names, values) = expressions.finish();

        let output = self
            .client
            .scan()
            .table_name(table_name)
            .set_projection_expression(projection)
            .set_filter_expression(filter)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values.map(to_aws_item))
            .set_exclusive_start_key(exclusive_start_key.map(to_aws_item))
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(Page {
            items: output
                .items
                .unwrap_or_default()
                .into_iter()
                .map(from_aws_item)
                .collect::<Result<_>>()?,
            count: output.count.max(0) as usize,
            scanned_count: output.scanned_count.max(0) as usize,
            last_evaluated_key: output.last_evaluated_key.map(from_aws_item).transpose()?,
        })
    }

    async fn query(&self, request: QueryRequest) -> Result<Page> {
        let QueryRequest {
            table_name,
            index_name,
            key_condition,
            filter,
            select,
            exclusive_start_key,
        } = request;

        let mut expressions = ExpressionBuilder::new();
        let key_condition = expressions
            .conditions(std::slice::from_ref(&key_condition))
            .unwrap_or_default();
        let filter = expressions.conditions(&filter);
        let (names, values) = expressions.finish();

        let mut builder = self
            .client
            .query()
            .table_name(table_name)
            .set_index_name(index_name)
            .key_condition_expression(key_condition)
            .set_filter_expression(filter)
            .set_expression_attribute_names(names)
            .set_expression_attribute_values(values.map(to_aws_item))
            .set_exclusive_start_key(exclusive_start_key.map(to_aws_item));
        if select == Select::Count {
            builder = builder.select(AwsSelect::Count);
        }

        let output = builder.send().await.map_err(sdk_error)?;

        Ok(Page {
            items: output
                .items
                .unwrap_or_default()
                .into_iter()
                .map(from_aws_item)
                .collect::<Result<_>>()?,
            count: output.count.max(0) as usize,
            scanned_count: output.scanned_count.max(0) as usize,
            last_evaluated_key: output.last_evaluated_key.map(from_aws_item).transpose()?,
        })
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(sdk_error)?;

        let table = output.table.ok_or_else(|| {
            DynamoError::Internal(format!("describe table {} returned no table", table_name))
        })?;

        Ok(TableDescription {
            name: table.table_name.unwrap_or_else(|| table_name.to_owned()),
            item_count: table.item_count.unwrap_or(0),
            key_schema: from_aws_key_schema(table.key_schema.unwrap_or_default()),
            global_secondary_indexes: table
                .global_secondary_indexes
                .unwrap_or_default()
                .into_iter()
                .map(|index| SecondaryIndex {
                    name: index.index_name.unwrap_or_default(),
                    key_schema: from_aws_key_schema(index.key_schema.unwrap_or_default()),
                })
                .collect(),
        })
    }

    async fn batch_delete(&self, table_name: &str, keys: Vec<Item>) -> Result<Vec<Item>> {
        let requests = keys
            .into_iter()
            .map(|key| {
                DeleteRequest::builder()
                    .set_key(Some(to_aws_item(key)))
                    .build()
                    .map(|delete| WriteRequest::builder().delete_request(delete).build())
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| DynamoError::invalid(err.to_string()))?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table_name, requests)
            .send()
            .await
            .map_err(sdk_error)?;

        output
            .unprocessed_items
            .unwrap_or_default()
            .remove(table_name)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|request| request.delete_request)
            .map(|delete| from_aws_item(delete.key))
            .collect()
    }
}

fn sdk_error<E>(err: SdkError<E, HttpResponse>) -> DynamoError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if let SdkError::ConstructionFailure(_) = err {
        return DynamoError::invalid(DisplayErrorContext(&err).to_string());
    }

    match err.code() {
        Some(code) => {
            let mut service = ServiceError::new(code, err.message().unwrap_or_default());
            if let Some(response) = err.raw_response() {
                service = service.with_status(response.status().as_u16());
            }
            DynamoError::Service(service)
        }
        None => DynamoError::Internal(DisplayErrorContext(&err).to_string()),
    }
}

fn to_aws(value: AttributeValue) -> AwsValue {
    match value {
        AttributeValue::S(s) => AwsValue::S(s),
        AttributeValue::N(n) => AwsValue::N(n),
        AttributeValue::B(b) => AwsValue::B(Blob::new(b)),
        AttributeValue::Bool(b) => AwsValue::Bool(b),
        AttributeValue::Null(b) => AwsValue::Null(b),
        AttributeValue::M(m) => AwsValue::M(to_aws_item(m)),
        AttributeValue::L(l) => AwsValue::L(l.into_iter().map(to_aws).collect()),
        AttributeValue::Ss(ss) => AwsValue::Ss(ss),
        AttributeValue::Ns(ns) => AwsValue::Ns(ns),
        AttributeValue::Bs(bs) => AwsValue::Bs(bs.into_iter().map(Blob::new).collect()),
    }
}

fn to_aws_item(item: HashMap<String, AttributeValue>) -> HashMap<String, AwsValue> {
    item.into_iter().map(|(k, v)| (k, to_aws(v))).collect()
}

fn from_aws(value: AwsValue) -> Result<AttributeValue> {
    let value = match value {
        AwsValue::S(s) => AttributeValue::S(s),
        AwsValue::N(n) => AttributeValue::N(n),
        AwsValue::B(b) => AttributeValue::B(b.into_inner()),
        AwsValue::Bool(b) => AttributeValue::Bool(b),
        AwsValue::Null(b) => AttributeValue::Null(b),
        AwsValue::M(m) => AttributeValue::M(from_aws_item(m)?),
        AwsValue::L(l) => AttributeValue::L(l.into_iter().map(from_aws).collect::<Result<_>>()?),
        AwsValue::Ss(ss) => AttributeValue::Ss(ss),
        AwsValue::Ns(ns) => AttributeValue::Ns(ns),
        AwsValue::Bs(bs) => AttributeValue::Bs(bs.into_iter().map(Blob::into_inner).collect()),
        other => {
            return Err(DynamoError::Decode {
                description: format!("unsupported attribute value {:?}", other),
            })
        }
    };
    Ok(value)
}

fn from_aws_item(item: HashMap<String, AwsValue>) -> Result<Item> {
    item.into_iter()
        .map(|(k, v)| from_aws(v).map(|v| (k, v)))
        .collect()
}

fn from_aws_key_schema(key_schema: Vec<AwsKeySchemaElement>) -> Vec<KeySchemaElement> {
    key_schema
        .into_iter()
        .filter_map(|element| {
            let key_type = match element.key_type {
                AwsKeyType::Hash => KeyType::Hash,
                AwsKeyType::Range => KeyType::Range,
                _ => return None,
            };
            Some(KeySchemaElement {
                attribute_name: element.attribute_name,
                key_type,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_conversion() {
        let item: Item = [
            ("id".to_owned(), AttributeValue::from("1")),
            ("n".to_owned(), AttributeValue::N("1.5".into())),
            ("b".to_owned(), AttributeValue::Bs(vec![b"x".to_vec()])),
            (
                "m".to_owned(),
                AttributeValue::M(
                    [("l".to_owned(), AttributeValue::L(vec![AttributeValue::Null(true)]))]
                        .into_iter()
                        .collect(),
                ),
            ),
        ]
        .into_iter()
        .collect();

        let aws = to_aws_item(item.clone());
        assert_eq!(aws["id"], AwsValue::S("1".into()));
        assert_eq!(from_aws_item(aws).unwrap(), item);
    }

    #[test]
    fn key_schema_conversion() {
        let schema = vec![
            AwsKeySchemaElement::builder()
                .attribute_name("message_id")
                .key_type(AwsKeyType::Hash)
                .build()
                .unwrap(),
            AwsKeySchemaElement::builder()
                .attribute_name("timestamp")
                .key_type(AwsKeyType::Range)
                .build()
                .unwrap(),
        ];
        assert_eq!(
            from_aws_key_schema(schema),
            vec![
                KeySchemaElement::hash("message_id"),
                KeySchemaElement::range("timestamp"),
            ]
        );
    }
}
