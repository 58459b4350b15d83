use clap::Args;
use serde_json::{Map, Value};

use crate::cli::{parse_object, print_json, Context};
use crate::client::ItemKey;
use crate::{DynamoError, Result};

/// Put a json item keeping its types
#[derive(Args, Debug)]
pub struct PutItemCommand {
    /// Item as a json object
    #[arg()]
    item: String,
    /// Table to write instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl PutItemCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let item = parse_object(&self.item)?;
        let table_name = match self.table_name.as_deref() {
            Some(table_name) => table_name,
            None => ctx.table_name()?,
        };

        ctx.resource().post_item(table_name, &item).await?;
        print_json(&Value::Bool(true))
    }
}

/// Get a single item by key
#[derive(Args, Debug)]
pub struct GetItemCommand {
    /// Partition key value
    #[arg(required_unless_present = "key_json")]
    value: Option<String>,
    /// Every key attribute as a json object
    #[arg(long, conflicts_with = "value")]
    key_json: Option<String>,
    /// Table to read instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl GetItemCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let GetItemCommand {
            value,
            key_json,
            table_name,
        } = self;

        let key = match (value, key_json) {
            (_, Some(key_json)) => ItemKey::Attributes(parse_object(&key_json)?),
            (Some(value), None) => ItemKey::Partition(value),
            (None, None) => return Err(DynamoError::invalid("a key is required")),
        };
        let table_name = match table_name.as_deref() {
            Some(table_name) => table_name,
            None => ctx.table_name()?,
        };

        match ctx.resource().get_item(table_name, key).await? {
            Some(item) => print_json(&item),
            None => Err(DynamoError::NotFound {
                resource: format!("item on {}", table_name),
            }),
        }
    }
}

/// Print one attribute of every item
#[derive(Args, Debug)]
pub struct GetColumnCommand {
    /// Attribute to project
    #[arg()]
    attribute: String,
    /// Only items whose attribute equals the value(e.g. country=chile)
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    /// Table to scan instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl GetColumnCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let GetColumnCommand {
            attribute,
            filters,
            table_name,
        } = self;

        let filters = filters
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>();
        let table_name = match table_name.as_deref() {
            Some(table_name) => table_name,
            None => ctx.table_name()?,
        };

        let column = ctx
            .resource()
            .get_column(
                table_name,
                &attribute,
                if filters.is_empty() {
                    None
                } else {
                    Some(&filters)
                },
            )
            .await?;
        print_json(&column)
    }
}

fn parse_filter(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid filter {:?}, expected KEY=VALUE", s))?;
    if key.is_empty() {
        return Err(format!("invalid filter {:?}, empty key", s));
    }
    Ok((key.to_owned(), value.to_owned()))
}
