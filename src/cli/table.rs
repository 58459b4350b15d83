use clap::{ArgAction, Args};
use serde_json::json;

use crate::cli::{print_json, Context};
use crate::{DynamoError, Result};

/// Print the item count of a table
#[derive(Args, Debug)]
pub struct CountCommand {
    /// Table to describe instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl CountCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let count = ctx
            .dynamo()?
            .get_index_count(self.table_name.as_deref())
            .await?;
        print_json(&json!({ "item_count": count }))
    }
}

/// Count items whose index attribute equals a value
#[derive(Args, Debug)]
pub struct ColumnCountCommand {
    /// Index attribute
    #[arg()]
    index: String,
    /// Value to count
    #[arg()]
    value: String,
}

impl ColumnCountCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let count = ctx
            .dynamo()?
            .get_column_count(&self.index, &self.value)
            .await?;
        print_json(&json!({ "count": count }))
    }
}

/// Print the key schema of a table
#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Table to describe instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl SchemaCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let schema = ctx
            .dynamo()?
            .get_index_key_schema(self.table_name.as_deref())
            .await?;
        print_json(&schema)
    }
}

/// Print the secondary indexes of a table
#[derive(Args, Debug)]
pub struct IndexesCommand {
    /// Table to describe instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl IndexesCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let indexes = ctx
            .dynamo()?
            .get_index_secondary_indexes(self.table_name.as_deref())
            .await?;
        print_json(&indexes)
    }
}

/// Delete every item of the configured table
#[derive(Args, Debug)]
pub struct TruncateCommand {
    /// Confirm deletion
    #[arg(long, action = ArgAction::SetTrue)]
    yes: bool,
}

impl TruncateCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let dynamo = ctx.dynamo()?;
        if !self.yes {
            return Err(DynamoError::invalid(format!(
                "pass --yes to delete every item of {}",
                dynamo
            )));
        }

        let deleted = dynamo.truncate_table().await?;
        print_json(&json!({ "deleted": deleted }))
    }
}
