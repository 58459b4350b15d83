use std::path::PathBuf;

use clap::{ArgAction, Args};
use serde_json::{json, Value};

use crate::cli::{parse_object, print_json, Context};
use crate::common::debug;
use crate::{DynamoError, Result};

/// Format and post a message to the table
#[derive(Args, Debug)]
pub struct PostCommand {
    /// Message as a json object
    #[arg()]
    message: String,
    /// Timestamp stored with the message, defaults to now
    #[arg(long)]
    timestamp: Option<String>,
    /// Do not add a generated message_id
    #[arg(long, action = ArgAction::SetTrue)]
    no_message_id: bool,
}

impl PostCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let PostCommand {
            message,
            timestamp,
            no_message_id,
        } = self;

        let message = parse_object(&message)?;
        let message_id = ctx
            .dynamo()?
            .post_message(&message, timestamp.as_deref(), !no_message_id)
            .await?;

        print_json(&json!({ "message_id": message_id.to_string() }))
    }
}

/// Print every message of a table
#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Table to scan instead of the configured one
    #[arg(long)]
    table_name: Option<String>,
}

impl ScanCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let messages = ctx
            .dynamo()?
            .get_all_messages_from_index(self.table_name.as_deref())
            .await?;
        print_json(&messages)
    }
}

/// Search messages on a secondary index
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Index attribute, with or without the -index suffix
    #[arg()]
    index: String,
    /// Value to search
    #[arg()]
    value: String,
}

impl SearchCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let messages = ctx.dynamo()?.search_on_index(&self.index, &self.value).await?;
        print_json(&messages)
    }
}

/// Upload messages listed under `_source` in a json file
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// Path to json file
    #[arg()]
    path: PathBuf,
    /// Timestamp stored with every message, defaults to now
    #[arg(long)]
    timestamp: Option<String>,
}

impl UploadCommand {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        let UploadCommand { path, timestamp } = self;

        debug!("Upload {}", path.display());

        let content = tokio::fs::read_to_string(&path).await?;
        let data = serde_json::from_str::<Value>(&content).map_err(|err| {
            DynamoError::invalid(format!("{} is not valid json. {}", path.display(), err))
        })?;

        let uploaded = ctx
            .dynamo()?
            .upload_table(&data, timestamp.as_deref())
            .await?;

        print_json(&json!({ "uploaded": uploaded }))
    }
}
