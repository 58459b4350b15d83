use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::backend::Backend;
use crate::cli::{item, message, table};
use crate::client::{DynamoDb, Resource};
use crate::common::debug;
use crate::config::{Config, Initializer};
use crate::Result;

/// Dynawrap command
#[derive(Parser, Debug)]
#[command(version, propagate_version = true, subcommand_required = true)]
pub struct DynawrapCommand {
    /// Connection options
    #[command(flatten)]
    pub options: GlobalOptions,
    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Connection options
#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Configuration file path
    #[arg(long, short = 'C', env = crate::config::env::CONFIG_PATH, global = true)]
    pub config: Option<PathBuf>,
    /// Table to operate on
    #[arg(long, env = crate::config::env::TABLE, global = true)]
    pub table: Option<String>,
    /// Restrict searches to this country
    #[arg(long, env = crate::config::env::COUNTRY, global = true)]
    pub country: Option<String>,
    /// Region where the table is located
    #[arg(long, env = crate::config::env::REGION, global = true)]
    pub region: Option<String>,
    /// Custom service endpoint(e.g. http://localhost:8000)
    #[arg(long, env = crate::config::env::ENDPOINT_URL, global = true)]
    pub endpoint_url: Option<String>,
    /// Credentials profile
    #[arg(long, env = crate::config::env::PROFILE, global = true)]
    pub profile: Option<String>,
    /// Deployment environment recorded in logs
    #[arg(long, env = crate::config::env::ENVIRONMENT, global = true)]
    pub environment: Option<String>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Post a message
    Post(message::PostCommand),
    /// Print every message of a table
    Scan(message::ScanCommand),
    /// Search messages on a secondary index
    Search(message::SearchCommand),
    /// Upload messages from a json file
    Upload(message::UploadCommand),
    /// Print the item count of a table
    Count(table::CountCommand),
    /// Count items on a secondary index
    ColumnCount(table::ColumnCountCommand),
    /// Print the key schema of a table
    Schema(table::SchemaCommand),
    /// Print the secondary indexes of a table
    Indexes(table::IndexesCommand),
    /// Delete every item of the table
    Truncate(table::TruncateCommand),
    /// Put a json item keeping its types
    PutItem(item::PutItemCommand),
    /// Get a single item by key
    GetItem(item::GetItemCommand),
    /// Print one attribute of every item
    GetColumn(item::GetColumnCommand),
}

impl Command {
    pub async fn run(self, ctx: &Context) -> Result<()> {
        match self {
            Command::Post(cmd) => cmd.run(ctx).await,
            Command::Scan(cmd) => cmd.run(ctx).await,
            Command::Search(cmd) => cmd.run(ctx).await,
            Command::Upload(cmd) => cmd.run(ctx).await,
            Command::Count(cmd) => cmd.run(ctx).await,
            Command::ColumnCount(cmd) => cmd.run(ctx).await,
            Command::Schema(cmd) => cmd.run(ctx).await,
            Command::Indexes(cmd) => cmd.run(ctx).await,
            Command::Truncate(cmd) => cmd.run(ctx).await,
            Command::PutItem(cmd) => cmd.run(ctx).await,
            Command::GetItem(cmd) => cmd.run(ctx).await,
            Command::GetColumn(cmd) => cmd.run(ctx).await,
        }
    }
}

/// Parse command line args
pub fn parse() -> DynawrapCommand {
    DynawrapCommand::parse()
}

/// Resolved configuration and backend shared by subcommands.
pub struct Context {
    initializer: Initializer,
    backend: Arc<dyn Backend>,
}

impl Context {
    /// Merge the configuration file with command line options and connect.
    pub async fn connect(options: GlobalOptions) -> Result<Self> {
        let initializer = Context::initializer(options).await?;
        debug!("{:?}", initializer);

        let backend = initializer.backend().await;
        Ok(Self::new(initializer, backend))
    }

    pub fn new(initializer: Initializer, backend: Arc<dyn Backend>) -> Self {
        Self {
            initializer,
            backend,
        }
    }

    pub fn dynamo(&self) -> Result<DynamoDb> {
        self.initializer.dynamo(Arc::clone(&self.backend))
    }

    pub fn resource(&self) -> Resource {
        self.initializer.resource(Arc::clone(&self.backend))
    }

    pub fn table_name(&self) -> Result<&str> {
        self.initializer.table_name()
    }

    async fn initializer(options: GlobalOptions) -> Result<Initializer> {
        let GlobalOptions {
            config,
            mut table,
            mut country,
            mut region,
            mut endpoint_url,
            mut profile,
            mut environment,
        } = options;

        let mut initializer = match config {
            Some(path) => Initializer::load_config_file(path).await?,
            None => Initializer::from_config(Config::default()),
        };

        let mut flags = {
            let mut config = Config::default();

            config.set_environment(&mut environment);
            config.client.set_region(&mut region);
            config.client.set_endpoint_url(&mut endpoint_url);
            config.client.set_profile(&mut profile);
            config.table.set_name(&mut table);
            config.table.set_country(&mut country);
            config
        };

        initializer.config.override_merge(&mut flags);

        Ok(initializer)
    }
}
