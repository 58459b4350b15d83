use std::path::Path;
use std::sync::Arc;

use tokio::fs;

use crate::backend::{AwsBackend, Backend, Logger};
use crate::client::{DynamoDb, Resource};
use crate::common::{self, info, ErrorKind};
use crate::config::Config;
use crate::Result;

#[derive(Debug)]
pub struct Initializer {
    pub config: Config,
}

impl Initializer {
    pub async fn load_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let f = fs::File::open(path).await?;
        let config = parse(f.into_std().await)?;

        Ok(Self { config })
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build the service backend described by the client configuration.
    pub async fn backend(&self) -> Arc<dyn Backend> {
        info!(
            environment = self.config.environment(),
            region = self.config.client.region(),
            "Connecting to dynamodb"
        );
        let backend = AwsBackend::from_config(&self.config.client).await;
        Arc::new(Logger::new(backend))
    }

    pub fn resource(&self, backend: Arc<dyn Backend>) -> Resource {
        Resource::new(backend, self.config.table.country().map(str::to_owned))
    }

    /// Table handle for the configured table.
    pub fn dynamo(&self, backend: Arc<dyn Backend>) -> Result<DynamoDb> {
        let table_name = self.table_name()?;
        self.resource(backend).table(table_name)
    }

    pub fn table_name(&self) -> Result<&str> {
        self.config.table.name().ok_or_else(|| {
            common::Error::from(ErrorKind::Config {
                description: "table name is not configured".to_owned(),
            })
            .into()
        })
    }
}

fn parse(reader: impl std::io::Read) -> common::Result<Config> {
    Ok(serde_yaml::from_reader::<_, Config>(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use crate::DynamoError;

    #[test]
    fn load_file() {
        tokio_test::block_on(async move {
            let mut f = tempfile::NamedTempFile::new().unwrap();
            writeln!(
                f,
                "client:\n  region: sa-east-1\ntable:\n  name: messages_staging\n  country: newhaven"
            )
            .unwrap();

            let initializer = Initializer::load_config_file(f.path()).await.unwrap();
            assert_eq!(initializer.config.client.region(), "sa-east-1");
            assert_eq!(initializer.table_name().unwrap(), "messages_staging");
        })
    }

    #[test]
    fn invalid_file() {
        tokio_test::block_on(async move {
            let mut f = tempfile::NamedTempFile::new().unwrap();
            writeln!(f, "client: [unclosed").unwrap();

            let err = Initializer::load_config_file(f.path()).await.unwrap_err();
            assert!(matches!(err, DynamoError::Config { .. }));

            let err = Initializer::load_config_file("/nonexistent/dynawrap.yaml")
                .await
                .unwrap_err();
            assert!(matches!(err, DynamoError::Io(_)));
        })
    }

    #[test]
    fn table_name_required() {
        let initializer = Initializer::from_config(Config::default());
        assert!(matches!(
            initializer.table_name(),
            Err(DynamoError::Config { .. })
        ));
    }
}
