use serde::Deserialize;

// Top level configuration file.
#[derive(Deserialize, Debug, Default)]
pub struct Config {
    // Deployment environment recorded on log records.
    pub environment: Option<String>,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub table: TableConfig,
}

impl Config {
    const DEFAULT_ENVIRONMENT: &'static str = "LOCAL";

    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .unwrap_or(Config::DEFAULT_ENVIRONMENT)
    }

    pub fn set_environment(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.environment = Some(val)
        }
    }

    pub(crate) fn override_merge(&mut self, other: &mut Config) {
        self.set_environment(&mut other.environment);
        self.client.override_merge(&mut other.client);
        self.table.override_merge(&mut other.table);
    }
}

// Service client configuration.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct ClientConfig {
    // Region where tables are located.
    region: Option<String>,
    // Custom endpoint, e.g. a local emulator.
    endpoint_url: Option<String>,
    // Named credentials profile.
    profile: Option<String>,
}

impl ClientConfig {
    const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn set_region(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.region = Some(val)
        }
    }
    pub fn set_endpoint_url(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.endpoint_url = Some(val)
        }
    }
    pub fn set_profile(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.profile = Some(val)
        }
    }
    pub(crate) fn override_merge(&mut self, other: &mut ClientConfig) {
        self.set_region(&mut other.region);
        self.set_endpoint_url(&mut other.endpoint_url);
        self.set_profile(&mut other.profile);
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(ClientConfig::DEFAULT_REGION)
    }

    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

// Table the wrapper is bound to.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct TableConfig {
    name: Option<String>,
    country: Option<String>,
}

impl TableConfig {
    pub fn set_name(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.name = Some(val)
        }
    }
    pub fn set_country(&mut self, val: &mut Option<String>) {
        if let Some(val) = val.take() {
            self.country = Some(val)
        }
    }
    pub(crate) fn override_merge(&mut self, other: &mut TableConfig) {
        self.set_name(&mut other.name);
        self.set_country(&mut other.country);
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.environment(), "LOCAL");
        assert_eq!(config.client.region(), "us-east-1");
        assert_eq!(config.client.endpoint_url(), None);
        assert_eq!(config.table.name(), None);
    }

    #[test]
    fn deserialize_partial() {
        let config: Config = serde_yaml::from_str(
            r#"
environment: staging
table:
  name: messages_staging
"#,
        )
        .unwrap();
        assert_eq!(config.environment(), "staging");
        assert_eq!(config.table.name(), Some("messages_staging"));
        assert_eq!(config.table.country(), None);
        assert_eq!(config.client.region(), "us-east-1");
    }

    #[test]
    fn override_merge_keeps_unset() {
        let mut config = Config::default();
        config.client.set_region(&mut Some("sa-east-1".to_owned()));
        config.table.set_country(&mut Some("chile".to_owned()));

        let mut flags = Config::default();
        flags.table.set_name(&mut Some("messages".to_owned()));
        flags.client.set_endpoint_url(&mut Some("http://localhost:8000".to_owned()));

        config.override_merge(&mut flags);

        assert_eq!(config.client.region(), "sa-east-1");
        assert_eq!(config.client.endpoint_url(), Some("http://localhost:8000"));
        assert_eq!(config.table.name(), Some("messages"));
        assert_eq!(config.table.country(), Some("chile"));
    }
}
