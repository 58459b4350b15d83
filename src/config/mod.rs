mod initialize;
pub use initialize::Initializer;

mod config;
pub use config::{ClientConfig, Config, TableConfig};

pub mod env {
    pub const LOG_DIRECTIVE: &str = "DYNAWRAP_LOG";
    pub const CONFIG_PATH: &str = "DYNAWRAP_CONFIG";
    pub const ENVIRONMENT: &str = "DYNAWRAP_ENVIRONMENT";
    pub const TABLE: &str = "DYNAWRAP_TABLE";
    pub const COUNTRY: &str = "DYNAWRAP_COUNTRY";
    pub const ENDPOINT_URL: &str = "DYNAWRAP_ENDPOINT_URL";
    pub const REGION: &str = "AWS_REGION";
    pub const PROFILE: &str = "AWS_PROFILE";
}
