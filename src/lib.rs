#![allow(clippy::module_inception)]

pub mod backend;
#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod expression;
pub mod message;
pub mod types;

pub use crate::error::DynamoError;
pub type Result<T, E = crate::error::DynamoError> = std::result::Result<T, E>;

pub use client::{DynamoDb, ItemKey, Resource};
pub use types::{AttributeValue, Item, TableName};

pub(crate) mod common {
    pub(crate) type Result<T, E = crate::error::internal::Error> = std::result::Result<T, E>;

    pub(crate) type Error = crate::error::internal::Error;
    pub(crate) type ErrorKind = crate::error::internal::ErrorKind;

    pub use crate::error::DynamoError;

    pub(crate) type Time = chrono::DateTime<chrono::Local>;

    pub use tracing::{debug, error, info, trace, warn};
}
