pub mod convert;

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::DynamoError;

/// A stored item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

// Table names are restricted by the service to this range.
pub const MIN_TABLE_NAME_BYTES: usize = 3;
pub const MAX_TABLE_NAME_BYTES: usize = 255;

/// A single typed attribute as the service stores it.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    // Numbers travel as decimal text.
    N(String),
    B(Vec<u8>),
    Bool(bool),
    Null(bool),
    M(HashMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Vec<u8>>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Type descriptor used by the service (`S`, `N`, `BOOL`, ...).
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::M(_) => "M",
            AttributeValue::L(_) => "L",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::S(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::S(s)
    }
}

// TableName is a string that satisfies the service naming rules.
// other components can pass it along without validating again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(s: impl Into<String>) -> Result<Self, DynamoError> {
        let s = s.into();
        if s.len() < MIN_TABLE_NAME_BYTES || s.len() > MAX_TABLE_NAME_BYTES {
            return Err(DynamoError::invalid(format!(
                "table name must be between {} and {} characters long. name: {:?}",
                MIN_TABLE_NAME_BYTES, MAX_TABLE_NAME_BYTES, s
            )));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(DynamoError::invalid(format!(
                "table name contains invalid character {:?}. name: {:?}",
                c, s
            )));
        }
        Ok(Self(s))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for TableName {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    #[serde(rename = "HASH")]
    Hash,
    #[serde(rename = "RANGE")]
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    #[serde(rename = "AttributeName")]
    pub attribute_name: String,
    #[serde(rename = "KeyType")]
    pub key_type: KeyType,
}

impl KeySchemaElement {
    pub fn hash(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Hash,
        }
    }

    pub fn range(attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            key_type: KeyType::Range,
        }
    }
}

/// Global secondary index and its key schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: String,
    pub key_schema: Vec<KeySchemaElement>,
}

impl SecondaryIndex {
    pub fn new(name: impl Into<String>, key_schema: Vec<KeySchemaElement>) -> Self {
        Self {
            name: name.into(),
            key_schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDescription {
    pub name: String,
    pub item_count: i64,
    pub key_schema: Vec<KeySchemaElement>,
    pub global_secondary_indexes: Vec<SecondaryIndex>,
}

impl TableDescription {
    /// Name of the HASH key attribute.
    pub fn partition_key(&self) -> Option<&str> {
        partition_key(&self.key_schema)
    }

    pub fn key_attributes(&self) -> Vec<String> {
        self.key_schema
            .iter()
            .map(|element| element.attribute_name.clone())
            .collect()
    }
}

pub(crate) fn partition_key(key_schema: &[KeySchemaElement]) -> Option<&str> {
    key_schema
        .iter()
        .find(|element| element.key_type == KeyType::Hash)
        .map(|element| element.attribute_name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name_rules() {
        assert!(TableName::new("messages_staging").is_ok());
        assert!(TableName::new("a.b-c_1").is_ok());

        assert!(matches!(
            TableName::new(""),
            Err(DynamoError::InvalidParameter { .. })
        ));
        assert!(TableName::new("ab").is_err());
        assert!(TableName::new("x".repeat(MAX_TABLE_NAME_BYTES + 1)).is_err());
        assert!(TableName::new("has space").is_err());
    }

    #[test]
    fn key_schema_serialize() {
        let element = KeySchemaElement::hash("message_id");
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"AttributeName": "message_id", "KeyType": "HASH"})
        );
    }

    #[test]
    fn lookup_partition_key() {
        let description = TableDescription {
            name: "messages".into(),
            item_count: 0,
            key_schema: vec![
                KeySchemaElement::range("timestamp"),
                KeySchemaElement::hash("message_id"),
            ],
            global_secondary_indexes: vec![],
        };
        assert_eq!(description.partition_key(), Some("message_id"));
        assert_eq!(description.key_attributes(), vec!["timestamp", "message_id"]);
    }
}
