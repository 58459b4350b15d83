//! Conversion between json values and stored attributes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};

use crate::common::{ErrorKind, Result};
use crate::types::{AttributeValue, Item};

/// Serialize a json value keeping its native type.
pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(to_item(map)),
    }
}

pub fn to_item(map: &Map<String, Value>) -> Item {
    map.iter()
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

/// Deserialize a stored attribute into plain json.
pub(crate) fn to_json(attr: &AttributeValue) -> Result<Value> {
    let value = match attr {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::B(b) => Value::String(STANDARD.encode(b)),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::M(map) => Value::Object(item_to_json(map)?),
        AttributeValue::L(values) => {
            Value::Array(values.iter().map(to_json).collect::<Result<_>>()?)
        }
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::Bs(values) => Value::Array(
            values
                .iter()
                .map(|b| Value::String(STANDARD.encode(b)))
                .collect(),
        ),
    };
    Ok(value)
}

pub(crate) fn item_to_json(item: &Item) -> Result<Map<String, Value>> {
    item.iter()
        .map(|(k, v)| to_json(v).map(|v| (k.clone(), v)))
        .collect()
}

fn parse_number(n: &str) -> Result<Number> {
    let n = n.trim();
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = n.parse::<u64>() {
        return Ok(Number::from(u));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| {
            ErrorKind::Decode {
                description: format!("invalid number {:?}", n),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn native_serialize() {
        let value = json!({
            "name": "school",
            "rank": 3,
            "score": 4.5,
            "active": true,
            "tags": ["a", 1],
            "nested": {"none": null},
        });
        let item = to_item(value.as_object().unwrap());

        assert_eq!(item["name"], AttributeValue::S("school".into()));
        assert_eq!(item["rank"], AttributeValue::N("3".into()));
        assert_eq!(item["score"], AttributeValue::N("4.5".into()));
        assert_eq!(item["active"], AttributeValue::Bool(true));
        assert_eq!(
            item["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("a".into()),
                AttributeValue::N("1".into())
            ])
        );
        match &item["nested"] {
            AttributeValue::M(m) => assert_eq!(m["none"], AttributeValue::Null(true)),
            other => panic!("unexpected {:?}", other),
        }

        let back = item_to_json(&item).unwrap();
        assert_eq!(Value::Object(back), value);
    }

    #[test]
    fn deserialize_sets_and_binary() {
        assert_eq!(
            to_json(&AttributeValue::Ns(vec!["1".into(), "2.5".into()])).unwrap(),
            json!([1, 2.5])
        );
        assert_eq!(
            to_json(&AttributeValue::B(b"hello".to_vec())).unwrap(),
            json!("aGVsbG8=")
        );
        assert_eq!(
            to_json(&AttributeValue::N("18446744073709551615".into())).unwrap(),
            json!(18446744073709551615u64)
        );
    }

    #[test]
    fn invalid_number() {
        let err = to_json(&AttributeValue::N("twelve".into())).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode { .. }));
    }
}
