//! Condition and projection expressions.
//!
//! Attribute names and values are always sent through placeholders so that
//! reserved words such as `timestamp` can be used as attribute names.

use std::collections::HashMap;

use crate::types::{AttributeValue, Item};

/// Equality condition on a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub value: AttributeValue,
}

impl Condition {
    pub fn eq(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.attribute)
            .map(|v| v == &self.value)
            .unwrap_or(false)
    }
}

/// True when every condition holds.
pub fn matches_all(conditions: &[Condition], item: &Item) -> bool {
    conditions.iter().all(|c| c.matches(item))
}

/// Placeholder tables accumulated while rendering expressions of one request.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    names: HashMap<String, String>,
    values: HashMap<String, AttributeValue>,
    // attribute name to its placeholder.
    name_placeholders: HashMap<String, String>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, attribute: &str) -> String {
        if let Some(placeholder) = self.name_placeholders.get(attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.name_placeholders.len());
        self.name_placeholders
            .insert(attribute.to_owned(), placeholder.clone());
        self.names.insert(placeholder.clone(), attribute.to_owned());
        placeholder
    }

    pub fn value(&mut self, value: &AttributeValue) -> String {
        let placeholder = format!(":v{}", self.values.len());
        self.values.insert(placeholder.clone(), value.clone());
        placeholder
    }

    /// Render `a = b AND c = d`. `None` when there is nothing to render.
    pub fn conditions(&mut self, conditions: &[Condition]) -> Option<String> {
        if conditions.is_empty() {
            return None;
        }
        let rendered = conditions
            .iter()
            .map(|c| {
                let name = self.name(&c.attribute);
                let value = self.value(&c.value);
                format!("{} = {}", name, value)
            })
            .collect::<Vec<_>>();
        Some(rendered.join(" AND "))
    }

    pub fn projection(&mut self, attributes: &[String]) -> Option<String> {
        if attributes.is_empty() {
            return None;
        }
        let rendered = attributes
            .iter()
            .map(|a| self.name(a))
            .collect::<Vec<_>>();
        Some(rendered.join(", "))
    }

    /// Placeholder tables, `None` when empty since the service rejects empty maps.
    pub fn finish(
        self,
    ) -> (
        Option<HashMap<String, String>>,
        Option<HashMap<String, AttributeValue>>,
    ) {
        let names = if self.names.is_empty() {
            None
        } else {
            Some(self.names)
        };
        let values = if self.values.is_empty() {
            None
        } else {
            Some(self.values)
        };
        (names, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_conditions_and_projection() {
        let mut builder = ExpressionBuilder::new();

        let projection = builder
            .projection(&["school_id".to_owned(), "timestamp".to_owned()])
            .unwrap();
        let filter = builder
            .conditions(&[
                Condition::eq("country", "chile"),
                Condition::eq("timestamp", "today"),
            ])
            .unwrap();

        assert_eq!(projection, "#n0, #n1");
        assert_eq!(filter, "#n2 = :v0 AND #n1 = :v1");

        let (names, values) = builder.finish();
        let names = names.unwrap();
        let values = values.unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names["#n1"], "timestamp");
        assert_eq!(values[":v0"], AttributeValue::S("chile".into()));
    }

    #[test]
    fn empty_builder() {
        let mut builder = ExpressionBuilder::new();
        assert_eq!(builder.conditions(&[]), None);
        assert_eq!(builder.projection(&[]), None);
        assert_eq!(builder.finish(), (None, None));
    }

    #[test]
    fn condition_matches() {
        let item: Item = [("country".to_owned(), AttributeValue::from("chile"))]
            .into_iter()
            .collect();
        assert!(Condition::eq("country", "chile").matches(&item));
        assert!(!Condition::eq("country", "peru").matches(&item));
        assert!(!Condition::eq("missing", "chile").matches(&item));
        assert!(matches_all(&[], &item));
    }
}
