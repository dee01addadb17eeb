//! Data values that can be bound into a template

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mapping passed to the renderer
pub type TemplateData = BTreeMap<String, TemplateValue>;

/// A renderable value: string, number, boolean or nested mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Map(TemplateData),
}

impl TemplateValue {
    /// Walk a dotted path (`user.name`) into nested mappings.
    pub fn lookup<'a>(data: &'a TemplateData, path: &[&str]) -> Option<&'a TemplateValue> {
        let (first, rest) = path.split_first()?;
        let mut current = data.get(*first)?;
        for segment in rest {
            match current {
                TemplateValue::Map(map) => current = map.get(*segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateValue::Bool(b) => write!(f, "{}", b),
            TemplateValue::Number(n) => write!(f, "{}", n),
            TemplateValue::String(s) => f.write_str(s),
            TemplateValue::Map(map) => {
                f.write_str("map[")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        TemplateValue::String(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        TemplateValue::String(value)
    }
}

impl From<bool> for TemplateValue {
    fn from(value: bool) -> Self {
        TemplateValue::Bool(value)
    }
}

impl From<i64> for TemplateValue {
    fn from(value: i64) -> Self {
        TemplateValue::Number(value.into())
    }
}

impl From<TemplateData> for TemplateValue {
    fn from(value: TemplateData) -> Self {
        TemplateValue::Map(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_closed_kinds() {
        let data: TemplateData = serde_json::from_str(
            r#"{"name": "Ana", "age": 31, "vip": true, "address": {"city": "Antigua"}}"#,
        )
        .unwrap();

        assert_eq!(data["name"], TemplateValue::from("Ana"));
        assert_eq!(data["age"], TemplateValue::from(31));
        assert_eq!(data["vip"], TemplateValue::from(true));
        assert_eq!(
            TemplateValue::lookup(&data, &["address", "city"]),
            Some(&TemplateValue::from("Antigua"))
        );
    }

    #[test]
    fn test_arrays_are_rejected() {
        let result: Result<TemplateData, _> = serde_json::from_str(r#"{"items": [1, 2]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_lookup_through_scalar_fails() {
        let data: TemplateData = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(TemplateValue::lookup(&data, &["name", "first"]), None);
    }
}
