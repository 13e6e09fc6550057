//! Node metadata
//!
//! spec.md's Design Notes reject a duck-typed `HashMap<String, Value>` for
//! node metadata in favor of a closed, tagged-variant map: unknown
//! languages extend the enum rather than stuffing arbitrary JSON into it.
//! The one place richer structure is still needed — annotations/decorators
//! — is flattened to JSON-encoded strings at this boundary, because the
//! target graph store cannot persist nested maps (spec.md §6, §9).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single metadata value. Closed set by design — see module docs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Bool(bool),
    Int(i64),
    Str(String),
    StrList(Vec<String>),
}

impl Attribute {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Attribute::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Attribute::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Attribute::StrList(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for Attribute {
    fn from(b: bool) -> Self {
        Attribute::Bool(b)
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::Str(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Str(s)
    }
}

impl From<Vec<String>> for Attribute {
    fn from(v: Vec<String>) -> Self {
        Attribute::StrList(v)
    }
}

/// Closed-set key/value metadata map attached to a `Node`.
///
/// Keys are free-form (each language plugin picks from the set spec.md §3
/// names: `annotations`, `is_constructor`, `extends`, `importPath`, ...) but
/// values are always one of the four `Attribute` variants.
pub type Metadata = BTreeMap<String, Attribute>;

/// One parsed annotation/decorator, as recorded in `metadata.annotations`.
///
/// Serialized to a flat JSON string (never a nested map) per spec.md §6:
/// `{"name": "...", "arguments": { ...scalars only... }}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<BTreeMap<String, Value>>,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Encode as the flat JSON string the graph store boundary requires.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"name\":\"{}\"}}", self.name))
    }

    /// Parse one encoded annotation string back into a structured form.
    /// Used by tests exercising the "annotation round-trip" property
    /// (spec.md §8.5).
    pub fn from_json_str(encoded: &str) -> Option<Annotation> {
        serde_json::from_str(encoded).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_round_trips_through_json() {
        let ann = Annotation::new("GetMapping").with_argument("value", "/u");
        let encoded = ann.to_json_string();
        let decoded = Annotation::from_json_str(&encoded).expect("valid json");
        assert_eq!(decoded.name, "GetMapping");
        assert_eq!(
            decoded.arguments.unwrap().get("value").unwrap(),
            &Value::String("/u".to_string())
        );
    }

    #[test]
    fn annotation_without_arguments_round_trips() {
        let ann = Annotation::new("Override");
        let encoded = ann.to_json_string();
        let decoded = Annotation::from_json_str(&encoded).unwrap();
        assert_eq!(decoded.name, "Override");
        assert!(decoded.arguments.is_none());
    }

    #[test]
    fn attribute_conversions() {
        let a: Attribute = "foo".into();
        assert_eq!(a.as_str(), Some("foo"));
        let b: Attribute = true.into();
        assert_eq!(b.as_bool(), Some(true));
    }
}
