/// Condition parameters — flat maps of scalar values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single parameter value.
///
/// Variant order matters for untagged deserialization: integers must be
/// tried before floats so `3` stays an integer and `3.0` stays a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// The kind of a [`ParamValue`], used for structural validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Bool,
    Int,
    Float,
    String,
}

impl ParamValue {
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Bool(_) => ParamKind::Bool,
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::String(_) => ParamKind::String,
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Float => "float",
            Self::String => "string",
        };
        f.write_str(name)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Named parameter values for one condition instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

/// Why a parameter map does not fit a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    Missing(String),
    Unexpected(String),
    WrongKind {
        key: String,
        expected: ParamKind,
        found: ParamKind,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing parameter '{}'", key),
            Self::Unexpected(key) => write!(f, "unexpected parameter '{}'", key),
            Self::WrongKind {
                key,
                expected,
                found,
            } => write!(
                f,
                "parameter '{}' should be {} but is {}",
                key, expected, found
            ),
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.values.insert(key.to_string(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key) {
            Some(ParamValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.values.get(key) {
            Some(ParamValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.values.get(key) {
            Some(ParamValue::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ParamValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Shallow structural comparison against a schema: same key set, same
    /// value kind per key. Values themselves are not inspected, and `3` is
    /// not a float.
    pub fn check_structure(&self, schema: &Params) -> Result<(), Mismatch> {
        for (key, expected) in &schema.values {
            match self.values.get(key) {
                None => return Err(Mismatch::Missing(key.clone())),
                Some(found) if found.kind() != expected.kind() => {
                    return Err(Mismatch::WrongKind {
                        key: key.clone(),
                        expected: expected.kind(),
                        found: found.kind(),
                    })
                }
                Some(_) => {}
            }
        }
        if let Some(extra) = self.values.keys().find(|k| !schema.values.contains_key(*k)) {
            return Err(Mismatch::Unexpected(extra.clone()));
        }
        Ok(())
    }

    pub fn has_same_structure(&self, schema: &Params) -> bool {
        self.check_structure(schema).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Params {
        Params::new()
            .with("check_attacker", false)
            .with("skeleton", "")
    }

    #[test]
    fn same_keys_and_kinds_match() {
        let params = Params::new()
            .with("check_attacker", true)
            .with("skeleton", "draugr");
        assert!(params.has_same_structure(&schema()));
    }

    #[test]
    fn missing_key_rejected() {
        let params = Params::new().with("check_attacker", true);
        assert_eq!(
            params.check_structure(&schema()),
            Err(Mismatch::Missing("skeleton".to_string()))
        );
    }

    #[test]
    fn extra_key_rejected() {
        let params = schema().with("bonus", 1i64);
        assert_eq!(
            params.check_structure(&schema()),
            Err(Mismatch::Unexpected("bonus".to_string()))
        );
    }

    #[test]
    fn wrong_kind_rejected() {
        let params = Params::new()
            .with("check_attacker", 1i64)
            .with("skeleton", "");
        assert!(matches!(
            params.check_structure(&schema()),
            Err(Mismatch::WrongKind { ref key, expected: ParamKind::Bool, found: ParamKind::Int }) if key == "check_attacker"
        ));
    }

    #[test]
    fn integer_and_float_are_different_kinds() {
        let float_schema = Params::new().with("range", 1024.0);
        assert_eq!(
            Params::new().with("range", 512i64).check_structure(&float_schema),
            Err(Mismatch::WrongKind {
                key: "range".to_string(),
                expected: ParamKind::Float,
                found: ParamKind::Int,
            })
        );
        assert!(Params::new().with("range", 512.0).has_same_structure(&float_schema));

        let int_schema = Params::new().with("count", 3i64);
        assert!(!Params::new().with("count", 3.0).has_same_structure(&int_schema));
    }

    #[test]
    fn ron_keeps_number_kinds() {
        let params: Params = ron::from_str(r#"{"a": 3, "b": 3.0, "c": true, "d": "x"}"#).unwrap();
        assert_eq!(params.get("a"), Some(&ParamValue::Int(3)));
        assert_eq!(params.get("b"), Some(&ParamValue::Float(3.0)));
        assert_eq!(params.get("c"), Some(&ParamValue::Bool(true)));
        assert_eq!(params.get("d"), Some(&ParamValue::String("x".to_string())));
    }

    #[test]
    fn typed_getters() {
        let params = Params::new()
            .with("flag", true)
            .with("range", 12.5)
            .with("count", 12i64)
            .with("name", "x");
        assert_eq!(params.bool("flag"), Some(true));
        assert_eq!(params.float("range"), Some(12.5));
        assert_eq!(params.int("count"), Some(12));
        assert_eq!(params.float("count"), None);
        assert_eq!(params.str("name"), Some("x"));
        assert_eq!(params.bool("name"), None);
    }
}
