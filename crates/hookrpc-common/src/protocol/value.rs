//! Decoded RPC values
//!
//! [`RpcValue`] is what the service and client see after a message has been
//! run through the [`ObjectHookRegistry`](super::hook::ObjectHookRegistry):
//! plain JSON data, plus reconstructed domain objects in the `Instance`
//! variant.

use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::hook::Transmittable;

/// String-keyed mapping of decoded values.
pub type RpcMap = BTreeMap<String, RpcValue>;

/// A decoded protocol value.
#[derive(Debug, Clone, Default)]
pub enum RpcValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<RpcValue>),
    Object(RpcMap),
    /// A domain object rebuilt from a `__classhook__` descriptor.
    Instance(Arc<dyn Transmittable>),
}

impl RpcValue {
    /// Wraps a domain object.
    pub fn instance<T: Transmittable>(object: T) -> Self {
        RpcValue::Instance(Arc::new(object))
    }

    /// Builds a number from a float. NaN and infinities become `Null`,
    /// matching what `serde_json` does for non-finite floats.
    pub fn from_f64(value: f64) -> Self {
        Number::from_f64(value).map(RpcValue::Number).unwrap_or(RpcValue::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RpcValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RpcValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RpcValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RpcValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RpcValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<RpcValue>> {
        match self {
            RpcValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&RpcMap> {
        match self {
            RpcValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Arc<dyn Transmittable>> {
        match self {
            RpcValue::Instance(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the wrapped domain object if it is a `T`.
    pub fn downcast_ref<T: Transmittable>(&self) -> Option<&T> {
        self.as_instance()
            .and_then(|object| object.as_any().downcast_ref::<T>())
    }

    /// Short description of the value's kind, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            RpcValue::Null => "null",
            RpcValue::Bool(_) => "bool",
            RpcValue::Number(_) => "number",
            RpcValue::String(_) => "string",
            RpcValue::Array(_) => "array",
            RpcValue::Object(_) => "object",
            RpcValue::Instance(object) => object.class_name(),
        }
    }

    /// Converts back to plain JSON.
    ///
    /// Returns `None` if the value contains a domain object anywhere; those
    /// need the hook encoder.
    pub fn as_plain_json(&self) -> Option<Value> {
        Some(match self {
            RpcValue::Null => Value::Null,
            RpcValue::Bool(b) => Value::Bool(*b),
            RpcValue::Number(n) => Value::Number(n.clone()),
            RpcValue::String(s) => Value::String(s.clone()),
            RpcValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(RpcValue::as_plain_json)
                    .collect::<Option<Vec<_>>>()?,
            ),
            RpcValue::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), value.as_plain_json()?);
                }
                Value::Object(out)
            }
            RpcValue::Instance(_) => return None,
        })
    }
}

impl PartialEq for RpcValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RpcValue::Null, RpcValue::Null) => true,
            (RpcValue::Bool(a), RpcValue::Bool(b)) => a == b,
            (RpcValue::Number(a), RpcValue::Number(b)) => a == b,
            (RpcValue::String(a), RpcValue::String(b)) => a == b,
            (RpcValue::Array(a), RpcValue::Array(b)) => a == b,
            (RpcValue::Object(a), RpcValue::Object(b)) => a == b,
            // Identity only; compare downcast values for structural equality.
            (RpcValue::Instance(a), RpcValue::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Plain conversion. No object hooks are applied, so `__classhook__`
/// descriptors stay ordinary objects.
impl From<Value> for RpcValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RpcValue::Null,
            Value::Bool(b) => RpcValue::Bool(b),
            Value::Number(n) => RpcValue::Number(n),
            Value::String(s) => RpcValue::String(s),
            Value::Array(items) => RpcValue::Array(items.into_iter().map(RpcValue::from).collect()),
            Value::Object(map) => RpcValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, RpcValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for RpcValue {
    fn from(value: bool) -> Self {
        RpcValue::Bool(value)
    }
}

impl From<i32> for RpcValue {
    fn from(value: i32) -> Self {
        RpcValue::Number(value.into())
    }
}

impl From<i64> for RpcValue {
    fn from(value: i64) -> Self {
        RpcValue::Number(value.into())
    }
}

impl From<u64> for RpcValue {
    fn from(value: u64) -> Self {
        RpcValue::Number(value.into())
    }
}

impl From<f64> for RpcValue {
    fn from(value: f64) -> Self {
        RpcValue::from_f64(value)
    }
}

impl From<&str> for RpcValue {
    fn from(value: &str) -> Self {
        RpcValue::String(value.to_string())
    }
}

impl From<String> for RpcValue {
    fn from(value: String) -> Self {
        RpcValue::String(value)
    }
}

impl From<Vec<RpcValue>> for RpcValue {
    fn from(value: Vec<RpcValue>) -> Self {
        RpcValue::Array(value)
    }
}

impl From<RpcMap> for RpcValue {
    fn from(value: RpcMap) -> Self {
        RpcValue::Object(value)
    }
}

impl<T: Into<RpcValue>> From<Option<T>> for RpcValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RpcValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_preserves_structure() {
        let value = RpcValue::from(json!({"a": [1, "two", null], "b": {"c": true}}));
        let object = value.as_object().unwrap();
        assert_eq!(object["a"].as_array().unwrap().len(), 3);
        assert_eq!(object["a"].as_array().unwrap()[1].as_str(), Some("two"));
        assert_eq!(object["b"].as_object().unwrap()["c"].as_bool(), Some(true));
    }

    #[test]
    fn test_plain_json_roundtrip() {
        let original = json!({"x": 1, "y": [2.5, "s"], "z": null});
        let value = RpcValue::from(original.clone());
        assert_eq!(value.as_plain_json(), Some(original));
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(RpcValue::from(f64::NAN).is_null());
        assert!(RpcValue::from(f64::INFINITY).is_null());
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(RpcValue::from(7i64).as_i64(), Some(7));
        assert_eq!(RpcValue::from(7i64).as_f64(), Some(7.0));
        assert_eq!(RpcValue::from(2.5).as_i64(), None);
        assert_eq!(RpcValue::from("7").as_i64(), None);
    }

    #[test]
    fn test_option_conversion() {
        assert!(RpcValue::from(None::<i64>).is_null());
        assert_eq!(RpcValue::from(Some("m")), RpcValue::from("m"));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(RpcValue::Null.type_name(), "null");
        assert_eq!(RpcValue::from(json!([])).type_name(), "array");
        assert_eq!(RpcValue::from(json!({})).type_name(), "object");
    }
}
