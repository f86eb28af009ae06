//! value representation
//!
//! Two layers:
//! - [Value] is a converted keyword value (logical, integer, real, string,
//!   or a fixed/variable-count list of those)
//! - [TreeValue] is a node of the output tree: a scalar, a section mapping,
//!   or the ordered list a repeatable entry gets promoted into on its second
//!   occurrence
//!
//! The promotion Scalar/Section -> Repeated is performed by the parser at the
//! point of the second insertion; a [TreeValue] never changes shape on read.
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// A single converted keyword value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(Vec<Value>),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Logical(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

/// A node of the output tree
///
/// Section keys carry a `+` prefix (a section and a keyword may share a bare
/// name within the same parent), keyword keys are the bare canonical schema
/// name, and a section parameter is stored under the reserved `_` key.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeValue {
    Scalar(Value),
    Section(indexmap::IndexMap<String, TreeValue>),
    Repeated(Vec<TreeValue>),
}

impl From<Value> for TreeValue {
    fn from(value: Value) -> Self {
        TreeValue::Scalar(value)
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Logical(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Real(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
        }
    }
}

impl serde::ser::Serialize for TreeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            TreeValue::Scalar(value) => value.serialize(serializer),
            TreeValue::Section(entries) => {
                let mut ser = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    ser.serialize_entry(key, value)?;
                }
                ser.end()
            }
            TreeValue::Repeated(entries) => {
                let mut ser = serializer.serialize_seq(Some(entries.len()))?;
                for element in entries {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serializes_nested_tree() {
        let mut cell = indexmap::IndexMap::new();
        cell.insert(
            "ABC".to_string(),
            TreeValue::Scalar(vec![4.0, 4.0, 4.0].into()),
        );

        let mut root = indexmap::IndexMap::new();
        root.insert("+CELL".to_string(), TreeValue::Section(cell));
        root.insert(
            "BASIS_SET".to_string(),
            TreeValue::Repeated(vec![
                TreeValue::Scalar("DZVP".into()),
                TreeValue::Scalar("AUX".into()),
            ]),
        );

        assert_eq!(
            serde_json::to_value(TreeValue::Section(root)).unwrap(),
            json!({
                "+CELL": { "ABC": [4.0, 4.0, 4.0] },
                "BASIS_SET": ["DZVP", "AUX"],
            })
        );
    }
}
