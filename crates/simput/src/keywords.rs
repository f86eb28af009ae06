//! keyword value conversion
//!
//! Turns the raw remainder of a keyword line (or a section parameter) into a
//! typed [Value] according to its [SchemaKeyword] definition.
use crate::context::Context;
use crate::error::ParserError;
use crate::schema::{DataType, SchemaKeyword, ValueCount};
use crate::value::Value;

pub fn parse_keyword_value(
    spec: &SchemaKeyword,
    raw: &str,
    ctx: &Context,
) -> Result<Value, ParserError> {
    let mut raw = raw.trim();

    if raw.is_empty() {
        match &spec.default {
            Some(default) => raw = default,
            None if spec.data_type == DataType::String => return Ok(Value::String(String::new())),
            None => {
                return Err(ParserError::InvalidValue {
                    reason: format!("'{}' expects a value", spec.name),
                    ctx: ctx.clone(),
                })
            }
        }
    }

    // the string type consumes the remainder whole, item counts do not apply
    if spec.data_type == DataType::String {
        return Ok(Value::String(raw.to_string()));
    }

    let items: Vec<&str> = raw.split_whitespace().collect();

    if let ValueCount::Exact(expected) = spec.count {
        if items.len() != expected {
            return Err(ParserError::InvalidValue {
                reason: format!(
                    "'{}' expects exactly {} value(s), got {}",
                    spec.name,
                    expected,
                    items.len()
                ),
                ctx: ctx.clone(),
            });
        }
    }

    let mut values = items
        .into_iter()
        .map(|item| parse_item(spec, item, ctx))
        .collect::<Result<Vec<_>, _>>()?;

    if spec.count == ValueCount::Exact(1) {
        Ok(values.pop().expect("item count was checked above"))
    } else {
        Ok(Value::List(values))
    }
}

fn parse_item(spec: &SchemaKeyword, item: &str, ctx: &Context) -> Result<Value, ParserError> {
    let invalid = |reason: String| ParserError::InvalidValue {
        reason,
        ctx: ctx.clone(),
    };

    match spec.data_type {
        DataType::Logical => match item.to_ascii_uppercase().as_str() {
            "T" | "TRUE" | ".TRUE." | "ON" | "YES" | "1" => Ok(Value::Logical(true)),
            "F" | "FALSE" | ".FALSE." | "OFF" | "NO" | "0" => Ok(Value::Logical(false)),
            _ => Err(invalid(format!("'{item}' is not a valid logical value"))),
        },
        DataType::Integer => item
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| invalid(format!("'{item}' is not a valid integer"))),
        DataType::Real => item
            .parse::<f64>()
            .map(Value::Real)
            .map_err(|_| invalid(format!("'{item}' is not a valid real number"))),
        DataType::Word => Ok(Value::String(item.to_string())),
        DataType::Enum => {
            if spec.choices.iter().any(|choice| choice.eq_ignore_ascii_case(item)) {
                Ok(Value::String(item.to_ascii_uppercase()))
            } else {
                Err(invalid(format!(
                    "'{}' is not one of {}",
                    item,
                    spec.choices.join(", ")
                )))
            }
        }
        DataType::String => Ok(Value::String(item.to_string())),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keyword(json: &str) -> SchemaKeyword {
        serde_json::from_str(json).expect("keyword spec must parse")
    }

    fn convert(spec: &SchemaKeyword, raw: &str) -> Result<Value, ParserError> {
        parse_keyword_value(spec, raw, &Context::default())
    }

    #[test]
    fn logical_literals() {
        let spec = keyword(r#"{"name": "FLAG", "type": "logical"}"#);
        for raw in ["T", "true", ".TRUE.", "on", "YES", "1"] {
            assert_eq!(convert(&spec, raw).unwrap(), Value::Logical(true), "{raw}");
        }
        for raw in ["F", "false", ".FALSE.", "off", "NO", "0"] {
            assert_eq!(convert(&spec, raw).unwrap(), Value::Logical(false), "{raw}");
        }
        assert!(convert(&spec, "maybe").is_err());
    }

    #[test]
    fn numbers() {
        let spec = keyword(r#"{"name": "N", "type": "integer"}"#);
        assert_eq!(convert(&spec, "42").unwrap(), Value::Integer(42));
        assert!(convert(&spec, "4.2").is_err());

        let spec = keyword(r#"{"name": "EPS", "type": "real"}"#);
        assert_eq!(convert(&spec, "1e-10").unwrap(), Value::Real(1e-10));
    }

    #[test]
    fn item_counts() {
        let spec = keyword(r#"{"name": "ABC", "type": "real", "count": 3}"#);
        assert_eq!(
            convert(&spec, "4.0 4.0 8.0").unwrap(),
            Value::List(vec![4.0.into(), 4.0.into(), 8.0.into()])
        );
        assert!(convert(&spec, "4.0 4.0").is_err());

        let spec = keyword(r#"{"name": "LIST", "type": "integer", "count": "*"}"#);
        assert_eq!(convert(&spec, "1").unwrap(), Value::List(vec![1.into()]));

        let spec = keyword(r#"{"name": "ONE", "type": "word"}"#);
        assert!(convert(&spec, "two words").is_err());
    }

    #[test]
    fn enums_fold_case_against_choices() {
        let spec =
            keyword(r#"{"name": "RUN_TYPE", "type": "enum", "choices": ["ENERGY", "MD"]}"#);
        assert_eq!(convert(&spec, "energy").unwrap(), Value::String("ENERGY".into()));
        assert!(convert(&spec, "NEB").is_err());
    }

    #[test]
    fn string_takes_the_remainder_whole() {
        let spec = keyword(r#"{"name": "NOTE", "type": "string"}"#);
        assert_eq!(
            convert(&spec, "10.0 10.0 10.0").unwrap(),
            Value::String("10.0 10.0 10.0".into())
        );
        assert_eq!(convert(&spec, "").unwrap(), Value::String(String::new()));
    }

    #[test]
    fn defaults_fill_in_missing_values() {
        let spec = keyword(r#"{"name": "PERIODIC", "type": "word", "default": "XYZ"}"#);
        assert_eq!(convert(&spec, "").unwrap(), Value::String("XYZ".into()));

        let spec = keyword(r#"{"name": "N", "type": "integer"}"#);
        assert!(convert(&spec, "").is_err());
    }
}
