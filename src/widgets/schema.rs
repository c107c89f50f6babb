use serde_json::{json, Value};

use crate::html;
use crate::models::ValidationError;

/// Declared type of a customization arg value.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    Unicode,
    Html,
    Bool,
    Int { min: Option<i64>, max: Option<i64> },
    List(Box<Schema>),
}

impl Schema {
    /// Checks `value` against the schema and returns its normalized form.
    pub fn normalize(&self, value: &Value) -> Result<Value, ValidationError> {
        match self {
            Schema::Unicode => value
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| mismatch("a string", value)),
            Schema::Html => value
                .as_str()
                .map(|s| Value::String(html::clean(s)))
                .ok_or_else(|| mismatch("an HTML string", value)),
            Schema::Bool => value
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| mismatch("a boolean", value)),
            Schema::Int { min, max } => {
                let n = value.as_i64().ok_or_else(|| mismatch("an integer", value))?;
                if let Some(min) = min.filter(|min| n < *min) {
                    return Err(ValidationError::CustomizationArg(format!(
                        "Expected an integer of at least {}, received {}",
                        min, n
                    )));
                }
                if let Some(max) = max.filter(|max| n > *max) {
                    return Err(ValidationError::CustomizationArg(format!(
                        "Expected an integer of at most {}, received {}",
                        max, n
                    )));
                }
                Ok(json!(n))
            }
            Schema::List(items) => {
                let values = value.as_array().ok_or_else(|| mismatch("a list", value))?;
                values
                    .iter()
                    .map(|item| items.normalize(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
        }
    }

    /// Wire form of the schema, as published in widget instance dicts.
    pub fn to_value(&self) -> Value {
        match self {
            Schema::Unicode => json!({ "type": "unicode" }),
            Schema::Html => json!({ "type": "html" }),
            Schema::Bool => json!({ "type": "bool" }),
            Schema::Int { min, max } => {
                let mut normalizers = Vec::new();
                if let Some(min) = min {
                    normalizers.push(json!({ "id": "require_at_least", "min_value": min }));
                }
                if let Some(max) = max {
                    normalizers.push(json!({ "id": "require_at_most", "max_value": max }));
                }
                if normalizers.is_empty() {
                    json!({ "type": "int" })
                } else {
                    json!({ "type": "int", "post_normalizers": normalizers })
                }
            }
            Schema::List(items) => json!({ "type": "list", "items": items.to_value() }),
        }
    }
}

fn mismatch(expected: &str, received: &Value) -> ValidationError {
    ValidationError::CustomizationArg(format!("Expected {}, received {}", expected, received))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_bounds() {
        let schema = Schema::Int {
            min: Some(1),
            max: Some(200),
        };

        assert_eq!(schema.normalize(&json!(5)).unwrap(), json!(5));
        assert!(schema.normalize(&json!(0)).is_err());
        assert!(schema.normalize(&json!(201)).is_err());
        assert!(schema.normalize(&json!("5")).is_err());
    }

    #[test]
    fn test_html_is_cleaned() {
        let value = Schema::Html
            .normalize(&json!("<p>ok</p><script>alert(1)</script>"))
            .unwrap();

        assert_eq!(value, json!("<p>ok</p>"));
    }

    #[test]
    fn test_list_items_are_checked() {
        let schema = Schema::List(Box::new(Schema::Unicode));

        assert!(schema.normalize(&json!(["a", "b"])).is_ok());
        assert!(schema.normalize(&json!(["a", 1])).is_err());
    }

    #[test]
    fn test_int_rejects_fractional_numbers() {
        let schema = Schema::Int {
            min: None,
            max: None,
        };

        assert!(schema.normalize(&json!(1.5)).is_err());
        assert_eq!(schema.to_value(), json!({ "type": "int" }));
    }

    #[test]
    fn test_int_wire_form() {
        let schema = Schema::Int {
            min: Some(1),
            max: Some(200),
        };

        assert_eq!(
            schema.to_value(),
            json!({
                "type": "int",
                "post_normalizers": [
                    { "id": "require_at_least", "min_value": 1 },
                    { "id": "require_at_most", "max_value": 200 }
                ]
            })
        );
    }
}
