//! Per-field-type value coercion
//!
//! Coercion never fails. A value that cannot take the shape its field type
//! asks for is stringified, and a number that does not fit an exact decimal
//! comes back as [`FieldValue::Degraded`] with a warning in the log.

use formscribe_domain::{parse_decimal, FieldType, FieldValue, FormValue};
use serde_json::Value;
use tracing::warn;

/// Convert an extracted value to the representation its field type requires
pub fn coerce(value: &Value, field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Number => coerce_number(value),
        FieldType::Text
        | FieldType::Textarea
        | FieldType::RichText
        | FieldType::Tel
        | FieldType::Email
        | FieldType::Select => FieldValue::Text(stringify(value)),
        FieldType::MultipleSelect | FieldType::CheckboxGroup => match value {
            Value::Array(items) => {
                FieldValue::Selection(items.iter().map(convert_floats_to_decimals).collect())
            }
            other => FieldValue::Selection(vec![FormValue::Text(stringify(other))]),
        },
        FieldType::Table => {
            let rows = match value {
                Value::Array(rows) => rows.iter().map(convert_floats_to_decimals).collect(),
                row => vec![convert_floats_to_decimals(row)],
            };
            FieldValue::Table(rows)
        }
    }
}

fn coerce_number(value: &Value) -> FieldValue {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            match parse_decimal(&text) {
                Some(d) => FieldValue::Number(d),
                None => {
                    warn!("Number {} does not fit a decimal, keeping it as text", text);
                    FieldValue::Degraded(text)
                }
            }
        }
        Value::String(s) => match parse_decimal(s.trim()) {
            Some(d) => FieldValue::Number(d),
            None => FieldValue::Text(s.clone()),
        },
        other => FieldValue::Text(stringify(other)),
    }
}

/// Render a value as plain text; sequences are joined with `", "`
///
/// Nested sequences are flattened into the same list: `[["a","b"],"c"]`
/// renders as `a, b, c`.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Deep-convert a JSON value into a [`FormValue`] with exact decimals
///
/// Every non-integer number becomes a decimal, integers stay integers and
/// the structure is otherwise unchanged.
pub fn convert_floats_to_decimals(value: &Value) -> FormValue {
    match value {
        Value::Number(n) => FormValue::from_number(n).unwrap_or_else(|| {
            warn!("Number {} does not fit a decimal, keeping it as text", n);
            FormValue::Text(n.to_string())
        }),
        Value::Array(items) => FormValue::List(items.iter().map(convert_floats_to_decimals).collect()),
        Value::Object(map) => FormValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), convert_floats_to_decimals(v)))
                .collect(),
        ),
        Value::Null => FormValue::Null,
        Value::Bool(b) => FormValue::Bool(*b),
        Value::String(s) => FormValue::Text(s.clone()),
    }
}
