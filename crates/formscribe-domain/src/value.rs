//! Form value model
//!
//! Persisted form data is a tree of [`FormValue`]s. There is deliberately no
//! floating-point variant: every non-integer number is an exact
//! [`Decimal`], so a record can never carry a binary float into storage.

use rust_decimal::Decimal;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Top-level form data: section (or free key) to value
pub type FormData = BTreeMap<String, FormValue>;

/// Extraction output: section name to field name to coerced value
pub type ExtractedForm = BTreeMap<String, BTreeMap<String, FormValue>>;

/// A persisted form value
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// JSON null
    Null,
    /// Boolean
    Bool(bool),
    /// Integral number
    Integer(i64),
    /// Exact decimal number
    Decimal(Decimal),
    /// String
    Text(String),
    /// Ordered sequence
    List(Vec<FormValue>),
    /// Nested mapping
    Map(BTreeMap<String, FormValue>),
}

impl FormValue {
    /// Convert a JSON number without going through binary floating point.
    ///
    /// Integers stay integers; everything else is parsed from the number's
    /// textual form into an exact decimal. Returns `None` when the number is
    /// out of decimal range.
    pub fn from_number(number: &Number) -> Option<FormValue> {
        if let Some(i) = number.as_i64() {
            return Some(FormValue::Integer(i));
        }
        if let Some(u) = number.as_u64() {
            return Some(FormValue::Decimal(Decimal::from(u)));
        }
        parse_decimal(&number.to_string()).map(FormValue::Decimal)
    }

    /// Borrow the nested mapping, if this is one
    pub fn as_map(&self) -> Option<&BTreeMap<String, FormValue>> {
        match self {
            FormValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert back into a JSON value.
    ///
    /// Decimals become JSON numbers carrying their exact digits.
    pub fn to_json(&self) -> Value {
        match self {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(*b),
            FormValue::Integer(i) => Value::from(*i),
            FormValue::Decimal(d) => match decimal_to_number(d) {
                Some(n) => Value::Number(n),
                None => Value::String(d.to_string()),
            },
            FormValue::Text(s) => Value::String(s.clone()),
            FormValue::List(items) => Value::Array(items.iter().map(FormValue::to_json).collect()),
            FormValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for FormValue {
    /// Lossless where possible; a number outside decimal range is kept as its text
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => {
                FormValue::from_number(&n).unwrap_or_else(|| FormValue::Text(n.to_string()))
            }
            Value::String(s) => FormValue::Text(s),
            Value::Array(items) => FormValue::List(items.into_iter().map(FormValue::from).collect()),
            Value::Object(map) => FormValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FormValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<Decimal> for FormValue {
    fn from(d: Decimal) -> Self {
        FormValue::Decimal(d)
    }
}

impl Serialize for FormValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FormValue::Null => serializer.serialize_unit(),
            FormValue::Bool(b) => serializer.serialize_bool(*b),
            FormValue::Integer(i) => serializer.serialize_i64(*i),
            FormValue::Decimal(d) => decimal_to_number(d)
                .ok_or_else(|| S::Error::custom(format!("decimal {} is not a JSON number", d)))?
                .serialize(serializer),
            FormValue::Text(s) => serializer.serialize_str(s),
            FormValue::List(items) => items.serialize(serializer),
            FormValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FormValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FormValue::from)
    }
}

/// A value coerced to the representation its declared field type requires
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text-like fields, and numbers that were not numeric
    Text(String),
    /// Numeric fields
    Number(Decimal),
    /// Multi-select and checkbox-group fields
    Selection(Vec<FormValue>),
    /// Tabular fields: one entry per row
    Table(Vec<FormValue>),
    /// Conversion failed and the raw value was kept as text
    Degraded(String),
}

impl FieldValue {
    /// Whether coercion had to fall back to the raw text
    pub fn is_degraded(&self) -> bool {
        matches!(self, FieldValue::Degraded(_))
    }
}

impl From<FieldValue> for FormValue {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) | FieldValue::Degraded(s) => FormValue::Text(s),
            FieldValue::Number(d) => FormValue::Decimal(d),
            FieldValue::Selection(items) | FieldValue::Table(items) => FormValue::List(items),
        }
    }
}

/// Parse decimal text, accepting plain (`75.5`) and scientific (`7.55e1`) notation
///
/// Returns `None` rather than rounding when the text has more precision or
/// magnitude than a `Decimal` holds.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let Some(pos) = s.find(['e', 'E']) else {
        return Decimal::from_str_exact(s).ok();
    };

    let mut mantissa = Decimal::from_str_exact(&s[..pos]).ok()?;
    let exponent: i64 = s[pos + 1..].parse().ok()?;
    let scale = i64::from(mantissa.scale());

    if exponent <= 0 {
        let scale = u32::try_from(scale - exponent).ok()?;
        mantissa.set_scale(scale).ok()?;
        return Some(mantissa);
    }
    if exponent <= scale {
        mantissa.set_scale(u32::try_from(scale - exponent).ok()?).ok()?;
        return Some(mantissa);
    }

    mantissa.set_scale(0).ok()?;
    // Beyond 10^29 every non-zero mantissa overflows
    if exponent - scale > 29 {
        return if mantissa.is_zero() { Some(Decimal::ZERO) } else { None };
    }
    (0..exponent - scale).try_fold(mantissa, |acc, _| acc.checked_mul(Decimal::TEN))
}

fn decimal_to_number(d: &Decimal) -> Option<Number> {
    serde_json::from_str::<Number>(&d.to_string()).ok()
}
