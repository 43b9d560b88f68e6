//! Interpret the model reply
//!
//! The reply must be exactly `{"fields": {"<address>": {"value",
//! "source_quote", "confidence"}}}`. Anything else is rejected as a whole;
//! there is no partial extraction.

use crate::coerce::coerce;
use crate::error::ExtractorError;
use crate::flatten::{FlattenedSchema, ADDRESS_SEPARATOR};
use formscribe_domain::{ExtractedForm, FormValue};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One field as reported by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionCandidate {
    /// Flat field address
    pub address: String,
    /// Extracted value; `None` when the model sent null
    pub value: Option<Value>,
    /// Text the value was taken from
    pub source_quote: Option<String>,
    /// Model confidence in `[0, 1]`
    pub confidence: Option<f64>,
}

impl ExtractionCandidate {
    /// Whether the candidate makes it into the extracted form
    ///
    /// Requires a value and a confidence strictly above `threshold`.
    pub fn is_promotable(&self, threshold: f64) -> bool {
        self.value.is_some() && self.confidence.is_some_and(|c| c > threshold)
    }
}

/// Parse the raw reply into candidates, in reply order
pub fn parse_model_response(response: &str) -> Result<Vec<ExtractionCandidate>, ExtractorError> {
    // Models sometimes wrap JSON in markdown code blocks, even in JSON mode
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ExtractorError::MalformedResponse(format!("JSON parse error: {}", e)))?;

    let root = json
        .as_object()
        .ok_or_else(|| ExtractorError::MalformedResponse("Expected a JSON object".to_string()))?;

    if let Some(extra) = root.keys().find(|k| k.as_str() != "fields") {
        return Err(ExtractorError::MalformedResponse(format!(
            "Unexpected top-level key '{}'",
            extra
        )));
    }

    let fields = root
        .get("fields")
        .ok_or_else(|| ExtractorError::MalformedResponse("Missing 'fields'".to_string()))?
        .as_object()
        .ok_or_else(|| ExtractorError::MalformedResponse("'fields' is not an object".to_string()))?;

    fields
        .iter()
        .map(|(address, candidate)| {
            parse_candidate(address, candidate)
                .map_err(|e| ExtractorError::MalformedResponse(format!("Field '{}': {}", address, e)))
        })
        .collect()
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> Result<String, ExtractorError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(ExtractorError::MalformedResponse("Empty code block".to_string()));
        }

        // Skip the opening fence line and the closing fence, if present
        let end = if lines[lines.len() - 1].trim_start().starts_with("```") {
            lines.len() - 1
        } else {
            lines.len()
        };
        Ok(lines[1..end].join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_candidate(address: &str, json: &Value) -> Result<ExtractionCandidate, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "candidate is not a JSON object".to_string())?;

    let value = match required(obj, "value")? {
        Value::Null => None,
        other => Some(other.clone()),
    };

    let source_quote = match required(obj, "source_quote")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err("'source_quote' must be a string or null".to_string()),
    };

    let confidence = match required(obj, "confidence")? {
        Value::Null => None,
        Value::Number(n) => {
            let c = n
                .as_f64()
                .ok_or_else(|| format!("'confidence' {} is not a finite number", n))?;
            if !(0.0..=1.0).contains(&c) {
                return Err(format!("'confidence' {} is outside [0, 1]", c));
            }
            Some(c)
        }
        _ => return Err("'confidence' must be a number or null".to_string()),
    };

    Ok(ExtractionCandidate {
        address: address.to_string(),
        value,
        source_quote,
        confidence,
    })
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, String> {
    obj.get(key).ok_or_else(|| format!("missing '{}'", key))
}

/// Split an address into `(section, field)`
///
/// Only one level of nesting is supported: the address must contain exactly
/// one separator with text on both sides.
pub fn split_address(address: &str) -> Result<(&str, &str), ExtractorError> {
    match address.split_once(ADDRESS_SEPARATOR) {
        Some((section, field))
            if !section.is_empty() && !field.is_empty() && !field.contains(ADDRESS_SEPARATOR) =>
        {
            Ok((section, field))
        }
        _ => Err(ExtractorError::UnsupportedAddress(address.to_string())),
    }
}

/// Promote, coerce and nest candidates into an [`ExtractedForm`]
///
/// Candidates failing the promotion predicate are dropped silently. A
/// promoted address the schema does not declare is dropped with a warning.
pub fn interpret(
    candidates: Vec<ExtractionCandidate>,
    schema: &FlattenedSchema,
    threshold: f64,
) -> Result<ExtractedForm, ExtractorError> {
    let mut form = ExtractedForm::new();

    for candidate in candidates {
        if !candidate.is_promotable(threshold) {
            debug!("Dropping '{}' (confidence {:?})", candidate.address, candidate.confidence);
            continue;
        }

        let (section, field) = split_address(&candidate.address)?;

        let Some(field_type) = schema.field_type(&candidate.address) else {
            warn!("Model returned unknown field '{}', ignoring it", candidate.address);
            continue;
        };

        let Some(value) = candidate.value.as_ref() else {
            continue;
        };

        let coerced = coerce(value, field_type);
        if coerced.is_degraded() {
            warn!("Field '{}' kept as raw text", candidate.address);
        }

        form.entry(section.to_string())
            .or_default()
            .insert(field.to_string(), FormValue::from(coerced));
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_fields;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::str::FromStr;

    fn schema() -> FlattenedSchema {
        flatten_fields(&json!({
            "vitals": {
                "weight": {"type": "number", "label": "Weight"},
                "height": {"type": "number", "label": "Height"}
            },
            "history": {
                "allergies": {"type": "multiple_select", "label": "Allergies"}
            }
        }))
        .unwrap()
    }

    fn candidate(address: &str, value: Value, confidence: Option<f64>) -> ExtractionCandidate {
        ExtractionCandidate {
            address: address.to_string(),
            value: (!value.is_null()).then_some(value),
            source_quote: None,
            confidence,
        }
    }

    #[test]
    fn test_parse_valid_response() {
        let response = r#"{"fields": {
            "vitals.weight": {"value": 75.5, "source_quote": "75.5 kilos", "confidence": 0.95},
            "vitals.height": {"value": null, "source_quote": null, "confidence": null}
        }}"#;

        let candidates = parse_model_response(response).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].address, "vitals.weight");
        assert_eq!(candidates[0].source_quote.as_deref(), Some("75.5 kilos"));
        assert_eq!(candidates[0].confidence, Some(0.95));
        assert_eq!(candidates[1].value, None);
        assert_eq!(candidates[1].confidence, None);
    }

    #[test]
    fn test_parse_json_with_markdown_wrapper() {
        let response = "```json\n{\"fields\": {}}\n```";
        assert!(parse_model_response(response).unwrap().is_empty());
    }

    #[test]
    fn test_empty_code_block() {
        assert!(matches!(
            parse_model_response("```"),
            Err(ExtractorError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_malformed_responses() {
        let cases = [
            "This is not JSON",
            "[]",
            r#"{"data": {}}"#,
            r#"{"fields": {}, "notes": "extra"}"#,
            r#"{"fields": []}"#,
            r#"{"fields": {"a.b": 5}}"#,
            r#"{"fields": {"a.b": {"value": 1, "confidence": 0.9}}}"#,
            r#"{"fields": {"a.b": {"value": 1, "source_quote": 7, "confidence": 0.9}}}"#,
            r#"{"fields": {"a.b": {"value": 1, "source_quote": "q", "confidence": "high"}}}"#,
            r#"{"fields": {"a.b": {"value": 1, "source_quote": "q", "confidence": 1.5}}}"#,
            r#"{"fields": {"a.b": {"value": 1, "source_quote": "q", "confidence": -0.1}}}"#,
        ];
        for response in cases {
            assert!(
                matches!(parse_model_response(response), Err(ExtractorError::MalformedResponse(_))),
                "expected rejection of {}",
                response
            );
        }
    }

    #[test]
    fn test_missing_fields_rejects_whole_reply() {
        let result = parse_model_response(r#"{"vitals.weight": {"value": 1, "source_quote": "", "confidence": 1}}"#);
        assert!(matches!(result, Err(ExtractorError::MalformedResponse(_))));
    }

    #[test]
    fn test_promotion_predicate() {
        assert!(candidate("a.b", json!(1), Some(0.81)).is_promotable(0.8));
        assert!(!candidate("a.b", json!(1), Some(0.8)).is_promotable(0.8));
        assert!(!candidate("a.b", json!(1), None).is_promotable(0.8));
        assert!(!candidate("a.b", json!(null), Some(0.99)).is_promotable(0.8));
        // A falsy but present value still counts
        assert!(candidate("a.b", json!(0), Some(0.9)).is_promotable(0.8));
    }

    #[test]
    fn test_split_address() {
        assert_eq!(split_address("vitals.weight").unwrap(), ("vitals", "weight"));
        for bad in ["weight", "a.b.c", ".weight", "vitals."] {
            assert!(matches!(
                split_address(bad),
                Err(ExtractorError::UnsupportedAddress(a)) if a == bad
            ));
        }
    }

    #[test]
    fn test_interpret_nests_and_coerces() {
        let candidates = vec![
            candidate("vitals.weight", json!(75.5), Some(0.95)),
            candidate("vitals.height", json!(170), Some(0.5)),
            candidate("history.allergies", json!("penicillin"), Some(0.9)),
        ];

        let form = interpret(candidates, &schema(), 0.8).unwrap();

        assert_eq!(form.len(), 2);
        assert_eq!(
            form["vitals"]["weight"],
            FormValue::Decimal(Decimal::from_str("75.5").unwrap())
        );
        assert!(!form["vitals"].contains_key("height"));
        assert_eq!(
            form["history"]["allergies"],
            FormValue::List(vec![FormValue::from("penicillin")])
        );
    }

    #[test]
    fn test_interpret_drops_unknown_address() {
        let candidates = vec![candidate("vitals.pulse", json!(60), Some(0.99))];
        let form = interpret(candidates, &schema(), 0.8).unwrap();
        assert!(form.is_empty());
    }

    #[test]
    fn test_interpret_rejects_deep_address() {
        let candidates = vec![candidate("a.b.c", json!(1), Some(0.99))];
        assert!(matches!(
            interpret(candidates, &schema(), 0.8),
            Err(ExtractorError::UnsupportedAddress(_))
        ));
    }

    #[test]
    fn test_low_confidence_deep_address_is_ignored() {
        let candidates = vec![candidate("a.b.c", json!(1), Some(0.2))];
        assert!(interpret(candidates, &schema(), 0.8).unwrap().is_empty());
    }
}
