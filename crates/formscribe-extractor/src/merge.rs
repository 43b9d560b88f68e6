//! Fill payloads and merging of extracted with explicit data

use crate::coerce::convert_floats_to_decimals;
use crate::error::ExtractorError;
use formscribe_domain::{ExtractedForm, FormData, FormValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to fill a form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormPayload {
    /// Code of the template being filled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_code: Option<String>,

    /// Explicitly supplied form data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Field schema used for extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_fields: Option<Value>,

    /// Conversation to extract values from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_text: Option<String>,
}

impl FormPayload {
    /// Create a payload for a template code
    pub fn new(template_code: impl Into<String>) -> Self {
        Self {
            template_code: Some(template_code.into()),
            ..Default::default()
        }
    }

    /// Parse a JSON request body
    pub fn from_json(body: &Value) -> Result<Self, ExtractorError> {
        Ok(serde_json::from_value(body.clone())?)
    }

    /// Set explicit data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the field schema used for extraction
    pub fn with_template_fields(mut self, fields: Value) -> Self {
        self.template_fields = Some(fields);
        self
    }

    /// Set the conversation to extract from
    pub fn with_conversation(mut self, text: impl Into<String>) -> Self {
        self.conversation_text = Some(text.into());
        self
    }

    /// The template code, or `RequiredFieldMissing`
    pub fn require_template_code(&self) -> Result<&str, ExtractorError> {
        self.template_code
            .as_deref()
            .ok_or_else(|| ExtractorError::RequiredFieldMissing("templateCode".to_string()))
    }

    /// Schema and conversation, when both are present and non-empty
    pub fn extraction_input(&self) -> Option<(&Value, &str)> {
        match (&self.template_fields, &self.conversation_text) {
            (Some(fields), Some(text)) if !is_empty_schema(fields) && !text.trim().is_empty() => {
                Some((fields, text.as_str()))
            }
            _ => None,
        }
    }
}

fn is_empty_schema(fields: &Value) -> bool {
    match fields {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Deep-convert explicit data, which must be a JSON object
pub fn convert_form_data(data: &Value) -> Result<FormData, ExtractorError> {
    let obj = data
        .as_object()
        .ok_or_else(|| ExtractorError::InvalidPayload("'data' must be a JSON object".to_string()))?;
    Ok(obj
        .iter()
        .map(|(k, v)| (k.clone(), convert_floats_to_decimals(v)))
        .collect())
}

/// Merge extracted sections with explicit data
///
/// The merge is shallow: an explicit top-level key replaces the extracted
/// section of the same name wholesale, it is not merged field by field.
pub fn merge_form_data(
    extracted: Option<ExtractedForm>,
    explicit: Option<&Value>,
) -> Result<FormData, ExtractorError> {
    if extracted.is_none() && explicit.is_none() {
        return Err(ExtractorError::RequiredFieldMissing("data".to_string()));
    }

    let mut data: FormData = extracted
        .into_iter()
        .flatten()
        .map(|(section, fields)| (section, FormValue::Map(fields)))
        .collect();

    if let Some(explicit) = explicit {
        data.extend(convert_form_data(explicit)?);
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extracted(section: &str, field: &str, value: FormValue) -> ExtractedForm {
        let mut form = ExtractedForm::new();
        form.entry(section.to_string())
            .or_default()
            .insert(field.to_string(), value);
        form
    }

    #[test]
    fn test_explicit_wins_shallow() {
        let merged = merge_form_data(
            Some(extracted("vitals", "height", FormValue::Integer(170))),
            Some(&json!({"vitals": {"weight": 80}})),
        )
        .unwrap();

        assert_eq!(
            FormValue::Map(merged).to_json(),
            json!({"vitals": {"weight": 80}})
        );
    }

    #[test]
    fn test_disjoint_sections_are_kept() {
        let merged = merge_form_data(
            Some(extracted("vitals", "height", FormValue::Integer(170))),
            Some(&json!({"notes": "follow up"})),
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged["notes"], FormValue::from("follow up"));
    }

    #[test]
    fn test_extraction_only() {
        let merged = merge_form_data(Some(ExtractedForm::new()), None).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_no_data_at_all() {
        assert!(matches!(
            merge_form_data(None, None),
            Err(ExtractorError::RequiredFieldMissing(f)) if f == "data"
        ));
    }

    #[test]
    fn test_data_must_be_object() {
        assert!(matches!(
            merge_form_data(None, Some(&json!([1, 2]))),
            Err(ExtractorError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_payload_from_json() {
        let payload = FormPayload::from_json(&json!({
            "templateCode": "intake",
            "conversationText": "hello",
            "templateFields": [{"id": "n", "type": "text", "label": "N"}]
        }))
        .unwrap();

        assert_eq!(payload.require_template_code().unwrap(), "intake");
        assert!(payload.data.is_none());
        assert!(payload.extraction_input().is_some());
    }

    #[test]
    fn test_payload_without_template_code() {
        let payload = FormPayload::default().with_data(json!({}));
        assert!(matches!(
            payload.require_template_code(),
            Err(ExtractorError::RequiredFieldMissing(f)) if f == "templateCode"
        ));
    }

    #[test]
    fn test_extraction_needs_both_inputs() {
        let payload = FormPayload::new("x").with_conversation("text");
        assert!(payload.extraction_input().is_none());

        let payload = FormPayload::new("x").with_template_fields(json!([]));
        assert!(payload.extraction_input().is_none());
    }

    #[test]
    fn test_empty_inputs_skip_extraction() {
        let fields = json!({"a": {"n": {"type": "text", "label": "N"}}});

        let payload = FormPayload::new("x")
            .with_template_fields(fields.clone())
            .with_conversation("  \n");
        assert!(payload.extraction_input().is_none());

        for empty in [json!({}), json!([]), Value::Null] {
            let payload = FormPayload::new("x")
                .with_template_fields(empty)
                .with_conversation("text");
            assert!(payload.extraction_input().is_none());
        }

        let payload = FormPayload::new("x")
            .with_template_fields(fields)
            .with_conversation("text");
        assert!(payload.extraction_input().is_some());
    }

    #[test]
    fn test_payload_type_mismatch() {
        let result = FormPayload::from_json(&json!({"templateCode": 5}));
        assert!(matches!(result, Err(ExtractorError::InvalidPayload(_))));
    }
}
