//! Pipeline tests against the mock provider and an in-memory store

#[cfg(test)]
mod tests {
    use crate::{ExtractorConfig, ExtractorError, FormExtractor, FormFiller, FormPayload};
    use formscribe_domain::traits::{LlmProvider, ModelRequest, TemplateUpdate};
    use formscribe_domain::{FormValue, TemplateId};
    use formscribe_llm::MockProvider;
    use formscribe_store::SqliteStore;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::str::FromStr;
    use std::time::Duration;

    const OWNER: &str = "user-1";

    fn vitals_fields() -> Value {
        json!([
            {"id": "vitals", "type": "section", "label": "Vitals", "fields": [
                {"id": "weight", "type": "number", "label": "Weight", "required": true},
                {"id": "height", "type": "number", "label": "Height"}
            ]},
            {"id": "history", "type": "section", "label": "History", "fields": [
                {"id": "allergies", "type": "multiple_select", "label": "Allergies",
                 "options": ["penicillin", "latex"]},
                {"id": "medications", "type": "table", "label": "Medications", "columns": [
                    {"id": "drug", "label": "Drug"},
                    {"id": "dose", "label": "Dose"}
                ]}
            ]}
        ])
    }

    const VITALS_REPLY: &str = r#"{"fields": {
        "vitals.weight": {"value": 75.5, "source_quote": "weighs 75.5 kg", "confidence": 0.95},
        "vitals.height": {"value": 170, "source_quote": "about 170", "confidence": 0.5},
        "history.allergies": {"value": "penicillin", "source_quote": "allergic to penicillin", "confidence": 0.9},
        "history.medications": {"value": [{"drug": "ibuprofen", "dose": 0.2}], "source_quote": "ibuprofen", "confidence": 0.85}
    }}"#;

    fn filler(llm: MockProvider) -> FormFiller<MockProvider, SqliteStore> {
        filler_with(llm, ExtractorConfig::default())
    }

    fn filler_with(llm: MockProvider, config: ExtractorConfig) -> FormFiller<MockProvider, SqliteStore> {
        let extractor = FormExtractor::new(llm, config).unwrap();
        FormFiller::new(extractor, SqliteStore::in_memory().unwrap())
    }

    fn dec(s: &str) -> FormValue {
        FormValue::Decimal(Decimal::from_str(s).unwrap())
    }

    #[tokio::test]
    async fn test_full_fill_flow() {
        let llm = MockProvider::new(VITALS_REPLY);
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("The patient weighs 75.5 kg and is allergic to penicillin.");

        let record = filler.fill(OWNER, payload).await.unwrap();

        assert_eq!(handle.call_count(), 1);
        assert_eq!(record.template_code, "intake");
        assert_eq!(record.created_at, record.updated_at);

        let vitals = record.data["vitals"].as_map().unwrap();
        assert_eq!(vitals["weight"], dec("75.5"));
        assert!(!vitals.contains_key("height"), "low confidence must be dropped");

        let history = record.data["history"].as_map().unwrap();
        assert_eq!(history["allergies"], FormValue::List(vec![FormValue::from("penicillin")]));
        assert_eq!(
            history["medications"].to_json(),
            json!([{"drug": "ibuprofen", "dose": 0.2}])
        );

        let stored = filler.get_form(record.form_id, OWNER).unwrap();
        assert_eq!(stored, Some(record));
    }

    #[tokio::test]
    async fn test_prompt_carries_schema_and_conversation() {
        let llm = MockProvider::default();
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("Weight is 80.");
        filler.fill(OWNER, payload).await.unwrap();

        let request = handle.last_request().unwrap();
        assert!(request.json_output);
        assert!(request.user.contains("- Weight (ID: vitals.weight, Type: number) [required]"));
        assert!(request.user.contains("ID: history.medications, Type: table"));
        assert!(request.user.contains("Conversation:\nWeight is 80."));
    }

    #[tokio::test]
    async fn test_explicit_data_wins_shallow() {
        let llm = MockProvider::new(
            r#"{"fields": {"vitals.height": {"value": 170, "source_quote": "170 cm", "confidence": 0.9}}}"#,
        );
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("Height 170 cm.")
            .with_data(json!({"vitals": {"weight": 80}}));

        let record = filler.fill(OWNER, payload).await.unwrap();
        assert_eq!(
            FormValue::Map(record.data).to_json(),
            json!({"vitals": {"weight": 80}})
        );
    }

    #[tokio::test]
    async fn test_explicit_data_without_extraction() {
        let llm = MockProvider::default();
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake").with_data(json!({"vitals": {"temp": 36.6}}));
        let record = filler.fill(OWNER, payload).await.unwrap();

        assert_eq!(handle.call_count(), 0);
        assert_eq!(record.data["vitals"].as_map().unwrap()["temp"], dec("36.6"));
    }

    #[tokio::test]
    async fn test_conversation_without_fields_skips_extraction() {
        let llm = MockProvider::default();
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_conversation("text")
            .with_data(json!({}));
        filler.fill(OWNER, payload).await.unwrap();
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_template_code_fails_before_model_call() {
        let llm = MockProvider::new(VITALS_REPLY);
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::default()
            .with_template_fields(vitals_fields())
            .with_conversation("text");

        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::RequiredFieldMissing(f)) if f == "templateCode"));
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_data() {
        let filler = filler(MockProvider::default());
        let result = filler.fill(OWNER, FormPayload::new("intake")).await;
        assert!(matches!(result, Err(ExtractorError::RequiredFieldMissing(f)) if f == "data"));
    }

    #[tokio::test]
    async fn test_empty_inputs_skip_model_call() {
        let llm = MockProvider::new(VITALS_REPLY);
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("")
            .with_data(json!({"notes": "walk-in"}));
        let record = filler.fill(OWNER, payload).await.unwrap();
        assert_eq!(record.data["notes"], FormValue::from("walk-in"));
        assert_eq!(handle.call_count(), 0);

        let payload = FormPayload::new("intake")
            .with_template_fields(json!({}))
            .with_conversation("The patient weighs 75.5 kg.");
        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::RequiredFieldMissing(f)) if f == "data"));
        assert_eq!(handle.call_count(), 0);
        assert_eq!(filler.list_forms(OWNER, None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_object_data() {
        let filler = filler(MockProvider::default());
        let payload = FormPayload::new("intake").with_data(json!("weight 80"));
        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_missing_fields_key_stores_nothing() {
        let llm = MockProvider::new(r#"{"vitals.weight": {"value": 80, "source_quote": "80", "confidence": 0.99}}"#);
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("Weight 80.");

        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::MalformedResponse(_))));
        assert!(filler.list_forms(OWNER, None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nested_address_is_unsupported() {
        let fields = json!([
            {"id": "a", "type": "section", "label": "A", "fields": [
                {"id": "b", "type": "section", "label": "B", "fields": [
                    {"id": "c", "type": "text", "label": "C"}
                ]}
            ]}
        ]);
        let llm = MockProvider::new(r#"{"fields": {"a.b.c": {"value": "x", "source_quote": "x", "confidence": 0.9}}}"#);
        let filler = filler(llm);

        let payload = FormPayload::new("deep")
            .with_template_fields(fields)
            .with_conversation("x");
        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::UnsupportedAddress(a)) if a == "a.b.c"));
    }

    #[tokio::test]
    async fn test_malformed_schema_fails_before_model_call() {
        let llm = MockProvider::default();
        let handle = llm.clone();
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(json!([{"id": "x", "type": "date", "label": "When"}]))
            .with_conversation("text");

        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::Schema(_))));
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_too_long() {
        let config = ExtractorConfig {
            max_text_length: 10,
            ..Default::default()
        };
        let filler = filler_with(MockProvider::default(), config);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("this conversation is too long");
        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::TextTooLong(_, 10))));
    }

    #[tokio::test]
    async fn test_llm_error() {
        let mut llm = MockProvider::default();
        llm.add_error("Weight");
        let filler = filler(llm);

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("text");
        let result = filler.fill(OWNER, payload).await;
        assert!(matches!(result, Err(ExtractorError::Llm(_))));
    }

    struct SlowProvider;

    impl LlmProvider for SlowProvider {
        type Error = String;

        fn complete(&self, _request: &ModelRequest) -> Result<String, Self::Error> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(r#"{"fields": {}}"#.to_string())
        }
    }

    #[tokio::test]
    async fn test_model_call_timeout() {
        let config = ExtractorConfig::default().with_timeout_secs(1);
        let extractor = FormExtractor::new(SlowProvider, config).unwrap();

        let result = extractor.extract(&vitals_fields(), "text").await;
        assert!(matches!(result, Err(ExtractorError::Timeout)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ExtractorConfig::default().with_confidence_threshold(2.0);
        assert!(matches!(
            FormExtractor::new(MockProvider::default(), config),
            Err(ExtractorError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let llm = MockProvider::new(VITALS_REPLY);
        let filler = filler_with(llm, ExtractorConfig::default().with_confidence_threshold(0.4));

        let payload = FormPayload::new("intake")
            .with_template_fields(vitals_fields())
            .with_conversation("text");
        let record = filler.fill(OWNER, payload).await.unwrap();

        let vitals = record.data["vitals"].as_map().unwrap();
        assert_eq!(vitals["height"], dec("170"));
    }

    #[test]
    fn test_preview_prompt_does_not_call_model() {
        let llm = MockProvider::default();
        let handle = llm.clone();
        let extractor = FormExtractor::new(llm, ExtractorConfig::default()).unwrap();

        let request = extractor.preview_prompt(&vitals_fields(), "hello").unwrap();
        assert!(request.user.contains("ID: vitals.weight"));
        assert_eq!(handle.call_count(), 0);
    }

    #[tokio::test]
    async fn test_fill_from_template() {
        let llm = MockProvider::new(VITALS_REPLY);
        let filler = filler(llm);

        let template = filler
            .create_template(OWNER, Some("Intake".to_string()), Some(vitals_fields()))
            .unwrap();

        let record = filler
            .fill_from_template(OWNER, template.template_id, Some("Weighs 75.5 kg.".to_string()), None)
            .await
            .unwrap();

        assert_eq!(record.template_code, template.template_id.to_string());
        assert_eq!(record.data["vitals"].as_map().unwrap()["weight"], dec("75.5"));
    }

    #[tokio::test]
    async fn test_fill_from_missing_template() {
        let filler = filler(MockProvider::default());
        let result = filler
            .fill_from_template(OWNER, TemplateId::new(), Some("x".to_string()), None)
            .await;
        assert!(matches!(result, Err(ExtractorError::TemplateNotFound(_))));
    }

    #[tokio::test]
    async fn test_template_of_other_owner_is_not_found() {
        let filler = filler(MockProvider::default());
        let template = filler.create_template("someone-else", None, None).unwrap();

        let result = filler
            .fill_from_template(OWNER, template.template_id, Some("x".to_string()), None)
            .await;
        assert!(matches!(result, Err(ExtractorError::TemplateNotFound(_))));
    }

    #[test]
    fn test_template_lifecycle() {
        let filler = filler(MockProvider::default());

        let template = filler.create_template(OWNER, None, None).unwrap();
        assert_eq!(template.name, "Untitled Form");
        assert_eq!(template.fields, json!([]));
        assert_eq!(filler.list_templates(OWNER).unwrap().len(), 1);

        let update = TemplateUpdate {
            name: Some("Intake".to_string()),
            fields: Some(vitals_fields()),
        };
        let updated = filler
            .update_template(template.template_id, OWNER, update)
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Intake");
        assert_eq!(updated.fields, vitals_fields());

        let deleted = filler.delete_template(template.template_id, OWNER).unwrap();
        assert_eq!(deleted, Some(updated));
        assert!(filler.get_template(template.template_id, OWNER).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_template_fields_are_stored_as_given() {
        let filler = filler(MockProvider::default());
        let fields = json!([
            {"id": "name", "type": "short_text", "label": "Name"},
            {"id": "visit", "type": "date", "label": "Visit date"}
        ]);
        let template = filler.create_template(OWNER, None, Some(fields.clone())).unwrap();
        assert_eq!(template.fields, fields);

        // Manual data entry needs no extraction schema
        let record = filler
            .fill_from_template(OWNER, template.template_id, None, Some(json!({"name": "Ada"})))
            .await
            .unwrap();
        assert_eq!(record.data["name"], FormValue::from("Ada"));

        // Extraction still checks the schema before calling the model
        let result = filler
            .fill_from_template(OWNER, template.template_id, Some("Ada came in.".to_string()), None)
            .await;
        assert!(matches!(result, Err(ExtractorError::Schema(_))));
    }

    #[test]
    fn test_template_fields_must_be_array_or_object() {
        let filler = filler(MockProvider::default());
        let result = filler.create_template(OWNER, None, Some(json!("not a schema")));
        assert!(matches!(result, Err(ExtractorError::InvalidPayload(_))));

        let template = filler.create_template(OWNER, None, None).unwrap();
        let update = TemplateUpdate {
            name: None,
            fields: Some(json!(42)),
        };
        let result = filler.update_template(template.template_id, OWNER, update);
        assert!(matches!(result, Err(ExtractorError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_form_update_and_delete() {
        let filler = filler(MockProvider::default());
        let record = filler
            .fill(OWNER, FormPayload::new("intake").with_data(json!({"vitals": {"weight": 70}})))
            .await
            .unwrap();

        let updated = filler
            .update_form(record.form_id, OWNER, &json!({"vitals": {"weight": 71.5}}))
            .unwrap()
            .unwrap();
        assert_eq!(updated.data["vitals"].as_map().unwrap()["weight"], dec("71.5"));
        assert_eq!(updated.created_at, record.created_at);

        assert!(matches!(
            filler.update_form(record.form_id, OWNER, &json!([1])),
            Err(ExtractorError::InvalidPayload(_))
        ));

        assert_eq!(filler.list_forms(OWNER, Some("intake")).unwrap().len(), 1);
        assert!(filler.list_forms(OWNER, Some("other")).unwrap().is_empty());

        let deleted = filler.delete_form(record.form_id, OWNER).unwrap();
        assert_eq!(deleted, Some(updated));
        assert!(filler.get_form(record.form_id, OWNER).unwrap().is_none());
    }
}
