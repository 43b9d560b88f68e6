//! Form filling and record management
//!
//! [`FormFiller`] ties the extractor to a [`FormStore`]: it merges extracted
//! and explicit data into a [`FilledFormRecord`] and persists it, and exposes
//! the template and form operations of the store with owner scoping.

use crate::error::ExtractorError;
use crate::extractor::FormExtractor;
use crate::merge::{convert_form_data, merge_form_data, FormPayload};
use formscribe_domain::traits::{FormStore, LlmProvider, TemplateUpdate};
use formscribe_domain::{unix_now, FilledFormRecord, FormId, FormTemplate, TemplateId};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Fills forms and manages templates for one store
pub struct FormFiller<L, S>
where
    L: LlmProvider,
    S: FormStore,
{
    extractor: FormExtractor<L>,
    store: Arc<Mutex<S>>,
}

impl<L, S> FormFiller<L, S>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
    S: FormStore,
    S::Error: std::fmt::Display,
{
    /// Create a filler owning `store`
    pub fn new(extractor: FormExtractor<L>, store: S) -> Self {
        Self::with_shared_store(extractor, Arc::new(Mutex::new(store)))
    }

    /// Create a filler on a store shared with other components
    pub fn with_shared_store(extractor: FormExtractor<L>, store: Arc<Mutex<S>>) -> Self {
        Self { extractor, store }
    }

    /// The underlying extractor
    pub fn extractor(&self) -> &FormExtractor<L> {
        &self.extractor
    }

    /// Fill and persist a new form
    ///
    /// Extraction runs only when the payload carries both template fields and
    /// conversation text. Explicit `data` keys replace extracted sections.
    pub async fn fill(&self, owner_id: &str, payload: FormPayload) -> Result<FilledFormRecord, ExtractorError> {
        let template_code = payload.require_template_code()?.to_string();

        let extracted = match payload.extraction_input() {
            Some((fields, conversation)) => Some(self.extractor.extract(fields, conversation).await?),
            None => None,
        };

        let data = merge_form_data(extracted, payload.data.as_ref())?;
        let record = FilledFormRecord::new(owner_id, template_code, data, unix_now());

        self.lock()?.put_form(record.clone()).map_err(store_error)?;

        info!(
            "Created form {} for template '{}' with {} sections",
            record.form_id,
            record.template_code,
            record.data.len()
        );
        Ok(record)
    }

    /// Fill a form from a stored template's field schema
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` if the owner has no such template.
    pub async fn fill_from_template(
        &self,
        owner_id: &str,
        template_id: TemplateId,
        conversation_text: Option<String>,
        data: Option<Value>,
    ) -> Result<FilledFormRecord, ExtractorError> {
        let template = self
            .get_template(template_id, owner_id)?
            .ok_or_else(|| ExtractorError::TemplateNotFound(template_id.to_string()))?;

        let payload = FormPayload {
            template_code: Some(template_id.to_string()),
            data,
            template_fields: Some(template.fields),
            conversation_text,
        };
        self.fill(owner_id, payload).await
    }

    /// Create a template
    ///
    /// `fields` is stored as given; it is checked against the extraction
    /// schema only when a form is filled from it.
    pub fn create_template(
        &self,
        owner_id: &str,
        name: Option<String>,
        fields: Option<Value>,
    ) -> Result<FormTemplate, ExtractorError> {
        let fields = fields.unwrap_or_else(|| Value::Array(Vec::new()));
        check_fields_container(&fields)?;

        let template = FormTemplate::new(owner_id, name, fields);
        self.lock()?.put_template(template.clone()).map_err(store_error)?;

        info!("Created template {} '{}'", template.template_id, template.name);
        Ok(template)
    }

    /// Get a template
    pub fn get_template(&self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, ExtractorError> {
        self.lock()?.get_template(id, owner_id).map_err(store_error)
    }

    /// List an owner's templates
    pub fn list_templates(&self, owner_id: &str) -> Result<Vec<FormTemplate>, ExtractorError> {
        self.lock()?.list_templates(owner_id).map_err(store_error)
    }

    /// Rename a template and/or replace its fields
    pub fn update_template(
        &self,
        id: TemplateId,
        owner_id: &str,
        update: TemplateUpdate,
    ) -> Result<Option<FormTemplate>, ExtractorError> {
        if let Some(fields) = &update.fields {
            check_fields_container(fields)?;
        }
        let updated = self
            .lock()?
            .update_template(id, owner_id, update, unix_now())
            .map_err(store_error)?;
        debug!("Updated template {}: {}", id, updated.is_some());
        Ok(updated)
    }

    /// Delete a template, returning it
    pub fn delete_template(&self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, ExtractorError> {
        self.lock()?.delete_template(id, owner_id).map_err(store_error)
    }

    /// Get a filled form
    pub fn get_form(&self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, ExtractorError> {
        self.lock()?.get_form(id, owner_id).map_err(store_error)
    }

    /// List an owner's filled forms, optionally for one template code
    pub fn list_forms(
        &self,
        owner_id: &str,
        template_code: Option<&str>,
    ) -> Result<Vec<FilledFormRecord>, ExtractorError> {
        self.lock()?.list_forms(owner_id, template_code).map_err(store_error)
    }

    /// Replace a form's data
    pub fn update_form(
        &self,
        id: FormId,
        owner_id: &str,
        data: &Value,
    ) -> Result<Option<FilledFormRecord>, ExtractorError> {
        let data = convert_form_data(data)?;
        let updated = self
            .lock()?
            .update_form_data(id, owner_id, data, unix_now())
            .map_err(store_error)?;
        debug!("Updated form {}: {}", id, updated.is_some());
        Ok(updated)
    }

    /// Delete a form, returning it
    pub fn delete_form(&self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, ExtractorError> {
        self.lock()?.delete_form(id, owner_id).map_err(store_error)
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, ExtractorError> {
        self.store
            .lock()
            .map_err(|e| ExtractorError::Store(format!("Lock error: {}", e)))
    }
}

fn check_fields_container(fields: &Value) -> Result<(), ExtractorError> {
    if fields.is_array() || fields.is_object() {
        Ok(())
    } else {
        Err(ExtractorError::InvalidPayload(
            "'fields' must be a JSON array or object".to_string(),
        ))
    }
}

fn store_error<E: std::fmt::Display>(e: E) -> ExtractorError {
    ExtractorError::Store(e.to_string())
}
