//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction pipeline and
//! infrastructure. Implementations live in other crates and are injected by
//! the caller; core logic never reaches for a global client or table handle.

use crate::form::{FilledFormRecord, FormTemplate};
use crate::id::{FormId, TemplateId};
use crate::value::FormData;

/// A single request to a language model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// System instruction
    pub system: String,

    /// User instruction carrying the data
    pub user: String,

    /// Ask the model to answer with a single JSON object
    pub json_output: bool,
}

/// Trait for language model operations
///
/// Implemented by the infrastructure layer (formscribe-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Send one request and return the raw text of the reply
    fn complete(&self, request: &ModelRequest) -> Result<String, Self::Error>;
}

/// Partial update of a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateUpdate {
    /// New display name
    pub name: Option<String>,

    /// New field schema document
    pub fields: Option<serde_json::Value>,
}

/// Trait for storing templates and filled forms
///
/// Every record is keyed by its id plus the owning user, so one owner can
/// never read or modify another owner's records.
///
/// Implemented by the infrastructure layer (formscribe-store)
pub trait FormStore {
    /// Error type for store operations
    type Error;

    /// Insert a new template
    fn put_template(&mut self, template: FormTemplate) -> Result<(), Self::Error>;

    /// Get a template by id and owner
    fn get_template(&self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, Self::Error>;

    /// List an owner's templates
    fn list_templates(&self, owner_id: &str) -> Result<Vec<FormTemplate>, Self::Error>;

    /// Apply an update, returning the new template or `None` if it does not exist
    fn update_template(
        &mut self,
        id: TemplateId,
        owner_id: &str,
        update: TemplateUpdate,
        updated_at: u64,
    ) -> Result<Option<FormTemplate>, Self::Error>;

    /// Delete a template, returning what was removed
    fn delete_template(&mut self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, Self::Error>;

    /// Insert a new filled form
    fn put_form(&mut self, record: FilledFormRecord) -> Result<(), Self::Error>;

    /// Get a filled form by id and owner
    fn get_form(&self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, Self::Error>;

    /// List an owner's filled forms, optionally only those of one template code
    fn list_forms(
        &self,
        owner_id: &str,
        template_code: Option<&str>,
    ) -> Result<Vec<FilledFormRecord>, Self::Error>;

    /// Replace a form's data, returning the new record or `None` if it does not exist
    fn update_form_data(
        &mut self,
        id: FormId,
        owner_id: &str,
        data: FormData,
        updated_at: u64,
    ) -> Result<Option<FilledFormRecord>, Self::Error>;

    /// Delete a filled form, returning what was removed
    fn delete_form(&mut self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, Self::Error>;
}
