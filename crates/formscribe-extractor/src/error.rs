//! Error types for the extraction pipeline

use formscribe_domain::SchemaError;
use thiserror::Error;

/// Errors that can occur while extracting or filling a form
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The template's field schema is malformed
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The model reply does not match the output contract
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A promoted address is not exactly `section.field`
    #[error("Unsupported field address '{0}': expected exactly one '.' separator")]
    UnsupportedAddress(String),

    /// The caller payload lacks a required key
    #[error("Missing required field: {0}")]
    RequiredFieldMissing(String),

    /// The caller payload has the wrong shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// LLM provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Form store error
    #[error("Store error: {0}")]
    Store(String),

    /// Conversation text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Model call did not finish in time
    #[error("Extraction timeout")]
    Timeout,

    /// No template with this id for this owner
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::InvalidPayload(e.to_string())
    }
}
