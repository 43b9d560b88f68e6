//! Core extraction pipeline

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::flatten::{flatten_fields, FlattenedSchema};
use crate::parser::{interpret, parse_model_response};
use crate::prompt::PromptBuilder;
use formscribe_domain::traits::{LlmProvider, ModelRequest};
use formscribe_domain::ExtractedForm;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info};

/// Extracts form field values from conversation text with a language model
pub struct FormExtractor<L>
where
    L: LlmProvider,
{
    llm_provider: Arc<L>,
    config: ExtractorConfig,
}

impl<L> FormExtractor<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    /// Create a new extractor
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration does not validate.
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            llm_provider: Arc::new(llm_provider),
            config,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Build the model request without calling the model
    pub fn preview_prompt(&self, fields: &Value, conversation: &str) -> Result<ModelRequest, ExtractorError> {
        let schema = self.prepare(fields, conversation)?;
        Ok(PromptBuilder::new(&schema.descriptors, conversation).build())
    }

    /// Extract values for `fields` from `conversation`
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The conversation is longer than `max_text_length`
    /// - The field schema is malformed
    /// - The model call fails or exceeds the timeout
    /// - The reply breaks the output contract or uses a nested address
    pub async fn extract(&self, fields: &Value, conversation: &str) -> Result<ExtractedForm, ExtractorError> {
        let schema = self.prepare(fields, conversation)?;

        info!(
            "Starting extraction of {} fields, text length {}",
            schema.len(),
            conversation.len()
        );

        let request = PromptBuilder::new(&schema.descriptors, conversation).build();
        debug!("Prompt length: {} chars", request.user.len());

        let response = timeout(self.config.extraction_timeout(), self.call_llm(request))
            .await
            .map_err(|_| ExtractorError::Timeout)??;

        debug!("Raw model response: {}", response);

        let candidates = parse_model_response(&response)?;
        let total = candidates.len();
        let form = interpret(candidates, &schema, self.config.confidence_threshold)?;

        info!(
            "Extraction complete: {} of {} candidates kept in {} sections",
            form.values().map(|fields| fields.len()).sum::<usize>(),
            total,
            form.len()
        );

        Ok(form)
    }

    fn prepare(&self, fields: &Value, conversation: &str) -> Result<FlattenedSchema, ExtractorError> {
        let length = conversation.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(length, self.config.max_text_length));
        }
        Ok(flatten_fields(fields)?)
    }

    async fn call_llm(&self, request: ModelRequest) -> Result<String, ExtractorError> {
        let llm = Arc::clone(&self.llm_provider);
        debug!("Calling model '{}'", self.config.model_name);

        // LlmProvider is synchronous, keep it off the async workers
        tokio::task::spawn_blocking(move || {
            llm.complete(&request)
                .map_err(|e| ExtractorError::Llm(e.to_string()))
        })
        .await
        .map_err(|e| ExtractorError::Llm(format!("Task join error: {}", e)))?
    }
}
