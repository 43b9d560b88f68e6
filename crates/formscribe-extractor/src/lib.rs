//! Formscribe Extractor
//!
//! Fills structured form templates from unstructured conversation text.
//!
//! # Architecture
//!
//! ```text
//! fields → flatten → prompt → LLM → parse → promote → coerce → merge → FormStore
//! ```
//!
//! - **Flattening**: the nested field tree becomes addressable descriptors
//!   (`vitals.weight`) plus an address → type lookup
//! - **Prompting**: descriptors and conversation become one model request
//!   with a strict JSON output contract
//! - **Interpretation**: the reply is validated as a whole, low-confidence
//!   candidates are dropped and survivors are nested by section
//! - **Coercion**: every value takes the shape its field type requires;
//!   numbers become exact decimals
//! - **Merge**: explicit data overrides extracted sections before the record
//!   is stored
//!
//! # Example Usage
//!
//! ```no_run
//! use formscribe_extractor::{ExtractorConfig, FormExtractor, FormFiller, FormPayload};
//! use formscribe_llm::MockProvider;
//! use formscribe_store::SqliteStore;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"fields": {
//!     "vitals.weight": {"value": 75, "source_quote": "75 kg", "confidence": 0.95}
//! }}"#);
//! let extractor = FormExtractor::new(llm, ExtractorConfig::default())?;
//! let filler = FormFiller::new(extractor, SqliteStore::in_memory()?);
//!
//! let payload = FormPayload::new("intake")
//!     .with_template_fields(json!({"vitals": {"weight": {"type": "number", "label": "Weight"}}}))
//!     .with_conversation("The patient weighs 75 kg.");
//!
//! let record = filler.fill("user-1", payload).await?;
//! println!("Stored form {}", record.form_id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod coerce;
mod config;
mod error;
mod extractor;
mod filler;
mod flatten;
mod merge;
mod parser;
mod prompt;

#[cfg(test)]
mod tests;

pub use coerce::{coerce, convert_floats_to_decimals};
pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::FormExtractor;
pub use filler::FormFiller;
pub use flatten::{flatten, flatten_fields, FieldDescriptor, FlattenedSchema, ADDRESS_SEPARATOR};
pub use merge::{convert_form_data, merge_form_data, FormPayload};
pub use parser::{interpret, parse_model_response, split_address, ExtractionCandidate};
pub use prompt::{render_field, PromptBuilder};
