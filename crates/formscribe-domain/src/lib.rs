//! Formscribe Domain Layer
//!
//! This crate contains the core data model for Formscribe: form templates,
//! their typed field schema, filled form records, and the value model used
//! for persisted form data. It also defines the trait interfaces that the
//! infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Field schema**: a declarative tree of sections and typed fields
//! - **Form value**: persisted data as a closed tagged union with no binary
//!   floating-point variant, so every number is stored as an exact decimal
//! - **Filled form**: one owner's populated instance of a template
//! - **Boundaries**: `LlmProvider` and `FormStore` are implemented elsewhere
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Only primitive dependencies (UUIDs, JSON, decimals)
//! - Pure data and validation logic
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod form;
pub mod id;
pub mod schema;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use form::{unix_now, FilledFormRecord, FormTemplate, DEFAULT_TEMPLATE_NAME};
pub use id::{FormId, TemplateId};
pub use schema::{parse_schema, Column, FieldNode, FieldSpec, FieldType, SchemaError};
pub use value::{parse_decimal, ExtractedForm, FieldValue, FormData, FormValue};
