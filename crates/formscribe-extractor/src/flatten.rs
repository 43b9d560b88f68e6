//! Field schema flattening
//!
//! Walks a field tree depth-first and produces one [`FieldDescriptor`] per
//! leaf, addressed by the dot-joined ids of its enclosing sections
//! (`vitals.weight`). A table is a leaf; its columns travel with it.

use formscribe_domain::{parse_schema, Column, FieldNode, FieldType, SchemaError};
use serde_json::Value;
use std::collections::HashMap;

/// Separator between address segments
pub const ADDRESS_SEPARATOR: char = '.';

/// One addressable field of a flattened schema
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Dot-delimited path, e.g. `vitals.weight`
    pub address: String,
    /// Declared type
    pub field_type: FieldType,
    /// Human-readable label
    pub label: String,
    /// Whether the template marks the field as required
    pub required: bool,
    /// Allowed choices for selection fields
    pub options: Option<Vec<String>>,
    /// Column schema of table fields
    pub columns: Option<Vec<Column>>,
    /// Example of the expected value
    pub example: String,
}

/// Result of one flattening pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedSchema {
    /// Descriptors in declaration order
    pub descriptors: Vec<FieldDescriptor>,
    types: HashMap<String, FieldType>,
}

impl FlattenedSchema {
    /// Declared type of the field at `address`
    pub fn field_type(&self, address: &str) -> Option<FieldType> {
        self.types.get(address).copied()
    }

    /// Number of leaf fields
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the schema has no fields at all
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Flatten parsed field nodes
///
/// # Errors
///
/// Returns `SchemaError` if two leaves end up with the same address.
pub fn flatten(nodes: &[FieldNode]) -> Result<FlattenedSchema, SchemaError> {
    let mut schema = FlattenedSchema::default();
    walk(nodes, "", &mut schema)?;
    Ok(schema)
}

/// Parse and flatten a template's raw field document
pub fn flatten_fields(document: &Value) -> Result<FlattenedSchema, SchemaError> {
    flatten(&parse_schema(document)?)
}

fn walk(nodes: &[FieldNode], prefix: &str, schema: &mut FlattenedSchema) -> Result<(), SchemaError> {
    for node in nodes {
        match node {
            FieldNode::Section { id, fields, .. } => {
                let prefix = format!("{}{}{}", prefix, id, ADDRESS_SEPARATOR);
                walk(fields, &prefix, schema)?;
            }
            FieldNode::Field(leaf) => {
                let address = format!("{}{}", prefix, leaf.id);
                if schema.types.insert(address.clone(), leaf.field_type).is_some() {
                    return Err(SchemaError {
                        path: address,
                        reason: "duplicate field address".to_string(),
                    });
                }
                schema.descriptors.push(FieldDescriptor {
                    address,
                    field_type: leaf.field_type,
                    label: leaf.label.clone(),
                    required: leaf.required,
                    options: leaf.options.clone(),
                    columns: leaf.columns.clone(),
                    example: leaf.example_value(),
                });
            }
        }
    }
    Ok(())
}
