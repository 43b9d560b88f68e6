//! Field schema of a form template
//!
//! Templates declare their fields as a JSON tree. [`parse_schema`] turns that
//! document into typed [`FieldNode`]s and fails fast on the first malformed
//! node, naming its path; nothing is silently skipped.

use serde_json::{json, Map, Value};
use std::fmt;

/// Declared type of a leaf field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Single-line text
    Text,
    /// Multi-line text
    Textarea,
    /// Formatted text
    RichText,
    /// Numeric value
    Number,
    /// Telephone number
    Tel,
    /// Email address
    Email,
    /// One choice out of `options`
    Select,
    /// Several choices out of `options`
    MultipleSelect,
    /// Checked boxes out of `options`
    CheckboxGroup,
    /// Rows of column values
    Table,
}

impl FieldType {
    /// All field types, in declaration order
    pub const ALL: [FieldType; 10] = [
        FieldType::Text,
        FieldType::Textarea,
        FieldType::RichText,
        FieldType::Number,
        FieldType::Tel,
        FieldType::Email,
        FieldType::Select,
        FieldType::MultipleSelect,
        FieldType::CheckboxGroup,
        FieldType::Table,
    ];

    /// Wire name of the type as it appears in template documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::RichText => "rich_text",
            FieldType::Number => "number",
            FieldType::Tel => "tel",
            FieldType::Email => "email",
            FieldType::Select => "select",
            FieldType::MultipleSelect => "multiple_select",
            FieldType::CheckboxGroup => "checkbox_group",
            FieldType::Table => "table",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        FieldType::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column of a table field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column key inside each row
    pub id: String,
    /// Human-readable column name
    pub label: String,
}

/// A leaf field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field id, unique among its siblings
    pub id: String,
    /// Human-readable label
    pub label: String,
    /// Declared type
    pub field_type: FieldType,
    /// Whether the form requires this field
    pub required: bool,
    /// Allowed choices for selection fields
    pub options: Option<Vec<String>>,
    /// Column schema; present exactly for table fields
    pub columns: Option<Vec<Column>>,
}

impl FieldSpec {
    /// Example of the expected value, shown to the model next to the field
    pub fn example_value(&self) -> String {
        let options = self.options.as_deref().filter(|o| !o.is_empty());
        match (self.field_type, options) {
            (FieldType::Table, _) => {
                let row: Map<String, Value> = self
                    .columns
                    .iter()
                    .flatten()
                    .map(|c| (c.id.clone(), json!(format!("value for {}", c.label))))
                    .collect();
                Value::Array(vec![Value::Object(row)]).to_string()
            }
            (FieldType::Text, _) => "text value".to_string(),
            (FieldType::Number, _) => "numeric value".to_string(),
            (FieldType::Textarea | FieldType::RichText, _) => "detailed text".to_string(),
            (FieldType::Select, Some(opts)) => format!("one of: {}", opts.join(", ")),
            (FieldType::MultipleSelect, Some(opts)) => format!("array of: {}", opts.join(", ")),
            (FieldType::CheckboxGroup, Some(opts)) => {
                format!("array of selected: {}", opts.join(", "))
            }
            _ => "value".to_string(),
        }
    }
}

/// A node of the field tree
#[derive(Debug, Clone, PartialEq)]
pub enum FieldNode {
    /// A section or group containing further nodes
    Section {
        /// Section id, becomes the address prefix of its children
        id: String,
        /// Human-readable label
        label: String,
        /// Child nodes in declaration order
        fields: Vec<FieldNode>,
    },
    /// A leaf field
    Field(FieldSpec),
}

impl FieldNode {
    /// Number of leaf fields in this subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            FieldNode::Section { fields, .. } => fields.iter().map(FieldNode::leaf_count).sum(),
            FieldNode::Field(_) => 1,
        }
    }
}

/// A malformed or incomplete field schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    /// Location of the offending node (e.g. `fields[1].fields[0]`)
    pub path: String,
    /// What is wrong with it
    pub reason: String,
}

impl SchemaError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for SchemaError {}

/// Parse a template's field document.
///
/// Two shapes are accepted:
/// - a tree: an array of nodes, where `section`/`group` nodes carry `fields`
/// - a section map: `{"<section>": {"<field id>": {"type", "label", ...}}}`
pub fn parse_schema(document: &Value) -> Result<Vec<FieldNode>, SchemaError> {
    match document {
        Value::Array(nodes) => parse_nodes(nodes, "fields"),
        Value::Object(sections) => parse_section_map(sections),
        _ => Err(SchemaError::new(
            "$",
            "field schema must be an array of nodes or a map of sections",
        )),
    }
}

fn parse_nodes(nodes: &[Value], path: &str) -> Result<Vec<FieldNode>, SchemaError> {
    nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| parse_node(node, &format!("{}[{}]", path, idx)))
        .collect()
}

fn parse_node(node: &Value, path: &str) -> Result<FieldNode, SchemaError> {
    let obj = node
        .as_object()
        .ok_or_else(|| SchemaError::new(path, "node is not an object"))?;

    let id = required_str(obj, "id", path)?;
    let kind = required_str(obj, "type", path)?;
    let label = required_str(obj, "label", path)?;

    match kind.as_str() {
        "section" | "group" => {
            let children = obj
                .get("fields")
                .and_then(Value::as_array)
                .ok_or_else(|| SchemaError::new(path, format!("{} is missing 'fields'", kind)))?;
            Ok(FieldNode::Section {
                id,
                label,
                fields: parse_nodes(children, &format!("{}.fields", path))?,
            })
        }
        _ => parse_field(id, label, &kind, obj, path).map(FieldNode::Field),
    }
}

fn parse_section_map(sections: &Map<String, Value>) -> Result<Vec<FieldNode>, SchemaError> {
    let mut nodes = Vec::with_capacity(sections.len());
    for (section_id, fields) in sections {
        let fields = fields.as_object().ok_or_else(|| {
            SchemaError::new(section_id, "section must map field ids to field configs")
        })?;

        let mut children = Vec::with_capacity(fields.len());
        for (field_id, config) in fields {
            let path = format!("{}.{}", section_id, field_id);
            let obj = config
                .as_object()
                .ok_or_else(|| SchemaError::new(&path, "field config is not an object"))?;
            let kind = required_str(obj, "type", &path)?;
            let label = required_str(obj, "label", &path)?;
            children.push(FieldNode::Field(parse_field(
                field_id.clone(),
                label,
                &kind,
                obj,
                &path,
            )?));
        }

        nodes.push(FieldNode::Section {
            id: section_id.clone(),
            label: section_id.clone(),
            fields: children,
        });
    }
    Ok(nodes)
}

fn parse_field(
    id: String,
    label: String,
    kind: &str,
    obj: &Map<String, Value>,
    path: &str,
) -> Result<FieldSpec, SchemaError> {
    let field_type = FieldType::parse(kind)
        .ok_or_else(|| SchemaError::new(path, format!("unsupported field type '{}'", kind)))?;

    let required = obj.get("required").and_then(Value::as_bool).unwrap_or(false);

    let options = match obj.get("options") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|o| {
                    o.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| SchemaError::new(path, "options must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => return Err(SchemaError::new(path, "options must be an array")),
    };

    let columns = if field_type == FieldType::Table {
        let raw = obj
            .get("columns")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::new(path, "table is missing 'columns'"))?;
        let mut columns = Vec::with_capacity(raw.len());
        for (idx, column) in raw.iter().enumerate() {
            let col_path = format!("{}.columns[{}]", path, idx);
            let col = column
                .as_object()
                .ok_or_else(|| SchemaError::new(&col_path, "column is not an object"))?;
            columns.push(Column {
                id: required_str(col, "id", &col_path)?,
                label: required_str(col, "label", &col_path)?,
            });
        }
        Some(columns)
    } else {
        None
    };

    Ok(FieldSpec {
        id,
        label,
        field_type,
        required,
        options,
        columns,
    })
}

fn required_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String, SchemaError> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SchemaError::new(path, format!("missing or invalid '{}'", key)))
}
