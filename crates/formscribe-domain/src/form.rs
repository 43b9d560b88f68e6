//! Form templates and filled form records

use crate::id::{FormId, TemplateId};
use crate::value::FormData;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name given to templates created without one
pub const DEFAULT_TEMPLATE_NAME: &str = "Untitled Form";

/// A form template owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    /// Unique identifier
    pub template_id: TemplateId,

    /// Owning user
    pub owner_id: String,

    /// Display name
    pub name: String,

    /// Field schema document, kept exactly as declared
    pub fields: serde_json::Value,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,

    /// Last modification time (seconds since Unix epoch)
    pub updated_at: u64,
}

impl FormTemplate {
    /// Create a new template stamped with the current time
    pub fn new(owner_id: impl Into<String>, name: Option<String>, fields: serde_json::Value) -> Self {
        let now = unix_now();
        Self {
            template_id: TemplateId::new(),
            owner_id: owner_id.into(),
            name: name.unwrap_or_else(|| DEFAULT_TEMPLATE_NAME.to_string()),
            fields,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A populated instance of a template
///
/// Created once per fill; updates replace `data` and `updated_at` in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledFormRecord {
    /// Unique identifier
    pub form_id: FormId,

    /// Owning user
    pub owner_id: String,

    /// Code of the template this form was filled from
    pub template_code: String,

    /// Section to field to value; never contains a binary float
    pub data: FormData,

    /// Creation time (seconds since Unix epoch)
    pub created_at: u64,

    /// Last modification time (seconds since Unix epoch)
    pub updated_at: u64,
}

impl FilledFormRecord {
    /// Create a new record stamped with `now`
    pub fn new(owner_id: impl Into<String>, template_code: impl Into<String>, data: FormData, now: u64) -> Self {
        Self {
            form_id: FormId::new(),
            owner_id: owner_id.into(),
            template_code: template_code.into(),
            data,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Current time in whole seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
