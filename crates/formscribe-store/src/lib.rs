//! Formscribe Storage Layer
//!
//! Implements the `FormStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One table per record kind, keyed by `(id, owner_id)`
//! - Template field schemas and form data are stored as JSON text
//! - Form data is written through `FormValue`, so decimals keep their exact
//!   digits across a write/read round-trip
//!
//! # Examples
//!
//! ```no_run
//! use formscribe_store::SqliteStore;
//!
//! let store = SqliteStore::new("formscribe.db").unwrap();
//! // Store is now ready for template and form operations
//! ```

#![warn(missing_docs)]

use formscribe_domain::traits::{FormStore, TemplateUpdate};
use formscribe_domain::{FilledFormRecord, FormData, FormId, FormTemplate, TemplateId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored JSON could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A record with the same key already exists
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

/// SQLite-based implementation of FormStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks
/// behind a mutex, or give each thread its own SqliteStore.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a fresh in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn template_exists(&self, id: TemplateId, owner_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM form_templates WHERE template_id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false))
    }

    fn form_exists(&self, id: FormId, owner_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM filled_forms WHERE form_id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false))
    }
}

/// Raw template row, decoded outside the rusqlite closure
struct TemplateRow {
    template_id: String,
    owner_id: String,
    name: String,
    fields: String,
    created_at: i64,
    updated_at: i64,
}

impl TemplateRow {
    const COLUMNS: &'static str = "template_id, owner_id, name, fields, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            template_id: row.get(0)?,
            owner_id: row.get(1)?,
            name: row.get(2)?,
            fields: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_template(self) -> Result<FormTemplate, StoreError> {
        Ok(FormTemplate {
            template_id: TemplateId::from_string(&self.template_id).map_err(StoreError::InvalidData)?,
            owner_id: self.owner_id,
            name: self.name,
            fields: serde_json::from_str(&self.fields)?,
            created_at: self.created_at as u64,
            updated_at: self.updated_at as u64,
        })
    }
}

/// Raw filled form row, decoded outside the rusqlite closure
struct FormRow {
    form_id: String,
    owner_id: String,
    template_code: String,
    data: String,
    created_at: i64,
    updated_at: i64,
}

impl FormRow {
    const COLUMNS: &'static str = "form_id, owner_id, template_code, data, created_at, updated_at";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            form_id: row.get(0)?,
            owner_id: row.get(1)?,
            template_code: row.get(2)?,
            data: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_record(self) -> Result<FilledFormRecord, StoreError> {
        Ok(FilledFormRecord {
            form_id: FormId::from_string(&self.form_id).map_err(StoreError::InvalidData)?,
            owner_id: self.owner_id,
            template_code: self.template_code,
            data: serde_json::from_str::<FormData>(&self.data)?,
            created_at: self.created_at as u64,
            updated_at: self.updated_at as u64,
        })
    }
}

impl FormStore for SqliteStore {
    type Error = StoreError;

    fn put_template(&mut self, template: FormTemplate) -> Result<(), Self::Error> {
        if self.template_exists(template.template_id, &template.owner_id)? {
            return Err(StoreError::Duplicate(template.template_id.to_string()));
        }

        self.conn.execute(
            "INSERT INTO form_templates (template_id, owner_id, name, fields, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                template.template_id.to_string(),
                &template.owner_id,
                &template.name,
                serde_json::to_string(&template.fields)?,
                template.created_at as i64,
                template.updated_at as i64,
            ],
        )?;

        debug!("Stored template {} for owner {}", template.template_id, template.owner_id);
        Ok(())
    }

    fn get_template(&self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM form_templates WHERE template_id = ?1 AND owner_id = ?2",
            TemplateRow::COLUMNS
        );
        self.conn
            .query_row(&sql, params![id.to_string(), owner_id], TemplateRow::from_row)
            .optional()?
            .map(TemplateRow::into_template)
            .transpose()
    }

    fn list_templates(&self, owner_id: &str) -> Result<Vec<FormTemplate>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM form_templates WHERE owner_id = ?1 ORDER BY created_at, template_id",
            TemplateRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_id], TemplateRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(TemplateRow::into_template).collect()
    }

    fn update_template(
        &mut self,
        id: TemplateId,
        owner_id: &str,
        update: TemplateUpdate,
        updated_at: u64,
    ) -> Result<Option<FormTemplate>, Self::Error> {
        let Some(mut template) = self.get_template(id, owner_id)? else {
            return Ok(None);
        };

        if let Some(name) = update.name {
            template.name = name;
        }
        if let Some(fields) = update.fields {
            template.fields = fields;
        }
        template.updated_at = updated_at;

        self.conn.execute(
            "UPDATE form_templates SET name = ?1, fields = ?2, updated_at = ?3
             WHERE template_id = ?4 AND owner_id = ?5",
            params![
                &template.name,
                serde_json::to_string(&template.fields)?,
                updated_at as i64,
                id.to_string(),
                owner_id,
            ],
        )?;

        Ok(Some(template))
    }

    fn delete_template(&mut self, id: TemplateId, owner_id: &str) -> Result<Option<FormTemplate>, Self::Error> {
        let existing = self.get_template(id, owner_id)?;
        if existing.is_some() {
            self.conn.execute(
                "DELETE FROM form_templates WHERE template_id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id],
            )?;
        }
        Ok(existing)
    }

    fn put_form(&mut self, record: FilledFormRecord) -> Result<(), Self::Error> {
        if self.form_exists(record.form_id, &record.owner_id)? {
            return Err(StoreError::Duplicate(record.form_id.to_string()));
        }

        self.conn.execute(
            "INSERT INTO filled_forms (form_id, owner_id, template_code, data, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.form_id.to_string(),
                &record.owner_id,
                &record.template_code,
                serde_json::to_string(&record.data)?,
                record.created_at as i64,
                record.updated_at as i64,
            ],
        )?;

        debug!("Stored form {} for owner {}", record.form_id, record.owner_id);
        Ok(())
    }

    fn get_form(&self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM filled_forms WHERE form_id = ?1 AND owner_id = ?2",
            FormRow::COLUMNS
        );
        self.conn
            .query_row(&sql, params![id.to_string(), owner_id], FormRow::from_row)
            .optional()?
            .map(FormRow::into_record)
            .transpose()
    }

    fn list_forms(
        &self,
        owner_id: &str,
        template_code: Option<&str>,
    ) -> Result<Vec<FilledFormRecord>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM filled_forms
             WHERE owner_id = ?1 AND (?2 IS NULL OR template_code = ?2)
             ORDER BY created_at, form_id",
            FormRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![owner_id, template_code], FormRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Query returned {} forms for owner {}", rows.len(), owner_id);
        rows.into_iter().map(FormRow::into_record).collect()
    }

    fn update_form_data(
        &mut self,
        id: FormId,
        owner_id: &str,
        data: FormData,
        updated_at: u64,
    ) -> Result<Option<FilledFormRecord>, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE filled_forms SET data = ?1, updated_at = ?2 WHERE form_id = ?3 AND owner_id = ?4",
            params![
                serde_json::to_string(&data)?,
                updated_at as i64,
                id.to_string(),
                owner_id,
            ],
        )?;

        if changed == 0 {
            return Ok(None);
        }
        self.get_form(id, owner_id)
    }

    fn delete_form(&mut self, id: FormId, owner_id: &str) -> Result<Option<FilledFormRecord>, Self::Error> {
        let existing = self.get_form(id, owner_id)?;
        if existing.is_some() {
            self.conn.execute(
                "DELETE FROM filled_forms WHERE form_id = ?1 AND owner_id = ?2",
                params![id.to_string(), owner_id],
            )?;
        }
        Ok(existing)
    }
}
