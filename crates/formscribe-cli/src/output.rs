//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use formscribe_domain::traits::ModelRequest;
use formscribe_domain::{ExtractedForm, FilledFormRecord, FormData, FormTemplate, FormValue};
use formscribe_extractor::{flatten_fields, render_field};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a list of templates.
    pub fn format_templates(&self, templates: &[FormTemplate]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(templates)?),
            OutputFormat::Quiet => Ok(join_ids(templates.iter().map(|t| t.template_id.to_string()))),
            OutputFormat::Table => {
                if templates.is_empty() {
                    return Ok(self.colorize("No templates found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Name", "Fields", "Created", "Updated"]);
                for template in templates {
                    let field_count = flatten_fields(&template.fields)
                        .map(|schema| schema.len().to_string())
                        .unwrap_or_else(|_| "invalid".to_string());
                    builder.push_record([
                        template.template_id.to_string(),
                        template.name.clone(),
                        field_count,
                        template.created_at.to_string(),
                        template.updated_at.to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format one template with its field list.
    pub fn format_template(&self, template: &FormTemplate) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(template)?),
            OutputFormat::Quiet => Ok(template.template_id.to_string()),
            OutputFormat::Table => {
                let mut out = format!(
                    "{} {}\n",
                    self.colorize(&template.name, "cyan"),
                    template.template_id
                );
                match flatten_fields(&template.fields) {
                    Ok(schema) => {
                        for descriptor in &schema.descriptors {
                            out.push_str(&render_field(descriptor));
                            out.push('\n');
                        }
                    }
                    Err(e) => out.push_str(&self.warning(&format!("Invalid fields: {}", e))),
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    /// Format a list of filled forms.
    pub fn format_forms(&self, forms: &[FilledFormRecord]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(forms)?),
            OutputFormat::Quiet => Ok(join_ids(forms.iter().map(|f| f.form_id.to_string()))),
            OutputFormat::Table => {
                if forms.is_empty() {
                    return Ok(self.colorize("No forms found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Template", "Sections", "Created", "Updated"]);
                for form in forms {
                    let sections: Vec<&str> = form.data.keys().map(String::as_str).collect();
                    builder.push_record([
                        form.form_id.to_string(),
                        form.template_code.clone(),
                        sections.join(", "),
                        form.created_at.to_string(),
                        form.updated_at.to_string(),
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format one filled form with its data.
    pub fn format_form(&self, form: &FilledFormRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(form)?),
            OutputFormat::Quiet => Ok(form.form_id.to_string()),
            OutputFormat::Table => Ok(format!(
                "{} {} ({})\n{}",
                self.colorize("Form", "cyan"),
                form.form_id,
                form.template_code,
                self.data_table(&form.data)
            )),
        }
    }

    /// Format the result of a dry-run extraction.
    pub fn format_extracted(&self, form: &ExtractedForm) -> Result<String> {
        let data: FormData = form
            .iter()
            .map(|(section, fields)| (section.clone(), FormValue::Map(fields.clone())))
            .collect();

        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&data)?),
            OutputFormat::Quiet => Ok(serde_json::to_string(&data)?),
            OutputFormat::Table => Ok(self.data_table(&data)),
        }
    }

    /// Format a prompt preview.
    pub fn format_prompt(&self, request: &ModelRequest) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "system": request.system,
                "user": request.user,
                "json_output": request.json_output,
            }))?),
            OutputFormat::Quiet => Ok(request.user.clone()),
            OutputFormat::Table => Ok(format!(
                "{}\n{}\n\n{}\n{}",
                self.colorize("System:", "cyan"),
                request.system,
                self.colorize("User:", "cyan"),
                request.user
            )),
        }
    }

    fn data_table(&self, data: &FormData) -> String {
        if data.is_empty() {
            return self.colorize("No values.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Section", "Field", "Value"]);
        for (section, value) in data {
            match value {
                FormValue::Map(fields) => {
                    for (field, value) in fields {
                        builder.push_record([section.clone(), field.clone(), display_value(value)]);
                    }
                }
                other => builder.push_record([section.clone(), "-".to_string(), display_value(other)]),
            }
        }
        render(builder)
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn join_ids(ids: impl Iterator<Item = String>) -> String {
    ids.collect::<Vec<_>>().join("\n")
}

/// Text shown for a value in a table cell.
fn display_value(value: &FormValue) -> String {
    match value {
        FormValue::Text(s) => s.clone(),
        other => other.to_json().to_string(),
    }
}
