//! Template command implementation.

use crate::cli::{TemplateAction, TemplateArgs};
use crate::commands::{confirm, read_json};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Filler;
use formscribe_domain::traits::{LlmProvider, TemplateUpdate};
use formscribe_domain::TemplateId;

/// Execute a template command.
pub fn execute_template<L>(
    args: TemplateArgs,
    filler: &Filler<L>,
    owner_id: &str,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    match args.action {
        TemplateAction::Create { name, fields } => {
            let fields = fields.as_deref().map(read_json).transpose()?;
            let template = filler.create_template(owner_id, name, fields)?;
            println!(
                "{}",
                formatter.success(&format!("Template created: {}", template.template_id))
            );
        }
        TemplateAction::List => {
            let templates = filler.list_templates(owner_id)?;
            println!("{}", formatter.format_templates(&templates)?);
        }
        TemplateAction::Get { id } => {
            let id = parse_template_id(&id)?;
            let template = filler
                .get_template(id, owner_id)?
                .ok_or_else(|| CliError::NotFound(format!("template {}", id)))?;
            println!("{}", formatter.format_template(&template)?);
        }
        TemplateAction::Update { id, name, fields } => {
            if name.is_none() && fields.is_none() {
                return Err(CliError::InvalidInput(
                    "Nothing to update: pass --name and/or --fields".to_string(),
                ));
            }
            let id = parse_template_id(&id)?;
            let update = TemplateUpdate {
                name,
                fields: fields.as_deref().map(read_json).transpose()?,
            };
            let template = filler
                .update_template(id, owner_id, update)?
                .ok_or_else(|| CliError::NotFound(format!("template {}", id)))?;
            println!("{}", formatter.format_template(&template)?);
        }
        TemplateAction::Delete { id, yes } => {
            let id = parse_template_id(&id)?;
            if !yes && !confirm(&format!("Delete template {}?", id))? {
                println!("{}", formatter.info("Operation cancelled"));
                return Ok(());
            }
            match filler.delete_template(id, owner_id)? {
                Some(template) => println!(
                    "{}",
                    formatter.success(&format!("Deleted template '{}'", template.name))
                ),
                None => return Err(CliError::NotFound(format!("template {}", id))),
            }
        }
    }

    Ok(())
}

/// Parse a template ID argument.
pub(crate) fn parse_template_id(id: &str) -> Result<TemplateId> {
    TemplateId::from_string(id)
        .map_err(|e| CliError::InvalidInput(format!("Invalid template ID '{}': {}", id, e)))
}
