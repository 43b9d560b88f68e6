//! Form command implementation.

use crate::cli::{FillArgs, FormAction, FormArgs};
use crate::commands::template::parse_template_id;
use crate::commands::{confirm, read_input, read_json};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Filler;
use formscribe_domain::traits::LlmProvider;
use formscribe_domain::{FilledFormRecord, FormId};
use formscribe_extractor::FormPayload;

/// Execute a form command.
pub async fn execute_form<L>(
    args: FormArgs,
    filler: &Filler<L>,
    owner_id: &str,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    match args.action {
        FormAction::Fill(fill) => {
            let record = execute_fill(fill, filler, owner_id).await?;
            println!("{}", formatter.format_form(&record)?);
        }
        FormAction::List { template_code } => {
            let forms = filler.list_forms(owner_id, template_code.as_deref())?;
            println!("{}", formatter.format_forms(&forms)?);
        }
        FormAction::Get { id } => {
            let id = parse_form_id(&id)?;
            let form = filler
                .get_form(id, owner_id)?
                .ok_or_else(|| CliError::NotFound(format!("form {}", id)))?;
            println!("{}", formatter.format_form(&form)?);
        }
        FormAction::Update { id, data } => {
            let id = parse_form_id(&id)?;
            let data = read_json(&data)?;
            let form = filler
                .update_form(id, owner_id, &data)?
                .ok_or_else(|| CliError::NotFound(format!("form {}", id)))?;
            println!("{}", formatter.format_form(&form)?);
        }
        FormAction::Delete { id, yes } => {
            let id = parse_form_id(&id)?;
            if !yes && !confirm(&format!("Delete form {}?", id))? {
                println!("{}", formatter.info("Operation cancelled"));
                return Ok(());
            }
            match filler.delete_form(id, owner_id)? {
                Some(form) => println!(
                    "{}",
                    formatter.success(&format!("Deleted form {}", form.form_id))
                ),
                None => return Err(CliError::NotFound(format!("form {}", id))),
            }
        }
    }

    Ok(())
}

/// Fill a form from whichever inputs were given.
async fn execute_fill<L>(args: FillArgs, filler: &Filler<L>, owner_id: &str) -> Result<FilledFormRecord>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let conversation = args.conversation.as_deref().map(read_input).transpose()?;
    let data = args.data.as_deref().map(read_json).transpose()?;

    if let Some(template) = args.template {
        let template_id = parse_template_id(&template)?;
        return Ok(filler
            .fill_from_template(owner_id, template_id, conversation, data)
            .await?);
    }

    let payload = match args.payload {
        Some(path) => FormPayload::from_json(&read_json(&path)?)?,
        None => FormPayload {
            template_code: args.template_code,
            data,
            template_fields: args.fields.as_deref().map(read_json).transpose()?,
            conversation_text: conversation,
        },
    };

    Ok(filler.fill(owner_id, payload).await?)
}

fn parse_form_id(id: &str) -> Result<FormId> {
    FormId::from_string(id).map_err(|e| CliError::InvalidInput(format!("Invalid form ID '{}': {}", id, e)))
}
