//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::commands::template::parse_template_id;
use crate::commands::{read_input, read_json};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Filler;
use formscribe_domain::traits::LlmProvider;
use serde_json::Value;

/// Execute the extract command: run the pipeline and print, store nothing.
pub async fn execute_extract<L>(
    args: ExtractArgs,
    filler: &Filler<L>,
    owner_id: &str,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let (fields, conversation) = resolve_inputs(&args, filler, owner_id)?;
    let extracted = filler.extractor().extract(&fields, &conversation).await?;
    println!("{}", formatter.format_extracted(&extracted)?);
    Ok(())
}

/// Field schema and conversation text for the extract and prompt commands.
pub(crate) fn resolve_inputs<L>(
    args: &ExtractArgs,
    filler: &Filler<L>,
    owner_id: &str,
) -> Result<(Value, String)>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: std::fmt::Display,
{
    let fields = match (&args.fields, &args.template) {
        (Some(path), _) => read_json(path)?,
        (None, Some(id)) => {
            let id = parse_template_id(id)?;
            filler
                .get_template(id, owner_id)?
                .ok_or_else(|| CliError::NotFound(format!("template {}", id)))?
                .fields
        }
        (None, None) => {
            return Err(CliError::InvalidInput(
                "Pass --fields or --template".to_string(),
            ))
        }
    };

    Ok((fields, read_input(&args.conversation)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mock_filler;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolve_from_template() {
        let filler = mock_filler("{}");
        let template = filler
            .create_template("alice", None, Some(json!([{"id": "n", "type": "text", "label": "N"}])))
            .unwrap();

        let mut conversation = NamedTempFile::new().unwrap();
        write!(conversation, "hello").unwrap();

        let args = ExtractArgs {
            conversation: conversation.path().to_str().unwrap().to_string(),
            fields: None,
            template: Some(template.template_id.to_string()),
        };
        let (fields, text) = resolve_inputs(&args, &filler, "alice").unwrap();
        assert_eq!(fields, template.fields);
        assert_eq!(text, "hello");

        // Other owners cannot use it
        assert!(matches!(
            resolve_inputs(&args, &filler, "bob"),
            Err(CliError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_stores_nothing() {
        let filler = mock_filler(
            r#"{"fields": {"a.n": {"value": "x", "source_quote": "x", "confidence": 0.99}}}"#,
        );
        let mut fields = NamedTempFile::new().unwrap();
        write!(fields, r#"{{"a": {{"n": {{"type": "text", "label": "N"}}}}}}"#).unwrap();
        let mut conversation = NamedTempFile::new().unwrap();
        write!(conversation, "x").unwrap();

        let args = ExtractArgs {
            conversation: conversation.path().to_str().unwrap().to_string(),
            fields: Some(fields.path().to_str().unwrap().to_string()),
            template: None,
        };
        let formatter = Formatter::new(crate::config::OutputFormat::Quiet, false);
        execute_extract(args, &filler, "alice", &formatter).await.unwrap();

        assert!(filler.list_forms("alice", None).unwrap().is_empty());
    }
}
