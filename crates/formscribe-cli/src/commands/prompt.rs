//! Prompt command implementation.

use crate::cli::ExtractArgs;
use crate::commands::extract::resolve_inputs;
use crate::error::Result;
use crate::output::Formatter;
use crate::Filler;
use formscribe_domain::traits::LlmProvider;

/// Execute the prompt command: print the model request without sending it.
pub fn execute_prompt<L>(
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
    let request = filler.extractor().preview_prompt(&fields, &conversation)?;
    println!("{}", formatter.format_prompt(&request)?);
    Ok(())
}
