//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};

/// Formscribe CLI - Fill form templates from conversation text.
#[derive(Debug, Parser)]
#[command(name = "formscribe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FORMSCRIBE_CONFIG")]
    pub config: Option<String>,

    /// Owner whose templates and forms are used
    #[arg(short, long, global = true, env = "FORMSCRIBE_OWNER")]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage form templates
    Template(TemplateArgs),

    /// Fill and manage forms
    Form(FormArgs),

    /// Extract field values without storing anything
    Extract(ExtractArgs),

    /// Print the model prompt for a schema and conversation
    Prompt(ExtractArgs),
}

/// Arguments for template management.
#[derive(Debug, Parser)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub action: TemplateAction,
}

/// Template actions.
#[derive(Debug, Subcommand)]
pub enum TemplateAction {
    /// Create a template
    Create {
        /// Template name
        #[arg(short, long)]
        name: Option<String>,
        /// JSON file with the field schema ("-" for stdin)
        #[arg(long)]
        fields: Option<String>,
    },

    /// List templates
    List,

    /// Show a template with its fields
    Get {
        /// Template ID
        id: String,
    },

    /// Rename a template or replace its fields
    Update {
        /// Template ID
        id: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// JSON file with the new field schema ("-" for stdin)
        #[arg(long)]
        fields: Option<String>,
    },

    /// Delete a template
    Delete {
        /// Template ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for form management.
#[derive(Debug, Parser)]
pub struct FormArgs {
    #[command(subcommand)]
    pub action: FormAction,
}

/// Form actions.
#[derive(Debug, Subcommand)]
pub enum FormAction {
    /// Fill a new form, extracting values from a conversation
    Fill(FillArgs),

    /// List forms
    List {
        /// Only forms of this template code
        #[arg(short, long)]
        template_code: Option<String>,
    },

    /// Show a form's data
    Get {
        /// Form ID
        id: String,
    },

    /// Replace a form's data
    Update {
        /// Form ID
        id: String,
        /// JSON file with the new data ("-" for stdin)
        #[arg(short, long)]
        data: String,
    },

    /// Delete a form
    Delete {
        /// Form ID
        id: String,
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Arguments for the fill command.
#[derive(Debug, Parser)]
pub struct FillArgs {
    /// Stored template to fill; its ID becomes the template code
    #[arg(long, conflicts_with_all = ["template_code", "fields", "payload"])]
    pub template: Option<String>,

    /// Template code recorded on the form
    #[arg(short, long)]
    pub template_code: Option<String>,

    /// JSON file with the field schema to extract
    #[arg(long)]
    pub fields: Option<String>,

    /// Conversation text file ("-" for stdin)
    #[arg(long)]
    pub conversation: Option<String>,

    /// JSON file with explicit data; its sections override extracted ones
    #[arg(short, long)]
    pub data: Option<String>,

    /// JSON file with a complete fill payload
    /// (templateCode, data, templateFields, conversationText)
    #[arg(long, conflicts_with_all = ["template_code", "fields", "conversation", "data"])]
    pub payload: Option<String>,
}

/// Arguments for the extract and prompt commands.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Conversation text file ("-" for stdin)
    pub conversation: String,

    /// JSON file with the field schema
    #[arg(long, required_unless_present = "template", conflicts_with = "template")]
    pub fields: Option<String>,

    /// Stored template whose fields are used
    #[arg(long)]
    pub template: Option<String>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_create() {
        let cli = Cli::parse_from(["formscribe", "template", "create", "--name", "Intake"]);
        match cli.command {
            Command::Template(TemplateArgs {
                action: TemplateAction::Create { name, fields },
            }) => {
                assert_eq!(name.as_deref(), Some("Intake"));
                assert!(fields.is_none());
            }
            _ => panic!("Expected template create"),
        }
    }

    #[test]
    fn test_form_fill_with_global_flags() {
        let cli = Cli::parse_from([
            "formscribe",
            "form",
            "fill",
            "-t",
            "intake",
            "--fields",
            "fields.json",
            "--conversation",
            "-",
            "--format",
            "json",
            "--owner",
            "alice",
        ]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.owner.as_deref(), Some("alice"));
        match cli.command {
            Command::Form(FormArgs {
                action: FormAction::Fill(args),
            }) => {
                assert_eq!(args.template_code.as_deref(), Some("intake"));
                assert_eq!(args.conversation.as_deref(), Some("-"));
            }
            _ => panic!("Expected form fill"),
        }
    }

    #[test]
    fn test_fill_template_conflicts_with_fields() {
        let result = Cli::try_parse_from([
            "formscribe",
            "form",
            "fill",
            "--template",
            "abc",
            "--fields",
            "fields.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_needs_a_schema() {
        assert!(Cli::try_parse_from(["formscribe", "extract", "talk.txt"]).is_err());
        let cli = Cli::parse_from(["formscribe", "extract", "talk.txt", "--fields", "f.json"]);
        assert!(matches!(cli.command, Command::Extract(_)));
    }

    #[test]
    fn test_prompt_with_template() {
        let cli = Cli::parse_from(["formscribe", "prompt", "talk.txt", "--template", "abc"]);
        match cli.command {
            Command::Prompt(args) => assert_eq!(args.template.as_deref(), Some("abc")),
            _ => panic!("Expected prompt"),
        }
    }
}
