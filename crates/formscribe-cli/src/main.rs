//! Formscribe CLI - Fill form templates from conversation text.

use clap::Parser;
use formscribe_cli::commands;
use formscribe_cli::config::OutputFormat;
use formscribe_cli::{build_filler, Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let no_color = cli.no_color;

    if let Err(e) = run(cli).await {
        let formatter = Formatter::new(OutputFormat::Table, !no_color);
        eprintln!("{}", formatter.error(&format!("Error: {}", e)));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> formscribe_cli::Result<()> {
    // Load config from --config, or the default location
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let owner_id = cli.owner.unwrap_or_else(|| config.owner_id.clone());
    let filler = build_filler(&config)?;

    match cli.command {
        Command::Template(args) => {
            commands::execute_template(args, &filler, &owner_id, &formatter)?;
        }
        Command::Form(args) => {
            commands::execute_form(args, &filler, &owner_id, &formatter).await?;
        }
        Command::Extract(args) => {
            commands::execute_extract(args, &filler, &owner_id, &formatter).await?;
        }
        Command::Prompt(args) => {
            commands::execute_prompt(args, &filler, &owner_id, &formatter)?;
        }
    }

    Ok(())
}
