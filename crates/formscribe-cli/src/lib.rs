//! Formscribe CLI library.
//!
//! This library provides the core functionality for the Formscribe command-line interface,
//! including configuration management, command execution, and output formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;

use formscribe_extractor::{FormExtractor, FormFiller};
use formscribe_llm::OpenAiProvider;
use formscribe_store::SqliteStore;
use std::fs;
use tracing::debug;

/// Form filler over the local SQLite database.
pub type Filler<L> = FormFiller<L, SqliteStore>;

/// Open the database and connect the configured model.
pub fn build_filler(config: &Config) -> Result<Filler<OpenAiProvider>> {
    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    debug!("Opening database at {}", db_path.display());
    let store = SqliteStore::new(&db_path)?;

    let llm = OpenAiProvider::new(&config.llm.endpoint, &config.llm.model)
        .with_api_key_from_env(&config.llm.api_key_env)
        .with_max_retries(config.llm.max_retries);

    let extractor = FormExtractor::new(llm, config.extractor_config())?;
    Ok(FormFiller::new(extractor, store))
}
