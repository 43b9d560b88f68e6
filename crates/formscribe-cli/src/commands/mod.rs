//! Command implementations.

pub mod extract;
pub mod form;
pub mod prompt;
pub mod template;

pub use self::extract::execute_extract;
pub use self::form::execute_form;
pub use self::prompt::execute_prompt;
pub use self::template::execute_template;

use crate::error::{CliError, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};

/// Read a whole file, or stdin for `-`.
pub fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(source)?)
    }
}

/// Read and parse a JSON document from a file, or stdin for `-`.
pub fn read_json(source: &str) -> Result<Value> {
    let text = read_input(source)?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::InvalidInput(format!("'{}' is not valid JSON: {}", source, e)))
}

/// Ask for a yes/no confirmation on stdin.
pub(crate) fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::Write::flush(&mut io::stdout())?;

    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}
