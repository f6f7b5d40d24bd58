//! Config command implementation.

use super::CliError;
use prismfall::MatchConfig;
use std::path::Path;

/// Execute the config command: print the defaults, or load, validate and
/// print a config file with every default filled in.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or fails validation.
pub(crate) fn execute(check: Option<&Path>) -> Result<(), CliError> {
    let config = match check {
        Some(path) => {
            let config = MatchConfig::load(path)?;
            eprintln!("{} is valid", path.display());
            config
        }
        None => MatchConfig::default(),
    };

    println!("{}", config.to_json()?);
    Ok(())
}
