//! Validate command - check a configuration against the resource schema

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::commands::offline_provider;
use crate::display;
use crate::error::{CliError, Result};
use crate::util::read_document;

pub fn run(global: &GlobalArgs, type_name: &str, file: &Path, strict: bool) -> Result<()> {
    let provider = offline_provider(global)?;
    let config = read_document(file)?;
    let diagnostics = provider.validate(type_name, &config)?;

    display::print_diagnostics(&diagnostics);

    let errors = if strict {
        diagnostics.len()
    } else {
        diagnostics.errors().count()
    };
    if errors > 0 {
        return Err(CliError::Validation { errors });
    }

    eprintln!(
        "{} {} is a valid {}",
        style("✓").green().bold(),
        file.display(),
        type_name
    );
    Ok(())
}
