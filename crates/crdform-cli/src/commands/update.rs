//! Update command - apply a changed plan on top of a prior state

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::{CliError, Result};
use crate::util::read_document;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path, prior: &Path) -> Result<()> {
    let plan = read_document(file)?;
    let prior_state = read_document(prior)?;
    let provider = connected_provider(global, type_name).await?;
    let resource = provider.resource(type_name)?;

    let diagnostics = resource.validate_config(&plan);
    if diagnostics.has_error() {
        display::print_diagnostics(&diagnostics);
        return Err(CliError::Validation {
            errors: diagnostics.errors().count(),
        });
    }

    let response = resource.update(&plan, &prior_state).await;
    display::finish("Update", &response)?;
    eprintln!("{} Updated {}", style("✓").green().bold(), type_name);
    Ok(())
}
