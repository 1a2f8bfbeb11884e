//! Create command - apply a plan with Server-Side Apply

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::{CliError, Result};
use crate::util::read_document;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let plan = read_document(file)?;
    let provider = connected_provider(global, type_name).await?;
    let resource = provider.resource(type_name)?;

    let diagnostics = resource.validate_config(&plan);
    if diagnostics.has_error() {
        display::print_diagnostics(&diagnostics);
        return Err(CliError::Validation {
            errors: diagnostics.errors().count(),
        });
    }

    let response = resource.create(&plan).await;
    display::finish("Create", &response)?;

    if let Some(id) = response.state.as_ref().and_then(|s| s.get("id")).and_then(|id| id.as_str()) {
        eprintln!("{} Created {} {}", style("✓").green().bold(), type_name, style(id).cyan());
    }
    Ok(())
}
