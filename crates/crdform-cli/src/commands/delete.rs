//! Delete command - remove the object described by a state

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::Result;
use crate::util::read_document;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let state = read_document(file)?;
    let provider = connected_provider(global, type_name).await?;
    let response = provider.resource(type_name)?.delete(&state).await;
    display::finish("Delete", &response)?;

    let id = state.get("id").and_then(|id| id.as_str()).unwrap_or(type_name);
    eprintln!("{} Deleted {}", style("✓").green().bold(), style(id).cyan());
    Ok(())
}
