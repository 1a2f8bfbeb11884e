//! Resources command - list the registered resource types

use crate::GlobalArgs;
use crate::commands::offline_provider;
use crate::display;
use crate::error::Result;

pub fn run(global: &GlobalArgs, json: bool) -> Result<()> {
    let provider = offline_provider(global)?;
    let types = provider.resource_types();

    if json {
        return display::print_json(&types);
    }
    display::print_resource_types(&types);
    Ok(())
}
