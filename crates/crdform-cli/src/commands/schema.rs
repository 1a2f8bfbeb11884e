//! Schema command - print the generated attribute schema

use crdform_core::SchemaFlavor;

use crate::GlobalArgs;
use crate::commands::offline_provider;
use crate::display;
use crate::error::Result;

pub fn run(global: &GlobalArgs, type_name: &str, flavor: SchemaFlavor) -> Result<()> {
    let provider = offline_provider(global)?;
    let definition = match flavor {
        SchemaFlavor::Manifest => provider.registry().get_manifest(type_name)?,
        _ => provider.registry().get(type_name)?,
    };
    display::print_json(definition.schema(flavor))
}
