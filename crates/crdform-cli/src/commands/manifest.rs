//! Manifest command - render a configuration as Kubernetes YAML

use std::path::Path;

use crate::GlobalArgs;
use crate::commands::offline_provider;
use crate::display;
use crate::error::Result;
use crate::util::read_document;

pub fn run(global: &GlobalArgs, type_name: &str, file: &Path, raw: bool) -> Result<()> {
    let provider = offline_provider(global)?;
    let config = read_document(file)?;
    let response = provider.manifest(type_name)?.read(&config);

    if raw && !response.has_error() {
        display::print_diagnostics(&response.diagnostics);
        if let Some(yaml) = response
            .state
            .as_ref()
            .and_then(|state| state.get("yaml"))
            .and_then(|yaml| yaml.as_str())
        {
            print!("{}", yaml);
        }
        return Ok(());
    }
    display::finish("Manifest", &response)
}
