//! Read command - refresh a state from the cluster

use std::path::Path;

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::Result;
use crate::util::read_document;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let state = read_document(file)?;
    let provider = connected_provider(global, type_name).await?;
    let response = provider.resource(type_name)?.read(&state).await;
    display::finish("Read", &response)
}
