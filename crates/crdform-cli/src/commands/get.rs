//! Get command - data source lookup of an existing object

use std::path::Path;

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::Result;
use crate::util::read_document;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let config = read_document(file)?;
    let provider = connected_provider(global, type_name).await?;
    let response = provider.data_source(type_name)?.read(&config).await;
    display::finish("Get", &response)
}
