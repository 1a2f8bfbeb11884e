//! Import command - adopt an existing object into a state

use crate::GlobalArgs;
use crate::commands::connected_provider;
use crate::display;
use crate::error::Result;

pub async fn run(global: &GlobalArgs, type_name: &str, id: &str) -> Result<()> {
    let provider = connected_provider(global, type_name).await?;
    let resource = provider.resource(type_name)?;

    let imported = resource.import_state(id);
    let Some(state) = imported.state.as_ref().filter(|_| !imported.has_error()) else {
        return display::finish("Import", &imported);
    };

    // Import only yields the lookup keys; Read fills in the rest
    let response = resource.read(state).await;
    display::finish("Import", &response)
}
