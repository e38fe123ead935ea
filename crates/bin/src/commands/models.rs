//! Registered model listing.

use crate::output::{OutputFormat, render_models};
use crate::store::Workspace;

/// Run the `models` command
pub fn list(workspace: &Workspace, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let registry = workspace.registry();
    let ids = registry.ids();

    match format {
        OutputFormat::Human => {
            let schemas = ids
                .iter()
                .map(|id| registry.schema(id).map(|schema| (*schema).clone()))
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", render_models(&schemas));
        }
        OutputFormat::Json => {
            let mut entries = Vec::with_capacity(ids.len());
            for id in &ids {
                let schema = registry.schema(id)?;
                entries.push(serde_json::json!({
                    "id": id,
                    "mount": schema.mount.as_str(),
                    "version": schema.version,
                }));
            }
            println!("{}", serde_json::to_string(&entries)?);
        }
    }

    Ok(())
}
