//! Whole-model commands.

use crate::cli::{ConfigureArgs, ModelArgs};
use crate::output::{OutputFormat, print_value};
use crate::store::Workspace;

/// Run the `show` command
pub fn show(
    workspace: &Workspace,
    args: &ModelArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(args)?;
    let settings = controller.get_settings(&workspace.read())?;
    print_value(&settings, format)?;
    Ok(())
}

/// Run the `configure` command
pub fn configure(
    workspace: &Workspace,
    args: &ConfigureArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let request = workspace.write(controller.model_name(), Some(&args.values))?;
    let response = controller.set_settings(&request)?;
    print_value(&response, format)?;
    Ok(())
}
