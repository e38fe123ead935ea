//! Commands on single collection entries.

use confmodel::{Error, constants::ITEM_IN_USE_TITLE};

use crate::cli::{AddArgs, DelArgs, GetArgs, SetArgs, ToggleArgs};
use crate::output::{OutputFormat, print_value};
use crate::store::{Workspace, key_name};

/// Run the `get` command
pub fn get(
    workspace: &Workspace,
    args: &GetArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let entry = controller.get_base(key_name(&args.path), &args.path, args.uuid.as_deref())?;
    if entry.is_empty() && format == OutputFormat::Human {
        println!("No entry found.");
        return Ok(());
    }
    print_value(&entry, format)?;
    Ok(())
}

/// Run the `add` command
pub fn add(
    workspace: &Workspace,
    args: &AddArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let group = key_name(&args.path);
    let request = workspace.write(group, Some(&args.values))?;
    let response = controller.add_base(&request, group, &args.path, None)?;
    print_value(&response, format)?;
    Ok(())
}

/// Run the `set` command
pub fn set(
    workspace: &Workspace,
    args: &SetArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let group = key_name(&args.path);
    let request = workspace.write(group, Some(&args.values))?;
    let response = controller.set_base(&request, group, &args.path, &args.uuid, None)?;
    print_value(&response, format)?;
    Ok(())
}

/// Run the `del` command
pub fn del(
    workspace: &Workspace,
    args: &DelArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?.with_safe_delete(args.safe);
    let request = workspace.write(key_name(&args.path), None)?;
    let response = match controller.del_base(&request, &args.path, &args.uuid) {
        Err(Error::Controller(err)) if err.is_safe_delete_blocked() => {
            return Err(format!("{ITEM_IN_USE_TITLE}:\n{err}").into());
        }
        other => other?,
    };
    print_value(&response, format)?;
    Ok(())
}

/// Run the `toggle` command
pub fn toggle(
    workspace: &Workspace,
    args: &ToggleArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let request = workspace.write(key_name(&args.path), None)?;
    let response =
        controller.toggle_base(&request, &args.path, &args.uuid, args.enabled.as_deref())?;
    print_value(&response, format)?;
    Ok(())
}
