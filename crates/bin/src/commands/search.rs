//! Grid search and option listing.

use serde_json::{Map, Value, json};

use crate::cli::{OptionsArgs, SearchArgs};
use crate::output::{OutputFormat, print_value, render_grid, render_options};
use crate::store::Workspace;

fn search_params(args: &SearchArgs) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("current".to_string(), json!(args.page));
    if let Some(rows) = args.rows {
        params.insert("rowCount".to_string(), json!(rows));
    }
    if let Some(phrase) = &args.phrase {
        params.insert("searchPhrase".to_string(), json!(phrase));
    }
    if let Some(sort) = &args.sort {
        let (field, direction) = match sort.strip_prefix('-') {
            Some(field) => (field, "desc"),
            None => (sort.as_str(), "asc"),
        };
        params.insert("sort".to_string(), json!({ field: direction }));
    }
    params
}

/// Run the `search` command
pub fn search(
    workspace: &Workspace,
    args: &SearchArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let mut request = workspace.read();
    request.params = search_params(args);

    let fields: Vec<&str> = args.fields.iter().map(String::as_str).collect();
    let response = controller.search_base(&request, &args.path, &fields, None, None, None)?;

    match format {
        OutputFormat::Human => println!("{}", render_grid(&fields, &response)),
        OutputFormat::Json => print_value(&response, format)?,
    }
    Ok(())
}

/// Run the `options` command
pub fn options(
    workspace: &Workspace,
    args: &OptionsArgs,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = workspace.controller(&args.model)?;
    let Some(options) = controller.options(&args.path, &args.field, args.uuid.as_deref())? else {
        return Err("entry not found".into());
    };

    match format {
        OutputFormat::Human => println!("{}", render_options(&options)),
        OutputFormat::Json => print_value(&options, format)?,
    }
    Ok(())
}
