//! Output formatting helpers for human-readable and JSON output.

use std::fmt::Write as _;

use confmodel::{grid::SearchResponse, relation::OptionData, schema::Schema};
use serde::Serialize;
use serde_json::Value;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Print a value as indented JSON for humans, compact JSON otherwise.
pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), serde_json::Error> {
    let rendered = match format {
        OutputFormat::Human => serde_json::to_string_pretty(value)?,
        OutputFormat::Json => serde_json::to_string(value)?,
    };
    println!("{rendered}");
    Ok(())
}

/// Aligns cells into columns under upper-cased headers.
///
/// Widths count characters, so labels outside ASCII line up too. Trailing
/// padding is trimmed from every line.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let width_of = |s: &str| s.chars().count();
    let mut widths: Vec<usize> = headers.iter().map(|h| width_of(h)).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(width_of(cell));
        }
    }

    let mut out = String::new();
    let mut line = |cells: &mut dyn Iterator<Item = String>| {
        let padded: Vec<String> = cells
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };
    line(&mut headers.iter().map(|h| h.to_uppercase()));
    for row in rows {
        line(&mut row.iter().cloned());
    }
    out
}

/// One grid page: the requested columns with their display values, the
/// entry id last, and a paging summary.
pub fn render_grid(fields: &[&str], response: &SearchResponse) -> String {
    let mut headers = fields.to_vec();
    headers.push("uuid");
    let rows: Vec<Vec<String>> = response
        .rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|h| row.get(*h).and_then(Value::as_str).unwrap_or_default().to_string())
                .collect()
        })
        .collect();

    let mut out = if rows.is_empty() {
        String::from("No matching entries.\n")
    } else {
        render_table(&headers, &rows)
    };
    let _ = write!(
        out,
        "\n{} of {} rows (page {}, {} total)",
        response.row_count, response.filtered, response.current, response.total
    );
    out
}

/// Options of a selection field; selected ones are starred.
pub fn render_options(options: &[OptionData]) -> String {
    if options.is_empty() {
        return String::from("No options available.");
    }
    let rows: Vec<Vec<String>> = options
        .iter()
        .map(|o| {
            let marker = if o.selected { "*" } else { "" };
            vec![marker.to_string(), o.label.clone(), o.value.clone()]
        })
        .collect();
    render_table(&["", "label", "value"], &rows).trim_end().to_string()
}

/// Registered model definitions.
pub fn render_models(schemas: &[Schema]) -> String {
    if schemas.is_empty() {
        return String::from("No models registered.");
    }
    let rows: Vec<Vec<String>> = schemas
        .iter()
        .map(|s| vec![s.id.clone(), s.mount.to_string(), s.version.clone()])
        .collect();
    render_table(&["id", "mount", "version"], &rows)
        .trim_end()
        .to_string()
}
