//! CLI argument definitions for the confmodel binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Generic CRUD over configuration modules
#[derive(Parser, Debug)]
#[command(name = "confmodel")]
#[command(about = "Inspect and edit configuration modules described by model definitions")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Print machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the document and model definitions live, and who is acting.
#[derive(clap::Args, Debug)]
pub struct StoreArgs {
    /// Configuration document (JSON)
    #[arg(short, long, default_value = "config.json", env = "CONFMODEL_CONFIG", global = true)]
    pub config: PathBuf,

    /// Directory of model definition files (*.json)
    #[arg(short, long, default_value = "models", env = "CONFMODEL_MODELS", global = true)]
    pub models: PathBuf,

    /// Engine settings file (JSON)
    #[arg(long, env = "CONFMODEL_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Name of the acting user
    #[arg(short, long, default_value = "root", env = "CONFMODEL_USER", global = true)]
    pub user: String,

    /// Act with the read-only privilege
    #[arg(long, global = true)]
    pub readonly: bool,
}

/// The model an operation works on.
#[derive(clap::Args, Debug)]
pub struct ModelArgs {
    /// Registered model id, e.g. OPNsense.DNSCrypt
    pub model: String,

    /// External model name; defaults to the lowercased last segment of the id
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered models
    Models,
    /// Show all values of a model
    Show(ModelArgs),
    /// Update model values from a JSON object
    Configure(ConfigureArgs),
    /// Show one entry, or the defaults of a new one
    Get(GetArgs),
    /// Add an entry to a collection
    Add(AddArgs),
    /// Update an entry
    Set(SetArgs),
    /// Delete an entry
    Del(DelArgs),
    /// Enable, disable or flip an entry
    Toggle(ToggleArgs),
    /// Search a collection
    Search(SearchArgs),
    /// List the options of a selection field
    Options(OptionsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigureArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Values as a JSON object, e.g. '{"general":{"enabled":"1"}}'
    #[arg(long)]
    pub values: String,
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Collection path inside the model, e.g. servers.server
    pub path: String,

    pub uuid: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    pub path: String,

    /// Field values as a JSON object
    #[arg(long)]
    pub values: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    pub path: String,

    pub uuid: String,

    /// Field values as a JSON object
    #[arg(long)]
    pub values: String,
}

#[derive(clap::Args, Debug)]
pub struct DelArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    pub path: String,

    pub uuid: String,

    /// Refuse to delete entries that are still referenced
    #[arg(long)]
    pub safe: bool,
}

#[derive(clap::Args, Debug)]
pub struct ToggleArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    pub path: String,

    pub uuid: String,

    /// Desired state (0 or 1); flips the current state when omitted
    #[arg(long)]
    pub enabled: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    pub path: String,

    /// Columns to show, comma separated
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub fields: Vec<String>,

    /// Column to sort on; prefix with - for descending order
    #[arg(long, allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Terms that must all appear in a row
    #[arg(short, long)]
    pub phrase: Option<String>,

    /// Rows per page; all rows when omitted
    #[arg(long)]
    pub rows: Option<i64>,

    #[arg(long, default_value_t = 1)]
    pub page: i64,
}

#[derive(clap::Args, Debug)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Collection or container path holding the field
    pub path: String,

    pub field: String,

    /// Entry whose current value is marked
    pub uuid: Option<String>,
}
