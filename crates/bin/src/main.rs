use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod store;

use cli::{Cli, Commands};
use output::OutputFormat;
use store::Workspace;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("confmodel=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let workspace = Workspace::open(&cli.store)?;

    match &cli.command {
        Commands::Models => commands::models::list(&workspace, format),
        Commands::Show(args) => commands::settings::show(&workspace, args, format),
        Commands::Configure(args) => commands::settings::configure(&workspace, args, format),
        Commands::Get(args) => commands::entry::get(&workspace, args, format),
        Commands::Add(args) => commands::entry::add(&workspace, args, format),
        Commands::Set(args) => commands::entry::set(&workspace, args, format),
        Commands::Del(args) => commands::entry::del(&workspace, args, format),
        Commands::Toggle(args) => commands::entry::toggle(&workspace, args, format),
        Commands::Search(args) => commands::search::search(&workspace, args, format),
        Commands::Options(args) => commands::search::options(&workspace, args, format),
    }
}
