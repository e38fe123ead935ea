//! Subcommand implementations.

pub mod entry;
pub mod models;
pub mod search;
pub mod settings;
