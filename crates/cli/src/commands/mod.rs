//! CLI subcommands

pub mod reconcile;
pub mod settings;
pub mod snapshot;
