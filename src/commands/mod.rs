//! Command-line interface definitions and handlers for the cellmesh CLI.

pub mod args;
pub mod helpers;
pub mod rank;
pub mod store;

pub use args::{Cli, Commands, StoreCommands};
pub use rank::run_rank;
pub use store::{run_store_build, run_store_info};
