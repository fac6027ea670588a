//! Crate implementing the CLI commands.

mod cli;
mod run;

pub use self::cli::{CliAction, CliOpts};
pub use self::run::{evaluate_run, parse_run_config};
