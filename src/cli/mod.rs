//! CLI module - argument parsing, prompts and subcommands

mod args;
pub mod coverage;
mod prompts;

pub use args::{Cli, Commands, OutputFormat};
pub use prompts::*;
