#![forbid(unsafe_code)]

//! `swapgrid` command-line front end.
//!
//! Runs a session line by line on a terminal, prints the default
//! configuration, and re-exports stored results.

pub mod cli;
pub mod error;
pub mod render;

pub use cli::{Cli, Commands, run, run_from_env};
pub use error::{CliError, Result};
