//! jsbench command-line library
//!
//! Argument parsing, option resolution and report formatting for the
//! `jsbench` binary. [`commands::execute`] runs a parsed [`Cli`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod report;

pub use cli::{CacheAction, Cli, Commands, RunArgs, SourceArgs};
pub use error::{CliError, CliResult};
