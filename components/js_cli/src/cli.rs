//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use core_types::{Count, TimingMethod};

/// Measure JavaScript and TypeScript snippets
#[derive(Parser, Debug)]
#[command(name = "jsbench")]
#[command(author, version, about = "jsbench - benchmark JavaScript/TypeScript snippets")]
pub struct Cli {
    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,

    /// More logging (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Dependency cache directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark one or more implementation files
    Run(RunArgs),
    /// Print the transformed code of one implementation
    Transform(SourceArgs),
    /// Print the bundled code of one implementation
    Bundle(SourceArgs),
    /// Inspect or clear the dependency cache
    Cache {
        /// Cache operation
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Dependency cache operations
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Print the number of cached modules
    Count,
    /// Remove every cached module
    Clear,
}

/// Inputs shared by every command that processes code
#[derive(Args, Debug, Clone, Default)]
pub struct CodeArgs {
    /// Setup module whose exports are visible to every implementation
    #[arg(long)]
    pub setup: Option<PathBuf>,

    /// Importable package, as NAME or NAME=URL
    #[arg(long = "library", short = 'l', value_name = "NAME[=URL]")]
    pub libraries: Vec<String>,
}

/// Arguments of `jsbench transform` and `jsbench bundle`
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Implementation file
    pub file: PathBuf,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub code: CodeArgs,
}

/// Arguments of `jsbench run`
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Implementation files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub code: CodeArgs,

    /// JSON file with benchmark options; flags override it
    #[arg(long)]
    pub options: Option<PathBuf>,

    /// Measured calls, or "auto" to measure for --time
    #[arg(long, value_parser = parse_count)]
    pub iterations: Option<Count>,

    /// Measurement budget in milliseconds for automatic iterations
    #[arg(long)]
    pub time: Option<u64>,

    /// Skip warmup
    #[arg(long)]
    pub no_warmup: bool,

    /// Warmup calls, or "auto"
    #[arg(long, value_parser = parse_count)]
    pub warmup_iterations: Option<Count>,

    /// Time every call on its own
    #[arg(long)]
    pub no_batching: bool,

    /// Calls per timing sample, or "auto"
    #[arg(long, value_parser = parse_count)]
    pub batch_size: Option<Count>,

    /// Clock: auto, hrtime or performance.now
    #[arg(long, value_parser = parse_method)]
    pub method: Option<TimingMethod>,

    /// Print the runs as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write {name, totalTime, opsPerSec} for completed runs to this file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

fn parse_json_string<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|err| err.to_string())
}

fn parse_count(value: &str) -> Result<Count, String> {
    parse_json_string(value)
}

fn parse_method(value: &str) -> Result<TimingMethod, String> {
    parse_json_string(value)
}
