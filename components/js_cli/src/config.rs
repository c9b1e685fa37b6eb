//! Benchmark options and libraries from files and flags

use std::fs;
use std::path::Path;

use core_types::{BenchmarkOptions, Library};

use crate::cli::{CodeArgs, RunArgs};
use crate::error::{CliError, CliResult};

/// Parse `NAME` or `NAME=URL`
pub fn parse_library(value: &str) -> CliResult<Library> {
    match value.split_once('=') {
        Some((name, url)) if !name.is_empty() && !url.is_empty() => Ok(Library::with_url(name, url)),
        Some(_) => Err(CliError::Options(format!("invalid library \"{}\"", value))),
        None if !value.is_empty() => Ok(Library::new(value)),
        None => Err(CliError::Options("empty library name".to_string())),
    }
}

/// Every `--library` flag
pub fn libraries(args: &CodeArgs) -> CliResult<Vec<Library>> {
    args.libraries.iter().map(|value| parse_library(value)).collect()
}

/// Read a file, attaching its path to errors
pub fn read_source(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|err| CliError::io(path, err))
}

/// The setup module, empty without `--setup`
pub fn setup_source(args: &CodeArgs) -> CliResult<String> {
    match &args.setup {
        Some(path) => read_source(path),
        None => Ok(String::new()),
    }
}

/// Options file merged over the defaults, then flags merged over that
pub fn resolve_options(args: &RunArgs) -> CliResult<BenchmarkOptions> {
    let mut options = match &args.options {
        Some(path) => {
            let text = read_source(path)?;
            serde_json::from_str(&text)
                .map_err(|err| CliError::Options(format!("{}: {}", path.display(), err)))?
        }
        None => BenchmarkOptions::default(),
    };

    if let Some(iterations) = args.iterations {
        options.iterations = iterations;
    }
    if let Some(time) = args.time {
        options.time = time;
    }
    if args.no_warmup {
        options.warmup.enabled = false;
    }
    if let Some(iterations) = args.warmup_iterations {
        options.warmup.iterations = iterations;
    }
    if args.no_batching {
        options.batching.enabled = false;
    }
    if let Some(size) = args.batch_size {
        options.batching.size = size;
    }
    if let Some(method) = args.method {
        options.method = method;
    }
    // User console output is reported separately
    options.quiet = true;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use core_types::{Count, TimingMethod};

    fn run_args(args: &[&str]) -> RunArgs {
        match Cli::try_parse_from(args).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_library_specs() {
        assert_eq!(parse_library("lodash").unwrap().resolved_url(), "https://esm.sh/lodash");
        assert_eq!(
            parse_library("preact=https://cdn.example/preact").unwrap(),
            Library::with_url("preact", "https://cdn.example/preact")
        );
        assert!(parse_library("=x").is_err());
        assert!(parse_library("").is_err());
    }

    #[test]
    fn test_flags_override_options_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        fs::write(&path, r#"{"iterations": 100, "time": 50, "warmup": {"iterations": 3}}"#).unwrap();

        let path = path.to_string_lossy().to_string();
        let args = run_args(&[
            "jsbench",
            "run",
            "a.js",
            "--options",
            &path,
            "--time",
            "200",
            "--no-batching",
            "--method",
            "performance.now",
        ]);
        let options = resolve_options(&args).unwrap();
        assert_eq!(options.iterations, Count::Fixed(100));
        assert_eq!(options.time, 200);
        assert!(options.warmup.enabled);
        assert_eq!(options.warmup.iterations, Count::Fixed(3));
        assert!(!options.batching.enabled);
        assert_eq!(options.method, TimingMethod::PerformanceNow);
        assert!(options.quiet);
    }

    #[test]
    fn test_bad_options_file_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        let path = path.to_string_lossy().to_string();
        let err = resolve_options(&run_args(&["jsbench", "run", "a.js", "--options", &path])).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
