//! CLI argument parsing tests
//!
//! Tests for verifying clap argument parsing works correctly

use std::path::PathBuf;

use clap::Parser as ClapParser;
use core_types::{Count, TimingMethod};
use js_cli::{CacheAction, Cli, Commands, RunArgs};

fn parse_run(args: &[&str]) -> RunArgs {
    match Cli::try_parse_from(args).unwrap().command {
        Commands::Run(args) => args,
        other => panic!("expected run, got {:?}", other),
    }
}

/// A subcommand is required
#[test]
fn cli_parse_no_args_fails() {
    assert!(Cli::try_parse_from(["jsbench"]).is_err());
}

/// `run` needs at least one file
#[test]
fn cli_run_requires_files() {
    assert!(Cli::try_parse_from(["jsbench", "run"]).is_err());
}

/// Defaults leave every option to the options file
#[test]
fn cli_run_defaults() {
    let args = parse_run(&["jsbench", "run", "a.ts", "b.ts"]);
    assert_eq!(args.files, vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")]);
    assert_eq!(args.iterations, None);
    assert_eq!(args.time, None);
    assert!(!args.no_warmup);
    assert!(!args.json);
    assert!(args.code.setup.is_none());
    assert!(args.code.libraries.is_empty());
}

/// Counts accept "auto" or an integer
#[test]
fn cli_run_counts() {
    let args = parse_run(&[
        "jsbench",
        "run",
        "a.ts",
        "--iterations",
        "500",
        "--warmup-iterations",
        "auto",
        "--batch-size",
        "16",
    ]);
    assert_eq!(args.iterations, Some(Count::Fixed(500)));
    assert_eq!(args.warmup_iterations, Some(Count::Auto));
    assert_eq!(args.batch_size, Some(Count::Fixed(16)));
}

/// Invalid counts are rejected by clap
#[test]
fn cli_run_rejects_bad_count() {
    assert!(Cli::try_parse_from(["jsbench", "run", "a.ts", "--iterations", "lots"]).is_err());
}

/// Timing method names match the options file
#[test]
fn cli_run_method() {
    let args = parse_run(&["jsbench", "run", "a.ts", "--method", "hrtime"]);
    assert_eq!(args.method, Some(TimingMethod::Hrtime));
    assert!(Cli::try_parse_from(["jsbench", "run", "a.ts", "--method", "rdtsc"]).is_err());
}

/// Libraries may repeat, short form included
#[test]
fn cli_run_libraries_and_setup() {
    let args = parse_run(&[
        "jsbench",
        "run",
        "a.ts",
        "--setup",
        "setup.ts",
        "--library",
        "lodash",
        "-l",
        "preact=https://cdn.example/preact",
    ]);
    assert_eq!(args.code.setup, Some(PathBuf::from("setup.ts")));
    assert_eq!(args.code.libraries, vec!["lodash", "preact=https://cdn.example/preact"]);
}

/// Global flags work after the subcommand
#[test]
fn cli_global_flags() {
    let cli = Cli::try_parse_from(["jsbench", "cache", "count", "-vv", "--cache-dir", "/tmp/c"]).unwrap();
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/c")));
    assert!(matches!(cli.command, Commands::Cache { action: CacheAction::Count }));
}

/// `transform` takes a single file
#[test]
fn cli_transform() {
    let cli = Cli::try_parse_from(["jsbench", "transform", "impl.ts", "--setup", "s.ts"]).unwrap();
    match cli.command {
        Commands::Transform(args) => {
            assert_eq!(args.file, PathBuf::from("impl.ts"));
            assert_eq!(args.code.setup, Some(PathBuf::from("s.ts")));
        }
        other => panic!("expected transform, got {:?}", other),
    }
}
