//! Subcommand implementations

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use code_processor::{combine_sources, process_implementation, transform, CachedLoader};
use core_types::{Implementation, RunStatus};
use dependency_cache::{default_cache_dir, CachedFetch, DiskCache, HttpFetcher};
use orchestrator::{export_results_json, BenchmarkService, BenchmarkStore, StoreEvent};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, info, warn};

use crate::cli::{CacheAction, Cli, Commands, RunArgs, SourceArgs};
use crate::config::{libraries, read_source, resolve_options, setup_source};
use crate::error::{CliError, CliResult};
use crate::report::{format_console_line, format_json, format_report};

/// Network timeout for module fetches
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit code after Ctrl-C
pub const EXIT_INTERRUPTED: i32 = 130;

/// Run a parsed command line, returning the process exit code
pub async fn execute(cli: Cli) -> CliResult<i32> {
    let cache_dir = cli.cache_dir.unwrap_or_else(default_cache_dir);
    match cli.command {
        Commands::Run(args) => run(&args, open_cache(&cache_dir)?).await,
        Commands::Transform(args) => {
            println!("{}", transform_source(&args)?);
            Ok(0)
        }
        Commands::Bundle(args) => {
            println!("{}", bundle_source(&args, open_cache(&cache_dir)?).await?);
            Ok(0)
        }
        Commands::Cache { action } => {
            let fetch = open_cache(&cache_dir)?;
            cache(action, &fetch)
        }
    }
}

fn open_cache(dir: &Path) -> CliResult<Arc<CachedFetch>> {
    debug!(dir = %dir.display(), "opening dependency cache");
    let store = DiskCache::open(dir)?;
    let fetcher = HttpFetcher::new(FETCH_TIMEOUT)?;
    Ok(Arc::new(CachedFetch::new(Arc::new(store), Arc::new(fetcher))))
}

/// Transformed code of one implementation
pub fn transform_source(args: &SourceArgs) -> CliResult<String> {
    let setup = setup_source(&args.code)?;
    let implementation = read_source(&args.file)?;
    Ok(transform(&combine_sources(&setup, &implementation), &libraries(&args.code)?)?)
}

/// Bundled code of one implementation
pub async fn bundle_source(args: &SourceArgs, fetch: Arc<CachedFetch>) -> CliResult<String> {
    let setup = setup_source(&args.code)?;
    let implementation = read_source(&args.file)?;
    let libraries = libraries(&args.code)?;
    let loader = Arc::new(CachedLoader::new(fetch));
    Ok(process_implementation(&setup, &implementation, &libraries, loader).await?)
}

fn cache(action: CacheAction, fetch: &CachedFetch) -> CliResult<i32> {
    match action {
        CacheAction::Count => println!("{}", fetch.count()?),
        CacheAction::Clear => {
            let removed = fetch.count()?;
            fetch.clear()?;
            println!("removed {} cached modules", removed);
        }
    }
    Ok(0)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Implementations in command-line order, ids by position
pub fn load_implementations(files: &[PathBuf]) -> CliResult<Vec<Implementation>> {
    files
        .iter()
        .enumerate()
        .map(|(index, path)| {
            Ok(Implementation::new(
                (index + 1).to_string(),
                display_name(path),
                read_source(path)?,
            ))
        })
        .collect()
}

/// Prints console output as it arrives
#[derive(Default)]
struct ConsoleStream {
    names: HashMap<String, String>,
    printed: HashMap<String, usize>,
}

impl ConsoleStream {
    fn handle(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::RunAdded(run) => {
                self.names.insert(run.id, run.filename);
            }
            StoreEvent::Console { run_id, entries } => {
                let name = self.names.get(&run_id).map(String::as_str).unwrap_or("?");
                let seen = self.printed.entry(run_id.clone()).or_default();
                for entry in entries.iter().skip(*seen) {
                    eprintln!("{}", format_console_line(name, entry));
                }
                *seen = entries.len();
            }
            _ => {}
        }
    }
}

async fn run(args: &RunArgs, fetch: Arc<CachedFetch>) -> CliResult<i32> {
    let options = resolve_options(args)?;
    let setup = setup_source(&args.code)?;
    let implementations = load_implementations(&args.files)?;

    let store = Arc::new(BenchmarkStore::new());
    let service = BenchmarkService::new(store.clone(), Arc::new(CachedLoader::new(fetch)))
        .with_libraries(libraries(&args.code)?);
    let mut events = store.subscribe();
    let mut console = ConsoleStream::default();

    let batch = service.run_benchmark(&setup, &implementations, options);
    tokio::pin!(batch);
    let mut outcome = None;
    let mut interrupted = false;
    loop {
        if outcome.is_some() && store.active_run_ids().is_empty() {
            break;
        }
        tokio::select! {
            result = &mut batch, if outcome.is_none() => outcome = Some(result),
            event = events.recv() => match event {
                Ok(event) => console.handle(event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "console output skipped"),
                Err(RecvError::Closed) => break,
            },
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                interrupted = true;
                for run_id in store.active_run_ids() {
                    service.stop_benchmark(&run_id);
                }
                info!("stopping benchmark");
            },
        }
    }
    loop {
        match events.try_recv() {
            Ok(event) => console.handle(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    if let Some(Err(err)) = &outcome {
        debug!(error = %err, kind = %err.kind(), "benchmark settled with an error");
    }

    let runs = store.runs();
    if args.json {
        println!("{}", format_json(&runs)?);
    } else {
        print!("{}", format_report(&runs));
    }
    if let Some(path) = &args.export {
        fs::write(path, export_results_json(&runs)?).map_err(|err| CliError::io(path, err))?;
        info!(path = %path.display(), "results exported");
    }

    if interrupted {
        return Ok(EXIT_INTERRUPTED);
    }
    let all_completed = runs.iter().all(|run| run.status == RunStatus::Completed);
    Ok(if all_completed { 0 } else { 1 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CodeArgs;

    #[test]
    fn test_implementations_keep_command_line_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.ts");
        let b = dir.path().join("b.js");
        fs::write(&a, "export const run = () => 1;").unwrap();
        fs::write(&b, "export const run = () => 2;").unwrap();

        let implementations = load_implementations(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(implementations[0].id, "1");
        assert_eq!(implementations[0].filename, "b.js");
        assert_eq!(implementations[1].filename, "a.ts");
        assert!(load_implementations(&[dir.path().join("missing.ts")]).is_err());
    }

    #[test]
    fn test_transform_uses_setup_file() {
        let dir = tempfile::tempdir().unwrap();
        let setup = dir.path().join("setup.ts");
        let file = dir.path().join("impl.ts");
        fs::write(&setup, "export const n: number = 2;").unwrap();
        fs::write(&file, "export function run() { return n * 2; }").unwrap();

        let code = transform_source(&SourceArgs {
            file,
            code: CodeArgs {
                setup: Some(setup),
                libraries: Vec::new(),
            },
        })
        .unwrap();
        assert_eq!(code, "const n = 2;\nreturn function run() {\n  return n * 2;\n};\n");
    }

    #[test]
    fn test_cache_commands_on_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = open_cache(dir.path()).unwrap();
        assert_eq!(cache(CacheAction::Count, &fetch).unwrap(), 0);
        assert_eq!(cache(CacheAction::Clear, &fetch).unwrap(), 0);
        assert_eq!(fetch.count().unwrap(), 0);
    }
}
