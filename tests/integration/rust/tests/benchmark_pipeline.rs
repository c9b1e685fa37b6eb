//! Benchmark Pipeline Integration Tests
//!
//! Setup + implementations -> orchestrator -> worker -> store.

use std::sync::Arc;
use std::time::Duration;

use core_types::{
    BatchingOptions, BenchmarkOptions, ConsoleLevel, Count, FailureKind, Implementation, Library,
    RunStatus, WarmupOptions,
};
use dependency_cache::StaticFetcher;
use integration_tests::memory_loader;
use orchestrator::{
    export_results, BenchmarkService, BenchmarkStore, OrchestratorError, StoreEvent,
    SIBLING_FAILURE_MESSAGE,
};

fn service(fetcher: StaticFetcher) -> BenchmarkService {
    BenchmarkService::new(Arc::new(BenchmarkStore::new()), memory_loader(fetcher))
        .with_libraries(vec![Library::new("double")])
}

fn fixed(iterations: u64) -> BenchmarkOptions {
    BenchmarkOptions {
        iterations: Count::Fixed(iterations),
        warmup: WarmupOptions {
            enabled: true,
            iterations: Count::Fixed(2),
        },
        batching: BatchingOptions {
            enabled: false,
            size: Count::Auto,
        },
        quiet: true,
        ..BenchmarkOptions::default()
    }
}

#[tokio::test]
async fn test_library_backed_implementations_complete() {
    let fetcher = StaticFetcher::new().with("https://esm.sh/double", "export default (x) => x * 2;");
    let service = service(fetcher);
    let mut events = service.store().subscribe();
    let implementations = vec![
        Implementation::new("a", "a.ts", "import double from \"double\";\nexport const run = () => double(base);"),
        Implementation::new("b", "b.ts", "export function run() { return base * 2; }"),
    ];

    let results = service
        .run_benchmark("export const base: number = 21;", &implementations, fixed(40))
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|result| result.samples == 40));

    let runs = service.store().runs();
    let exported = export_results(&runs);
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0].name, "a.ts");
    assert!(exported.iter().all(|entry| entry.ops_per_sec > 0.0));

    let mut progress: Vec<f64> = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StoreEvent::RunUpdated(run) = event {
            if run.implementation_id == "a" {
                progress.push(run.progress);
            }
        }
    }
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", progress);
    assert_eq!(progress.last().copied(), Some(100.0));
    assert!(progress[..progress.len() - 1].iter().all(|value| *value < 100.0));
}

#[tokio::test]
async fn test_fixed_delay_round_trips_through_the_worker() {
    let service = service(StaticFetcher::new());
    let implementation = Implementation::new(
        "delay",
        "delay.js",
        "export function run() { const end = Date.now() + 5; while (Date.now() < end) {} }",
    );
    let results = service
        .run_benchmark("", &[implementation], fixed(10))
        .await
        .unwrap();
    let result = results[0];
    assert_eq!(result.samples, 10);
    // Date.now() ticks in whole milliseconds, so each call takes 4-5 ms
    assert!(
        (150.0..=260.0).contains(&result.ops_per_second.average),
        "ops/sec {}",
        result.ops_per_second.average
    );
}

#[tokio::test]
async fn test_console_output_is_coalesced_per_run() {
    let service = service(StaticFetcher::new());
    let implementation = Implementation::new(
        "log",
        "log.js",
        "for (let i = 0; i < 5; i++) console.log(\"ready\");\n\
         console.warn(\"other\");\n\
         export const run = () => 1;",
    );
    service
        .run_benchmark("", &[implementation], fixed(5))
        .await
        .unwrap();

    let run = service.store().latest_run("log").unwrap();
    let console = service.store().console(&run.id);
    assert_eq!(console.len(), 2, "{:?}", console);
    assert_eq!(console[0].message, "ready");
    assert_eq!(console[0].count, 5);
    assert_eq!(console[1].level, ConsoleLevel::Warn);
    assert_eq!(console[1].count, 1);
}

#[tokio::test]
async fn test_parse_failure_fails_the_batch_without_a_worker() {
    let service = service(StaticFetcher::new());
    let implementations = vec![
        Implementation::new("1", "one.js", "export const run = () => 1;"),
        Implementation::new("2", "two.js", "export const run = () => {{"),
        Implementation::new("3", "three.js", "export const run = () => 3;"),
    ];
    let err = service
        .run_benchmark("", &implementations, fixed(5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidCode);
    assert!(!service.is_running());

    let store = service.store();
    assert_eq!(store.latest_run("1").unwrap().error.as_deref(), Some(SIBLING_FAILURE_MESSAGE));
    assert_eq!(store.latest_run("3").unwrap().error.as_deref(), Some(SIBLING_FAILURE_MESSAGE));
    let broken = store.latest_run("2").unwrap();
    assert_eq!(broken.status, RunStatus::Failed);
    assert_ne!(broken.error.as_deref(), Some(SIBLING_FAILURE_MESSAGE));
    assert!(store.runs().iter().all(|run| run.status == RunStatus::Failed));
}

#[tokio::test]
async fn test_stop_discards_partial_state() {
    let service = service(StaticFetcher::new());
    let runner = service.clone();
    let task = tokio::spawn(async move {
        let implementation = Implementation::new("spin", "spin.js", "export function run() { while (true) {} }");
        runner.run_benchmark("", &[implementation], fixed(3)).await
    });

    let store = service.store().clone();
    let run_id = tokio::time::timeout(Duration::from_secs(20), async {
        loop {
            if let Some(run) = store.latest_run("spin").filter(|run| run.status == RunStatus::Warmup) {
                return run.id;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert!(service.stop_benchmark(&run_id));
    assert_eq!(task.await.unwrap(), Err(OrchestratorError::Cancelled));

    tokio::time::sleep(Duration::from_millis(100)).await;
    let run = store.run(&run_id).unwrap();
    assert_eq!(run.status, RunStatus::Cancelled);
    assert!(run.result.is_none());
    assert!(run.error.is_none());
    assert!(store.chart(&run_id).is_empty());
}
