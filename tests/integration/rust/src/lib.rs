//! Integration test suite for the benchmark pipeline
//!
//! Shared helpers for tests that cross component boundaries.

use std::sync::Arc;

use code_processor::{CachedLoader, ModuleLoader};
use dependency_cache::{CachedFetch, MemoryCache, StaticFetcher};
use rquickjs::{Context, Ctx, Function, Runtime, Value};

/// Re-export components for test convenience
pub mod components {
    pub use benchmarks;
    pub use code_processor;
    pub use core_types;
    pub use dependency_cache;
    pub use isolation;
    pub use orchestrator;
    pub use parser;
}

/// A cached fetch over an in-memory module map
pub fn memory_fetch(fetcher: StaticFetcher) -> (Arc<CachedFetch>, Arc<StaticFetcher>) {
    let fetcher = Arc::new(fetcher);
    let fetch = CachedFetch::new(Arc::new(MemoryCache::new()), fetcher.clone());
    (Arc::new(fetch), fetcher)
}

/// A module loader over an in-memory module map
pub fn memory_loader(fetcher: StaticFetcher) -> Arc<dyn ModuleLoader> {
    Arc::new(CachedLoader::new(memory_fetch(fetcher).0))
}

fn describe(ctx: &Ctx<'_>, err: rquickjs::Error) -> String {
    match err {
        rquickjs::Error::Exception => format!("{:?}", ctx.catch()),
        other => other.to_string(),
    }
}

/// Evaluate a processed function body, call the `run` it returns once and
/// give back the JSON of its (awaited) return value
pub fn run_once(code: &str) -> Result<String, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let context = Context::full(&runtime).map_err(|err| err.to_string())?;
    context.with(|ctx| {
        let run: Function = ctx
            .eval(format!("(function () {{\n{}\n}})()", code))
            .map_err(|err| describe(&ctx, err))?;
        let mut value: Value = run.call(()).map_err(|err| describe(&ctx, err))?;
        if let Some(promise) = value.as_promise() {
            value = promise.finish::<Value>().map_err(|err| describe(&ctx, err))?;
        }
        match ctx.json_stringify(value).map_err(|err| describe(&ctx, err))? {
            Some(json) => json.to_string().map_err(|err| err.to_string()),
            None => Ok("undefined".to_string()),
        }
    })
}
