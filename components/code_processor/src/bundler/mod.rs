//! Network import bundling
//!
//! Every module reachable from the entry through static imports, re-exports
//! or literal dynamic imports is fetched, parsed and emitted as a factory in
//! a module registry. Entry imports become `__require` calls, so the output
//! is a plain function body with no module syntax left.

mod bindings;
mod emit;
mod graph;

use std::sync::Arc;

use async_trait::async_trait;
use core_types::Library;
use dependency_cache::CachedFetch;
use parser::{print_program, Parser};
use tracing::{debug, info};
use url::Url;

use crate::error::{ProcessError, Result};

pub(crate) use graph::ModuleGraph;

/// Source of module text for the bundler
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the source of the module at `url`
    async fn load(&self, url: &Url) -> Result<String>;
}

/// Loader backed by the persistent dependency cache
pub struct CachedLoader {
    fetch: Arc<CachedFetch>,
}

impl CachedLoader {
    /// Wrap a cached fetch function
    pub fn new(fetch: Arc<CachedFetch>) -> Self {
        CachedLoader { fetch }
    }
}

#[async_trait]
impl ModuleLoader for CachedLoader {
    async fn load(&self, url: &Url) -> Result<String> {
        let response = self
            .fetch
            .fetch(url.as_str())
            .await
            .map_err(|err| ProcessError::Fetch {
                url: url.to_string(),
                reason: err.to_string(),
            })?;
        if !response.is_success() {
            return Err(ProcessError::Fetch {
                url: url.to_string(),
                reason: format!("status={}", response.status),
            });
        }
        Ok(response.body)
    }
}

/// Inline every network import of `entry` into one function body.
///
/// `entry` is a transformed benchmark body, so a top-level `return` is
/// accepted. Code without imports is only re-printed.
pub async fn bundle(
    entry: &str,
    libraries: &[Library],
    loader: Arc<dyn ModuleLoader>,
) -> Result<String> {
    let mut program = Parser::new(entry)
        .allow_return_outside_function(true)
        .parse_program()?;

    let specifiers = graph::collect_specifiers(&mut program);
    if specifiers.is_empty() {
        return Ok(print_program(&program));
    }

    let graph = ModuleGraph::build(&specifiers, libraries, loader.as_ref()).await?;
    info!(modules = graph.len(), "bundled network imports");
    let output = emit::emit(program, graph)?;
    let code = print_program(&output);
    debug!(bytes = code.len(), "bundle emitted");
    Ok(code)
}
