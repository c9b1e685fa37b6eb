//! Module discovery and resolution

use std::collections::{HashMap, HashSet};

use core_types::Library;
use futures::future::join_all;
use parser::ast::{ExportNamedDeclaration, Literal};
use parser::visit::{walk_expression, walk_statement};
use parser::{parse_module, Expression, Program, Statement, VisitMut};
use tracing::{debug, trace};
use url::Url;

use super::ModuleLoader;
use crate::error::{ProcessError, Result};

const ENTRY: &str = "<entry>";

/// A fetched and parsed module
pub(crate) struct Module {
    pub url: Url,
    pub program: Program,
    /// Specifier as written to the module it names
    pub resolved: HashMap<String, Url>,
}

/// Every module reachable from the entry, in discovery order
pub(crate) struct ModuleGraph {
    pub entry: HashMap<String, Url>,
    pub modules: Vec<Module>,
}

impl ModuleGraph {
    /// Fetch the transitive closure of `specifiers`.
    ///
    /// Modules are loaded breadth first; each level is fetched concurrently.
    pub async fn build(
        specifiers: &[String],
        libraries: &[Library],
        loader: &dyn ModuleLoader,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut frontier = Vec::new();
        let mut entry = HashMap::new();
        for specifier in specifiers {
            let url = resolve(specifier, None, libraries)?;
            if seen.insert(url.clone()) {
                frontier.push(url.clone());
            }
            entry.insert(specifier.clone(), url);
        }

        let mut modules = Vec::new();
        let mut depth = 0;
        while !frontier.is_empty() {
            trace!(depth, count = frontier.len(), "loading module level");
            let loaded = join_all(frontier.iter().map(|url| load_module(loader, url))).await;

            let mut next = Vec::new();
            for (url, program) in frontier.into_iter().zip(loaded) {
                let mut program = program?;
                let mut resolved = HashMap::new();
                for specifier in collect_specifiers(&mut program) {
                    let target = resolve(&specifier, Some(&url), libraries)?;
                    if seen.insert(target.clone()) {
                        next.push(target.clone());
                    }
                    resolved.insert(specifier, target);
                }
                modules.push(Module {
                    url,
                    program,
                    resolved,
                });
            }
            frontier = next;
            depth += 1;
        }

        Ok(ModuleGraph { entry, modules })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

async fn load_module(loader: &dyn ModuleLoader, url: &Url) -> Result<Program> {
    let source = loader.load(url).await?;
    debug!(url = %url, bytes = source.len(), "loaded module");
    let mut program = parse_module(&source).map_err(|error| ProcessError::ModuleParse {
        url: url.to_string(),
        error,
    })?;

    let mut awaits = TopLevelAwait::default();
    awaits.visit_program(&mut program);
    if awaits.found {
        return Err(ProcessError::TopLevelAwait {
            url: url.to_string(),
        });
    }
    Ok(program)
}

/// Turn an import specifier into a module URL.
///
/// Absolute URLs are used as-is, relative ones are joined with the importer
/// and bare names must belong to a configured library.
pub(crate) fn resolve(specifier: &str, importer: Option<&Url>, libraries: &[Library]) -> Result<Url> {
    let unresolved = || ProcessError::Unresolved {
        specifier: specifier.to_string(),
        importer: importer.map_or_else(|| ENTRY.to_string(), Url::to_string),
    };

    if specifier.starts_with("http://") || specifier.starts_with("https://") {
        return Url::parse(specifier).map_err(|_| unresolved());
    }
    if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/') {
        return importer
            .ok_or_else(unresolved)?
            .join(specifier)
            .map_err(|_| unresolved());
    }
    libraries
        .iter()
        .find_map(|library| library.resolve_specifier(specifier))
        .and_then(|url| Url::parse(&url).ok())
        .ok_or_else(unresolved)
}

/// Module specifiers referenced by `program`, deduplicated in source order.
///
/// Static imports, re-exports and dynamic imports of string literals count.
pub(crate) fn collect_specifiers(program: &mut Program) -> Vec<String> {
    let mut collector = Specifiers::default();
    collector.visit_program(program);
    collector.found
}

#[derive(Default)]
struct Specifiers {
    found: Vec<String>,
}

impl Specifiers {
    fn add(&mut self, specifier: &str) {
        if !self.found.iter().any(|s| s == specifier) {
            self.found.push(specifier.to_string());
        }
    }
}

impl VisitMut for Specifiers {
    fn visit_statement(&mut self, stmt: &mut Statement) {
        match stmt {
            Statement::ImportDeclaration(import) => self.add(&import.source),
            Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                source: Some(source),
                ..
            })
            | Statement::ExportAllDeclaration { source, .. } => self.add(source),
            _ => {}
        }
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        if let Expression::ImportExpression { source } = expr {
            if let Expression::Literal {
                value: Literal::String(specifier),
            } = source.unparenthesized()
            {
                self.add(specifier);
            }
        }
        walk_expression(self, expr);
    }
}

/// Finds `await` outside any function
#[derive(Default)]
struct TopLevelAwait {
    found: bool,
}

impl VisitMut for TopLevelAwait {
    fn visit_function(&mut self, _function: &mut parser::ast::Function) {}

    fn visit_statement(&mut self, stmt: &mut Statement) {
        if let Statement::ForOfStatement { is_await: true, .. } = stmt {
            self.found = true;
        }
        walk_statement(self, stmt);
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        match expr {
            Expression::AwaitExpression { .. } => self.found = true,
            Expression::ArrowFunctionExpression { .. } => return,
            _ => {}
        }
        walk_expression(self, expr);
    }
}
