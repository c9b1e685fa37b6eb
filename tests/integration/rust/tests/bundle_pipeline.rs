//! Bundle Integration Tests
//!
//! Source -> transform -> bundle (through the dependency cache) -> engine.

use core_types::{FailureKind, Library};
use code_processor::{process_implementation, CachedLoader};
use dependency_cache::StaticFetcher;
use integration_tests::{memory_fetch, memory_loader, run_once};
use std::sync::Arc;

fn mathlib() -> StaticFetcher {
    StaticFetcher::new()
        .with(
            "https://esm.sh/mathlib",
            "export { double } from \"./double.js\";\n\
             export const triple = (x: number) => x * 3;\n\
             export default \"mathlib\";",
        )
        .with(
            "https://esm.sh/double.js",
            "export function double(x) { return x * 2; }",
        )
        .with(
            "https://esm.sh/mathlib/extra",
            "import { triple } from \"https://esm.sh/mathlib\";\nexport const nine = triple(3);",
        )
}

fn libraries() -> Vec<Library> {
    vec![Library::new("mathlib")]
}

#[tokio::test]
async fn test_library_imports_are_bundled_and_run() {
    let implementation = "import name, { double, triple } from \"mathlib\";\n\
                          export const run = () => [name, double(4), triple(2)];";
    let code = process_implementation("", implementation, &libraries(), memory_loader(mathlib()))
        .await
        .unwrap();
    assert!(!code.contains("import "), "imports left in:\n{}", code);
    assert_eq!(run_once(&code).unwrap(), "[\"mathlib\",8,6]");
}

#[tokio::test]
async fn test_namespace_and_subpath_imports() {
    let setup = "import * as m from \"mathlib\";\nexport const keys = Object.keys(m).sort();";
    let implementation = "import { nine } from \"mathlib/extra\";\nexport const run = () => [keys, nine];";
    let code = process_implementation(setup, implementation, &libraries(), memory_loader(mathlib()))
        .await
        .unwrap();
    assert_eq!(run_once(&code).unwrap(), "[[\"default\",\"double\",\"triple\"],9]");
}

#[tokio::test]
async fn test_dynamic_import_resolves_to_the_namespace() {
    let implementation = "export const run = async () => (await import(\"mathlib\")).triple(3);";
    let code = process_implementation("", implementation, &libraries(), memory_loader(mathlib()))
        .await
        .unwrap();
    assert_eq!(run_once(&code).unwrap(), "9");
}

#[tokio::test]
async fn test_imported_bindings_are_live() {
    let fetcher = StaticFetcher::new().with(
        "https://esm.sh/counter",
        "export let count = 0;\nexport function inc() { count++; }",
    );
    let implementation = "import { count, inc } from \"counter\";\n\
                          export const run = () => { inc(); inc(); return count; };";
    let code = process_implementation(
        "",
        implementation,
        &[Library::new("counter")],
        memory_loader(fetcher),
    )
    .await
    .unwrap();
    assert_eq!(run_once(&code).unwrap(), "2");
}

#[tokio::test]
async fn test_modules_in_an_import_cycle_see_each_other() {
    let fetcher = StaticFetcher::new()
        .with(
            "https://esm.sh/cyclic",
            "import { b } from \"./b.js\";\n\
             export { ba } from \"./b.js\";\n\
             export const a = () => \"a\";\n\
             export const ab = () => a() + b();",
        )
        .with(
            "https://esm.sh/b.js",
            "import { a } from \"https://esm.sh/cyclic\";\n\
             export const b = () => \"b\";\n\
             export const ba = () => b() + a();",
        );
    let implementation = "import { ab, ba } from \"cyclic\";\nexport const run = () => [ab(), ba()];";
    let code = process_implementation(
        "",
        implementation,
        &[Library::new("cyclic")],
        memory_loader(fetcher),
    )
    .await
    .unwrap();
    assert_eq!(run_once(&code).unwrap(), "[\"ab\",\"ba\"]");
}

#[tokio::test]
async fn test_second_bundle_is_served_from_cache() {
    let (fetch, fetcher) = memory_fetch(mathlib());
    let loader = Arc::new(CachedLoader::new(fetch.clone()));
    let implementation = "import { double } from \"mathlib\";\nexport const run = () => double(1);";

    let first = process_implementation("", implementation, &libraries(), loader.clone())
        .await
        .unwrap();
    let requests = fetcher.requests();
    let second = process_implementation("", implementation, &libraries(), loader)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(requests, 2);
    assert_eq!(fetcher.requests(), requests);
    assert_eq!(fetch.count().unwrap(), 2);
    assert!(fetch.stats().hits >= 2);
}

#[tokio::test]
async fn test_missing_module_is_a_fetch_error_naming_the_url() {
    let fetcher = StaticFetcher::new().with_status("https://esm.sh/gone", 404, "not found");
    let implementation = "import gone from \"gone\";\nexport const run = () => gone;";
    let err = process_implementation("", implementation, &[Library::new("gone")], memory_loader(fetcher))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::BundleFetchError);
    assert!(err.to_string().contains("https://esm.sh/gone"));
}

#[tokio::test]
async fn test_unknown_bare_specifier_is_invalid_code() {
    let implementation = "import x from \"not-configured\";\nexport const run = () => x;";
    let err = process_implementation("", implementation, &libraries(), memory_loader(mathlib()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidCode);
}
