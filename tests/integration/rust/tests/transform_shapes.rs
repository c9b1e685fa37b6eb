//! Transform Integration Tests
//!
//! Every supported `run` export form must come out as a returned function
//! that behaves like the original when executed by the engine.

use code_processor::{combine_sources, transform};
use integration_tests::run_once;

fn transform_and_run(setup: &str, implementation: &str) -> String {
    let code = transform(&combine_sources(setup, implementation), &[])
        .unwrap_or_else(|err| panic!("transform failed for {:?}: {}", implementation, err));
    assert!(!code.contains("export"), "exports left in:\n{}", code);
    run_once(&code).unwrap_or_else(|err| panic!("execution failed for:\n{}\n{}", code, err))
}

#[test]
fn test_named_export_forms_return_42() {
    let forms = [
        "export function run() { return 42; }",
        "export const run = () => { return 42; };",
        "export const run = () => 42;",
        "export const run = function () { return 42; };",
        "export let run = function inner() { return 42; };",
        "function answer() { return 42; }\nexport { answer as run };",
    ];
    for form in forms {
        assert_eq!(transform_and_run("", form), "42", "form: {}", form);
    }
}

#[test]
fn test_default_export_forms_return_42() {
    let forms = [
        "export default () => 42;",
        "export default function () { return 42; }",
        "export default function named() { return 42; }",
        "export default (function () { return 42; });",
    ];
    for form in forms {
        assert_eq!(transform_and_run("", form), "42", "form: {}", form);
    }
}

#[test]
fn test_async_forms_are_awaited() {
    let forms = [
        "export async function run() { return 42; }",
        "export const run = async () => 42;",
        "export const run = async function () { return 42; };",
        "export default async () => 42;",
        "export default async function () { return 42; }",
    ];
    for form in forms {
        assert_eq!(transform_and_run("", form), "42", "form: {}", form);
    }
}

#[test]
fn test_setup_exports_become_ambient_bindings() {
    let setup = "export const x = 40;\n\
                 export { x as y };\n\
                 export type T = number;\n\
                 export interface Pair { a: T; b: T }\n\
                 export function two(): T { return 2; }";
    let implementation = "export const run = (): T => { const p: Pair = { a: x, b: two() }; return p.a + p.b; };";
    let code = transform(&combine_sources(setup, implementation), &[]).unwrap();
    assert!(!code.contains("export"), "exports left in:\n{}", code);
    assert!(!code.contains("interface"), "types left in:\n{}", code);
    assert_eq!(run_once(&code).unwrap(), "42");
}

#[test]
fn test_named_run_wins_over_default() {
    let implementation = "export default () => 1;\nexport const run = () => 42;";
    assert_eq!(transform_and_run("", implementation), "42");
}

#[test]
fn test_typescript_is_erased_before_execution() {
    let implementation = "enum Color { Red = 40, Green }\n\
        class Box<T> { constructor(private readonly value: T) {} get(): T { return this.value; } }\n\
        export function run(): number { const b = new Box<number>(Color.Green as number); return b.get()! + 1; }";
    assert_eq!(transform_and_run("", implementation), "42");
}

#[test]
fn test_bindings_after_the_export_are_initialized() {
    let implementation = "export const run = () => later;\nconst later = 42;";
    assert_eq!(transform_and_run("", implementation), "42");
}
