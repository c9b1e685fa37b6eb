//! AST rewrites that turn a benchmark module into a factory body
//!
//! Each pass is a pure function over a [`Program`] and can be applied on
//! its own. [`transform`] runs them in order: [`rewrite_imports`],
//! [`normalize_run_function`], [`strip_exports`].

mod imports;
mod run_function;
mod strip_exports;

pub use imports::rewrite_imports;
pub use run_function::normalize_run_function;
pub use strip_exports::strip_exports;

use core_types::Library;
use parser::{print_program, Parser, Program};
use tracing::debug;

use crate::error::Result;

/// Join the setup and implementation sources the way they are parsed
pub fn combine_sources(setup: &str, implementation: &str) -> String {
    format!("{}\n\n{}", setup, implementation)
}

/// Transform combined benchmark source into a function body ending in
/// `return function run() {...}`.
pub fn transform(source: &str, libraries: &[Library]) -> Result<String> {
    let mut program = Parser::new(source).parse_program()?;
    transform_program(&mut program, libraries)?;
    let code = print_program(&program);
    debug!(statements = program.body.len(), "transformed benchmark source");
    Ok(code)
}

/// Apply every pass to an already parsed program
pub fn transform_program(program: &mut Program, libraries: &[Library]) -> Result<()> {
    rewrite_imports(program, libraries);
    normalize_run_function(program)?;
    strip_exports(program);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessError;
    use core_types::FailureKind;

    fn run(source: &str) -> String {
        transform(source, &[]).unwrap()
    }

    #[test]
    fn test_run_function_forms() {
        let cases = [
            "export function run() { return 42; }",
            "export const run = () => { return 42; }",
            "export const run = () => 42",
            "export const run = function () { return 42; }",
            "export default () => 42",
            "export default function () { return 42; }",
            "export default function compute() { return 42; }",
        ];
        for source in cases {
            assert_eq!(
                run(source),
                "return function run() {\n  return 42;\n};\n",
                "source: {}",
                source
            );
        }
    }

    #[test]
    fn test_async_and_generator_are_preserved() {
        assert_eq!(
            run("export const run = async (n: number) => { await n; }"),
            "return async function run(n) {\n  await n;\n};\n"
        );
        assert_eq!(
            run("export default function* () { yield 1; }"),
            "return function* run() {\n  yield 1;\n};\n"
        );
        assert_eq!(
            run("export default async function named() {}"),
            "return async function run() {};\n"
        );
    }

    #[test]
    fn test_named_run_wins_over_default() {
        let code = run("export default () => 1;\nexport const run = () => 2;");
        assert!(code.ends_with("return function run() {\n  return 2;\n};\n"));
        assert!(!code.contains("export"));
    }

    #[test]
    fn test_setup_bindings_are_kept() {
        let source = combine_sources(
            "export const size = 10;\nexport function make(n: number) { return new Array(n).fill(0); }",
            "export const run = () => make(size).length",
        );
        assert_eq!(
            run(&source),
            "const size = 10;\nfunction make(n) {\n  return new Array(n).fill(0);\n}\nreturn function run() {\n  return make(size).length;\n};\n"
        );
    }

    #[test]
    fn test_type_only_exports_vanish() {
        let code = run(
            "export type T = string;\nexport interface I { a: number }\nexport const x: T = 'x';\nexport { x as y };\nexport function run() { return x; }",
        );
        assert_eq!(code, "const x = \"x\";\nreturn function run() {\n  return x;\n};\n");
    }

    #[test]
    fn test_return_is_placed_after_later_bindings() {
        assert_eq!(
            run("export function run() { return later; }\nconst later = 5;"),
            "const later = 5;\nreturn function run() {\n  return later;\n};\n"
        );
    }

    #[test]
    fn test_missing_run_export() {
        let err = transform("export const walk = () => 1;", &[]).unwrap_err();
        assert_eq!(err, ProcessError::MissingExport);
        assert_eq!(err.kind(), FailureKind::MissingExport);
    }

    #[test]
    fn test_parse_failure_is_invalid_code() {
        let err = transform("export const run = () => {", &[]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::InvalidCode);
    }

    #[test]
    fn test_library_imports_are_rewritten() {
        let libraries = [Library::new("lodash")];
        let code = transform(
            "import _ from 'lodash';\nimport x from './local.js';\nexport const run = () => _.sum([x]);",
            &libraries,
        )
        .unwrap();
        assert_eq!(
            code,
            "import _ from \"https://esm.sh/lodash\";\nimport x from \"./local.js\";\nreturn function run() {\n  return _.sum([x]);\n};\n"
        );
    }
}
