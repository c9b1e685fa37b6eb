//! Contract tests for parser API
//!
//! These tests exercise the public surface the code processor relies on:
//! tokenizing, parsing modules, rewriting and printing.

use core_types::{ErrorKind, JsError};
use parser::ast::{ImportSpecifier, Literal};
use parser::{parse_module, print_program, Expression, Lexer, Parser, Program, Statement, Token};

fn reprint(source: &str) -> String {
    print_program(&parse_module(source).unwrap())
}

// =============================================================================
// Lexer Contract Tests
// =============================================================================

#[test]
fn test_lexer_next_token_returns_result() {
    let mut lexer = Lexer::new("let x = 42;");
    let result: Result<Token, JsError> = lexer.next_token();
    assert!(result.is_ok());
}

#[test]
fn test_lexer_peek_does_not_consume() {
    let mut lexer = Lexer::new("answer");
    let peeked = lexer.peek_token().unwrap().clone();
    let next = lexer.next_token().unwrap();
    assert_eq!(peeked, next);
    assert_eq!(next, Token::Identifier("answer".to_string()));
}

#[test]
fn test_lexer_number_and_string_tokens() {
    let mut lexer = Lexer::new("42.5 'hi'");
    assert_eq!(lexer.next_token().unwrap(), Token::Number(42.5));
    assert_eq!(lexer.next_token().unwrap(), Token::String("hi".to_string()));
    assert_eq!(lexer.next_token().unwrap(), Token::EOF);
}

// =============================================================================
// Parser Contract Tests
// =============================================================================

#[test]
fn test_parse_program_returns_statements() {
    let program: Program = Parser::new("let a = 1; a + 1;").parse_program().unwrap();
    assert_eq!(program.body.len(), 2);
    assert!(matches!(program.body[0], Statement::VariableDeclaration(_)));
    assert!(matches!(program.body[1], Statement::ExpressionStatement { .. }));
}

#[test]
fn test_syntax_error_has_kind_and_position() {
    let err = Parser::new("let = ;").parse_program().unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    let pos = err.source_position.expect("syntax errors carry a position");
    assert_eq!(pos.line, 1);
}

#[test]
fn test_top_level_await_requires_module_mode() {
    assert!(Parser::new("await work();").parse_program().is_err());
    assert!(parse_module("await work();").is_ok());
}

#[test]
fn test_top_level_return_is_opt_in() {
    assert!(Parser::new("return 1;").parse_program().is_err());
    let program = Parser::new("return 1;")
        .allow_return_outside_function(true)
        .parse_program()
        .unwrap();
    assert!(matches!(program.body[0], Statement::ReturnStatement { .. }));
}

#[test]
fn test_module_imports_are_collected() {
    let program = parse_module(
        "import def, { named as alias } from 'https://esm.sh/lib';\nimport * as ns from './ns.js';",
    )
    .unwrap();
    let Statement::ImportDeclaration(first) = &program.body[0] else {
        panic!("expected an import declaration");
    };
    assert_eq!(first.source, "https://esm.sh/lib");
    assert_eq!(
        first.specifiers,
        vec![
            ImportSpecifier::Default {
                local: "def".to_string()
            },
            ImportSpecifier::Named {
                imported: "named".to_string(),
                local: "alias".to_string()
            },
        ]
    );
}

#[test]
fn test_dynamic_import_parses_as_expression() {
    let program = parse_module("const m = import('./m.js');").unwrap();
    let Statement::VariableDeclaration(decl) = &program.body[0] else {
        panic!("expected a declaration");
    };
    let init = decl.declarations[0].init.as_ref().unwrap();
    match init {
        Expression::ImportExpression { source } => assert_eq!(
            **source,
            Expression::Literal {
                value: Literal::String("./m.js".to_string())
            }
        ),
        other => panic!("unexpected {:?}", other),
    }
}

// =============================================================================
// TypeScript Erasure Contract Tests
// =============================================================================

#[test]
fn test_typescript_annotations_are_erased() {
    let source = r#"
interface Options { size: number }
type Pair<T> = [T, T];
function run(options: Options = { size: 3 }): number {
    const pair: Pair<number> = [options.size, options.size!];
    return (pair[0] as number) + pair[1];
}
"#;
    assert_eq!(
        reprint(source),
        "function run(options = { size: 3 }) {\n  const pair = [options.size, options.size];\n  return (pair[0]) + pair[1];\n}\n"
    );
}

#[test]
fn test_type_only_imports_are_dropped() {
    assert_eq!(
        reprint("import type { A } from './types';\nimport { type B, c } from './mixed';\nc();"),
        "import { c } from \"./mixed\";\nc();\n"
    );
}

#[test]
fn test_generic_call_is_not_a_comparison() {
    assert_eq!(reprint("const xs = make<string>(1);"), "const xs = make(1);\n");
    assert_eq!(reprint("const b = a < c;"), "const b = a < c;\n");
}

#[test]
fn test_unsupported_syntax_is_reported() {
    assert!(parse_module("const el = <div />;").is_err());
    assert!(parse_module("namespace N { export const x = 1; }").is_err());
    assert!(parse_module("@sealed class A {}").is_err());
}

// =============================================================================
// Printer Contract Tests
// =============================================================================

#[test]
fn test_print_is_stable_under_reparse() {
    let source = r#"
export async function run() {
    const data = await fetch(`${base}/items?limit=${n}`);
    for (const [key, value] of Object.entries(data ?? {})) {
        if (!value) continue;
        total += key.length * -value;
    }
    return { total, done: true };
}
"#;
    let once = reprint(source);
    let twice = reprint(&once);
    assert_eq!(once, twice);
}
