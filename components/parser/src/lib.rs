//! JavaScript/TypeScript Parser Component
//!
//! Provides the lexer, parser, AST and code printer used to rewrite benchmark
//! sources. TypeScript syntax is erased while parsing, so every [`Program`]
//! describes plain ECMAScript.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes JavaScript/TypeScript source code
//! - [`Parser`] - Recursive descent parser producing an AST
//! - [`Program`] - Abstract Syntax Tree root
//! - [`VisitMut`] - In-place AST rewriting
//! - [`Printer`] - Prints an AST back to JavaScript
//!
//! # Example
//!
//! ```
//! use parser::{print_program, Parser};
//!
//! let source = "let x: number = 42;";
//! let program = Parser::new(source).parse_program().unwrap();
//! assert_eq!(print_program(&program), "let x = 42;\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
mod modules;
pub mod parser;
mod typescript;
pub mod visit;

pub use ast::{Expression, Pattern, Program, Statement};
pub use codegen::{print_expression, print_program, Printer};
pub use lexer::{Keyword, Lexer, Punctuator, Token};
pub use parser::Parser;
pub use visit::VisitMut;

use core_types::JsError;

/// Parse `source` as a module
pub fn parse_module(source: &str) -> Result<Program, JsError> {
    Parser::new(source).allow_top_level_await(true).parse_program()
}
