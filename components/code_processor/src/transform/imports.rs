//! Library import rewriting

use core_types::Library;
use parser::ast::ExportNamedDeclaration;
use parser::{Program, Statement};
use tracing::debug;

/// Point every import (and re-export) of a configured library at its URL.
///
/// Only exact name matches are rewritten. Other specifiers are left for the
/// bundler to resolve.
pub fn rewrite_imports(program: &mut Program, libraries: &[Library]) {
    for stmt in &mut program.body {
        let source = match stmt {
            Statement::ImportDeclaration(import) => &mut import.source,
            Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                source: Some(source),
                ..
            }) => source,
            Statement::ExportAllDeclaration { source, .. } => source,
            _ => continue,
        };
        if let Some(library) = libraries.iter().find(|library| library.name == *source) {
            let url = library.resolved_url();
            debug!(library = %library.name, url = %url, "rewrote library import");
            *source = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{parse_module, print_program};

    fn rewrite(source: &str, libraries: &[Library]) -> String {
        let mut program = parse_module(source).unwrap();
        rewrite_imports(&mut program, libraries);
        print_program(&program)
    }

    #[test]
    fn test_exact_matches_only() {
        let libraries = [Library::new("react")];
        assert_eq!(
            rewrite("import React from 'react';\nimport dom from 'react-dom';", &libraries),
            "import React from \"https://esm.sh/react\";\nimport dom from \"react-dom\";\n"
        );
    }

    #[test]
    fn test_explicit_url_and_reexports() {
        let libraries = [Library::with_url("fmt", "https://cdn.example.com/fmt.mjs")];
        assert_eq!(
            rewrite("export * from 'fmt';\nexport { pad } from 'fmt';", &libraries),
            "export * from \"https://cdn.example.com/fmt.mjs\";\nexport { pad } from \"https://cdn.example.com/fmt.mjs\";\n"
        );
    }
}
