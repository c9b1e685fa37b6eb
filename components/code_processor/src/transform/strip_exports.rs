//! Export stripping

use parser::ast::{ExportDefault, ImportDeclaration, ImportSpecifier};
use parser::lexer::is_binding_identifier;
use parser::{Expression, Program, Statement};

/// Rewrite every remaining export to a plain local statement.
///
/// Declarations lose their `export`, export lists disappear, type-only
/// exports are dropped and re-exports turn into imports of the same names.
pub fn strip_exports(program: &mut Program) {
    let body = std::mem::take(&mut program.body);
    program.body = body.into_iter().filter_map(strip_statement).collect();
}

fn strip_statement(stmt: Statement) -> Option<Statement> {
    match stmt {
        Statement::ExportNamedDeclaration(export) => match export.declaration {
            Some(declaration) => match *declaration {
                Statement::TypeDeclaration { .. } => None,
                declaration => Some(declaration),
            },
            None => export.source.map(|source| {
                let specifiers = export
                    .specifiers
                    .into_iter()
                    .filter(|specifier| is_binding_identifier(&specifier.exported))
                    .map(|specifier| ImportSpecifier::Named {
                        imported: specifier.local,
                        local: specifier.exported,
                    })
                    .collect();
                Statement::ImportDeclaration(ImportDeclaration { specifiers, source })
            }),
        },
        Statement::ExportDefaultDeclaration(export) => Some(match export {
            ExportDefault::Function(function) if function.name.is_some() => {
                Statement::FunctionDeclaration(function)
            }
            ExportDefault::Function(function) => Statement::ExpressionStatement {
                expression: Expression::FunctionExpression(function),
            },
            ExportDefault::Class(class) if class.name.is_some() => Statement::ClassDeclaration(class),
            ExportDefault::Class(class) => Statement::ExpressionStatement {
                expression: Expression::ClassExpression(class),
            },
            ExportDefault::Expression(expression) => Statement::ExpressionStatement { expression },
        }),
        Statement::ExportAllDeclaration { exported, source } => {
            let specifiers = exported
                .filter(|name| is_binding_identifier(name))
                .map(|local| vec![ImportSpecifier::Namespace { local }])
                .unwrap_or_default();
            Some(Statement::ImportDeclaration(ImportDeclaration { specifiers, source }))
        }
        Statement::TypeDeclaration { .. } => None,
        other => Some(other),
    }
}
