//! `run` export normalization

use parser::ast::{ArrowFunctionBody, ExportDefault, Function};
use parser::{Expression, Pattern, Program, Statement};
use tracing::debug;

use crate::error::{ProcessError, Result};

const RUN: &str = "run";

/// What the factory ends up returning
enum RunExport {
    /// A function, returned as `function run() {...}`
    Function(Function),
    /// An existing binding, returned by name
    Binding(String),
}

/// Where a named `run` export was found
enum NamedRun {
    Declaration,
    Declarator(usize),
    Specifier(usize),
}

/// Replace the `run` export with a trailing `return function run() {...}`.
///
/// A named `run` export wins over a default export. Fails with
/// [`ProcessError::MissingExport`] when neither is present.
pub fn normalize_run_function(program: &mut Program) -> Result<()> {
    let export = match take_named_run(program) {
        Some(export) => export,
        None => take_default_run(program).ok_or(ProcessError::MissingExport)?,
    };

    let argument = match export {
        RunExport::Function(function) => {
            debug!(is_async = function.is_async, "normalized run function");
            Expression::FunctionExpression(function)
        }
        RunExport::Binding(name) => {
            debug!(binding = %name, "run exported by reference");
            Expression::identifier(name)
        }
    };
    program.body.push(Statement::ReturnStatement {
        argument: Some(argument),
    });
    Ok(())
}

fn find_named_run(body: &[Statement]) -> Option<(usize, NamedRun)> {
    body.iter().enumerate().find_map(|(index, stmt)| {
        let Statement::ExportNamedDeclaration(export) = stmt else {
            return None;
        };
        let found = match export.declaration.as_deref() {
            Some(Statement::FunctionDeclaration(function)) => {
                (function.name.as_deref() == Some(RUN)).then_some(NamedRun::Declaration)
            }
            Some(Statement::VariableDeclaration(decl)) => decl
                .declarations
                .iter()
                .position(|d| matches!(&d.id, Pattern::Identifier(name) if name == RUN))
                .map(NamedRun::Declarator),
            Some(_) => None,
            None => export
                .specifiers
                .iter()
                .position(|s| s.exported == RUN)
                .map(NamedRun::Specifier),
        };
        found.map(|found| (index, found))
    })
}

fn take_named_run(program: &mut Program) -> Option<RunExport> {
    let (index, found) = find_named_run(&program.body)?;
    let Statement::ExportNamedDeclaration(export) = &mut program.body[index] else {
        return None;
    };

    match found {
        NamedRun::Declaration => {
            let Statement::ExportNamedDeclaration(export) = program.body.remove(index) else {
                return None;
            };
            match export.declaration.map(|decl| *decl) {
                Some(Statement::FunctionDeclaration(function)) => Some(RunExport::Function(function)),
                _ => None,
            }
        }
        NamedRun::Declarator(position) => {
            let Some(Statement::VariableDeclaration(decl)) = export.declaration.as_deref_mut() else {
                return None;
            };
            let is_function = decl.declarations[position]
                .init
                .as_ref()
                .map_or(false, |init| {
                    matches!(
                        init.unparenthesized(),
                        Expression::ArrowFunctionExpression { .. } | Expression::FunctionExpression(_)
                    )
                });
            if !is_function {
                return Some(RunExport::Binding(RUN.to_string()));
            }
            let declarator = decl.declarations.remove(position);
            if decl.declarations.is_empty() {
                program.body.remove(index);
            }
            declarator.init.and_then(into_run_function).map(RunExport::Function)
        }
        NamedRun::Specifier(position) => {
            if export.source.is_some() {
                // Stripped into `import { x as run }`, which binds `run`
                return Some(RunExport::Binding(RUN.to_string()));
            }
            let specifier = export.specifiers.remove(position);
            Some(RunExport::Binding(specifier.local))
        }
    }
}

fn take_default_run(program: &mut Program) -> Option<RunExport> {
    let index = program.body.iter().position(|stmt| match stmt {
        Statement::ExportDefaultDeclaration(ExportDefault::Function(_)) => true,
        Statement::ExportDefaultDeclaration(ExportDefault::Expression(expr)) => matches!(
            expr.unparenthesized(),
            Expression::ArrowFunctionExpression { .. } | Expression::FunctionExpression(_)
        ),
        _ => false,
    })?;

    match program.body.remove(index) {
        Statement::ExportDefaultDeclaration(ExportDefault::Function(function)) => {
            Some(RunExport::Function(renamed(function)))
        }
        Statement::ExportDefaultDeclaration(ExportDefault::Expression(expr)) => {
            into_run_function(expr).map(RunExport::Function)
        }
        _ => None,
    }
}

fn renamed(mut function: Function) -> Function {
    function.name = Some(RUN.to_string());
    function
}

/// Convert an arrow or function expression into `function run`
fn into_run_function(mut expr: Expression) -> Option<Function> {
    while let Expression::ParenthesizedExpression { expression } = expr {
        expr = *expression;
    }
    match expr {
        Expression::FunctionExpression(function) => Some(renamed(function)),
        Expression::ArrowFunctionExpression {
            params,
            body,
            is_async,
        } => {
            let body = match body {
                ArrowFunctionBody::Block(body) => body,
                ArrowFunctionBody::Expression(expr) => vec![Statement::ReturnStatement {
                    argument: Some(*expr),
                }],
            };
            Some(Function {
                name: Some(RUN.to_string()),
                params,
                body,
                is_async,
                is_generator: false,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{parse_module, print_program};

    fn normalize(source: &str) -> Result<String> {
        let mut program = parse_module(source).unwrap();
        normalize_run_function(&mut program)?;
        Ok(print_program(&program))
    }

    #[test]
    fn test_export_list_returns_binding() {
        assert_eq!(
            normalize("const impl = () => 3;\nexport { impl as run, impl };").unwrap(),
            "const impl = () => 3;\nexport { impl };\nreturn impl;\n"
        );
    }

    #[test]
    fn test_other_declarators_survive() {
        assert_eq!(
            normalize("export const a = 1, run = () => a;").unwrap(),
            "export const a = 1;\nreturn function run() {\n  return a;\n};\n"
        );
    }

    #[test]
    fn test_non_function_run_value_is_returned_by_name() {
        assert_eq!(
            normalize("export const run = makeRunner();").unwrap(),
            "export const run = makeRunner();\nreturn run;\n"
        );
    }

    #[test]
    fn test_object_literal_arrow_body() {
        assert_eq!(
            normalize("export default () => ({ ok: true });").unwrap(),
            "return function run() {\n  return ({ ok: true });\n};\n"
        );
    }

    #[test]
    fn test_default_non_function_is_not_a_run_export() {
        assert!(matches!(
            normalize("export default 42;"),
            Err(ProcessError::MissingExport)
        ));
    }
}
