//! Live import bindings
//!
//! References to imported names are rewritten into member reads on the
//! importing module's `__mN` namespace, so each read sees the exporter's
//! current value. Modules in an import cycle can therefore use each other's
//! exports once both factories have run. Local declarations shadow imports
//! with ordinary block and function scoping.

use std::collections::{HashMap, HashSet};

use parser::ast::{
    ArrowFunctionBody, Class, ForInOfLeft, ForInit, Function, Literal, VariableDeclaration,
    VariableKind,
};
use parser::lexer::is_identifier_name;
use parser::visit::{walk_class, walk_expression, walk_function, walk_statement};
use parser::{Expression, Pattern, Program, Statement, VisitMut};

/// Imported local name to its namespace binding and exported name
pub(super) type ImportBindings = HashMap<String, (String, String)>;

/// `namespace.name`, or `namespace["name"]` for non-identifier names
pub(super) fn namespace_member(namespace: &str, name: &str) -> Expression {
    if is_identifier_name(name) {
        Expression::member(Expression::identifier(namespace), name)
    } else {
        Expression::MemberExpression {
            object: Box::new(Expression::identifier(namespace)),
            property: Box::new(Expression::string(name)),
            computed: true,
            optional: false,
        }
    }
}

/// Rewrite every unshadowed reference to an imported name in `program`
pub(super) fn link_imports(program: &mut Program, bindings: &ImportBindings) {
    if bindings.is_empty() {
        return;
    }
    LiveBindings {
        bindings,
        scopes: Vec::new(),
    }
    .visit_program(program);
}

struct LiveBindings<'a> {
    bindings: &'a ImportBindings,
    scopes: Vec<HashSet<String>>,
}

impl LiveBindings<'_> {
    fn target(&self, name: &str) -> Option<Expression> {
        if self.scopes.iter().any(|scope| scope.contains(name)) {
            return None;
        }
        self.bindings
            .get(name)
            .map(|(namespace, imported)| namespace_member(namespace, imported))
    }

    fn is_import(&self, expr: &Expression) -> bool {
        matches!(expr, Expression::Identifier { name } if self.target(name).is_some())
    }

    fn scoped(&mut self, names: HashSet<String>, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(names);
        visit(self);
        self.scopes.pop();
    }

    fn block(&mut self, body: &mut [Statement]) {
        let mut names = HashSet::new();
        lexical_names(body, &mut names);
        self.scoped(names, |this| {
            for stmt in body.iter_mut() {
                this.visit_statement(stmt);
            }
        });
    }
}

impl VisitMut for LiveBindings<'_> {
    fn visit_statement(&mut self, stmt: &mut Statement) {
        if let Statement::TryStatement {
            block,
            handler,
            finalizer,
        } = stmt
        {
            self.block(block);
            if let Some(handler) = handler {
                let mut names = HashSet::new();
                lexical_names(&handler.body, &mut names);
                if let Some(param) = &handler.param {
                    names.extend(param.bound_names());
                }
                self.scoped(names, |this| {
                    if let Some(param) = &mut handler.param {
                        this.visit_pattern(param);
                    }
                    for stmt in handler.body.iter_mut() {
                        this.visit_statement(stmt);
                    }
                });
            }
            if let Some(finalizer) = finalizer {
                self.block(finalizer);
            }
            return;
        }

        let mut names = HashSet::new();
        match stmt {
            Statement::BlockStatement { body } => lexical_names(body, &mut names),
            Statement::SwitchStatement { cases, .. } => {
                for case in cases.iter() {
                    lexical_names(&case.consequent, &mut names);
                }
            }
            Statement::ForStatement {
                init: Some(ForInit::VariableDeclaration(decl)),
                ..
            }
            | Statement::ForInStatement {
                left: ForInOfLeft::VariableDeclaration(decl),
                ..
            }
            | Statement::ForOfStatement {
                left: ForInOfLeft::VariableDeclaration(decl),
                ..
            } => declared_names(decl, &mut names),
            _ => {}
        }
        if names.is_empty() {
            walk_statement(self, stmt);
        } else {
            self.scoped(names, |this| walk_statement(this, stmt));
        }
    }

    fn visit_expression(&mut self, expr: &mut Expression) {
        match expr {
            Expression::Identifier { name } => {
                if let Some(target) = self.target(name) {
                    *expr = target;
                }
            }
            Expression::CallExpression { callee, .. } if self.is_import(callee) => {
                // Imported functions are called without the namespace as `this`
                let target =
                    std::mem::replace(callee.as_mut(), Expression::identifier("undefined"));
                **callee = Expression::SequenceExpression {
                    expressions: vec![
                        Expression::Literal {
                            value: Literal::Number(0.0),
                        },
                        target,
                    ],
                };
                walk_expression(self, expr);
            }
            Expression::ArrowFunctionExpression { params, body, .. } => {
                let mut names: HashSet<String> =
                    params.iter().flat_map(Pattern::bound_names).collect();
                if let ArrowFunctionBody::Block(body) = body {
                    function_names(body, &mut names);
                }
                self.scoped(names, |this| walk_expression(this, expr));
            }
            _ => walk_expression(self, expr),
        }
    }

    fn visit_function(&mut self, function: &mut Function) {
        let mut names: HashSet<String> = function
            .params
            .iter()
            .flat_map(Pattern::bound_names)
            .collect();
        names.extend(function.name.iter().cloned());
        function_names(&function.body, &mut names);
        self.scoped(names, |this| walk_function(this, function));
    }

    fn visit_class(&mut self, class: &mut Class) {
        let names = class.name.iter().cloned().collect();
        self.scoped(names, |this| walk_class(this, class));
    }
}

/// Names a function body declares: hoisted `var`s plus its top-level lexical names
fn function_names(body: &[Statement], names: &mut HashSet<String>) {
    for stmt in body {
        var_names(stmt, names);
    }
    lexical_names(body, names);
}

fn declared_names(decl: &VariableDeclaration, names: &mut HashSet<String>) {
    for declarator in &decl.declarations {
        names.extend(declarator.id.bound_names());
    }
}

/// `let`, `const`, class, enum and function declarations directly in `body`
fn lexical_names(body: &[Statement], names: &mut HashSet<String>) {
    for stmt in body {
        match stmt {
            Statement::VariableDeclaration(decl) if !matches!(decl.kind, VariableKind::Var) => {
                declared_names(decl, names)
            }
            Statement::FunctionDeclaration(Function {
                name: Some(name), ..
            })
            | Statement::ClassDeclaration(Class {
                name: Some(name), ..
            })
            | Statement::EnumDeclaration { name, .. } => {
                names.insert(name.clone());
            }
            _ => {}
        }
    }
}

/// `var` declarations anywhere in `stmt` outside nested functions
fn var_names(stmt: &Statement, names: &mut HashSet<String>) {
    let var = |decl: &VariableDeclaration, names: &mut HashSet<String>| {
        if matches!(decl.kind, VariableKind::Var) {
            declared_names(decl, names);
        }
    };
    match stmt {
        Statement::VariableDeclaration(decl) => var(decl, names),
        Statement::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            var_names(consequent, names);
            if let Some(alternate) = alternate {
                var_names(alternate, names);
            }
        }
        Statement::WhileStatement { body, .. }
        | Statement::DoWhileStatement { body, .. }
        | Statement::WithStatement { body, .. }
        | Statement::LabeledStatement { body, .. } => var_names(body, names),
        Statement::ForStatement { init, body, .. } => {
            if let Some(ForInit::VariableDeclaration(decl)) = init {
                var(decl, names);
            }
            var_names(body, names);
        }
        Statement::ForInStatement { left, body, .. }
        | Statement::ForOfStatement { left, body, .. } => {
            if let ForInOfLeft::VariableDeclaration(decl) = left {
                var(decl, names);
            }
            var_names(body, names);
        }
        Statement::BlockStatement { body } => {
            for stmt in body {
                var_names(stmt, names);
            }
        }
        Statement::TryStatement {
            block,
            handler,
            finalizer,
        } => {
            let handler = handler.iter().flat_map(|handler| handler.body.iter());
            for stmt in block.iter().chain(handler).chain(finalizer.iter().flatten()) {
                var_names(stmt, names);
            }
        }
        Statement::SwitchStatement { cases, .. } => {
            for stmt in cases.iter().flat_map(|case| case.consequent.iter()) {
                var_names(stmt, names);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{parse_module, print_program};

    fn link(source: &str, imports: &[(&str, &str)]) -> String {
        let mut program = parse_module(source).unwrap();
        let bindings = imports
            .iter()
            .map(|(local, imported)| {
                (local.to_string(), ("__m0".to_string(), imported.to_string()))
            })
            .collect();
        link_imports(&mut program, &bindings);
        print_program(&program)
    }

    #[test]
    fn test_references_read_the_namespace() {
        assert_eq!(
            link("const y = count + 1;", &[("count", "count")]),
            "const y = __m0.count + 1;\n"
        );
        assert_eq!(
            link("const y = d;", &[("d", "default")]),
            "const y = __m0.default;\n"
        );
        assert_eq!(
            link("const y = odd;", &[("odd", "a-b")]),
            "const y = __m0[\"a-b\"];\n"
        );
    }

    #[test]
    fn test_calls_drop_the_namespace_receiver() {
        assert_eq!(link("inc(1);", &[("inc", "inc")]), "(0, __m0.inc)(1);\n");
    }

    #[test]
    fn test_shorthand_properties_expand() {
        assert_eq!(
            link("const o = { count };", &[("count", "count")]),
            "const o = { count: __m0.count };\n"
        );
    }

    #[test]
    fn test_local_declarations_shadow_imports() {
        let code = link(
            "function f(x) { return x; }\n\
             function g() { var x = 1; return x; }\n\
             const h = (x) => x;\n\
             { let x = 2; x; }\n\
             for (const x of []) { x; }\n\
             try { x; } catch (x) { x; }\n\
             x;",
            &[("x", "x")],
        );
        assert_eq!(code.matches("__m0.x").count(), 2, "{code}");
        assert!(code.ends_with("__m0.x;\n"), "{code}");
    }

    #[test]
    fn test_member_names_and_bindings_are_untouched() {
        assert_eq!(
            link("const o = { x: 1 };\no.x;", &[("x", "x")]),
            "const o = { x: 1 };\no.x;\n"
        );
    }
}
