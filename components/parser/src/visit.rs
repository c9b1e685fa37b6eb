//! Mutable AST traversal
//!
//! Implement [`VisitMut`] and override the hooks you need. Each default hook
//! calls the matching `walk_*` function, which visits the node's children, so
//! an override decides whether (and when) to descend by calling `walk_*` itself.

use crate::ast::*;

/// In-place AST visitor
pub trait VisitMut {
    /// Visit a whole program
    fn visit_program(&mut self, program: &mut Program) {
        walk_program(self, program);
    }

    /// Visit a statement
    fn visit_statement(&mut self, stmt: &mut Statement) {
        walk_statement(self, stmt);
    }

    /// Visit an expression
    fn visit_expression(&mut self, expr: &mut Expression) {
        walk_expression(self, expr);
    }

    /// Visit a binding or assignment pattern
    fn visit_pattern(&mut self, pattern: &mut Pattern) {
        walk_pattern(self, pattern);
    }

    /// Visit a function (declaration, expression or method)
    fn visit_function(&mut self, function: &mut Function) {
        walk_function(self, function);
    }

    /// Visit a class (declaration or expression)
    fn visit_class(&mut self, class: &mut Class) {
        walk_class(self, class);
    }
}

/// Visit every top-level statement
pub fn walk_program<V: VisitMut + ?Sized>(v: &mut V, program: &mut Program) {
    for stmt in &mut program.body {
        v.visit_statement(stmt);
    }
}

fn walk_statements<V: VisitMut + ?Sized>(v: &mut V, body: &mut [Statement]) {
    for stmt in body {
        v.visit_statement(stmt);
    }
}

fn walk_variable_declaration<V: VisitMut + ?Sized>(v: &mut V, decl: &mut VariableDeclaration) {
    for declarator in &mut decl.declarations {
        v.visit_pattern(&mut declarator.id);
        if let Some(init) = &mut declarator.init {
            v.visit_expression(init);
        }
    }
}

/// Visit the children of a statement
pub fn walk_statement<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Statement) {
    match stmt {
        Statement::VariableDeclaration(decl) => walk_variable_declaration(v, decl),
        Statement::FunctionDeclaration(function) => v.visit_function(function),
        Statement::ClassDeclaration(class) => v.visit_class(class),
        Statement::EnumDeclaration { members, .. } => {
            for member in members {
                if let Some(init) = &mut member.init {
                    v.visit_expression(init);
                }
            }
        }
        Statement::ExpressionStatement { expression } => v.visit_expression(expression),
        Statement::ReturnStatement { argument } => {
            if let Some(argument) = argument {
                v.visit_expression(argument);
            }
        }
        Statement::IfStatement {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expression(test);
            v.visit_statement(consequent);
            if let Some(alternate) = alternate {
                v.visit_statement(alternate);
            }
        }
        Statement::WhileStatement { test, body } | Statement::DoWhileStatement { body, test } => {
            v.visit_expression(test);
            v.visit_statement(body);
        }
        Statement::ForStatement {
            init,
            test,
            update,
            body,
        } => {
            match init {
                Some(ForInit::VariableDeclaration(decl)) => walk_variable_declaration(v, decl),
                Some(ForInit::Expression(expr)) => v.visit_expression(expr),
                None => {}
            }
            if let Some(test) = test {
                v.visit_expression(test);
            }
            if let Some(update) = update {
                v.visit_expression(update);
            }
            v.visit_statement(body);
        }
        Statement::ForInStatement { left, right, body }
        | Statement::ForOfStatement {
            left, right, body, ..
        } => {
            match left {
                ForInOfLeft::VariableDeclaration(decl) => walk_variable_declaration(v, decl),
                ForInOfLeft::Pattern(pattern) => v.visit_pattern(pattern),
            }
            v.visit_expression(right);
            v.visit_statement(body);
        }
        Statement::BlockStatement { body } => walk_statements(v, body),
        Statement::ThrowStatement { argument } => v.visit_expression(argument),
        Statement::TryStatement {
            block,
            handler,
            finalizer,
        } => {
            walk_statements(v, block);
            if let Some(handler) = handler {
                if let Some(param) = &mut handler.param {
                    v.visit_pattern(param);
                }
                walk_statements(v, &mut handler.body);
            }
            if let Some(finalizer) = finalizer {
                walk_statements(v, finalizer);
            }
        }
        Statement::SwitchStatement {
            discriminant,
            cases,
        } => {
            v.visit_expression(discriminant);
            for case in cases {
                if let Some(test) = &mut case.test {
                    v.visit_expression(test);
                }
                walk_statements(v, &mut case.consequent);
            }
        }
        Statement::WithStatement { object, body } => {
            v.visit_expression(object);
            v.visit_statement(body);
        }
        Statement::LabeledStatement { body, .. } => v.visit_statement(body),
        Statement::ExportNamedDeclaration(export) => {
            if let Some(declaration) = &mut export.declaration {
                v.visit_statement(declaration);
            }
        }
        Statement::ExportDefaultDeclaration(export) => match export {
            ExportDefault::Function(function) => v.visit_function(function),
            ExportDefault::Class(class) => v.visit_class(class),
            ExportDefault::Expression(expr) => v.visit_expression(expr),
        },
        Statement::TypeDeclaration { .. }
        | Statement::EmptyStatement
        | Statement::BreakStatement { .. }
        | Statement::ContinueStatement { .. }
        | Statement::DebuggerStatement
        | Statement::ImportDeclaration(_)
        | Statement::ExportAllDeclaration { .. } => {}
    }
}

fn walk_property_key<V: VisitMut + ?Sized>(v: &mut V, key: &mut PropertyKey) {
    if let PropertyKey::Computed(expr) = key {
        v.visit_expression(expr);
    }
}

/// Visit the children of an expression
pub fn walk_expression<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expression) {
    match expr {
        Expression::ParenthesizedExpression { expression }
        | Expression::ImportExpression { source: expression }
        | Expression::AwaitExpression { argument: expression }
        | Expression::SpreadElement { argument: expression }
        | Expression::UnaryExpression {
            argument: expression,
            ..
        }
        | Expression::UpdateExpression {
            argument: expression,
            ..
        } => v.visit_expression(expression),
        Expression::TemplateLiteral { expressions, .. }
        | Expression::SequenceExpression { expressions } => {
            for expr in expressions {
                v.visit_expression(expr);
            }
        }
        Expression::TaggedTemplateExpression {
            tag, expressions, ..
        } => {
            v.visit_expression(tag);
            for expr in expressions {
                v.visit_expression(expr);
            }
        }
        Expression::BinaryExpression { left, right, .. }
        | Expression::LogicalExpression { left, right, .. } => {
            v.visit_expression(left);
            v.visit_expression(right);
        }
        Expression::AssignmentExpression { left, right, .. } => {
            v.visit_pattern(left);
            v.visit_expression(right);
        }
        Expression::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            v.visit_expression(test);
            v.visit_expression(consequent);
            v.visit_expression(alternate);
        }
        Expression::CallExpression {
            callee, arguments, ..
        }
        | Expression::NewExpression { callee, arguments } => {
            v.visit_expression(callee);
            for argument in arguments {
                v.visit_expression(argument);
            }
        }
        Expression::MemberExpression {
            object,
            property,
            computed,
            ..
        } => {
            v.visit_expression(object);
            if *computed {
                v.visit_expression(property);
            }
        }
        Expression::ArrayExpression { elements } => {
            for element in elements.iter_mut().flatten() {
                v.visit_expression(element);
            }
        }
        Expression::ObjectExpression { properties } => {
            for property in properties {
                match property {
                    ObjectProperty::Property { key, value, .. } => {
                        walk_property_key(v, key);
                        v.visit_expression(value);
                    }
                    ObjectProperty::Method { key, value, .. } => {
                        walk_property_key(v, key);
                        v.visit_function(value);
                    }
                    ObjectProperty::SpreadElement(argument) => v.visit_expression(argument),
                }
            }
        }
        Expression::ArrowFunctionExpression { params, body, .. } => {
            for param in params {
                v.visit_pattern(param);
            }
            match body {
                ArrowFunctionBody::Expression(expr) => v.visit_expression(expr),
                ArrowFunctionBody::Block(body) => walk_statements(v, body),
            }
        }
        Expression::FunctionExpression(function) => v.visit_function(function),
        Expression::ClassExpression(class) => v.visit_class(class),
        Expression::YieldExpression { argument, .. } => {
            if let Some(argument) = argument {
                v.visit_expression(argument);
            }
        }
        Expression::Identifier { .. }
        | Expression::Literal { .. }
        | Expression::MetaProperty { .. }
        | Expression::ThisExpression
        | Expression::SuperExpression => {}
    }
}

/// Visit the expressions inside a pattern
pub fn walk_pattern<V: VisitMut + ?Sized>(v: &mut V, pattern: &mut Pattern) {
    match pattern {
        Pattern::Identifier(_) => {}
        Pattern::ObjectPattern(properties) => {
            for property in properties {
                if let Some(key) = &mut property.key {
                    walk_property_key(v, key);
                }
                v.visit_pattern(&mut property.value);
            }
        }
        Pattern::ArrayPattern(elements) => {
            for element in elements.iter_mut().flatten() {
                v.visit_pattern(element);
            }
        }
        Pattern::AssignmentPattern { left, right } => {
            v.visit_pattern(left);
            v.visit_expression(right);
        }
        Pattern::RestElement(argument) => v.visit_pattern(argument),
        Pattern::Expression(expr) => v.visit_expression(expr),
    }
}

/// Visit a function's parameters and body
pub fn walk_function<V: VisitMut + ?Sized>(v: &mut V, function: &mut Function) {
    for param in &mut function.params {
        v.visit_pattern(param);
    }
    walk_statements(v, &mut function.body);
}

/// Visit a class heritage clause and members
pub fn walk_class<V: VisitMut + ?Sized>(v: &mut V, class: &mut Class) {
    if let Some(super_class) = &mut class.super_class {
        v.visit_expression(super_class);
    }
    for element in &mut class.body {
        match element {
            ClassElement::MethodDefinition { key, value, .. } => {
                walk_property_key(v, key);
                v.visit_function(value);
            }
            ClassElement::PropertyDefinition { key, value, .. } => {
                walk_property_key(v, key);
                if let Some(value) = value {
                    v.visit_expression(value);
                }
            }
            ClassElement::StaticBlock { body } => walk_statements(v, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;

    struct RenameIdentifiers;

    impl VisitMut for RenameIdentifiers {
        fn visit_expression(&mut self, expr: &mut Expression) {
            if let Expression::Identifier { name } = expr {
                if name == "a" {
                    *name = "b".to_string();
                }
            }
            walk_expression(self, expr);
        }
    }

    #[derive(Default)]
    struct CountAwaits {
        top_level: usize,
    }

    impl VisitMut for CountAwaits {
        fn visit_function(&mut self, _function: &mut Function) {}

        fn visit_expression(&mut self, expr: &mut Expression) {
            match expr {
                Expression::AwaitExpression { .. } => self.top_level += 1,
                Expression::ArrowFunctionExpression { .. } => return,
                _ => {}
            }
            walk_expression(self, expr);
        }
    }

    #[test]
    fn test_rewrite_reaches_nested_expressions() {
        let mut program = parse_module("f(a, [a], { k: a }, () => a);").unwrap();
        RenameIdentifiers.visit_program(&mut program);
        let printed = crate::print_program(&program);
        assert_eq!(printed, "f(b, [b], { k: b }, () => b);\n");
    }

    #[test]
    fn test_overrides_can_skip_function_bodies() {
        let mut program =
            parse_module("await x;\nasync function f() { await y; }\nconst g = async () => await z;")
                .unwrap();
        let mut counter = CountAwaits::default();
        counter.visit_program(&mut program);
        assert_eq!(counter.top_level, 1);
    }
}
