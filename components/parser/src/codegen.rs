//! Deterministic JavaScript printer
//!
//! Output style: two-space indentation, double-quoted strings, semicolons
//! after every statement, parenthesized arrow parameters and no comments.
//! Parentheses are only added where operator precedence requires them;
//! parentheses written in the source survive as
//! [`Expression::ParenthesizedExpression`].

use std::collections::HashSet;

use crate::ast::*;
use crate::lexer::is_identifier_name;
use crate::visit::{walk_expression, VisitMut};

/// Print a program
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::new();
    printer.program(program);
    printer.finish()
}

/// Print a single expression
pub fn print_expression(expr: &Expression) -> String {
    let mut printer = Printer::new();
    printer.expression(expr, PREC_SEQUENCE);
    printer.finish()
}

/// Format a number the way JavaScript source spells it
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", value)
    }
}

/// Double-quoted string literal
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            '\0' => {
                if chars.peek().map_or(false, |next| next.is_ascii_digit()) {
                    out.push_str("\\x00");
                } else {
                    out.push_str("\\0");
                }
            }
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

const PREC_SEQUENCE: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_NULLISH: u8 = 4;
const PREC_UNARY: u8 = 15;
const PREC_POSTFIX: u8 = 16;
const PREC_LHS: u8 = 17;
const PREC_CALL: u8 = 18;
const PREC_PRIMARY: u8 = 19;

fn binary_precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::BitwiseOr => 6,
        BinaryOperator::BitwiseXor => 7,
        BinaryOperator::BitwiseAnd => 8,
        BinaryOperator::Eq
        | BinaryOperator::NotEq
        | BinaryOperator::StrictEq
        | BinaryOperator::StrictNotEq => 9,
        BinaryOperator::Lt
        | BinaryOperator::LtEq
        | BinaryOperator::Gt
        | BinaryOperator::GtEq
        | BinaryOperator::Instanceof
        | BinaryOperator::In => 10,
        BinaryOperator::LeftShift
        | BinaryOperator::RightShift
        | BinaryOperator::UnsignedRightShift => 11,
        BinaryOperator::Add | BinaryOperator::Sub => 12,
        BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 13,
        BinaryOperator::Exp => 14,
    }
}

fn logical_precedence(op: LogicalOperator) -> u8 {
    match op {
        LogicalOperator::NullishCoalesce => PREC_NULLISH,
        LogicalOperator::Or => 4,
        LogicalOperator::And => 5,
    }
}

fn precedence(expr: &Expression) -> u8 {
    match expr {
        Expression::SequenceExpression { .. } => PREC_SEQUENCE,
        Expression::AssignmentExpression { .. }
        | Expression::ArrowFunctionExpression { .. }
        | Expression::YieldExpression { .. }
        | Expression::SpreadElement { .. } => PREC_ASSIGN,
        Expression::ConditionalExpression { .. } => PREC_CONDITIONAL,
        Expression::LogicalExpression { operator, .. } => logical_precedence(*operator),
        Expression::BinaryExpression { operator, .. } => binary_precedence(*operator),
        Expression::UnaryExpression { .. } | Expression::AwaitExpression { .. } => PREC_UNARY,
        Expression::UpdateExpression { prefix: true, .. } => PREC_UNARY,
        Expression::UpdateExpression { prefix: false, .. } => PREC_POSTFIX,
        Expression::CallExpression { .. }
        | Expression::MemberExpression { .. }
        | Expression::NewExpression { .. }
        | Expression::TaggedTemplateExpression { .. }
        | Expression::ImportExpression { .. } => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

/// The node printed first, used to spot statements that would start with
/// `{`, `function` or `class`
fn starts_ambiguously(expr: &Expression, include_object: bool) -> bool {
    match expr {
        Expression::ObjectExpression { .. } => include_object,
        Expression::FunctionExpression(_) | Expression::ClassExpression(_) => true,
        Expression::AssignmentExpression { left, .. } => match left.as_ref() {
            Pattern::ObjectPattern(_) => include_object,
            Pattern::Expression(e) => starts_ambiguously(e, include_object),
            _ => false,
        },
        Expression::BinaryExpression { left, .. } | Expression::LogicalExpression { left, .. } => {
            precedence(left) >= precedence(expr) && starts_ambiguously(left, include_object)
        }
        Expression::ConditionalExpression { test, .. } => {
            precedence(test) > PREC_CONDITIONAL && starts_ambiguously(test, include_object)
        }
        Expression::CallExpression { callee: e, .. }
        | Expression::TaggedTemplateExpression { tag: e, .. } => {
            precedence(e) >= PREC_CALL && starts_ambiguously(e, include_object)
        }
        Expression::MemberExpression { object, .. } => {
            precedence(object) >= PREC_CALL && starts_ambiguously(object, include_object)
        }
        Expression::UpdateExpression {
            argument,
            prefix: false,
            ..
        } => starts_ambiguously(argument, include_object),
        Expression::SequenceExpression { expressions } => expressions
            .first()
            .map_or(false, |first| starts_ambiguously(first, include_object)),
        _ => false,
    }
}

/// `new` callees may not contain a call or optional chain outside parentheses
fn callee_needs_parens(expr: &Expression) -> bool {
    match expr {
        Expression::CallExpression { .. } => true,
        Expression::MemberExpression {
            object, optional, ..
        } => *optional || callee_needs_parens(object),
        Expression::TaggedTemplateExpression { tag, .. } => callee_needs_parens(tag),
        _ => false,
    }
}

/// True if `in` would be read as part of a `for (init; ...)` head
fn contains_in_operator(expr: &Expression) -> bool {
    match expr {
        Expression::BinaryExpression {
            operator: BinaryOperator::In,
            ..
        } => true,
        Expression::BinaryExpression { left, right, .. }
        | Expression::LogicalExpression { left, right, .. } => {
            contains_in_operator(left) || contains_in_operator(right)
        }
        Expression::AssignmentExpression { right, .. } => contains_in_operator(right),
        Expression::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            contains_in_operator(test)
                || contains_in_operator(consequent)
                || contains_in_operator(alternate)
        }
        Expression::SequenceExpression { expressions } => {
            expressions.iter().any(contains_in_operator)
        }
        Expression::UnaryExpression { argument, .. } | Expression::AwaitExpression { argument } => {
            contains_in_operator(argument)
        }
        _ => false,
    }
}

fn is_erased(stmt: &Statement) -> bool {
    match stmt {
        Statement::TypeDeclaration { .. } => true,
        Statement::ExportNamedDeclaration(export) => {
            matches!(export.declaration.as_deref(), Some(Statement::TypeDeclaration { .. }))
        }
        _ => false,
    }
}

/// Prints AST nodes into a string buffer
pub struct Printer {
    out: String,
    indent: usize,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

impl Printer {
    /// Create an empty printer
    pub fn new() -> Self {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    /// Take the printed text
    pub fn finish(self) -> String {
        self.out
    }

    /// Print every statement of a program, one per line
    pub fn program(&mut self, program: &Program) {
        for stmt in &program.body {
            self.statement(stmt);
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Print a statement on its own line(s)
    pub fn statement(&mut self, stmt: &Statement) {
        if is_erased(stmt) {
            return;
        }
        match stmt {
            Statement::EnumDeclaration { name, members } => {
                for lowered in lower_enum(name, members, false) {
                    self.statement(&lowered);
                }
            }
            Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                declaration: Some(declaration),
                ..
            }) if matches!(**declaration, Statement::EnumDeclaration { .. }) => {
                if let Statement::EnumDeclaration { name, members } = declaration.as_ref() {
                    for lowered in lower_enum(name, members, true) {
                        self.statement(&lowered);
                    }
                }
            }
            _ => {
                self.write_indent();
                self.statement_inline(stmt);
                self.push("\n");
            }
        }
    }

    fn block(&mut self, body: &[Statement]) {
        if body.iter().all(is_erased) {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.indent += 1;
        for stmt in body {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.write_indent();
        self.push("}");
    }

    /// Body of `if`/loops, printed after a space
    fn body(&mut self, stmt: &Statement) {
        self.push(" ");
        self.statement_inline(stmt);
    }

    fn statement_inline(&mut self, stmt: &Statement) {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                self.variable_declaration(decl);
                self.push(";");
            }
            Statement::FunctionDeclaration(function) => self.function(function),
            Statement::ClassDeclaration(class) => self.class(class),
            Statement::EnumDeclaration { name, members } => {
                self.block(&lower_enum(name, members, false));
            }
            Statement::TypeDeclaration { .. } => self.push(";"),
            Statement::ExpressionStatement { expression } => {
                if starts_ambiguously(expression, true) {
                    self.push("(");
                    self.expression(expression, PREC_SEQUENCE);
                    self.push(");");
                } else {
                    self.expression(expression, PREC_SEQUENCE);
                    self.push(";");
                }
            }
            Statement::ReturnStatement { argument } => match argument {
                Some(argument) => {
                    self.push("return ");
                    self.expression(argument, PREC_SEQUENCE);
                    self.push(";");
                }
                None => self.push("return;"),
            },
            Statement::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.push("if (");
                self.expression(test, PREC_SEQUENCE);
                self.push(")");
                let dangling = alternate.is_some()
                    && matches!(
                        consequent.as_ref(),
                        Statement::IfStatement {
                            alternate: None,
                            ..
                        }
                    );
                if dangling {
                    self.push(" ");
                    self.block(std::slice::from_ref(consequent.as_ref()));
                } else {
                    self.body(consequent);
                }
                if let Some(alternate) = alternate {
                    self.push(" else");
                    self.body(alternate);
                }
            }
            Statement::WhileStatement { test, body } => {
                self.push("while (");
                self.expression(test, PREC_SEQUENCE);
                self.push(")");
                self.body(body);
            }
            Statement::DoWhileStatement { body, test } => {
                self.push("do");
                self.body(body);
                self.push(" while (");
                self.expression(test, PREC_SEQUENCE);
                self.push(");");
            }
            Statement::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                self.push("for (");
                match init {
                    Some(ForInit::VariableDeclaration(decl)) => self.variable_declaration(decl),
                    Some(ForInit::Expression(expr)) => {
                        if contains_in_operator(expr) {
                            self.push("(");
                            self.expression(expr, PREC_SEQUENCE);
                            self.push(")");
                        } else {
                            self.expression(expr, PREC_SEQUENCE);
                        }
                    }
                    None => {}
                }
                self.push(";");
                if let Some(test) = test {
                    self.push(" ");
                    self.expression(test, PREC_SEQUENCE);
                }
                self.push(";");
                if let Some(update) = update {
                    self.push(" ");
                    self.expression(update, PREC_SEQUENCE);
                }
                self.push(")");
                self.body(body);
            }
            Statement::ForInStatement { left, right, body } => {
                self.push("for (");
                self.for_left(left);
                self.push(" in ");
                self.expression(right, PREC_SEQUENCE);
                self.push(")");
                self.body(body);
            }
            Statement::ForOfStatement {
                left,
                right,
                body,
                is_await,
            } => {
                self.push(if *is_await { "for await (" } else { "for (" });
                self.for_left(left);
                self.push(" of ");
                self.expression(right, PREC_ASSIGN);
                self.push(")");
                self.body(body);
            }
            Statement::BlockStatement { body } => self.block(body),
            Statement::EmptyStatement => self.push(";"),
            Statement::BreakStatement { label } => match label {
                Some(label) => self.push(&format!("break {};", label)),
                None => self.push("break;"),
            },
            Statement::ContinueStatement { label } => match label {
                Some(label) => self.push(&format!("continue {};", label)),
                None => self.push("continue;"),
            },
            Statement::ThrowStatement { argument } => {
                self.push("throw ");
                self.expression(argument, PREC_SEQUENCE);
                self.push(";");
            }
            Statement::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                self.push("try ");
                self.block(block);
                if let Some(handler) = handler {
                    match &handler.param {
                        Some(param) => {
                            self.push(" catch (");
                            self.pattern(param);
                            self.push(") ");
                        }
                        None => self.push(" catch "),
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            Statement::SwitchStatement {
                discriminant,
                cases,
            } => {
                self.push("switch (");
                self.expression(discriminant, PREC_SEQUENCE);
                self.push(") {\n");
                self.indent += 1;
                for case in cases {
                    self.write_indent();
                    match &case.test {
                        Some(test) => {
                            self.push("case ");
                            self.expression(test, PREC_SEQUENCE);
                            self.push(":\n");
                        }
                        None => self.push("default:\n"),
                    }
                    self.indent += 1;
                    for stmt in &case.consequent {
                        self.statement(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.write_indent();
                self.push("}");
            }
            Statement::WithStatement { object, body } => {
                self.push("with (");
                self.expression(object, PREC_SEQUENCE);
                self.push(")");
                self.body(body);
            }
            Statement::DebuggerStatement => self.push("debugger;"),
            Statement::LabeledStatement { label, body } => {
                self.push(label);
                self.push(":");
                self.body(body);
            }
            Statement::ImportDeclaration(import) => self.import_declaration(import),
            Statement::ExportNamedDeclaration(export) => self.export_named(export),
            Statement::ExportDefaultDeclaration(export) => {
                self.push("export default ");
                match export {
                    ExportDefault::Function(function) => self.function(function),
                    ExportDefault::Class(class) => self.class(class),
                    ExportDefault::Expression(expr) => {
                        if starts_ambiguously(expr, false) {
                            self.push("(");
                            self.expression(expr, PREC_ASSIGN);
                            self.push(");");
                        } else {
                            self.expression(expr, PREC_ASSIGN);
                            self.push(";");
                        }
                    }
                }
            }
            Statement::ExportAllDeclaration { exported, source } => {
                self.push("export * ");
                if let Some(exported) = exported {
                    self.push("as ");
                    self.module_export_name(exported);
                    self.push(" ");
                }
                self.push("from ");
                self.push(&quote_string(source));
                self.push(";");
            }
        }
    }

    fn variable_declaration(&mut self, decl: &VariableDeclaration) {
        self.push(decl.kind.as_str());
        self.push(" ");
        for (i, declarator) in decl.declarations.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pattern(&declarator.id);
            if let Some(init) = &declarator.init {
                self.push(" = ");
                self.expression(init, PREC_ASSIGN);
            }
        }
    }

    fn for_left(&mut self, left: &ForInOfLeft) {
        match left {
            ForInOfLeft::VariableDeclaration(decl) => self.variable_declaration(decl),
            ForInOfLeft::Pattern(pattern) => self.pattern(pattern),
        }
    }

    fn module_export_name(&mut self, name: &str) {
        if is_identifier_name(name) {
            self.push(name);
        } else {
            self.push(&quote_string(name));
        }
    }

    fn import_declaration(&mut self, import: &ImportDeclaration) {
        self.push("import ");
        if import.specifiers.is_empty() {
            self.push(&quote_string(&import.source));
            self.push(";");
            return;
        }

        let mut named = Vec::new();
        let mut wrote_clause = false;
        for specifier in &import.specifiers {
            match specifier {
                ImportSpecifier::Default { local } => {
                    if wrote_clause {
                        self.push(", ");
                    }
                    self.push(local);
                    wrote_clause = true;
                }
                ImportSpecifier::Namespace { local } => {
                    if wrote_clause {
                        self.push(", ");
                    }
                    self.push("* as ");
                    self.push(local);
                    wrote_clause = true;
                }
                ImportSpecifier::Named { imported, local } => named.push((imported, local)),
            }
        }
        if !named.is_empty() {
            if wrote_clause {
                self.push(", ");
            }
            self.push("{ ");
            for (i, (imported, local)) in named.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                if imported == local {
                    self.push(local);
                } else {
                    self.module_export_name(imported);
                    self.push(" as ");
                    self.push(local);
                }
            }
            self.push(" }");
        }
        self.push(" from ");
        self.push(&quote_string(&import.source));
        self.push(";");
    }

    fn export_named(&mut self, export: &ExportNamedDeclaration) {
        if let Some(declaration) = &export.declaration {
            self.push("export ");
            self.statement_inline(declaration);
            return;
        }
        if export.specifiers.is_empty() {
            self.push("export {}");
        } else {
            self.push("export { ");
            for (i, specifier) in export.specifiers.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.module_export_name(&specifier.local);
                if specifier.local != specifier.exported {
                    self.push(" as ");
                    self.module_export_name(&specifier.exported);
                }
            }
            self.push(" }");
        }
        if let Some(source) = &export.source {
            self.push(" from ");
            self.push(&quote_string(source));
        }
        self.push(";");
    }

    fn function(&mut self, function: &Function) {
        if function.is_async {
            self.push("async ");
        }
        self.push("function");
        if function.is_generator {
            self.push("*");
        }
        self.push(" ");
        if let Some(name) = &function.name {
            self.push(name);
        }
        self.params(&function.params);
        self.push(" ");
        self.block(&function.body);
    }

    fn params(&mut self, params: &[Pattern]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.pattern(param);
        }
        self.push(")");
    }

    fn class(&mut self, class: &Class) {
        self.push("class");
        if let Some(name) = &class.name {
            self.push(" ");
            self.push(name);
        }
        if let Some(super_class) = &class.super_class {
            self.push(" extends ");
            self.expression(super_class, PREC_CALL);
        }
        if class.body.is_empty() {
            self.push(" {}");
            return;
        }
        self.push(" {\n");
        self.indent += 1;
        for element in &class.body {
            self.write_indent();
            match element {
                ClassElement::MethodDefinition {
                    key,
                    kind,
                    value,
                    is_static,
                } => {
                    if *is_static {
                        self.push("static ");
                    }
                    self.method(key, *kind, value);
                }
                ClassElement::PropertyDefinition {
                    key,
                    value,
                    is_static,
                } => {
                    if *is_static {
                        self.push("static ");
                    }
                    self.property_key(key);
                    if let Some(value) = value {
                        self.push(" = ");
                        self.expression(value, PREC_ASSIGN);
                    }
                    self.push(";");
                }
                ClassElement::StaticBlock { body } => {
                    self.push("static ");
                    self.block(body);
                }
            }
            self.push("\n");
        }
        self.indent -= 1;
        self.write_indent();
        self.push("}");
    }

    fn method(&mut self, key: &PropertyKey, kind: MethodKind, value: &Function) {
        match kind {
            MethodKind::Get => self.push("get "),
            MethodKind::Set => self.push("set "),
            MethodKind::Method | MethodKind::Constructor => {}
        }
        if value.is_async {
            self.push("async ");
        }
        if value.is_generator {
            self.push("*");
        }
        self.property_key(key);
        self.params(&value.params);
        self.push(" ");
        self.block(&value.body);
    }

    fn property_key(&mut self, key: &PropertyKey) {
        match key {
            PropertyKey::Identifier(name) => self.push(name),
            PropertyKey::PrivateName(name) => {
                self.push("#");
                self.push(name);
            }
            PropertyKey::String(value) => self.push(&quote_string(value)),
            PropertyKey::Number(value) => self.push(&format_number(*value)),
            PropertyKey::Computed(expr) => {
                self.push("[");
                self.expression(expr, PREC_ASSIGN);
                self.push("]");
            }
        }
    }

    /// Print a binding or assignment pattern
    pub fn pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Identifier(name) => self.push(name),
            Pattern::ObjectPattern(properties) => {
                if properties.is_empty() {
                    self.push("{}");
                    return;
                }
                self.push("{ ");
                for (i, property) in properties.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match &property.key {
                        None => self.pattern(&property.value),
                        Some(key) => {
                            let shorthand_name = match (key, &property.value) {
                                (PropertyKey::Identifier(k), Pattern::Identifier(v)) => k == v,
                                (PropertyKey::Identifier(k), Pattern::AssignmentPattern { left, .. }) => {
                                    matches!(left.as_ref(), Pattern::Identifier(v) if v == k)
                                }
                                _ => false,
                            };
                            if !shorthand_name {
                                self.property_key(key);
                                self.push(": ");
                            }
                            self.pattern(&property.value);
                        }
                    }
                }
                self.push(" }");
            }
            Pattern::ArrayPattern(elements) => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(element) = element {
                        self.pattern(element);
                    }
                }
                if matches!(elements.last(), Some(None)) {
                    self.push(",");
                }
                self.push("]");
            }
            Pattern::AssignmentPattern { left, right } => {
                self.pattern(left);
                self.push(" = ");
                self.expression(right, PREC_ASSIGN);
            }
            Pattern::RestElement(argument) => {
                self.push("...");
                self.pattern(argument);
            }
            Pattern::Expression(expr) => self.expression(expr, PREC_LHS),
        }
    }

    /// Print `expr`, parenthesized if it binds looser than `min_precedence`
    pub fn expression(&mut self, expr: &Expression, min_precedence: u8) {
        if precedence(expr) < min_precedence {
            self.push("(");
            self.expression_unparenthesized(expr);
            self.push(")");
        } else {
            self.expression_unparenthesized(expr);
        }
    }

    fn expression_unparenthesized(&mut self, expr: &Expression) {
        match expr {
            Expression::Identifier { name } => self.push(name),
            Expression::Literal { value } => self.literal(value),
            Expression::ParenthesizedExpression { expression } => {
                self.push("(");
                self.expression(expression, PREC_SEQUENCE);
                self.push(")");
            }
            Expression::TemplateLiteral {
                quasis,
                expressions,
            } => self.template(quasis, expressions),
            Expression::TaggedTemplateExpression {
                tag,
                quasis,
                expressions,
            } => {
                self.expression(tag, PREC_CALL);
                self.template(quasis, expressions);
            }
            Expression::BinaryExpression {
                left,
                operator,
                right,
            } => {
                let prec = binary_precedence(*operator);
                if *operator == BinaryOperator::Exp {
                    self.expression(left, PREC_POSTFIX);
                    self.push(" ** ");
                    self.expression(right, prec);
                } else {
                    self.expression(left, prec);
                    self.push(" ");
                    self.push(operator.as_str());
                    self.push(" ");
                    self.expression(right, prec + 1);
                }
            }
            Expression::LogicalExpression {
                left,
                operator,
                right,
            } => {
                let prec = logical_precedence(*operator);
                self.logical_operand(left, *operator, prec);
                self.push(" ");
                self.push(operator.as_str());
                self.push(" ");
                self.logical_operand(right, *operator, prec + 1);
            }
            Expression::UnaryExpression { operator, argument } => {
                self.push(operator.as_str());
                let needs_space = match operator {
                    UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete => true,
                    UnaryOperator::Minus => starts_with_sign(argument, '-'),
                    UnaryOperator::Plus => starts_with_sign(argument, '+'),
                    _ => false,
                };
                if needs_space {
                    self.push(" ");
                }
                self.expression(argument, PREC_UNARY);
            }
            Expression::UpdateExpression {
                operator,
                argument,
                prefix,
            } => {
                let op = match operator {
                    UpdateOperator::Increment => "++",
                    UpdateOperator::Decrement => "--",
                };
                if *prefix {
                    self.push(op);
                    self.expression(argument, PREC_LHS);
                } else {
                    self.expression(argument, PREC_LHS);
                    self.push(op);
                }
            }
            Expression::AssignmentExpression {
                left,
                operator,
                right,
            } => {
                self.pattern(left);
                self.push(" ");
                self.push(operator.as_str());
                self.push(" ");
                self.expression(right, PREC_ASSIGN);
            }
            Expression::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.expression(test, PREC_NULLISH);
                self.push(" ? ");
                self.expression(consequent, PREC_ASSIGN);
                self.push(" : ");
                self.expression(alternate, PREC_ASSIGN);
            }
            Expression::CallExpression {
                callee,
                arguments,
                optional,
            } => {
                self.expression(callee, PREC_CALL);
                if *optional {
                    self.push("?.");
                }
                self.arguments(arguments);
            }
            Expression::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                if matches!(
                    object.as_ref(),
                    Expression::Literal {
                        value: Literal::Number(_)
                    }
                ) {
                    self.push("(");
                    self.expression(object, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expression(object, PREC_CALL);
                }
                if *computed {
                    self.push(if *optional { "?.[" } else { "[" });
                    self.expression(property, PREC_SEQUENCE);
                    self.push("]");
                } else {
                    self.push(if *optional { "?." } else { "." });
                    self.expression(property, PREC_PRIMARY);
                }
            }
            Expression::NewExpression { callee, arguments } => {
                self.push("new ");
                if callee_needs_parens(callee) {
                    self.push("(");
                    self.expression(callee, PREC_SEQUENCE);
                    self.push(")");
                } else {
                    self.expression(callee, PREC_CALL);
                }
                self.arguments(arguments);
            }
            Expression::MetaProperty { meta, property } => {
                self.push(meta);
                self.push(".");
                self.push(property);
            }
            Expression::ImportExpression { source } => {
                self.push("import(");
                self.expression(source, PREC_ASSIGN);
                self.push(")");
            }
            Expression::ArrayExpression { elements } => {
                self.push("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    if let Some(element) = element {
                        self.expression(element, PREC_ASSIGN);
                    }
                }
                if matches!(elements.last(), Some(None)) {
                    self.push(",");
                }
                self.push("]");
            }
            Expression::ObjectExpression { properties } => self.object(properties),
            Expression::ArrowFunctionExpression {
                params,
                body,
                is_async,
            } => {
                if *is_async {
                    self.push("async ");
                }
                self.params(params);
                self.push(" => ");
                match body {
                    ArrowFunctionBody::Block(body) => self.block(body),
                    ArrowFunctionBody::Expression(expr) => {
                        if starts_with_object(expr) {
                            self.push("(");
                            self.expression(expr, PREC_SEQUENCE);
                            self.push(")");
                        } else {
                            self.expression(expr, PREC_ASSIGN);
                        }
                    }
                }
            }
            Expression::FunctionExpression(function) => self.function(function),
            Expression::ClassExpression(class) => self.class(class),
            Expression::ThisExpression => self.push("this"),
            Expression::SuperExpression => self.push("super"),
            Expression::AwaitExpression { argument } => {
                self.push("await ");
                self.expression(argument, PREC_UNARY);
            }
            Expression::YieldExpression { argument, delegate } => {
                self.push(if *delegate { "yield*" } else { "yield" });
                if let Some(argument) = argument {
                    self.push(" ");
                    self.expression(argument, PREC_ASSIGN);
                }
            }
            Expression::SpreadElement { argument } => {
                self.push("...");
                self.expression(argument, PREC_ASSIGN);
            }
            Expression::SequenceExpression { expressions } => {
                for (i, expr) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expression(expr, PREC_ASSIGN);
                }
            }
        }
    }

    /// `??` cannot be mixed with `||`/`&&` without parentheses
    fn logical_operand(&mut self, operand: &Expression, parent: LogicalOperator, min: u8) {
        let mixes = match operand {
            Expression::LogicalExpression { operator, .. } => {
                (parent == LogicalOperator::NullishCoalesce)
                    != (*operator == LogicalOperator::NullishCoalesce)
            }
            _ => false,
        };
        if mixes {
            self.push("(");
            self.expression(operand, PREC_SEQUENCE);
            self.push(")");
        } else {
            self.expression(operand, min);
        }
    }

    fn arguments(&mut self, arguments: &[Expression]) {
        self.push("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.expression(argument, PREC_ASSIGN);
        }
        self.push(")");
    }

    fn template(&mut self, quasis: &[TemplateElement], expressions: &[Expression]) {
        self.push("`");
        for (i, quasi) in quasis.iter().enumerate() {
            self.push(&quasi.raw);
            if let Some(expr) = expressions.get(i) {
                self.push("${");
                self.expression(expr, PREC_SEQUENCE);
                self.push("}");
            }
        }
        self.push("`");
    }

    fn literal(&mut self, value: &Literal) {
        match value {
            Literal::Number(n) => self.push(&format_number(*n)),
            Literal::BigInt(digits) => {
                self.push(digits);
                self.push("n");
            }
            Literal::String(s) => self.push(&quote_string(s)),
            Literal::Boolean(b) => self.push(if *b { "true" } else { "false" }),
            Literal::Null => self.push("null"),
            Literal::RegExp { pattern, flags } => {
                self.push("/");
                self.push(pattern);
                self.push("/");
                self.push(flags);
            }
        }
    }

    fn object(&mut self, properties: &[ObjectProperty]) {
        if properties.is_empty() {
            self.push("{}");
            return;
        }
        let multiline = properties.iter().any(property_has_body);
        if multiline {
            self.push("{\n");
            self.indent += 1;
        } else {
            self.push("{ ");
        }
        for (i, property) in properties.iter().enumerate() {
            if i > 0 {
                self.push(if multiline { ",\n" } else { ", " });
            }
            if multiline {
                self.write_indent();
            }
            match property {
                ObjectProperty::Property {
                    key,
                    value,
                    shorthand,
                } => {
                    let is_shorthand = *shorthand
                        && match (key, value) {
                            (PropertyKey::Identifier(k), Expression::Identifier { name }) => k == name,
                            (_, Expression::AssignmentExpression { .. }) => true,
                            _ => false,
                        };
                    if is_shorthand {
                        self.expression(value, PREC_ASSIGN);
                    } else {
                        self.property_key(key);
                        self.push(": ");
                        self.expression(value, PREC_ASSIGN);
                    }
                }
                ObjectProperty::Method { key, kind, value } => self.method(key, *kind, value),
                ObjectProperty::SpreadElement(argument) => {
                    self.push("...");
                    self.expression(argument, PREC_ASSIGN);
                }
            }
        }
        if multiline {
            self.push("\n");
            self.indent -= 1;
            self.write_indent();
            self.push("}");
        } else {
            self.push(" }");
        }
    }
}

fn leftmost(expr: &Expression) -> &Expression {
    match expr {
        Expression::BinaryExpression { left, .. } | Expression::LogicalExpression { left, .. } => {
            leftmost(left)
        }
        Expression::ConditionalExpression { test, .. } => leftmost(test),
        Expression::CallExpression { callee: e, .. }
        | Expression::TaggedTemplateExpression { tag: e, .. }
        | Expression::MemberExpression { object: e, .. } => leftmost(e),
        Expression::SequenceExpression { expressions } => {
            expressions.first().map_or(expr, leftmost)
        }
        _ => expr,
    }
}

fn starts_with_object(expr: &Expression) -> bool {
    match leftmost(expr) {
        Expression::ObjectExpression { .. } => true,
        Expression::AssignmentExpression { left, .. } => {
            matches!(left.as_ref(), Pattern::ObjectPattern(_))
        }
        _ => false,
    }
}

fn starts_with_sign(expr: &Expression, sign: char) -> bool {
    match expr {
        Expression::UnaryExpression { operator, .. } => operator.as_str().starts_with(sign),
        Expression::UpdateExpression {
            operator,
            prefix: true,
            ..
        } => match operator {
            UpdateOperator::Increment => sign == '+',
            UpdateOperator::Decrement => sign == '-',
        },
        Expression::Literal {
            value: Literal::Number(n),
        } => sign == '-' && (*n < 0.0 || (*n == 0.0 && n.is_sign_negative())),
        _ => false,
    }
}

fn property_has_body(property: &ObjectProperty) -> bool {
    match property {
        ObjectProperty::Method { .. } => true,
        ObjectProperty::Property { value, .. } | ObjectProperty::SpreadElement(value) => {
            match value.unparenthesized() {
                Expression::FunctionExpression(_) | Expression::ClassExpression(_) => true,
                Expression::ArrowFunctionExpression {
                    body: ArrowFunctionBody::Block(_),
                    ..
                } => true,
                Expression::ObjectExpression { properties } => properties.iter().any(property_has_body),
                _ => false,
            }
        }
    }
}

/// Qualifies references to earlier enum members with the enum object
struct QualifyEnumMembers<'a> {
    object: &'a str,
    members: &'a HashSet<String>,
}

impl VisitMut for QualifyEnumMembers<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        if let Expression::Identifier { name } = expr {
            if self.members.contains(name) {
                *expr = Expression::member(Expression::identifier(self.object), name.clone());
                return;
            }
        }
        if let Expression::MemberExpression {
            object,
            computed: false,
            ..
        } = expr
        {
            self.visit_expression(object);
            return;
        }
        walk_expression(self, expr);
    }
}

fn enum_member_target(object: &str, member: &str) -> Expression {
    Expression::MemberExpression {
        object: Box::new(Expression::identifier(object)),
        property: Box::new(Expression::string(member)),
        computed: true,
        optional: false,
    }
}

fn assign(target: Expression, value: Expression) -> Expression {
    Expression::AssignmentExpression {
        left: Box::new(Pattern::Expression(Box::new(target))),
        operator: AssignmentOperator::Assign,
        right: Box::new(value),
    }
}

fn numeric_literal(expr: &Expression) -> Option<f64> {
    match expr.unparenthesized() {
        Expression::Literal {
            value: Literal::Number(n),
        } => Some(*n),
        Expression::UnaryExpression {
            operator: UnaryOperator::Minus,
            argument,
        } => numeric_literal(argument).map(|n| -n),
        _ => None,
    }
}

/// Lower `enum E { A, B = "b" }` to
/// `var E; (function (E) { E[E["A"] = 0] = "A"; E["B"] = "b"; })(E || (E = {}));`
fn lower_enum(name: &str, members: &[EnumMember], exported: bool) -> Vec<Statement> {
    let mut body = Vec::with_capacity(members.len());
    let mut seen = HashSet::new();
    let mut next: Option<f64> = Some(0.0);
    let mut previous: Option<&str> = None;

    for member in members {
        let (value, numeric) = match &member.init {
            None => match (next, previous) {
                (Some(n), _) => (Expression::Literal { value: Literal::Number(n) }, true),
                (None, Some(prev)) => (
                    Expression::BinaryExpression {
                        left: Box::new(enum_member_target(name, prev)),
                        operator: BinaryOperator::Add,
                        right: Box::new(Expression::Literal { value: Literal::Number(1.0) }),
                    },
                    true,
                ),
                (None, None) => (Expression::Literal { value: Literal::Number(0.0) }, true),
            },
            Some(init) => {
                if let Some(n) = numeric_literal(init) {
                    (Expression::Literal { value: Literal::Number(n) }, true)
                } else if matches!(
                    init.unparenthesized(),
                    Expression::Literal { value: Literal::String(_) } | Expression::TemplateLiteral { .. }
                ) {
                    (init.clone(), false)
                } else {
                    let mut value = init.clone();
                    QualifyEnumMembers {
                        object: name,
                        members: &seen,
                    }
                    .visit_expression(&mut value);
                    (value, true)
                }
            }
        };

        next = match &value {
            Expression::Literal {
                value: Literal::Number(n),
            } => Some(n + 1.0),
            _ => None,
        };

        let entry = if numeric {
            assign(
                Expression::MemberExpression {
                    object: Box::new(Expression::identifier(name)),
                    property: Box::new(assign(enum_member_target(name, &member.name), value)),
                    computed: true,
                    optional: false,
                },
                Expression::string(member.name.clone()),
            )
        } else {
            assign(enum_member_target(name, &member.name), value)
        };
        body.push(Statement::ExpressionStatement { expression: entry });
        seen.insert(member.name.clone());
        previous = Some(member.name.as_str());
    }

    let declaration = Statement::VariableDeclaration(VariableDeclaration {
        kind: VariableKind::Var,
        declarations: vec![VariableDeclarator {
            id: Pattern::Identifier(name.to_string()),
            init: None,
        }],
    });
    let declaration = if exported {
        Statement::ExportNamedDeclaration(ExportNamedDeclaration {
            declaration: Some(Box::new(declaration)),
            specifiers: Vec::new(),
            source: None,
        })
    } else {
        declaration
    };

    let factory = Expression::ParenthesizedExpression {
        expression: Box::new(Expression::FunctionExpression(Function {
            name: None,
            params: vec![Pattern::Identifier(name.to_string())],
            body,
            is_async: false,
            is_generator: false,
        })),
    };
    let argument = Expression::LogicalExpression {
        left: Box::new(Expression::identifier(name)),
        operator: LogicalOperator::Or,
        right: Box::new(assign(
            Expression::identifier(name),
            Expression::ObjectExpression {
                properties: Vec::new(),
            },
        )),
    };

    vec![
        declaration,
        Statement::ExpressionStatement {
            expression: Expression::call(factory, vec![argument]),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;

    fn reprint(source: &str) -> String {
        print_program(&parse_module(source).unwrap())
    }

    #[test]
    fn test_print_declarations() {
        assert_eq!(reprint("let   x=1,y"), "let x = 1, y;\n");
        assert_eq!(
            reprint("function add(a,b){return a+b}"),
            "function add(a, b) {\n  return a + b;\n}\n"
        );
        assert_eq!(reprint("const f = async x => x"), "const f = async (x) => x;\n");
    }

    #[test]
    fn test_print_strings_use_double_quotes() {
        assert_eq!(reprint("'it\\'s \"x\"'"), "\"it's \\\"x\\\"\";\n");
    }

    #[test]
    fn test_print_precedence_parentheses() {
        let expr = Expression::BinaryExpression {
            left: Box::new(Expression::BinaryExpression {
                left: Box::new(Expression::identifier("a")),
                operator: BinaryOperator::Add,
                right: Box::new(Expression::identifier("b")),
            }),
            operator: BinaryOperator::Mul,
            right: Box::new(Expression::identifier("c")),
        };
        assert_eq!(print_expression(&expr), "(a + b) * c");

        let mixed = Expression::LogicalExpression {
            left: Box::new(Expression::LogicalExpression {
                left: Box::new(Expression::identifier("a")),
                operator: LogicalOperator::Or,
                right: Box::new(Expression::identifier("b")),
            }),
            operator: LogicalOperator::NullishCoalesce,
            right: Box::new(Expression::identifier("c")),
        };
        assert_eq!(print_expression(&mixed), "(a || b) ?? c");
    }

    #[test]
    fn test_print_keeps_source_parentheses() {
        assert_eq!(reprint("x = (a, b);"), "x = (a, b);\n");
        assert_eq!(reprint("(function () {})();"), "(function () {})();\n");
    }

    #[test]
    fn test_print_object_forms() {
        assert_eq!(reprint("x = {a:1, b, [c]: 2, ...d}"), "x = { a: 1, b, [c]: 2, ...d };\n");
        assert_eq!(
            reprint("x = { m() { return 1 } }"),
            "x = {\n  m() {\n    return 1;\n  }\n};\n"
        );
        assert_eq!(reprint("f = () => ({})"), "f = () => ({});\n");
    }

    #[test]
    fn test_print_control_flow() {
        assert_eq!(
            reprint("for (let i = 0; i < n; i++) if (i % 2) continue; else total += i"),
            "for (let i = 0; i < n; i++) if (i % 2) continue; else total += i;\n"
        );
        assert_eq!(
            reprint("try { a() } catch { b() } finally { c() }"),
            "try {\n  a();\n} catch {\n  b();\n} finally {\n  c();\n}\n"
        );
        assert_eq!(
            reprint("switch (x) { case 1: y(); break; default: z() }"),
            "switch (x) {\n  case 1:\n    y();\n    break;\n  default:\n    z();\n}\n"
        );
    }

    #[test]
    fn test_print_class() {
        assert_eq!(
            reprint("class A extends B { static n = 1; #p; get v() { return this.#p } }"),
            "class A extends B {\n  static n = 1;\n  #p;\n  get v() {\n    return this.#p;\n  }\n}\n"
        );
    }

    #[test]
    fn test_print_typescript_erased() {
        assert_eq!(
            reprint("interface P { x: number }\nconst p: P = { x: 1 } as P;\ntype T = string;"),
            "const p = { x: 1 };\n"
        );
    }

    #[test]
    fn test_print_parameter_properties() {
        assert_eq!(
            reprint("class P { constructor(private x: number) {} }"),
            "class P {\n  constructor(x) {\n    this.x = x;\n  }\n}\n"
        );
    }

    #[test]
    fn test_print_enum_lowering() {
        assert_eq!(
            reprint("enum E { A, B = 'b', C = 5, D }"),
            "var E;\n(function (E) {\n  E[E[\"A\"] = 0] = \"A\";\n  E[\"B\"] = \"b\";\n  E[E[\"C\"] = 5] = \"C\";\n  E[E[\"D\"] = 6] = \"D\";\n})(E || (E = {}));\n"
        );
    }

    #[test]
    fn test_print_unary_spacing_and_number_members() {
        assert_eq!(reprint("x = - -y; z = typeof w"), "x = - -y;\nz = typeof w;\n");
        let expr = Expression::call(
            Expression::member(
                Expression::Literal {
                    value: Literal::Number(1.0),
                },
                "toFixed",
            ),
            vec![],
        );
        assert_eq!(print_expression(&expr), "(1).toFixed()");
    }

    #[test]
    fn test_print_module_syntax() {
        assert_eq!(
            reprint("import a, {b as c, d} from 'm'; export {a as default}; export * as ns from './x'"),
            "import a, { b as c, d } from \"m\";\nexport { a as default };\nexport * as ns from \"./x\";\n"
        );
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn test_statement_starting_with_object_gets_parens() {
        let stmt = Statement::ExpressionStatement {
            expression: Expression::AssignmentExpression {
                left: Box::new(Pattern::ObjectPattern(vec![ObjectPatternProperty {
                    key: Some(PropertyKey::Identifier("a".to_string())),
                    value: Pattern::Identifier("a".to_string()),
                    shorthand: true,
                }])),
                operator: AssignmentOperator::Assign,
                right: Box::new(Expression::identifier("o")),
            },
        };
        let program = Program { body: vec![stmt] };
        assert_eq!(print_program(&program), "({ a } = o);\n");
    }
}
