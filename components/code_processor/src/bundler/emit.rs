//! Registry emission
//!
//! Each module becomes `__modules[url] = function (__exports) {...}`. The
//! factory body starts with export getters, then the `__require` calls for
//! its imports, then the module's own statements. Imported names stay live:
//! see [`super::bindings`].

use std::collections::HashMap;

use parser::ast::{
    ArrowFunctionBody, AssignmentOperator, ExportDefault, ExportNamedDeclaration, Function,
    ImportDeclaration, ImportSpecifier, Literal, ObjectProperty, PropertyKey, VariableDeclaration,
    VariableDeclarator, VariableKind,
};
use parser::visit::walk_expression;
use parser::{Expression, Parser, Pattern, Program, Statement, VisitMut};
use url::Url;

use super::bindings::{link_imports, namespace_member, ImportBindings};
use super::graph::{Module, ModuleGraph};
use crate::error::Result;

const PRELUDE: &str = r#"
const __modules = {};
const __cache = {};
function __export(target, name, getter) {
  Object.defineProperty(target, name, { enumerable: true, get: getter });
}
function __reexport(target, source) {
  for (const name of Object.keys(source)) {
    if (name !== "default" && !Object.prototype.hasOwnProperty.call(target, name)) {
      __export(target, name, () => source[name]);
    }
  }
}
function __require(url) {
  let namespace = __cache[url];
  if (!namespace) {
    namespace = __cache[url] = {};
    __modules[url](namespace);
  }
  return namespace;
}
"#;

const EXPORTS: &str = "__exports";
const DEFAULT_LOCAL: &str = "__default";

/// Build the bundled program: prelude, registry, then the entry
pub(crate) fn emit(entry: Program, graph: ModuleGraph) -> Result<Program> {
    let mut body = Parser::new(PRELUDE).parse_program()?.body;
    for module in graph.modules {
        body.push(register(module));
    }

    let mut entry_body = EntryBuilder::new(&graph.entry);
    for stmt in entry.body {
        entry_body.statement(stmt);
    }
    body.extend(entry_body.finish());
    Ok(Program { body })
}

fn register(module: Module) -> Statement {
    let Module {
        url,
        program,
        resolved,
    } = module;

    let mut builder = FactoryBuilder::new(&url, &resolved);
    for stmt in program.body {
        builder.statement(stmt);
    }

    let target = Expression::MemberExpression {
        object: Box::new(Expression::identifier("__modules")),
        property: Box::new(Expression::string(url.as_str())),
        computed: true,
        optional: false,
    };
    let factory = Function {
        name: None,
        params: vec![Pattern::Identifier(EXPORTS.to_string())],
        body: builder.finish(),
        is_async: false,
        is_generator: false,
    };
    Statement::ExpressionStatement {
        expression: Expression::AssignmentExpression {
            left: Box::new(Pattern::Expression(Box::new(target))),
            operator: AssignmentOperator::Assign,
            right: Box::new(Expression::FunctionExpression(factory)),
        },
    }
}

/// `__require("url")`
fn require(url: &Url) -> Expression {
    Expression::call(
        Expression::identifier("__require"),
        vec![Expression::string(url.as_str())],
    )
}

fn const_binding(name: impl Into<String>, init: Expression) -> Statement {
    Statement::VariableDeclaration(VariableDeclaration {
        kind: VariableKind::Const,
        declarations: vec![VariableDeclarator {
            id: Pattern::Identifier(name.into()),
            init: Some(init),
        }],
    })
}

fn call_statement(callee: &str, arguments: Vec<Expression>) -> Statement {
    Statement::ExpressionStatement {
        expression: Expression::call(Expression::identifier(callee), arguments),
    }
}

/// Import bindings shared by module factories and the entry
struct Imports<'a> {
    resolved: &'a HashMap<String, Url>,
    statements: Vec<Statement>,
    bindings: ImportBindings,
    namespaces: usize,
}

impl<'a> Imports<'a> {
    fn new(resolved: &'a HashMap<String, Url>) -> Self {
        Imports {
            resolved,
            statements: Vec::new(),
            bindings: ImportBindings::new(),
            namespaces: 0,
        }
    }

    fn url(&self, specifier: &str) -> Option<&'a Url> {
        self.resolved.get(specifier)
    }

    /// Bind a fresh `__mN` to the namespace of `url`
    fn namespace(&mut self, url: &Url) -> String {
        let name = format!("__m{}", self.namespaces);
        self.namespaces += 1;
        self.statements.push(const_binding(name.clone(), require(url)));
        name
    }

    fn import(&mut self, import: ImportDeclaration) {
        let Some(url) = self.url(&import.source) else {
            return;
        };
        if import.specifiers.is_empty() {
            self.statements.push(Statement::ExpressionStatement {
                expression: require(url),
            });
            return;
        }
        let namespace = self.namespace(url);
        for specifier in import.specifiers {
            match specifier {
                ImportSpecifier::Default { local } => {
                    self.bindings
                        .insert(local, (namespace.clone(), "default".to_string()));
                }
                ImportSpecifier::Namespace { local } => self
                    .statements
                    .push(const_binding(local, Expression::identifier(namespace.clone()))),
                ImportSpecifier::Named { imported, local } => {
                    self.bindings.insert(local, (namespace.clone(), imported));
                }
            }
        }
    }
}

/// Rewrites `import.meta` and literal dynamic imports
struct ModuleExpressions<'a> {
    url: Option<&'a Url>,
    resolved: &'a HashMap<String, Url>,
}

impl VisitMut for ModuleExpressions<'_> {
    fn visit_expression(&mut self, expr: &mut Expression) {
        if let Expression::MetaProperty { meta, property } = expr {
            if meta == "import" && property == "meta" {
                if let Some(url) = self.url {
                    *expr = Expression::ObjectExpression {
                        properties: vec![ObjectProperty::Property {
                            key: PropertyKey::Identifier("url".to_string()),
                            value: Expression::string(url.as_str()),
                            shorthand: false,
                        }],
                    };
                }
                return;
            }
        }
        if let Expression::ImportExpression { source } = expr {
            let target = match source.unparenthesized() {
                Expression::Literal {
                    value: Literal::String(specifier),
                } => self.resolved.get(specifier),
                _ => None,
            };
            if let Some(url) = target {
                *expr = deferred_require(url);
                return;
            }
        }
        walk_expression(self, expr);
    }
}

/// `Promise.resolve().then(() => __require("url"))`
fn deferred_require(url: &Url) -> Expression {
    let resolved = Expression::call(
        Expression::member(Expression::identifier("Promise"), "resolve"),
        Vec::new(),
    );
    let callback = Expression::ArrowFunctionExpression {
        params: Vec::new(),
        body: ArrowFunctionBody::Expression(Box::new(require(url))),
        is_async: false,
    };
    Expression::call(Expression::member(resolved, "then"), vec![callback])
}

/// Body of one module factory
struct FactoryBuilder<'a> {
    url: &'a Url,
    getters: Vec<Statement>,
    imports: Imports<'a>,
    body: Vec<Statement>,
}

impl<'a> FactoryBuilder<'a> {
    fn new(url: &'a Url, resolved: &'a HashMap<String, Url>) -> Self {
        FactoryBuilder {
            url,
            getters: Vec::new(),
            imports: Imports::new(resolved),
            body: Vec::new(),
        }
    }

    /// `__export(__exports, "name", () => value)`
    fn export(&mut self, name: &str, value: Expression) {
        let getter = Expression::ArrowFunctionExpression {
            params: Vec::new(),
            body: ArrowFunctionBody::Expression(Box::new(value)),
            is_async: false,
        };
        self.getters.push(call_statement(
            "__export",
            vec![Expression::identifier(EXPORTS), Expression::string(name), getter],
        ));
    }

    fn export_local(&mut self, name: &str) {
        self.export(name, Expression::identifier(name));
    }

    fn statement(&mut self, stmt: Statement) {
        match stmt {
            Statement::ImportDeclaration(import) => self.imports.import(import),
            Statement::ExportNamedDeclaration(export) => self.export_named(export),
            Statement::ExportDefaultDeclaration(export) => self.export_default(export),
            Statement::ExportAllDeclaration { exported, source } => {
                let Some(url) = self.imports.url(&source) else {
                    return;
                };
                match exported {
                    Some(name) => {
                        let namespace = self.imports.namespace(url);
                        self.export(&name, Expression::identifier(namespace));
                    }
                    None => self.imports.statements.push(call_statement(
                        "__reexport",
                        vec![Expression::identifier(EXPORTS), require(url)],
                    )),
                }
            }
            Statement::TypeDeclaration { .. } => {}
            other => self.body.push(other),
        }
    }

    fn export_named(&mut self, export: ExportNamedDeclaration) {
        if let Some(declaration) = export.declaration {
            let names = match declaration.as_ref() {
                Statement::VariableDeclaration(decl) => decl
                    .declarations
                    .iter()
                    .flat_map(|d| d.id.bound_names())
                    .collect(),
                Statement::FunctionDeclaration(Function { name: Some(name), .. }) => {
                    vec![name.clone()]
                }
                Statement::ClassDeclaration(class) => class.name.iter().cloned().collect(),
                Statement::EnumDeclaration { name, .. } => vec![name.clone()],
                _ => Vec::new(),
            };
            for name in &names {
                self.export_local(name);
            }
            if !matches!(declaration.as_ref(), Statement::TypeDeclaration { .. }) {
                self.body.push(*declaration);
            }
            return;
        }

        match export.source {
            Some(source) => {
                let Some(url) = self.imports.url(&source) else {
                    return;
                };
                let namespace = self.imports.namespace(url);
                for specifier in export.specifiers {
                    self.export(
                        &specifier.exported,
                        namespace_member(&namespace, &specifier.local),
                    );
                }
            }
            None => {
                for specifier in export.specifiers {
                    self.export(&specifier.exported, Expression::identifier(specifier.local));
                }
            }
        }
    }

    fn export_default(&mut self, export: ExportDefault) {
        match export {
            ExportDefault::Function(mut function) => {
                let name = function
                    .name
                    .get_or_insert_with(|| DEFAULT_LOCAL.to_string())
                    .clone();
                self.export("default", Expression::identifier(name));
                self.body.push(Statement::FunctionDeclaration(function));
            }
            ExportDefault::Class(mut class) => {
                let name = class
                    .name
                    .get_or_insert_with(|| DEFAULT_LOCAL.to_string())
                    .clone();
                self.export("default", Expression::identifier(name));
                self.body.push(Statement::ClassDeclaration(class));
            }
            ExportDefault::Expression(expression) => {
                self.export("default", Expression::identifier(DEFAULT_LOCAL));
                self.body.push(const_binding(DEFAULT_LOCAL, expression));
            }
        }
    }

    fn finish(self) -> Vec<Statement> {
        let mut program = Program {
            body: self.getters,
        };
        program.body.extend(self.imports.statements);
        program.body.extend(self.body);
        link_imports(&mut program, &self.imports.bindings);
        ModuleExpressions {
            url: Some(self.url),
            resolved: self.imports.resolved,
        }
        .visit_program(&mut program);
        program.body
    }
}

/// Entry statements with their imports hoisted into `__require` calls
struct EntryBuilder<'a> {
    imports: Imports<'a>,
    body: Vec<Statement>,
}

impl<'a> EntryBuilder<'a> {
    fn new(resolved: &'a HashMap<String, Url>) -> Self {
        EntryBuilder {
            imports: Imports::new(resolved),
            body: Vec::new(),
        }
    }

    fn statement(&mut self, stmt: Statement) {
        match stmt {
            Statement::ImportDeclaration(import) => self.imports.import(import),
            other => self.body.push(other),
        }
    }

    fn finish(self) -> Vec<Statement> {
        let mut program = Program {
            body: self.imports.statements,
        };
        program.body.extend(self.body);
        link_imports(&mut program, &self.imports.bindings);
        ModuleExpressions {
            url: None,
            resolved: self.imports.resolved,
        }
        .visit_program(&mut program);
        program.body
    }
}
