//! Abstract Syntax Tree node definitions
//!
//! TypeScript-only syntax is erased while parsing. The only traces it leaves
//! are [`Statement::TypeDeclaration`] placeholders (so type-only exports can be
//! recognised and dropped) and [`Statement::EnumDeclaration`], which has a
//! runtime value.

/// A parsed module or script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements in source order
    pub body: Vec<Statement>,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Variable declaration (let, const, var)
    VariableDeclaration(VariableDeclaration),

    /// Function declaration
    FunctionDeclaration(Function),

    /// Class declaration
    ClassDeclaration(Class),

    /// TypeScript enum declaration
    EnumDeclaration {
        /// Enum name
        name: String,
        /// Members in declaration order
        members: Vec<EnumMember>,
    },

    /// Erased TypeScript declaration (type alias, interface, declare, overload)
    TypeDeclaration {
        /// Declared name, if the declaration has one
        name: Option<String>,
    },

    /// Expression statement
    ExpressionStatement {
        /// The expression
        expression: Expression,
    },

    /// Return statement
    ReturnStatement {
        /// Return value
        argument: Option<Expression>,
    },

    /// If statement
    IfStatement {
        /// Condition
        test: Expression,
        /// Then branch
        consequent: Box<Statement>,
        /// Else branch
        alternate: Option<Box<Statement>>,
    },

    /// While loop
    WhileStatement {
        /// Condition
        test: Expression,
        /// Loop body
        body: Box<Statement>,
    },

    /// Do-while loop
    DoWhileStatement {
        /// Loop body
        body: Box<Statement>,
        /// Condition
        test: Expression,
    },

    /// C-style for loop
    ForStatement {
        /// Initializer
        init: Option<ForInit>,
        /// Condition
        test: Option<Expression>,
        /// Update
        update: Option<Expression>,
        /// Loop body
        body: Box<Statement>,
    },

    /// For-in loop
    ForInStatement {
        /// Loop binding
        left: ForInOfLeft,
        /// Object being enumerated
        right: Expression,
        /// Loop body
        body: Box<Statement>,
    },

    /// For-of loop
    ForOfStatement {
        /// Loop binding
        left: ForInOfLeft,
        /// Iterable
        right: Expression,
        /// Loop body
        body: Box<Statement>,
        /// `for await`
        is_await: bool,
    },

    /// Block `{ ... }`
    BlockStatement {
        /// Statements
        body: Vec<Statement>,
    },

    /// Empty statement `;`
    EmptyStatement,

    /// Break statement
    BreakStatement {
        /// Optional label
        label: Option<String>,
    },

    /// Continue statement
    ContinueStatement {
        /// Optional label
        label: Option<String>,
    },

    /// Throw statement
    ThrowStatement {
        /// Thrown value
        argument: Expression,
    },

    /// Try statement
    TryStatement {
        /// Protected block
        block: Vec<Statement>,
        /// Catch clause
        handler: Option<CatchClause>,
        /// Finally block
        finalizer: Option<Vec<Statement>>,
    },

    /// Switch statement
    SwitchStatement {
        /// Switched value
        discriminant: Expression,
        /// Cases in order
        cases: Vec<SwitchCase>,
    },

    /// With statement
    WithStatement {
        /// Scope object
        object: Expression,
        /// Body
        body: Box<Statement>,
    },

    /// Debugger statement
    DebuggerStatement,

    /// Labeled statement
    LabeledStatement {
        /// Label
        label: String,
        /// Labeled body
        body: Box<Statement>,
    },

    /// `import ... from "source"`
    ImportDeclaration(ImportDeclaration),

    /// `export <declaration>` or `export { ... } [from "source"]`
    ExportNamedDeclaration(ExportNamedDeclaration),

    /// `export default ...`
    ExportDefaultDeclaration(ExportDefault),

    /// `export * [as name] from "source"`
    ExportAllDeclaration {
        /// Namespace name for `export * as name`
        exported: Option<String>,
        /// Module specifier
        source: String,
    },
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// let declaration
    Let,
    /// const declaration
    Const,
    /// var declaration
    Var,
}

impl VariableKind {
    /// Keyword spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Let => "let",
            VariableKind::Const => "const",
            VariableKind::Var => "var",
        }
    }
}

/// `let`/`const`/`var` with its declarators
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// Declaration kind
    pub kind: VariableKind,
    /// Declarators
    pub declarations: Vec<VariableDeclarator>,
}

/// Variable declarator
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Pattern (identifier or destructuring)
    pub id: Pattern,
    /// Initial value
    pub init: Option<Expression>,
}

/// A function's shape, shared by declarations, expressions and methods
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Function name
    pub name: Option<String>,
    /// Parameters
    pub params: Vec<Pattern>,
    /// Body statements
    pub body: Vec<Statement>,
    /// Is async function
    pub is_async: bool,
    /// Is generator function
    pub is_generator: bool,
}

/// A class's shape, shared by declarations and expressions
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    /// Class name
    pub name: Option<String>,
    /// Superclass expression
    pub super_class: Option<Box<Expression>>,
    /// Class body
    pub body: Vec<ClassElement>,
}

/// TypeScript enum member
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    /// Member name
    pub name: String,
    /// Explicit initializer
    pub init: Option<Expression>,
}

/// Switch case
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Case test, `None` for `default`
    pub test: Option<Expression>,
    /// Case body
    pub consequent: Vec<Statement>,
}

/// Catch clause
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Parameter
    pub param: Option<Pattern>,
    /// Body
    pub body: Vec<Statement>,
}

/// For loop initialization
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    /// Variable declaration
    VariableDeclaration(VariableDeclaration),
    /// Expression
    Expression(Expression),
}

/// Left side of for-in/for-of loop
#[derive(Debug, Clone, PartialEq)]
pub enum ForInOfLeft {
    /// Declaration with a single declarator and no initializer
    VariableDeclaration(VariableDeclaration),
    /// Existing binding, member expression or destructuring target
    Pattern(Pattern),
}

/// Static import declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    /// Imported bindings, empty for side-effect imports
    pub specifiers: Vec<ImportSpecifier>,
    /// Module specifier
    pub source: String,
}

/// One imported binding
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import local from ...`
    Default {
        /// Local binding
        local: String,
    },
    /// `import * as local from ...`
    Namespace {
        /// Local binding
        local: String,
    },
    /// `import { imported as local } from ...`
    Named {
        /// Exported name in the source module
        imported: String,
        /// Local binding
        local: String,
    },
}

/// Named export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamedDeclaration {
    /// Exported declaration (`export const x = 1`)
    pub declaration: Option<Box<Statement>>,
    /// Export list (`export { a as b }`)
    pub specifiers: Vec<ExportSpecifier>,
    /// Re-export source (`export { a } from "m"`)
    pub source: Option<String>,
}

/// One entry of an export list
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    /// Local (or source-module) name
    pub local: String,
    /// Exported name
    pub exported: String,
}

/// `export default` payload
#[derive(Debug, Clone, PartialEq)]
pub enum ExportDefault {
    /// `export default function [name]() {}`
    Function(Function),
    /// `export default class [name] {}`
    Class(Class),
    /// `export default <expression>;`
    Expression(Expression),
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Identifier reference (private names keep their leading `#`)
    Identifier {
        /// Variable name
        name: String,
    },

    /// Literal value
    Literal {
        /// Literal value
        value: Literal,
    },

    /// Parenthesized expression, kept so printing preserves the author's grouping
    ParenthesizedExpression {
        /// The inner expression
        expression: Box<Expression>,
    },

    /// Template literal
    TemplateLiteral {
        /// Text parts, one more than `expressions`
        quasis: Vec<TemplateElement>,
        /// Substitutions
        expressions: Vec<Expression>,
    },

    /// Tagged template
    TaggedTemplateExpression {
        /// Tag function
        tag: Box<Expression>,
        /// Text parts
        quasis: Vec<TemplateElement>,
        /// Substitutions
        expressions: Vec<Expression>,
    },

    /// Binary operation
    BinaryExpression {
        /// Left operand
        left: Box<Expression>,
        /// Operator
        operator: BinaryOperator,
        /// Right operand
        right: Box<Expression>,
    },

    /// Prefix unary operation
    UnaryExpression {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        argument: Box<Expression>,
    },

    /// Update expression (++, --)
    UpdateExpression {
        /// Operator
        operator: UpdateOperator,
        /// Operand
        argument: Box<Expression>,
        /// Is prefix operator
        prefix: bool,
    },

    /// Logical expression (&&, ||, ??)
    LogicalExpression {
        /// Left operand
        left: Box<Expression>,
        /// Operator
        operator: LogicalOperator,
        /// Right operand
        right: Box<Expression>,
    },

    /// Assignment expression
    AssignmentExpression {
        /// Left-hand side
        left: Box<Pattern>,
        /// Operator
        operator: AssignmentOperator,
        /// Right-hand side
        right: Box<Expression>,
    },

    /// Conditional expression (ternary)
    ConditionalExpression {
        /// Condition
        test: Box<Expression>,
        /// Consequent
        consequent: Box<Expression>,
        /// Alternate
        alternate: Box<Expression>,
    },

    /// Function call
    CallExpression {
        /// Function being called
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
        /// Optional call (e.g., foo?.())
        optional: bool,
    },

    /// Member access (obj.prop or obj[prop])
    MemberExpression {
        /// Object
        object: Box<Expression>,
        /// Property
        property: Box<Expression>,
        /// Is computed (bracket notation)
        computed: bool,
        /// Optional access (e.g., obj?.prop)
        optional: bool,
    },

    /// New expression
    NewExpression {
        /// Constructor
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Expression>,
    },

    /// Meta property (new.target, import.meta)
    MetaProperty {
        /// Meta (e.g., "new" or "import")
        meta: String,
        /// Property (e.g., "target" or "meta")
        property: String,
    },

    /// Dynamic `import(source)`
    ImportExpression {
        /// Module specifier expression
        source: Box<Expression>,
    },

    /// Array literal
    ArrayExpression {
        /// Elements, `None` for holes
        elements: Vec<Option<Expression>>,
    },

    /// Object literal
    ObjectExpression {
        /// Properties
        properties: Vec<ObjectProperty>,
    },

    /// Arrow function
    ArrowFunctionExpression {
        /// Parameters
        params: Vec<Pattern>,
        /// Body (expression or block)
        body: ArrowFunctionBody,
        /// Is async
        is_async: bool,
    },

    /// Function expression
    FunctionExpression(Function),

    /// Class expression
    ClassExpression(Class),

    /// `this`
    ThisExpression,

    /// `super`
    SuperExpression,

    /// Await expression
    AwaitExpression {
        /// Awaited value
        argument: Box<Expression>,
    },

    /// Yield expression
    YieldExpression {
        /// Yielded value
        argument: Option<Box<Expression>>,
        /// `yield*`
        delegate: bool,
    },

    /// Spread element in calls and array literals
    SpreadElement {
        /// Spread value
        argument: Box<Expression>,
    },

    /// Comma-separated sequence
    SequenceExpression {
        /// Expressions in order
        expressions: Vec<Expression>,
    },
}

impl Expression {
    /// Identifier reference
    pub fn identifier(name: impl Into<String>) -> Expression {
        Expression::Identifier { name: name.into() }
    }

    /// String literal
    pub fn string(value: impl Into<String>) -> Expression {
        Expression::Literal {
            value: Literal::String(value.into()),
        }
    }

    /// Non-computed, non-optional member access `object.property`
    pub fn member(object: Expression, property: impl Into<String>) -> Expression {
        Expression::MemberExpression {
            object: Box::new(object),
            property: Box::new(Expression::identifier(property)),
            computed: false,
            optional: false,
        }
    }

    /// Plain call `callee(arguments)`
    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
        Expression::CallExpression {
            callee: Box::new(callee),
            arguments,
            optional: false,
        }
    }

    /// Strip any number of enclosing parentheses
    pub fn unparenthesized(&self) -> &Expression {
        let mut current = self;
        while let Expression::ParenthesizedExpression { expression } = current {
            current = expression;
        }
        current
    }
}

/// Pattern for bindings and assignment targets
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// Simple identifier
    Identifier(String),
    /// Object destructuring
    ObjectPattern(Vec<ObjectPatternProperty>),
    /// Array destructuring, `None` for holes
    ArrayPattern(Vec<Option<Pattern>>),
    /// Assignment pattern (with default value)
    AssignmentPattern {
        /// Left side
        left: Box<Pattern>,
        /// Default value
        right: Box<Expression>,
    },
    /// Rest element (...rest)
    RestElement(Box<Pattern>),
    /// Member expression target (for destructuring assignment, not parameters)
    Expression(Box<Expression>),
}

impl Pattern {
    /// Names bound by this pattern, in source order
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names(&self, names: &mut Vec<String>) {
        match self {
            Pattern::Identifier(name) => names.push(name.clone()),
            Pattern::ObjectPattern(properties) => {
                for property in properties {
                    property.value.collect_bound_names(names);
                }
            }
            Pattern::ArrayPattern(elements) => {
                for element in elements.iter().flatten() {
                    element.collect_bound_names(names);
                }
            }
            Pattern::AssignmentPattern { left, .. } => left.collect_bound_names(names),
            Pattern::RestElement(inner) => inner.collect_bound_names(names),
            Pattern::Expression(_) => {}
        }
    }
}

/// Object pattern property
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    /// Key, `None` for a rest element
    pub key: Option<PropertyKey>,
    /// Value pattern
    pub value: Pattern,
    /// Is shorthand (e.g., { a } instead of { a: a })
    pub shorthand: bool,
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Number
    Number(f64),
    /// BigInt digits with radix prefix
    BigInt(String),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
    /// Null
    Null,
    /// Regular expression
    RegExp {
        /// Pattern source
        pattern: String,
        /// Flags
        flags: String,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Modulo
    Mod,
    /// Exponentiation
    Exp,
    /// Equality
    Eq,
    /// Inequality
    NotEq,
    /// Strict equality
    StrictEq,
    /// Strict inequality
    StrictNotEq,
    /// Less than
    Lt,
    /// Less than or equal
    LtEq,
    /// Greater than
    Gt,
    /// Greater than or equal
    GtEq,
    /// Bitwise AND
    BitwiseAnd,
    /// Bitwise OR
    BitwiseOr,
    /// Bitwise XOR
    BitwiseXor,
    /// Left shift
    LeftShift,
    /// Right shift
    RightShift,
    /// Unsigned right shift
    UnsignedRightShift,
    /// Instanceof
    Instanceof,
    /// In
    In,
}

impl BinaryOperator {
    /// Operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
            BinaryOperator::Eq => "==",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::StrictNotEq => "!==",
            BinaryOperator::Lt => "<",
            BinaryOperator::LtEq => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::GtEq => ">=",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::LeftShift => "<<",
            BinaryOperator::RightShift => ">>",
            BinaryOperator::UnsignedRightShift => ">>>",
            BinaryOperator::Instanceof => "instanceof",
            BinaryOperator::In => "in",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// Negate
    Minus,
    /// Plus (type coercion)
    Plus,
    /// Logical NOT
    Not,
    /// Bitwise NOT
    BitwiseNot,
    /// Typeof
    Typeof,
    /// Void
    Void,
    /// Delete
    Delete,
}

impl UnaryOperator {
    /// Operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::Typeof => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// Increment
    Increment,
    /// Decrement
    Decrement,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// Nullish coalescing
    NullishCoalesce,
}

impl LogicalOperator {
    /// Operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::NullishCoalesce => "??",
        }
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// Simple assignment (=)
    Assign,
    /// Addition assignment (+=)
    AddAssign,
    /// Subtraction assignment (-=)
    SubAssign,
    /// Multiplication assignment (*=)
    MulAssign,
    /// Division assignment (/=)
    DivAssign,
    /// Modulo assignment (%=)
    ModAssign,
    /// Exponentiation assignment (**=)
    ExpAssign,
    /// Bitwise AND assignment (&=)
    BitAndAssign,
    /// Bitwise OR assignment (|=)
    BitOrAssign,
    /// Bitwise XOR assignment (^=)
    BitXorAssign,
    /// Left shift assignment (<<=)
    LeftShiftAssign,
    /// Right shift assignment (>>=)
    RightShiftAssign,
    /// Unsigned right shift assignment (>>>=)
    UnsignedRightShiftAssign,
    /// Logical AND assignment (&&=)
    LogicalAndAssign,
    /// Logical OR assignment (||=)
    LogicalOrAssign,
    /// Nullish coalescing assignment (??=)
    NullishCoalesceAssign,
}

impl AssignmentOperator {
    /// Operator spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::AddAssign => "+=",
            AssignmentOperator::SubAssign => "-=",
            AssignmentOperator::MulAssign => "*=",
            AssignmentOperator::DivAssign => "/=",
            AssignmentOperator::ModAssign => "%=",
            AssignmentOperator::ExpAssign => "**=",
            AssignmentOperator::BitAndAssign => "&=",
            AssignmentOperator::BitOrAssign => "|=",
            AssignmentOperator::BitXorAssign => "^=",
            AssignmentOperator::LeftShiftAssign => "<<=",
            AssignmentOperator::RightShiftAssign => ">>=",
            AssignmentOperator::UnsignedRightShiftAssign => ">>>=",
            AssignmentOperator::LogicalAndAssign => "&&=",
            AssignmentOperator::LogicalOrAssign => "||=",
            AssignmentOperator::NullishCoalesceAssign => "??=",
        }
    }
}

/// Class element
#[derive(Debug, Clone, PartialEq)]
pub enum ClassElement {
    /// Method definition
    MethodDefinition {
        /// Method name
        key: PropertyKey,
        /// Method kind
        kind: MethodKind,
        /// Method function
        value: Function,
        /// Is static
        is_static: bool,
    },
    /// Property definition
    PropertyDefinition {
        /// Property key
        key: PropertyKey,
        /// Initial value
        value: Option<Expression>,
        /// Is static
        is_static: bool,
    },
    /// `static { ... }`
    StaticBlock {
        /// Block statements
        body: Vec<Statement>,
    },
}

/// Method kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Regular method
    Method,
    /// Getter
    Get,
    /// Setter
    Set,
    /// Constructor
    Constructor,
}

/// Object property
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    /// Property with key and value
    Property {
        /// Key
        key: PropertyKey,
        /// Value
        value: Expression,
        /// Is shorthand
        shorthand: bool,
    },
    /// Method, getter or setter
    Method {
        /// Key
        key: PropertyKey,
        /// Method kind (never `Constructor`)
        kind: MethodKind,
        /// Method function
        value: Function,
    },
    /// Spread property
    SpreadElement(Expression),
}

/// Property key
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier key
    Identifier(String),
    /// Private name key, without the `#`
    PrivateName(String),
    /// String literal key
    String(String),
    /// Number literal key
    Number(f64),
    /// Computed key
    Computed(Box<Expression>),
}

impl PropertyKey {
    /// True if the key is the plain name `name`
    pub fn is_named(&self, name: &str) -> bool {
        match self {
            PropertyKey::Identifier(n) | PropertyKey::String(n) => n == name,
            _ => false,
        }
    }
}

/// Arrow function body
#[derive(Debug, Clone, PartialEq)]
pub enum ArrowFunctionBody {
    /// Expression body
    Expression(Box<Expression>),
    /// Block body
    Block(Vec<Statement>),
}

/// Template literal element
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    /// Raw string value
    pub raw: String,
    /// Cooked string value, `None` if it contains an invalid escape
    pub cooked: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_names_of_nested_pattern() {
        let pattern = Pattern::ObjectPattern(vec![
            ObjectPatternProperty {
                key: Some(PropertyKey::Identifier("a".to_string())),
                value: Pattern::Identifier("a".to_string()),
                shorthand: true,
            },
            ObjectPatternProperty {
                key: Some(PropertyKey::Identifier("b".to_string())),
                value: Pattern::ArrayPattern(vec![
                    None,
                    Some(Pattern::AssignmentPattern {
                        left: Box::new(Pattern::Identifier("c".to_string())),
                        right: Box::new(Expression::string("x")),
                    }),
                ]),
                shorthand: false,
            },
            ObjectPatternProperty {
                key: None,
                value: Pattern::RestElement(Box::new(Pattern::Identifier("rest".to_string()))),
                shorthand: false,
            },
        ]);
        assert_eq!(pattern.bound_names(), vec!["a", "c", "rest"]);
    }

    #[test]
    fn test_unparenthesized_strips_all_layers() {
        let expr = Expression::ParenthesizedExpression {
            expression: Box::new(Expression::ParenthesizedExpression {
                expression: Box::new(Expression::identifier("x")),
            }),
        };
        assert_eq!(expr.unparenthesized(), &Expression::identifier("x"));
    }

    #[test]
    fn test_property_key_is_named() {
        assert!(PropertyKey::Identifier("run".to_string()).is_named("run"));
        assert!(PropertyKey::String("run".to_string()).is_named("run"));
        assert!(!PropertyKey::PrivateName("run".to_string()).is_named("run"));
    }
}
