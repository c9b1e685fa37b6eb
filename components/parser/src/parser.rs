//! Recursive descent parser for ECMAScript modules with TypeScript syntax
//!
//! Statements and expressions live here; TypeScript erasure is in
//! `typescript.rs` and module syntax in `modules.rs`.

use crate::ast::*;
use crate::error::*;
use crate::lexer::{Keyword, Lexer, Punctuator, Token};
use core_types::JsError;

/// Flags that change how nested constructs are parsed
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Context {
    pub(crate) in_function: bool,
    pub(crate) in_async: bool,
    pub(crate) in_generator: bool,
    /// `in` is not a binary operator inside a `for (...)` head
    pub(crate) in_for_init: bool,
    /// Arrow heads may not carry a return type inside a conditional consequent
    pub(crate) no_arrow_return_type: bool,
}

/// Parser for ECMAScript/TypeScript source
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) ctx: Context,
    allow_return_outside_function: bool,
    allow_top_level_await: bool,
}

impl Parser {
    /// Create a new parser for the given source code
    pub fn new(source: &str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            ctx: Context::default(),
            allow_return_outside_function: false,
            allow_top_level_await: false,
        }
    }

    /// Accept `return` statements at the top level (function-body sources)
    pub fn allow_return_outside_function(mut self, allow: bool) -> Self {
        self.allow_return_outside_function = allow;
        self
    }

    /// Parse `await` at the top level as an await expression
    pub fn allow_top_level_await(mut self, allow: bool) -> Self {
        self.allow_top_level_await = allow;
        self
    }

    /// Parse the whole source as a program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();
        while !self.is_at_end()? {
            body.push(self.parse_statement()?);
        }
        Ok(Program { body })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    pub(crate) fn peek(&mut self) -> Result<&Token, JsError> {
        self.lexer.peek_token()
    }

    pub(crate) fn advance(&mut self) -> Result<Token, JsError> {
        self.lexer.next_token()
    }

    pub(crate) fn is_at_end(&mut self) -> Result<bool, JsError> {
        Ok(matches!(self.peek()?, Token::EOF))
    }

    pub(crate) fn check_punctuator(&mut self, p: Punctuator) -> Result<bool, JsError> {
        Ok(matches!(self.peek()?, Token::Punctuator(x) if *x == p))
    }

    pub(crate) fn check_keyword(&mut self, k: Keyword) -> Result<bool, JsError> {
        Ok(matches!(self.peek()?, Token::Keyword(x) if *x == k))
    }

    pub(crate) fn check_identifier(&mut self, name: &str) -> Result<bool, JsError> {
        Ok(matches!(self.peek()?, Token::Identifier(x) if x == name))
    }

    pub(crate) fn eat_punctuator(&mut self, p: Punctuator) -> Result<bool, JsError> {
        if self.check_punctuator(p)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn eat_identifier(&mut self, name: &str) -> Result<bool, JsError> {
        if self.check_identifier(name)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn expect_punctuator(&mut self, p: Punctuator) -> Result<(), JsError> {
        if self.eat_punctuator(p)? {
            return Ok(());
        }
        let got = self.peek()?.describe();
        Err(unexpected_token(
            &format!("`{}`", p.as_str()),
            &got,
            Some(self.lexer.token_position()),
        ))
    }

    pub(crate) fn expect_keyword(&mut self, k: Keyword) -> Result<(), JsError> {
        if self.check_keyword(k)? {
            self.advance()?;
            return Ok(());
        }
        let got = self.peek()?.describe();
        Err(unexpected_token(
            &format!("`{}`", k.as_str()),
            &got,
            Some(self.lexer.token_position()),
        ))
    }

    /// Expect a binding or reference identifier (contextual words allowed)
    pub(crate) fn expect_identifier(&mut self) -> Result<String, JsError> {
        if let Token::Identifier(_) = self.peek()? {
            if let Token::Identifier(name) = self.advance()? {
                return Ok(name);
            }
        }
        Err(self.unexpected())
    }

    /// Expect an identifier name (keywords allowed), as after `.`
    pub(crate) fn expect_identifier_name(&mut self) -> Result<String, JsError> {
        match self.peek()? {
            Token::Identifier(_) | Token::Keyword(_) => {}
            _ => return Err(self.unexpected()),
        }
        match self.advance()? {
            Token::Identifier(name) => Ok(name),
            Token::Keyword(k) => Ok(k.as_str().to_string()),
            _ => Err(self.unexpected()),
        }
    }

    /// Expect a string literal (module specifiers)
    pub(crate) fn expect_string(&mut self) -> Result<String, JsError> {
        if let Token::String(_) = self.peek()? {
            if let Token::String(value) = self.advance()? {
                return Ok(value);
            }
        }
        Err(unexpected_token(
            "string literal",
            &self.peek()?.describe(),
            Some(self.lexer.token_position()),
        ))
    }

    /// Syntax error describing the current lookahead
    pub(crate) fn unexpected(&mut self) -> JsError {
        let position = Some(self.lexer.token_position());
        match self.lexer.peek_token() {
            Ok(Token::EOF) => unexpected_eof(position),
            Ok(token) => syntax_error(format!("Unexpected {}", token.describe()), position),
            Err(err) => err,
        }
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> JsError {
        syntax_error(message, Some(self.lexer.token_position()))
    }

    /// Peek at the token after the current lookahead.
    ///
    /// Returns the token and whether a line terminator precedes it.
    pub(crate) fn peek_second(&mut self) -> Result<(Token, bool), JsError> {
        self.peek()?;
        let checkpoint = self.lexer.checkpoint();
        self.advance()?;
        let second = self.peek()?.clone();
        let newline = self.lexer.line_terminator_before_token;
        self.lexer.restore(checkpoint);
        Ok((second, newline))
    }

    /// Run `f`, rewinding the lexer and context if it fails
    pub(crate) fn speculate<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Option<T> {
        let checkpoint = self.lexer.checkpoint();
        let ctx = self.ctx;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.lexer.restore(checkpoint);
                self.ctx = ctx;
                None
            }
        }
    }

    /// True if `f` succeeds at the current position. Never consumes input.
    pub(crate) fn lookahead(&mut self, f: impl FnOnce(&mut Self) -> Result<(), JsError>) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let ctx = self.ctx;
        let matched = f(self).is_ok();
        self.lexer.restore(checkpoint);
        self.ctx = ctx;
        matched
    }

    /// Run `f` with a different context, restoring the previous one after
    pub(crate) fn with_context<T>(
        &mut self,
        ctx: Context,
        f: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        let saved = self.ctx;
        self.ctx = ctx;
        let result = f(self);
        self.ctx = saved;
        result
    }

    /// Run `f` inside brackets, where `in` and arrow return types are unrestricted
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, JsError>,
    ) -> Result<T, JsError> {
        let ctx = Context {
            in_for_init: false,
            no_arrow_return_type: false,
            ..self.ctx
        };
        self.with_context(ctx, f)
    }

    pub(crate) fn consume_semicolon(&mut self) -> Result<(), JsError> {
        if self.eat_punctuator(Punctuator::Semicolon)? {
            return Ok(());
        }
        if self.lexer.line_terminator_before_token
            || self.is_at_end()?
            || self.check_punctuator(Punctuator::RBrace)?
        {
            return Ok(());
        }
        let got = self.peek()?.describe();
        Err(unexpected_token("`;`", &got, Some(self.lexer.token_position())))
    }

    fn await_allowed(&self) -> bool {
        self.ctx.in_async || (!self.ctx.in_function && self.allow_top_level_await)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    pub(crate) fn parse_statement(&mut self) -> Result<Statement, JsError> {
        let token = self.peek()?.clone();
        match token {
            Token::Punctuator(Punctuator::LBrace) => Ok(Statement::BlockStatement {
                body: self.parse_block()?,
            }),
            Token::Punctuator(Punctuator::Semicolon) => {
                self.advance()?;
                Ok(Statement::EmptyStatement)
            }
            Token::Punctuator(Punctuator::At) => Err(self.error_here("Decorators are not supported")),
            Token::Keyword(Keyword::Var) => {
                self.advance()?;
                let decl = self.parse_variable_declaration(VariableKind::Var)?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(decl))
            }
            Token::Keyword(Keyword::Const) => {
                self.advance()?;
                if self.check_keyword(Keyword::Enum)? {
                    self.advance()?;
                    return self.parse_enum_declaration();
                }
                let decl = self.parse_variable_declaration(VariableKind::Const)?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(decl))
            }
            Token::Keyword(Keyword::Function) => {
                self.advance()?;
                self.parse_function_declaration(false)
            }
            Token::Keyword(Keyword::Class) => {
                self.advance()?;
                let class = self.parse_class()?;
                Ok(Statement::ClassDeclaration(class))
            }
            Token::Keyword(Keyword::Enum) => {
                self.advance()?;
                self.parse_enum_declaration()
            }
            Token::Keyword(Keyword::Import) => {
                let (second, _) = self.peek_second()?;
                if matches!(
                    second,
                    Token::Punctuator(Punctuator::LParen) | Token::Punctuator(Punctuator::Dot)
                ) {
                    self.parse_expression_statement()
                } else {
                    self.parse_import_declaration()
                }
            }
            Token::Keyword(Keyword::Export) => self.parse_export_declaration(),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::While) => {
                self.advance()?;
                let test = self.parse_parenthesized_condition()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Statement::WhileStatement { test, body })
            }
            Token::Keyword(Keyword::Do) => {
                self.advance()?;
                let body = Box::new(self.parse_statement()?);
                self.expect_keyword(Keyword::While)?;
                let test = self.parse_parenthesized_condition()?;
                self.eat_punctuator(Punctuator::Semicolon)?;
                Ok(Statement::DoWhileStatement { body, test })
            }
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::Break) | Token::Keyword(Keyword::Continue) => {
                let is_break = matches!(token, Token::Keyword(Keyword::Break));
                self.advance()?;
                let mut label = None;
                if let Token::Identifier(_) = self.peek()? {
                    if !self.lexer.line_terminator_before_token {
                        label = Some(self.expect_identifier()?);
                    }
                }
                self.consume_semicolon()?;
                Ok(if is_break {
                    Statement::BreakStatement { label }
                } else {
                    Statement::ContinueStatement { label }
                })
            }
            Token::Keyword(Keyword::Throw) => {
                self.advance()?;
                self.peek()?;
                if self.lexer.line_terminator_before_token {
                    return Err(self.error_here("Illegal newline after throw"));
                }
                let argument = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Statement::ThrowStatement { argument })
            }
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            Token::Keyword(Keyword::With) => {
                self.advance()?;
                let object = self.parse_parenthesized_condition()?;
                let body = Box::new(self.parse_statement()?);
                Ok(Statement::WithStatement { object, body })
            }
            Token::Keyword(Keyword::Debugger) => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Statement::DebuggerStatement)
            }
            Token::Identifier(ref name) => self.parse_identifier_statement(name),
            _ => self.parse_expression_statement(),
        }
    }

    /// Statements that start with an identifier: contextual declarations,
    /// labels and plain expression statements.
    fn parse_identifier_statement(&mut self, name: &str) -> Result<Statement, JsError> {
        let (second, newline) = self.peek_second()?;

        if matches!(second, Token::Punctuator(Punctuator::Colon)) {
            let label = self.expect_identifier()?;
            self.advance()?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Statement::LabeledStatement { label, body });
        }

        match name {
            "let"
                if matches!(
                    second,
                    Token::Identifier(_)
                        | Token::Punctuator(Punctuator::LBracket)
                        | Token::Punctuator(Punctuator::LBrace)
                ) =>
            {
                self.advance()?;
                let decl = self.parse_variable_declaration(VariableKind::Let)?;
                self.consume_semicolon()?;
                Ok(Statement::VariableDeclaration(decl))
            }
            "async" if !newline && matches!(second, Token::Keyword(Keyword::Function)) => {
                self.advance()?;
                self.advance()?;
                self.parse_function_declaration(true)
            }
            "type" if !newline && matches!(second, Token::Identifier(_)) => {
                self.parse_type_alias()
            }
            "interface" if !newline && matches!(second, Token::Identifier(_)) => {
                self.parse_interface()
            }
            "declare"
                if !newline && matches!(second, Token::Identifier(_) | Token::Keyword(_)) =>
            {
                self.parse_declare()
            }
            "abstract" if !newline && matches!(second, Token::Keyword(Keyword::Class)) => {
                self.advance()?;
                self.advance()?;
                let class = self.parse_class()?;
                Ok(Statement::ClassDeclaration(class))
            }
            "namespace" | "module"
                if !newline && matches!(second, Token::Identifier(_) | Token::String(_)) =>
            {
                Err(self.error_here("TypeScript namespaces are not supported"))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, JsError> {
        let expression = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::ExpressionStatement { expression })
    }

    pub(crate) fn parse_block(&mut self) -> Result<Vec<Statement>, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut body = Vec::new();
        while !self.check_punctuator(Punctuator::RBrace)? {
            if self.is_at_end()? {
                return Err(self.unexpected());
            }
            body.push(self.parse_statement()?);
        }
        self.advance()?;
        Ok(body)
    }

    fn parse_parenthesized_condition(&mut self) -> Result<Expression, JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let expr = self.nested(|p| p.parse_expression())?;
        self.expect_punctuator(Punctuator::RParen)?;
        Ok(expr)
    }

    /// Declarators after `var`/`let`/`const`
    pub(crate) fn parse_variable_declaration(
        &mut self,
        kind: VariableKind,
    ) -> Result<VariableDeclaration, JsError> {
        let mut declarations = Vec::new();
        loop {
            let id = self.parse_binding_target()?;
            self.eat_punctuator(Punctuator::Not)?;
            if self.check_punctuator(Punctuator::Colon)? {
                self.skip_type_annotation()?;
            }
            let init = if self.eat_punctuator(Punctuator::Assign)? {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            declarations.push(VariableDeclarator { id, init });
            if !self.eat_punctuator(Punctuator::Comma)? {
                break;
            }
        }
        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::If)?;
        let test = self.parse_parenthesized_condition()?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.check_keyword(Keyword::Else)? {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::IfStatement {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_return_statement(&mut self) -> Result<Statement, JsError> {
        if !self.ctx.in_function && !self.allow_return_outside_function {
            return Err(self.error_here("Illegal return statement outside of a function"));
        }
        self.expect_keyword(Keyword::Return)?;
        let ends = self.check_punctuator(Punctuator::Semicolon)?
            || self.check_punctuator(Punctuator::RBrace)?
            || self.is_at_end()?
            || self.lexer.line_terminator_before_token;
        let argument = if ends {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::ReturnStatement { argument })
    }

    fn parse_for_statement(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::For)?;
        let is_await = self.eat_identifier("await")?;
        self.expect_punctuator(Punctuator::LParen)?;

        let head_ctx = Context {
            in_for_init: true,
            no_arrow_return_type: false,
            ..self.ctx
        };

        let mut init = None;
        if !self.check_punctuator(Punctuator::Semicolon)? {
            let declaration_kind = match self.peek()?.clone() {
                Token::Keyword(Keyword::Var) => Some(VariableKind::Var),
                Token::Keyword(Keyword::Const) => Some(VariableKind::Const),
                Token::Identifier(ref name) if name == "let" => {
                    let (second, _) = self.peek_second()?;
                    matches!(
                        second,
                        Token::Identifier(_)
                            | Token::Punctuator(Punctuator::LBracket)
                            | Token::Punctuator(Punctuator::LBrace)
                    )
                    .then_some(VariableKind::Let)
                }
                _ => None,
            };

            if let Some(kind) = declaration_kind {
                self.advance()?;
                let decl =
                    self.with_context(head_ctx, |p| p.parse_variable_declaration(kind))?;
                if let Some(stmt) = self.parse_for_in_of_rest(
                    ForInOfLeft::VariableDeclaration(decl.clone()),
                    is_await,
                )? {
                    return Ok(stmt);
                }
                init = Some(ForInit::VariableDeclaration(decl));
            } else {
                let expr = self.with_context(head_ctx, |p| p.parse_expression())?;
                if self.check_identifier("of")? || self.check_keyword(Keyword::In)? {
                    let pattern = self.expression_to_pattern(expr)?;
                    if let Some(stmt) =
                        self.parse_for_in_of_rest(ForInOfLeft::Pattern(pattern), is_await)?
                    {
                        return Ok(stmt);
                    }
                    return Err(self.unexpected());
                }
                init = Some(ForInit::Expression(expr));
            }
        }

        self.expect_punctuator(Punctuator::Semicolon)?;
        let test = if self.check_punctuator(Punctuator::Semicolon)? {
            None
        } else {
            Some(self.nested(|p| p.parse_expression())?)
        };
        self.expect_punctuator(Punctuator::Semicolon)?;
        let update = if self.check_punctuator(Punctuator::RParen)? {
            None
        } else {
            Some(self.nested(|p| p.parse_expression())?)
        };
        self.expect_punctuator(Punctuator::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::ForStatement {
            init,
            test,
            update,
            body,
        })
    }

    /// After a for-head binding: `of expr)` or `in expr)` followed by the body.
    fn parse_for_in_of_rest(
        &mut self,
        left: ForInOfLeft,
        is_await: bool,
    ) -> Result<Option<Statement>, JsError> {
        if self.eat_identifier("of")? {
            let right = self.nested(|p| p.parse_assignment_expression())?;
            self.expect_punctuator(Punctuator::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Some(Statement::ForOfStatement {
                left,
                right,
                body,
                is_await,
            }));
        }
        if self.check_keyword(Keyword::In)? {
            self.advance()?;
            let right = self.nested(|p| p.parse_expression())?;
            self.expect_punctuator(Punctuator::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(Some(Statement::ForInStatement { left, right, body }));
        }
        Ok(None)
    }

    fn parse_try_statement(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::Try)?;
        let block = self.parse_block()?;

        let handler = if self.check_keyword(Keyword::Catch)? {
            self.advance()?;
            let param = if self.eat_punctuator(Punctuator::LParen)? {
                let pattern = self.parse_binding_target()?;
                if self.check_punctuator(Punctuator::Colon)? {
                    self.skip_type_annotation()?;
                }
                self.expect_punctuator(Punctuator::RParen)?;
                Some(pattern)
            } else {
                None
            };
            let body = self.parse_block()?;
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.check_keyword(Keyword::Finally)? {
            self.advance()?;
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_here("Missing catch or finally after try"));
        }
        Ok(Statement::TryStatement {
            block,
            handler,
            finalizer,
        })
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::Switch)?;
        let discriminant = self.parse_parenthesized_condition()?;
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut cases = Vec::new();
        while !self.eat_punctuator(Punctuator::RBrace)? {
            let test = if self.check_keyword(Keyword::Case)? {
                self.advance()?;
                Some(self.nested(|p| p.parse_expression())?)
            } else {
                self.expect_keyword(Keyword::Default)?;
                None
            };
            self.expect_punctuator(Punctuator::Colon)?;
            let mut consequent = Vec::new();
            while !self.check_keyword(Keyword::Case)?
                && !self.check_keyword(Keyword::Default)?
                && !self.check_punctuator(Punctuator::RBrace)?
            {
                if self.is_at_end()? {
                    return Err(self.unexpected());
                }
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        Ok(Statement::SwitchStatement {
            discriminant,
            cases,
        })
    }

    // ------------------------------------------------------------------
    // Functions and classes
    // ------------------------------------------------------------------

    /// After `function` (and `async`). Overload signatures become type declarations.
    pub(crate) fn parse_function_declaration(
        &mut self,
        is_async: bool,
    ) -> Result<Statement, JsError> {
        match self.parse_function_rest(is_async, true)? {
            Some(function) => Ok(Statement::FunctionDeclaration(function)),
            None => Ok(Statement::TypeDeclaration { name: None }),
        }
    }

    /// Parse a function after the `function` keyword.
    ///
    /// Returns `None` for a body-less overload signature when `allow_signature` is set.
    pub(crate) fn parse_function_rest(
        &mut self,
        is_async: bool,
        allow_signature: bool,
    ) -> Result<Option<Function>, JsError> {
        let is_generator = self.eat_punctuator(Punctuator::Star)?;
        let name = match self.peek()? {
            Token::Identifier(_) => Some(self.expect_identifier()?),
            _ => None,
        };
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
        }
        let fn_ctx = Context {
            in_function: true,
            in_async: is_async,
            in_generator: is_generator,
            in_for_init: false,
            no_arrow_return_type: false,
        };
        let (params, _) = self.with_context(fn_ctx, |p| p.parse_parameters(false))?;
        if self.check_punctuator(Punctuator::Colon)? {
            self.skip_return_type()?;
        }
        if allow_signature && !self.check_punctuator(Punctuator::LBrace)? {
            self.consume_semicolon()?;
            return Ok(None);
        }
        let body = self.with_context(fn_ctx, |p| p.parse_block())?;
        Ok(Some(Function {
            name,
            params,
            body,
            is_async,
            is_generator,
        }))
    }

    /// Parse `( params )`.
    ///
    /// With `allow_modifiers`, TypeScript parameter properties are accepted and
    /// their names returned alongside the patterns.
    pub(crate) fn parse_parameters(
        &mut self,
        allow_modifiers: bool,
    ) -> Result<(Vec<Pattern>, Vec<String>), JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let mut params = Vec::new();
        let mut properties = Vec::new();

        let outer = self.ctx;
        let param_ctx = Context {
            in_for_init: false,
            no_arrow_return_type: false,
            ..outer
        };
        self.with_context(param_ctx, |p| {
            while !p.check_punctuator(Punctuator::RParen)? {
                if p.check_punctuator(Punctuator::At)? {
                    return Err(p.error_here("Decorators are not supported"));
                }

                let mut is_property = false;
                while let Token::Identifier(word) = p.peek()?.clone() {
                    if !matches!(
                        word.as_str(),
                        "public" | "private" | "protected" | "readonly" | "override"
                    ) {
                        break;
                    }
                    let (second, _) = p.peek_second()?;
                    let is_modifier = matches!(
                        second,
                        Token::Identifier(_)
                            | Token::Punctuator(Punctuator::LBrace)
                            | Token::Punctuator(Punctuator::LBracket)
                    );
                    if !is_modifier {
                        break;
                    }
                    if !allow_modifiers {
                        return Err(p.error_here("Parameter modifiers are only allowed in constructors"));
                    }
                    p.advance()?;
                    is_property = true;
                }

                if p.check_keyword(Keyword::This)? {
                    p.advance()?;
                    if p.check_punctuator(Punctuator::Colon)? {
                        p.skip_type_annotation()?;
                    }
                    if !p.eat_punctuator(Punctuator::Comma)? {
                        break;
                    }
                    continue;
                }

                let param = if p.eat_punctuator(Punctuator::Spread)? {
                    let target = p.parse_binding_target()?;
                    p.eat_punctuator(Punctuator::Question)?;
                    if p.check_punctuator(Punctuator::Colon)? {
                        p.skip_type_annotation()?;
                    }
                    Pattern::RestElement(Box::new(target))
                } else {
                    let target = p.parse_binding_target()?;
                    p.eat_punctuator(Punctuator::Question)?;
                    if p.check_punctuator(Punctuator::Colon)? {
                        p.skip_type_annotation()?;
                    }
                    if is_property {
                        if let Pattern::Identifier(name) = &target {
                            properties.push(name.clone());
                        }
                    }
                    if p.eat_punctuator(Punctuator::Assign)? {
                        let right = p.parse_assignment_expression()?;
                        Pattern::AssignmentPattern {
                            left: Box::new(target),
                            right: Box::new(right),
                        }
                    } else {
                        target
                    }
                };
                params.push(param);

                if !p.eat_punctuator(Punctuator::Comma)? {
                    break;
                }
            }
            Ok(())
        })?;

        self.expect_punctuator(Punctuator::RParen)?;
        Ok((params, properties))
    }

    /// Parse a class after the `class` keyword
    pub(crate) fn parse_class(&mut self) -> Result<Class, JsError> {
        let name = match self.peek()? {
            Token::Identifier(n) if n != "implements" => Some(self.expect_identifier()?),
            _ => None,
        };
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
        }

        let super_class = if self.check_keyword(Keyword::Extends)? {
            self.advance()?;
            let expr = self.parse_left_hand_side_expression()?;
            if self.check_punctuator(Punctuator::Lt)? {
                self.skip_type_arguments()?;
            }
            Some(Box::new(expr))
        } else {
            None
        };

        if self.eat_identifier("implements")? {
            loop {
                self.skip_type()?;
                if !self.eat_punctuator(Punctuator::Comma)? {
                    break;
                }
            }
        }

        let body = self.parse_class_body(super_class.is_some())?;
        Ok(Class {
            name,
            super_class,
            body,
        })
    }

    fn parse_class_body(&mut self, has_heritage: bool) -> Result<Vec<ClassElement>, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut elements = Vec::new();

        while !self.eat_punctuator(Punctuator::RBrace)? {
            if self.eat_punctuator(Punctuator::Semicolon)? {
                continue;
            }
            if self.check_punctuator(Punctuator::At)? {
                return Err(self.error_here("Decorators are not supported"));
            }
            if self.is_at_end()? {
                return Err(self.unexpected());
            }

            let mut is_static = false;
            let mut erased = false;
            let mut static_block = false;
            loop {
                let word = match self.peek()? {
                    Token::Identifier(w) => w.clone(),
                    _ => break,
                };
                if !matches!(
                    word.as_str(),
                    "static"
                        | "public"
                        | "private"
                        | "protected"
                        | "readonly"
                        | "abstract"
                        | "override"
                        | "declare"
                        | "accessor"
                ) {
                    break;
                }
                let (second, _) = self.peek_second()?;
                if !starts_class_member(&second) {
                    break;
                }
                if word == "static" && matches!(second, Token::Punctuator(Punctuator::LBrace)) {
                    self.advance()?;
                    let block_ctx = Context {
                        in_function: true,
                        in_async: false,
                        in_generator: false,
                        in_for_init: false,
                        no_arrow_return_type: false,
                    };
                    let body = self.with_context(block_ctx, |p| p.parse_block())?;
                    elements.push(ClassElement::StaticBlock { body });
                    static_block = true;
                    break;
                }
                self.advance()?;
                match word.as_str() {
                    "static" => is_static = true,
                    "abstract" | "declare" => erased = true,
                    _ => {}
                }
            }
            if static_block {
                continue;
            }

            // Index signature: [key: string]: T;
            if self.check_punctuator(Punctuator::LBracket)? {
                let is_index_signature = self.lookahead(|p| {
                    p.advance()?;
                    p.expect_identifier()?;
                    p.expect_punctuator(Punctuator::Colon)
                });
                if is_index_signature {
                    self.skip_balanced()?;
                    if self.check_punctuator(Punctuator::Colon)? {
                        self.skip_type_annotation()?;
                    }
                    self.consume_semicolon()?;
                    continue;
                }
            }

            let member = self.parse_method_or_property(true, has_heritage)?;
            if let Some((key, member)) = member {
                if erased {
                    continue;
                }
                match member {
                    Member::Method(kind, value) => {
                        let kind = if kind == MethodKind::Method
                            && !is_static
                            && key.is_named("constructor")
                        {
                            MethodKind::Constructor
                        } else {
                            kind
                        };
                        elements.push(ClassElement::MethodDefinition {
                            key,
                            kind,
                            value,
                            is_static,
                        });
                    }
                    Member::Property(value) => {
                        elements.push(ClassElement::PropertyDefinition {
                            key,
                            value,
                            is_static,
                        });
                    }
                }
            }
        }
        Ok(elements)
    }

    /// Shared member parser for classes and object literals.
    ///
    /// Returns `None` for erased members (overload signatures).
    fn parse_method_or_property(
        &mut self,
        in_class: bool,
        has_heritage: bool,
    ) -> Result<Option<(PropertyKey, Member)>, JsError> {
        let mut is_async = false;
        let mut is_generator = false;
        let mut kind = MethodKind::Method;

        if let Token::Identifier(word) = self.peek()?.clone() {
            let (second, newline) = self.peek_second()?;
            let prefix_applies = starts_property_name(&second)
                || matches!(second, Token::Punctuator(Punctuator::Star));
            if prefix_applies {
                match word.as_str() {
                    "async" if !newline => {
                        self.advance()?;
                        is_async = true;
                    }
                    "get" if !matches!(second, Token::Punctuator(Punctuator::Star)) => {
                        self.advance()?;
                        kind = MethodKind::Get;
                    }
                    "set" if !matches!(second, Token::Punctuator(Punctuator::Star)) => {
                        self.advance()?;
                        kind = MethodKind::Set;
                    }
                    _ => {}
                }
            }
        }
        if self.eat_punctuator(Punctuator::Star)? {
            is_generator = true;
        }

        let key = self.parse_property_key()?;
        let optional = self.eat_punctuator(Punctuator::Question)?;
        if in_class && !optional {
            self.eat_punctuator(Punctuator::Not)?;
        }

        if self.check_punctuator(Punctuator::LParen)? || self.check_punctuator(Punctuator::Lt)? {
            if self.check_punctuator(Punctuator::Lt)? {
                self.skip_type_parameters()?;
            }
            let fn_ctx = Context {
                in_function: true,
                in_async: is_async,
                in_generator: is_generator,
                in_for_init: false,
                no_arrow_return_type: false,
            };
            let is_constructor = in_class && key.is_named("constructor");
            let (params, properties) =
                self.with_context(fn_ctx, |p| p.parse_parameters(is_constructor))?;
            if self.check_punctuator(Punctuator::Colon)? {
                self.skip_return_type()?;
            }
            if in_class && !self.check_punctuator(Punctuator::LBrace)? {
                self.consume_semicolon()?;
                return Ok(None);
            }
            let mut body = self.with_context(fn_ctx, |p| p.parse_block())?;
            if !properties.is_empty() {
                insert_parameter_properties(&mut body, &properties, has_heritage);
            }
            let value = Function {
                name: None,
                params,
                body,
                is_async,
                is_generator,
            };
            return Ok(Some((key, Member::Method(kind, value))));
        }

        if is_async || is_generator || kind != MethodKind::Method {
            return Err(self.unexpected());
        }

        if in_class {
            if self.check_punctuator(Punctuator::Colon)? {
                self.skip_type_annotation()?;
            }
            let value = if self.eat_punctuator(Punctuator::Assign)? {
                let field_ctx = Context {
                    in_function: true,
                    in_async: false,
                    in_generator: false,
                    in_for_init: false,
                    no_arrow_return_type: false,
                };
                Some(self.with_context(field_ctx, |p| p.parse_assignment_expression())?)
            } else {
                None
            };
            self.consume_semicolon()?;
            return Ok(Some((key, Member::Property(value))));
        }

        self.expect_punctuator(Punctuator::Colon)?;
        let value = self.parse_assignment_expression()?;
        Ok(Some((key, Member::Property(Some(value)))))
    }

    pub(crate) fn parse_property_key(&mut self) -> Result<PropertyKey, JsError> {
        let token = self.advance()?;
        match token {
            Token::Identifier(name) => Ok(PropertyKey::Identifier(name)),
            Token::Keyword(k) => Ok(PropertyKey::Identifier(k.as_str().to_string())),
            Token::String(s) => Ok(PropertyKey::String(s)),
            Token::Number(n) => Ok(PropertyKey::Number(n)),
            Token::BigInt(digits) => Ok(PropertyKey::String(digits)),
            Token::PrivateName(name) => Ok(PropertyKey::PrivateName(name)),
            Token::Punctuator(Punctuator::LBracket) => {
                let expr = self.nested(|p| p.parse_assignment_expression())?;
                self.expect_punctuator(Punctuator::RBracket)?;
                Ok(PropertyKey::Computed(Box::new(expr)))
            }
            other => Err(syntax_error(
                format!("Unexpected {} in property name", other.describe()),
                Some(self.lexer.token_position()),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Patterns
    // ------------------------------------------------------------------

    /// Identifier, object pattern or array pattern
    pub(crate) fn parse_binding_target(&mut self) -> Result<Pattern, JsError> {
        match self.peek()? {
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_pattern(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_pattern(),
            _ => Ok(Pattern::Identifier(self.expect_identifier()?)),
        }
    }

    fn parse_binding_element(&mut self) -> Result<Pattern, JsError> {
        let target = self.parse_binding_target()?;
        if self.eat_punctuator(Punctuator::Assign)? {
            let right = self.nested(|p| p.parse_assignment_expression())?;
            return Ok(Pattern::AssignmentPattern {
                left: Box::new(target),
                right: Box::new(right),
            });
        }
        Ok(target)
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern, JsError> {
        self.expect_punctuator(Punctuator::LBracket)?;
        let mut elements = Vec::new();
        while !self.eat_punctuator(Punctuator::RBracket)? {
            if self.eat_punctuator(Punctuator::Comma)? {
                elements.push(None);
                continue;
            }
            if self.eat_punctuator(Punctuator::Spread)? {
                let target = self.parse_binding_target()?;
                elements.push(Some(Pattern::RestElement(Box::new(target))));
            } else {
                elements.push(Some(self.parse_binding_element()?));
            }
            if !self.check_punctuator(Punctuator::RBracket)? {
                self.expect_punctuator(Punctuator::Comma)?;
            }
        }
        Ok(Pattern::ArrayPattern(elements))
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut properties = Vec::new();
        while !self.eat_punctuator(Punctuator::RBrace)? {
            if self.eat_punctuator(Punctuator::Spread)? {
                let target = self.parse_binding_target()?;
                properties.push(ObjectPatternProperty {
                    key: None,
                    value: Pattern::RestElement(Box::new(target)),
                    shorthand: false,
                });
            } else {
                let key = self.parse_property_key()?;
                if self.eat_punctuator(Punctuator::Colon)? {
                    let value = self.parse_binding_element()?;
                    properties.push(ObjectPatternProperty {
                        key: Some(key),
                        value,
                        shorthand: false,
                    });
                } else {
                    let name = match &key {
                        PropertyKey::Identifier(name) => name.clone(),
                        _ => return Err(self.unexpected()),
                    };
                    let mut value = Pattern::Identifier(name);
                    if self.eat_punctuator(Punctuator::Assign)? {
                        let right = self.nested(|p| p.parse_assignment_expression())?;
                        value = Pattern::AssignmentPattern {
                            left: Box::new(value),
                            right: Box::new(right),
                        };
                    }
                    properties.push(ObjectPatternProperty {
                        key: Some(key),
                        value,
                        shorthand: true,
                    });
                }
            }
            if !self.check_punctuator(Punctuator::RBrace)? {
                self.expect_punctuator(Punctuator::Comma)?;
            }
        }
        Ok(Pattern::ObjectPattern(properties))
    }

    /// Reinterpret an already parsed expression as an assignment target
    pub(crate) fn expression_to_pattern(&self, expr: Expression) -> Result<Pattern, JsError> {
        match expr {
            Expression::Identifier { name } => Ok(Pattern::Identifier(name)),
            Expression::MemberExpression { .. } => Ok(Pattern::Expression(Box::new(expr))),
            Expression::ParenthesizedExpression { expression } => match *expression {
                inner @ (Expression::Identifier { .. }
                | Expression::MemberExpression { .. }
                | Expression::ParenthesizedExpression { .. }) => self.expression_to_pattern(inner),
                _ => Err(self.error_here("Invalid assignment target")),
            },
            Expression::ArrayExpression { elements } => {
                let mut patterns = Vec::with_capacity(elements.len());
                for element in elements {
                    patterns.push(match element {
                        None => None,
                        Some(Expression::SpreadElement { argument }) => {
                            Some(Pattern::RestElement(Box::new(self.expression_to_pattern(*argument)?)))
                        }
                        Some(other) => Some(self.expression_to_pattern(other)?),
                    });
                }
                Ok(Pattern::ArrayPattern(patterns))
            }
            Expression::ObjectExpression { properties } => {
                let mut patterns = Vec::with_capacity(properties.len());
                for property in properties {
                    match property {
                        ObjectProperty::Property {
                            key,
                            value,
                            shorthand,
                        } => patterns.push(ObjectPatternProperty {
                            key: Some(key),
                            value: self.expression_to_pattern(value)?,
                            shorthand,
                        }),
                        ObjectProperty::SpreadElement(argument) => {
                            patterns.push(ObjectPatternProperty {
                                key: None,
                                value: Pattern::RestElement(Box::new(
                                    self.expression_to_pattern(argument)?,
                                )),
                                shorthand: false,
                            })
                        }
                        ObjectProperty::Method { .. } => {
                            return Err(self.error_here("Invalid destructuring target"))
                        }
                    }
                }
                Ok(Pattern::ObjectPattern(patterns))
            }
            Expression::AssignmentExpression {
                left,
                operator: AssignmentOperator::Assign,
                right,
            } => Ok(Pattern::AssignmentPattern { left, right }),
            _ => Err(self.error_here("Invalid assignment target")),
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Expression including the comma operator
    pub(crate) fn parse_expression(&mut self) -> Result<Expression, JsError> {
        let first = self.parse_assignment_expression()?;
        if !self.check_punctuator(Punctuator::Comma)? {
            return Ok(first);
        }
        let mut expressions = vec![first];
        while self.eat_punctuator(Punctuator::Comma)? {
            expressions.push(self.parse_assignment_expression()?);
        }
        Ok(Expression::SequenceExpression { expressions })
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expression, JsError> {
        if self.ctx.in_generator && self.check_identifier("yield")? {
            return self.parse_yield_expression();
        }
        if let Some(arrow) = self.try_parse_arrow_function()? {
            return Ok(arrow);
        }

        let left = self.parse_conditional_expression()?;

        let operator = match self.peek()? {
            Token::Punctuator(p) => assignment_operator(*p),
            _ => None,
        };
        let Some(operator) = operator else {
            return Ok(left);
        };
        self.advance()?;

        let target = if operator == AssignmentOperator::Assign {
            self.expression_to_pattern(left)?
        } else {
            match left.unparenthesized() {
                Expression::Identifier { name } => Pattern::Identifier(name.clone()),
                Expression::MemberExpression { .. } => Pattern::Expression(Box::new(left)),
                _ => return Err(self.error_here("Invalid left-hand side in assignment")),
            }
        };
        let right = self.parse_assignment_expression()?;
        Ok(Expression::AssignmentExpression {
            left: Box::new(target),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_yield_expression(&mut self) -> Result<Expression, JsError> {
        self.advance()?;
        let delegate = self.eat_punctuator(Punctuator::Star)?;
        let ends = !delegate
            && (self.lexer.line_terminator_before_token
                || matches!(
                    self.peek()?,
                    Token::Punctuator(
                        Punctuator::RParen
                            | Punctuator::RBracket
                            | Punctuator::RBrace
                            | Punctuator::Comma
                            | Punctuator::Semicolon
                            | Punctuator::Colon
                    ) | Token::EOF
                ));
        let argument = if ends {
            None
        } else {
            Some(Box::new(self.parse_assignment_expression()?))
        };
        Ok(Expression::YieldExpression { argument, delegate })
    }

    /// Detect and parse an arrow function at the current position
    fn try_parse_arrow_function(&mut self) -> Result<Option<Expression>, JsError> {
        let token = self.peek()?.clone();
        match token {
            Token::Identifier(ref name) => {
                let (second, newline) = self.peek_second()?;
                if name == "async" && !newline {
                    match second {
                        Token::Identifier(_) => {
                            let head = self.speculate(|p| {
                                p.advance()?;
                                let param = p.expect_identifier()?;
                                p.expect_arrow()?;
                                Ok(vec![Pattern::Identifier(param)])
                            });
                            if let Some(params) = head {
                                return self.parse_arrow_body(params, true).map(Some);
                            }
                        }
                        Token::Punctuator(Punctuator::LParen) | Token::Punctuator(Punctuator::Lt) => {
                            let head = self.speculate(|p| {
                                p.advance()?;
                                p.parse_arrow_head(true)
                            });
                            if let Some(params) = head {
                                return self.parse_arrow_body(params, true).map(Some);
                            }
                        }
                        _ => {}
                    }
                }
                if matches!(second, Token::Punctuator(Punctuator::Arrow)) && !newline {
                    let param = self.expect_identifier()?;
                    self.advance()?;
                    return self
                        .parse_arrow_body(vec![Pattern::Identifier(param)], false)
                        .map(Some);
                }
                Ok(None)
            }
            Token::Punctuator(Punctuator::LParen) | Token::Punctuator(Punctuator::Lt) => {
                match self.speculate(|p| p.parse_arrow_head(false)) {
                    Some(params) => self.parse_arrow_body(params, false).map(Some),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// `<T>(params): R =>` up to and including the arrow
    fn parse_arrow_head(&mut self, is_async: bool) -> Result<Vec<Pattern>, JsError> {
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
        }
        let head_ctx = Context {
            in_async: is_async,
            ..self.ctx
        };
        let (params, _) = self.with_context(head_ctx, |p| p.parse_parameters(false))?;
        if self.check_punctuator(Punctuator::Colon)? {
            if self.ctx.no_arrow_return_type {
                return Err(self.unexpected());
            }
            self.skip_return_type()?;
        }
        self.expect_arrow()?;
        Ok(params)
    }

    fn expect_arrow(&mut self) -> Result<(), JsError> {
        self.peek()?;
        if self.lexer.line_terminator_before_token {
            return Err(self.error_here("Line terminator not permitted before arrow"));
        }
        self.expect_punctuator(Punctuator::Arrow)
    }

    fn parse_arrow_body(
        &mut self,
        params: Vec<Pattern>,
        is_async: bool,
    ) -> Result<Expression, JsError> {
        let body_ctx = Context {
            in_function: true,
            in_async: is_async,
            in_generator: false,
            in_for_init: if self.check_punctuator(Punctuator::LBrace)? {
                false
            } else {
                self.ctx.in_for_init
            },
            no_arrow_return_type: self.ctx.no_arrow_return_type,
        };
        let body = if self.check_punctuator(Punctuator::LBrace)? {
            ArrowFunctionBody::Block(self.with_context(body_ctx, |p| p.parse_block())?)
        } else {
            ArrowFunctionBody::Expression(Box::new(
                self.with_context(body_ctx, |p| p.parse_assignment_expression())?,
            ))
        };
        Ok(Expression::ArrowFunctionExpression {
            params,
            body,
            is_async,
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, JsError> {
        let test = self.parse_binary_expression(0)?;
        if !self.eat_punctuator(Punctuator::Question)? {
            return Ok(test);
        }
        let consequent_ctx = Context {
            in_for_init: false,
            no_arrow_return_type: true,
            ..self.ctx
        };
        let consequent =
            self.with_context(consequent_ctx, |p| p.parse_assignment_expression())?;
        self.expect_punctuator(Punctuator::Colon)?;
        let alternate = self.parse_assignment_expression()?;
        Ok(Expression::ConditionalExpression {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// Precedence climbing over binary and logical operators
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<Expression, JsError> {
        let mut left = self.parse_unary_expression()?;
        loop {
            if (self.check_identifier("as")? || self.check_identifier("satisfies")?)
                && !self.lexer.line_terminator_before_token
                && RELATIONAL_PRECEDENCE >= min_precedence
            {
                self.advance()?;
                if !self.check_keyword(Keyword::Const)? {
                    self.skip_type()?;
                } else {
                    self.advance()?;
                }
                continue;
            }

            let Some(op) = self.peek_binary_operator()? else {
                break;
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance()?;
            let right = if op == BinaryOp::Binary(BinaryOperator::Exp) {
                self.parse_binary_expression(precedence)?
            } else {
                self.parse_binary_expression(precedence + 1)?
            };
            left = match op {
                BinaryOp::Binary(operator) => Expression::BinaryExpression {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
                BinaryOp::Logical(operator) => Expression::LogicalExpression {
                    left: Box::new(left),
                    operator,
                    right: Box::new(right),
                },
            };
        }
        Ok(left)
    }

    fn peek_binary_operator(&mut self) -> Result<Option<BinaryOp>, JsError> {
        let in_for_init = self.ctx.in_for_init;
        let op = match self.peek()? {
            Token::Punctuator(p) => match p {
                Punctuator::NullishCoalesce => BinaryOp::Logical(LogicalOperator::NullishCoalesce),
                Punctuator::OrOr => BinaryOp::Logical(LogicalOperator::Or),
                Punctuator::AndAnd => BinaryOp::Logical(LogicalOperator::And),
                Punctuator::Or => BinaryOp::Binary(BinaryOperator::BitwiseOr),
                Punctuator::Xor => BinaryOp::Binary(BinaryOperator::BitwiseXor),
                Punctuator::And => BinaryOp::Binary(BinaryOperator::BitwiseAnd),
                Punctuator::EqEq => BinaryOp::Binary(BinaryOperator::Eq),
                Punctuator::NotEq => BinaryOp::Binary(BinaryOperator::NotEq),
                Punctuator::EqEqEq => BinaryOp::Binary(BinaryOperator::StrictEq),
                Punctuator::NotEqEq => BinaryOp::Binary(BinaryOperator::StrictNotEq),
                Punctuator::Lt => BinaryOp::Binary(BinaryOperator::Lt),
                Punctuator::LtEq => BinaryOp::Binary(BinaryOperator::LtEq),
                Punctuator::Gt => BinaryOp::Binary(BinaryOperator::Gt),
                Punctuator::GtEq => BinaryOp::Binary(BinaryOperator::GtEq),
                Punctuator::LtLt => BinaryOp::Binary(BinaryOperator::LeftShift),
                Punctuator::GtGt => BinaryOp::Binary(BinaryOperator::RightShift),
                Punctuator::GtGtGt => BinaryOp::Binary(BinaryOperator::UnsignedRightShift),
                Punctuator::Plus => BinaryOp::Binary(BinaryOperator::Add),
                Punctuator::Minus => BinaryOp::Binary(BinaryOperator::Sub),
                Punctuator::Star => BinaryOp::Binary(BinaryOperator::Mul),
                Punctuator::Slash => BinaryOp::Binary(BinaryOperator::Div),
                Punctuator::Percent => BinaryOp::Binary(BinaryOperator::Mod),
                Punctuator::StarStar => BinaryOp::Binary(BinaryOperator::Exp),
                _ => return Ok(None),
            },
            Token::Keyword(Keyword::Instanceof) => BinaryOp::Binary(BinaryOperator::Instanceof),
            Token::Keyword(Keyword::In) if !in_for_init => BinaryOp::Binary(BinaryOperator::In),
            _ => return Ok(None),
        };
        Ok(Some(op))
    }

    fn parse_unary_expression(&mut self) -> Result<Expression, JsError> {
        let token = self.peek()?.clone();
        let operator = match token {
            Token::Punctuator(Punctuator::Minus) => Some(UnaryOperator::Minus),
            Token::Punctuator(Punctuator::Plus) => Some(UnaryOperator::Plus),
            Token::Punctuator(Punctuator::Not) => Some(UnaryOperator::Not),
            Token::Punctuator(Punctuator::Tilde) => Some(UnaryOperator::BitwiseNot),
            Token::Keyword(Keyword::Typeof) => Some(UnaryOperator::Typeof),
            Token::Keyword(Keyword::Void) => Some(UnaryOperator::Void),
            Token::Keyword(Keyword::Delete) => Some(UnaryOperator::Delete),
            _ => None,
        };
        if let Some(operator) = operator {
            self.advance()?;
            let argument = self.parse_unary_expression()?;
            return Ok(Expression::UnaryExpression {
                operator,
                argument: Box::new(argument),
            });
        }

        match token {
            Token::Punctuator(Punctuator::PlusPlus) | Token::Punctuator(Punctuator::MinusMinus) => {
                self.advance()?;
                let operator = if token == Token::Punctuator(Punctuator::PlusPlus) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                let argument = self.parse_unary_expression()?;
                return Ok(Expression::UpdateExpression {
                    operator,
                    argument: Box::new(argument),
                    prefix: true,
                });
            }
            Token::Identifier(ref name) if name == "await" && self.await_allowed() => {
                self.advance()?;
                let argument = self.parse_unary_expression()?;
                return Ok(Expression::AwaitExpression {
                    argument: Box::new(argument),
                });
            }
            Token::Punctuator(Punctuator::Lt) => {
                return Err(self.error_here(
                    "JSX and angle-bracket type assertions are not supported",
                ));
            }
            _ => {}
        }

        let expr = self.parse_left_hand_side_expression()?;
        let postfix = match self.peek()? {
            Token::Punctuator(Punctuator::PlusPlus) => Some(UpdateOperator::Increment),
            Token::Punctuator(Punctuator::MinusMinus) => Some(UpdateOperator::Decrement),
            _ => None,
        };
        if let Some(operator) = postfix {
            if !self.lexer.line_terminator_before_token {
                self.advance()?;
                return Ok(Expression::UpdateExpression {
                    operator,
                    argument: Box::new(expr),
                    prefix: false,
                });
            }
        }
        Ok(expr)
    }

    /// Member accesses, calls, tagged templates and `new`
    pub(crate) fn parse_left_hand_side_expression(&mut self) -> Result<Expression, JsError> {
        let start = if self.check_keyword(Keyword::New)? {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        self.parse_member_chain(start, true)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, JsError> {
        self.expect_keyword(Keyword::New)?;
        if self.eat_punctuator(Punctuator::Dot)? {
            let property = self.expect_identifier_name()?;
            return Ok(Expression::MetaProperty {
                meta: "new".to_string(),
                property,
            });
        }
        let callee = if self.check_keyword(Keyword::New)? {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        let callee = self.parse_member_chain(callee, false)?;
        if self.check_punctuator(Punctuator::Lt)? {
            self.speculate(|p| p.skip_type_arguments());
        }
        let arguments = if self.check_punctuator(Punctuator::LParen)? {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::NewExpression {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_member_chain(
        &mut self,
        mut expr: Expression,
        allow_call: bool,
    ) -> Result<Expression, JsError> {
        loop {
            let token = self.peek()?.clone();
            match token {
                Token::Punctuator(Punctuator::Dot) => {
                    self.advance()?;
                    let property = self.parse_member_name()?;
                    expr = Expression::MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: false,
                        optional: false,
                    };
                }
                Token::Punctuator(Punctuator::OptionalChain) => {
                    if !allow_call {
                        return Err(self.error_here("Optional chain is not allowed in new expression"));
                    }
                    self.advance()?;
                    if self.check_punctuator(Punctuator::LParen)? {
                        let arguments = self.parse_arguments()?;
                        expr = Expression::CallExpression {
                            callee: Box::new(expr),
                            arguments,
                            optional: true,
                        };
                    } else if self.eat_punctuator(Punctuator::LBracket)? {
                        let property = self.nested(|p| p.parse_expression())?;
                        self.expect_punctuator(Punctuator::RBracket)?;
                        expr = Expression::MemberExpression {
                            object: Box::new(expr),
                            property: Box::new(property),
                            computed: true,
                            optional: true,
                        };
                    } else {
                        let property = self.parse_member_name()?;
                        expr = Expression::MemberExpression {
                            object: Box::new(expr),
                            property: Box::new(property),
                            computed: false,
                            optional: true,
                        };
                    }
                }
                Token::Punctuator(Punctuator::LBracket) => {
                    self.advance()?;
                    let property = self.nested(|p| p.parse_expression())?;
                    self.expect_punctuator(Punctuator::RBracket)?;
                    expr = Expression::MemberExpression {
                        object: Box::new(expr),
                        property: Box::new(property),
                        computed: true,
                        optional: false,
                    };
                }
                Token::Punctuator(Punctuator::LParen) if allow_call => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::CallExpression {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                    };
                }
                Token::Template(_) | Token::TemplateHead(_) => {
                    let (quasis, expressions) = self.parse_template_parts()?;
                    expr = Expression::TaggedTemplateExpression {
                        tag: Box::new(expr),
                        quasis,
                        expressions,
                    };
                }
                Token::Punctuator(Punctuator::Not) if !self.lexer.line_terminator_before_token => {
                    // TypeScript non-null assertion
                    self.advance()?;
                }
                Token::Punctuator(Punctuator::Lt) if allow_call => {
                    let instantiated = self.speculate(|p| {
                        p.skip_type_arguments()?;
                        match p.peek()? {
                            Token::Punctuator(Punctuator::LParen)
                            | Token::Template(_)
                            | Token::TemplateHead(_) => Ok(()),
                            _ => Err(p.unexpected()),
                        }
                    });
                    if instantiated.is_none() {
                        break;
                    }
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_member_name(&mut self) -> Result<Expression, JsError> {
        if let Token::PrivateName(_) = self.peek()? {
            if let Token::PrivateName(name) = self.advance()? {
                return Ok(Expression::identifier(format!("#{}", name)));
            }
        }
        Ok(Expression::identifier(self.expect_identifier_name()?))
    }

    pub(crate) fn parse_arguments(&mut self) -> Result<Vec<Expression>, JsError> {
        self.expect_punctuator(Punctuator::LParen)?;
        let arguments = self.nested(|p| {
            let mut arguments = Vec::new();
            while !p.check_punctuator(Punctuator::RParen)? {
                if p.eat_punctuator(Punctuator::Spread)? {
                    let argument = p.parse_assignment_expression()?;
                    arguments.push(Expression::SpreadElement {
                        argument: Box::new(argument),
                    });
                } else {
                    arguments.push(p.parse_assignment_expression()?);
                }
                if !p.eat_punctuator(Punctuator::Comma)? {
                    break;
                }
            }
            Ok(arguments)
        })?;
        self.expect_punctuator(Punctuator::RParen)?;
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, JsError> {
        let token = self.peek()?.clone();
        match token {
            Token::Identifier(name) => {
                if name == "async" {
                    let (second, newline) = self.peek_second()?;
                    if !newline && matches!(second, Token::Keyword(Keyword::Function)) {
                        self.advance()?;
                        self.advance()?;
                        return self.parse_function_expression(true);
                    }
                }
                self.advance()?;
                Ok(Expression::Identifier { name })
            }
            Token::PrivateName(name) => {
                self.advance()?;
                Ok(Expression::identifier(format!("#{}", name)))
            }
            Token::Number(n) => {
                self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::Number(n),
                })
            }
            Token::BigInt(digits) => {
                self.advance()?;
                Ok(Expression::Literal {
                    value: Literal::BigInt(digits),
                })
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expression::string(s))
            }
            Token::Template(_) | Token::TemplateHead(_) => {
                let (quasis, expressions) = self.parse_template_parts()?;
                Ok(Expression::TemplateLiteral {
                    quasis,
                    expressions,
                })
            }
            Token::Punctuator(Punctuator::Slash) | Token::Punctuator(Punctuator::SlashEq) => {
                match self.lexer.rescan_as_regexp()? {
                    Token::RegExp { pattern, flags } => Ok(Expression::Literal {
                        value: Literal::RegExp { pattern, flags },
                    }),
                    _ => Err(self.error_here("Invalid regular expression")),
                }
            }
            Token::Punctuator(Punctuator::LParen) => {
                self.advance()?;
                let expression = self.nested(|p| p.parse_expression())?;
                self.expect_punctuator(Punctuator::RParen)?;
                Ok(Expression::ParenthesizedExpression {
                    expression: Box::new(expression),
                })
            }
            Token::Punctuator(Punctuator::LBracket) => self.parse_array_literal(),
            Token::Punctuator(Punctuator::LBrace) => self.parse_object_literal(),
            Token::Punctuator(Punctuator::At) => Err(self.error_here("Decorators are not supported")),
            Token::Keyword(keyword) => match keyword {
                Keyword::This => {
                    self.advance()?;
                    Ok(Expression::ThisExpression)
                }
                Keyword::Super => {
                    self.advance()?;
                    Ok(Expression::SuperExpression)
                }
                Keyword::Null => {
                    self.advance()?;
                    Ok(Expression::Literal {
                        value: Literal::Null,
                    })
                }
                Keyword::True | Keyword::False => {
                    self.advance()?;
                    Ok(Expression::Literal {
                        value: Literal::Boolean(keyword == Keyword::True),
                    })
                }
                Keyword::Function => {
                    self.advance()?;
                    self.parse_function_expression(false)
                }
                Keyword::Class => {
                    self.advance()?;
                    Ok(Expression::ClassExpression(self.parse_class()?))
                }
                Keyword::New => self.parse_new_expression(),
                Keyword::Import => self.parse_import_call_or_meta(),
                _ => Err(self.unexpected()),
            },
            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_expression(&mut self, is_async: bool) -> Result<Expression, JsError> {
        match self.parse_function_rest(is_async, false)? {
            Some(function) => Ok(Expression::FunctionExpression(function)),
            None => Err(self.error_here("Function expression requires a body")),
        }
    }

    fn parse_import_call_or_meta(&mut self) -> Result<Expression, JsError> {
        self.expect_keyword(Keyword::Import)?;
        if self.eat_punctuator(Punctuator::Dot)? {
            let property = self.expect_identifier_name()?;
            return Ok(Expression::MetaProperty {
                meta: "import".to_string(),
                property,
            });
        }
        let mut arguments = self.parse_arguments()?;
        if arguments.is_empty() {
            return Err(self.error_here("import() requires a module specifier"));
        }
        let source = arguments.remove(0);
        Ok(Expression::ImportExpression {
            source: Box::new(source),
        })
    }

    /// Template literal parts starting at the current template token
    fn parse_template_parts(
        &mut self,
    ) -> Result<(Vec<TemplateElement>, Vec<Expression>), JsError> {
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        match self.advance()? {
            Token::Template(part) => {
                quasis.push(TemplateElement {
                    raw: part.raw,
                    cooked: part.cooked,
                });
                return Ok((quasis, expressions));
            }
            Token::TemplateHead(part) => quasis.push(TemplateElement {
                raw: part.raw,
                cooked: part.cooked,
            }),
            _ => return Err(self.error_here("Expected template literal")),
        }
        loop {
            expressions.push(self.nested(|p| p.parse_expression())?);
            if !self.check_punctuator(Punctuator::RBrace)? {
                return Err(self.unexpected());
            }
            match self.lexer.rescan_template_continuation()? {
                Token::TemplateMiddle(part) => quasis.push(TemplateElement {
                    raw: part.raw,
                    cooked: part.cooked,
                }),
                Token::TemplateTail(part) => {
                    quasis.push(TemplateElement {
                        raw: part.raw,
                        cooked: part.cooked,
                    });
                    break;
                }
                _ => return Err(self.error_here("Malformed template literal")),
            }
        }
        Ok((quasis, expressions))
    }

    fn parse_array_literal(&mut self) -> Result<Expression, JsError> {
        self.expect_punctuator(Punctuator::LBracket)?;
        let elements = self.nested(|p| {
            let mut elements = Vec::new();
            while !p.check_punctuator(Punctuator::RBracket)? {
                if p.eat_punctuator(Punctuator::Comma)? {
                    elements.push(None);
                    continue;
                }
                if p.eat_punctuator(Punctuator::Spread)? {
                    let argument = p.parse_assignment_expression()?;
                    elements.push(Some(Expression::SpreadElement {
                        argument: Box::new(argument),
                    }));
                } else {
                    elements.push(Some(p.parse_assignment_expression()?));
                }
                if !p.check_punctuator(Punctuator::RBracket)? {
                    p.expect_punctuator(Punctuator::Comma)?;
                }
            }
            Ok(elements)
        })?;
        self.expect_punctuator(Punctuator::RBracket)?;
        Ok(Expression::ArrayExpression { elements })
    }

    fn parse_object_literal(&mut self) -> Result<Expression, JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let properties = self.nested(|p| {
            let mut properties = Vec::new();
            while !p.check_punctuator(Punctuator::RBrace)? {
                if p.eat_punctuator(Punctuator::Spread)? {
                    properties.push(ObjectProperty::SpreadElement(p.parse_assignment_expression()?));
                } else {
                    properties.push(p.parse_object_property()?);
                }
                if !p.check_punctuator(Punctuator::RBrace)? {
                    p.expect_punctuator(Punctuator::Comma)?;
                }
            }
            Ok(properties)
        })?;
        self.expect_punctuator(Punctuator::RBrace)?;
        Ok(Expression::ObjectExpression { properties })
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty, JsError> {
        // Shorthand `{ a }` and cover-initialized `{ a = 1 }`
        if let Token::Identifier(name) = self.peek()?.clone() {
            let (second, _) = self.peek_second()?;
            match second {
                Token::Punctuator(Punctuator::Comma) | Token::Punctuator(Punctuator::RBrace) => {
                    self.advance()?;
                    return Ok(ObjectProperty::Property {
                        key: PropertyKey::Identifier(name.clone()),
                        value: Expression::Identifier { name },
                        shorthand: true,
                    });
                }
                Token::Punctuator(Punctuator::Assign) => {
                    self.advance()?;
                    self.advance()?;
                    let right = self.parse_assignment_expression()?;
                    return Ok(ObjectProperty::Property {
                        key: PropertyKey::Identifier(name.clone()),
                        value: Expression::AssignmentExpression {
                            left: Box::new(Pattern::Identifier(name)),
                            operator: AssignmentOperator::Assign,
                            right: Box::new(right),
                        },
                        shorthand: true,
                    });
                }
                _ => {}
            }
        }

        match self.parse_method_or_property(false, false)? {
            Some((key, Member::Method(kind, value))) => Ok(ObjectProperty::Method { key, kind, value }),
            Some((key, Member::Property(Some(value)))) => Ok(ObjectProperty::Property {
                key,
                value,
                shorthand: false,
            }),
            _ => Err(self.unexpected()),
        }
    }
}

/// A parsed class or object member body
enum Member {
    Method(MethodKind, Function),
    Property(Option<Expression>),
}

/// Binary or logical operator with its precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

const RELATIONAL_PRECEDENCE: u8 = 8;

impl BinaryOp {
    fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Logical(LogicalOperator::NullishCoalesce) => 1,
            BinaryOp::Logical(LogicalOperator::Or) => 2,
            BinaryOp::Logical(LogicalOperator::And) => 3,
            BinaryOp::Binary(op) => match op {
                BinaryOperator::BitwiseOr => 4,
                BinaryOperator::BitwiseXor => 5,
                BinaryOperator::BitwiseAnd => 6,
                BinaryOperator::Eq
                | BinaryOperator::NotEq
                | BinaryOperator::StrictEq
                | BinaryOperator::StrictNotEq => 7,
                BinaryOperator::Lt
                | BinaryOperator::LtEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
                | BinaryOperator::Instanceof
                | BinaryOperator::In => RELATIONAL_PRECEDENCE,
                BinaryOperator::LeftShift
                | BinaryOperator::RightShift
                | BinaryOperator::UnsignedRightShift => 9,
                BinaryOperator::Add | BinaryOperator::Sub => 10,
                BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 11,
                BinaryOperator::Exp => 12,
            },
        }
    }
}

fn assignment_operator(p: Punctuator) -> Option<AssignmentOperator> {
    let op = match p {
        Punctuator::Assign => AssignmentOperator::Assign,
        Punctuator::PlusEq => AssignmentOperator::AddAssign,
        Punctuator::MinusEq => AssignmentOperator::SubAssign,
        Punctuator::StarEq => AssignmentOperator::MulAssign,
        Punctuator::SlashEq => AssignmentOperator::DivAssign,
        Punctuator::PercentEq => AssignmentOperator::ModAssign,
        Punctuator::StarStarEq => AssignmentOperator::ExpAssign,
        Punctuator::AndEq => AssignmentOperator::BitAndAssign,
        Punctuator::OrEq => AssignmentOperator::BitOrAssign,
        Punctuator::XorEq => AssignmentOperator::BitXorAssign,
        Punctuator::LtLtEq => AssignmentOperator::LeftShiftAssign,
        Punctuator::GtGtEq => AssignmentOperator::RightShiftAssign,
        Punctuator::GtGtGtEq => AssignmentOperator::UnsignedRightShiftAssign,
        Punctuator::AndAndEq => AssignmentOperator::LogicalAndAssign,
        Punctuator::OrOrEq => AssignmentOperator::LogicalOrAssign,
        Punctuator::NullishCoalesceEq => AssignmentOperator::NullishCoalesceAssign,
        _ => return None,
    };
    Some(op)
}

/// True if `token` can begin a property name
fn starts_property_name(token: &Token) -> bool {
    matches!(
        token,
        Token::Identifier(_)
            | Token::Keyword(_)
            | Token::String(_)
            | Token::Number(_)
            | Token::BigInt(_)
            | Token::PrivateName(_)
            | Token::Punctuator(Punctuator::LBracket)
    )
}

/// True if `token` can follow a class member modifier
fn starts_class_member(token: &Token) -> bool {
    starts_property_name(token)
        || matches!(
            token,
            Token::Punctuator(Punctuator::Star) | Token::Punctuator(Punctuator::LBrace)
        )
}

/// Lower constructor parameter properties to `this.name = name;` statements
fn insert_parameter_properties(body: &mut Vec<Statement>, names: &[String], has_heritage: bool) {
    let assignments = names.iter().map(|name| Statement::ExpressionStatement {
        expression: Expression::AssignmentExpression {
            left: Box::new(Pattern::Expression(Box::new(Expression::member(
                Expression::ThisExpression,
                name.clone(),
            )))),
            operator: AssignmentOperator::Assign,
            right: Box::new(Expression::identifier(name.clone())),
        },
    });

    let insert_at = if has_heritage {
        body.iter()
            .position(|stmt| {
                matches!(
                    stmt,
                    Statement::ExpressionStatement {
                        expression: Expression::CallExpression { callee, .. }
                    } if matches!(**callee, Expression::SuperExpression)
                )
            })
            .map(|index| index + 1)
            .unwrap_or(0)
    } else {
        0
    };
    let tail = body.split_off(insert_at);
    body.extend(assignments);
    body.extend(tail);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse_program().unwrap()
    }

    fn parse_expr(source: &str) -> Expression {
        match parse(source).body.into_iter().next() {
            Some(Statement::ExpressionStatement { expression }) => expression,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_variable_declaration() {
        let program = parse("let x = 1, y;");
        match &program.body[0] {
            Statement::VariableDeclaration(decl) => {
                assert_eq!(decl.kind, VariableKind::Let);
                assert_eq!(decl.declarations.len(), 2);
                assert!(decl.declarations[1].init.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse_expr("1 + 2 * 3;");
        match expr {
            Expression::BinaryExpression {
                operator: BinaryOperator::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expression::BinaryExpression {
                    operator: BinaryOperator::Mul,
                    ..
                }
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_exponent_is_right_associative() {
        let expr = parse_expr("a ** b ** c");
        match expr {
            Expression::BinaryExpression { left, right, .. } => {
                assert!(matches!(*left, Expression::Identifier { .. }));
                assert!(matches!(*right, Expression::BinaryExpression { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_arrow_functions() {
        assert!(matches!(
            parse_expr("x => x * 2"),
            Expression::ArrowFunctionExpression { ref params, .. } if params.len() == 1
        ));
        assert!(matches!(
            parse_expr("(a, b = 1, ...rest) => {}"),
            Expression::ArrowFunctionExpression { ref params, .. } if params.len() == 3
        ));
        assert!(matches!(
            parse_expr("async (x) => await x"),
            Expression::ArrowFunctionExpression { is_async: true, .. }
        ));
        assert!(matches!(
            parse_expr("(a, b)"),
            Expression::ParenthesizedExpression { .. }
        ));
    }

    #[test]
    fn test_parse_async_as_identifier_call() {
        assert!(matches!(parse_expr("async(1, 2)"), Expression::CallExpression { .. }));
    }

    #[test]
    fn test_parse_destructuring_assignment() {
        let expr = parse_expr("[a, b] = [b, a]");
        match expr {
            Expression::AssignmentExpression { left, .. } => {
                assert!(matches!(*left, Pattern::ArrayPattern(_)))
            }
            other => panic!("unexpected {:?}", other),
        }
        let expr = parse_expr("({ a, b: { c = 1 } } = obj)");
        assert!(matches!(expr, Expression::ParenthesizedExpression { .. }));
    }

    #[test]
    fn test_parse_regexp_in_expression_position() {
        let expr = parse_expr("x = /ab+c/g.test(s)");
        match expr {
            Expression::AssignmentExpression { right, .. } => {
                assert!(matches!(*right, Expression::CallExpression { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_expr("a / b / c"), Expression::BinaryExpression { .. }));
    }

    #[test]
    fn test_parse_template_literal_with_nested_braces() {
        match parse_expr("`a${ {x: 1}.x }b${y}c`") {
            Expression::TemplateLiteral {
                quasis,
                expressions,
            } => {
                assert_eq!(quasis.len(), 3);
                assert_eq!(expressions.len(), 2);
                assert_eq!(quasis[2].raw, "c");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_optional_chain_and_nullish() {
        let expr = parse_expr("a?.b?.[c]?.(d) ?? e");
        assert!(matches!(
            expr,
            Expression::LogicalExpression {
                operator: LogicalOperator::NullishCoalesce,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_class_members() {
        let program = parse(
            "class A extends B { static #count = 0; x; get y() { return 1; } static { init(); } constructor() { super(); } }",
        );
        match &program.body[0] {
            Statement::ClassDeclaration(class) => {
                assert_eq!(class.name.as_deref(), Some("A"));
                assert_eq!(class.body.len(), 5);
                assert!(matches!(
                    class.body[4],
                    ClassElement::MethodDefinition {
                        kind: MethodKind::Constructor,
                        ..
                    }
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_for_variants() {
        let program = parse(
            "for (let i = 0; i < 3; i++) {} for (const k in o) {} for (const [a, b] of pairs) {} for (x of y) ;",
        );
        assert!(matches!(program.body[0], Statement::ForStatement { .. }));
        assert!(matches!(program.body[1], Statement::ForInStatement { .. }));
        assert!(matches!(program.body[2], Statement::ForOfStatement { .. }));
        assert!(matches!(program.body[3], Statement::ForOfStatement { .. }));
    }

    #[test]
    fn test_parse_asi() {
        let program = parse("let a = 1\nlet b = 2\na\n++b");
        assert_eq!(program.body.len(), 4);
    }

    #[test]
    fn test_parse_return_needs_function_unless_allowed() {
        assert!(Parser::new("return 1;").parse_program().is_err());
        let program = Parser::new("return 1;")
            .allow_return_outside_function(true)
            .parse_program()
            .unwrap();
        assert!(matches!(program.body[0], Statement::ReturnStatement { .. }));
    }

    #[test]
    fn test_parse_labeled_loop() {
        let program = parse("outer: for (;;) { break outer; }");
        assert!(matches!(program.body[0], Statement::LabeledStatement { .. }));
    }

    #[test]
    fn test_parse_error_reports_position() {
        let err = Parser::new("let x = ;").parse_program().unwrap_err();
        let pos = err.source_position.unwrap();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 9);
    }

    #[test]
    fn test_parse_jsx_is_rejected() {
        let err = Parser::new("const el = <div />;").parse_program().unwrap_err();
        assert!(err.message.contains("JSX"));
    }

    #[test]
    fn test_parse_generator_yield() {
        let program = parse("function* g() { const x = yield 1; yield* other(); }");
        assert!(matches!(
            &program.body[0],
            Statement::FunctionDeclaration(Function { is_generator: true, .. })
        ));
    }

    #[test]
    fn test_parse_object_literal_forms() {
        let expr = parse_expr("({ a, b: 1, [c]: 2, d() {}, get e() { return 1; }, async *f() {}, ...g })");
        match expr.unparenthesized() {
            Expression::ObjectExpression { properties } => assert_eq!(properties.len(), 7),
            other => panic!("unexpected {:?}", other),
        }
    }
}
