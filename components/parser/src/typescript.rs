//! TypeScript syntax erasure
//!
//! Types are skipped token by token. Declarations with no runtime meaning
//! (type aliases, interfaces, ambient declarations) become
//! [`Statement::TypeDeclaration`]; enums are kept for the printer to lower.

use crate::ast::{EnumMember, Statement};
use crate::error::syntax_error;
use crate::lexer::{Keyword, Punctuator, Token};
use crate::parser::Parser;
use core_types::JsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    Paren,
    Bracket,
    Brace,
    Template,
}

impl Parser {
    /// `: Type`
    pub(crate) fn skip_type_annotation(&mut self) -> Result<(), JsError> {
        self.expect_punctuator(Punctuator::Colon)?;
        self.skip_type()
    }

    /// `: Type` after a parameter list, including type predicates
    pub(crate) fn skip_return_type(&mut self) -> Result<(), JsError> {
        self.expect_punctuator(Punctuator::Colon)?;

        let (second, newline) = self.peek_second()?;
        let subject = matches!(second, Token::Identifier(_) | Token::Keyword(Keyword::This));
        if self.check_identifier("asserts")? && subject && !newline {
            self.advance()?;
            self.advance()?;
            if self.eat_identifier("is")? {
                self.skip_type()?;
            }
            return Ok(());
        }

        let is_predicate = matches!(self.peek()?, Token::Identifier(_) | Token::Keyword(Keyword::This))
            && matches!(&second, Token::Identifier(word) if word == "is")
            && !newline;
        if is_predicate {
            self.advance()?;
            self.advance()?;
        }
        self.skip_type()
    }

    /// Skip one complete type
    pub(crate) fn skip_type(&mut self) -> Result<(), JsError> {
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
            return self.skip_function_type_rest();
        }
        if self.check_identifier("abstract")? {
            let (second, _) = self.peek_second()?;
            if second == Token::Keyword(Keyword::New) {
                self.advance()?;
            }
        }
        if self.check_keyword(Keyword::New)? {
            self.advance()?;
            if self.check_punctuator(Punctuator::Lt)? {
                self.skip_type_parameters()?;
            }
            return self.skip_function_type_rest();
        }
        if self.check_punctuator(Punctuator::LParen)? {
            let is_function_type = self.lookahead(|p| {
                p.skip_balanced()?;
                p.expect_punctuator(Punctuator::Arrow)
            });
            if is_function_type {
                return self.skip_function_type_rest();
            }
        }

        self.skip_union_type()?;

        if self.check_keyword(Keyword::Extends)? && !self.lexer.line_terminator_before_token {
            self.advance()?;
            self.skip_union_type()?;
            self.expect_punctuator(Punctuator::Question)?;
            self.skip_type()?;
            self.expect_punctuator(Punctuator::Colon)?;
            self.skip_type()?;
        }
        Ok(())
    }

    /// `(params) => Type`
    fn skip_function_type_rest(&mut self) -> Result<(), JsError> {
        if !self.check_punctuator(Punctuator::LParen)? {
            return Err(self.unexpected());
        }
        self.skip_balanced()?;
        self.expect_punctuator(Punctuator::Arrow)?;
        self.skip_type()
    }

    fn skip_union_type(&mut self) -> Result<(), JsError> {
        if !self.eat_punctuator(Punctuator::Or)? {
            self.eat_punctuator(Punctuator::And)?;
        }
        loop {
            self.skip_postfix_type()?;
            if !self.eat_punctuator(Punctuator::Or)? && !self.eat_punctuator(Punctuator::And)? {
                return Ok(());
            }
        }
    }

    fn skip_postfix_type(&mut self) -> Result<(), JsError> {
        self.skip_primary_type()?;
        while self.check_punctuator(Punctuator::LBracket)? && !self.lexer.line_terminator_before_token {
            self.advance()?;
            if self.eat_punctuator(Punctuator::RBracket)? {
                continue;
            }
            self.skip_type()?;
            self.expect_punctuator(Punctuator::RBracket)?;
        }
        Ok(())
    }

    fn skip_primary_type(&mut self) -> Result<(), JsError> {
        let token = self.peek()?.clone();
        match token {
            Token::Identifier(word) => {
                let (second, newline) = self.peek_second()?;
                let is_operator = matches!(word.as_str(), "keyof" | "unique" | "readonly" | "infer")
                    && !newline
                    && matches!(
                        second,
                        Token::Identifier(_)
                            | Token::Keyword(_)
                            | Token::Punctuator(Punctuator::LParen)
                            | Token::Punctuator(Punctuator::LBracket)
                            | Token::Punctuator(Punctuator::LBrace)
                    );
                if is_operator {
                    self.advance()?;
                    if word == "infer" {
                        self.expect_identifier()?;
                        return Ok(());
                    }
                    return self.skip_postfix_type();
                }
                self.advance()?;
                self.skip_type_reference_rest()
            }
            Token::Keyword(Keyword::Typeof) => {
                self.advance()?;
                if self.check_keyword(Keyword::Import)? {
                    return self.skip_import_type();
                }
                self.expect_identifier_name()?;
                self.skip_type_reference_rest()
            }
            Token::Keyword(Keyword::Import) => self.skip_import_type(),
            Token::Keyword(
                Keyword::Void | Keyword::Null | Keyword::This | Keyword::True | Keyword::False,
            ) => {
                self.advance()?;
                Ok(())
            }
            Token::String(_) | Token::Number(_) | Token::BigInt(_) | Token::Template(_) => {
                self.advance()?;
                Ok(())
            }
            Token::TemplateHead(_) => self.skip_balanced(),
            Token::Punctuator(Punctuator::Minus) => {
                self.advance()?;
                match self.advance()? {
                    Token::Number(_) | Token::BigInt(_) => Ok(()),
                    other => Err(syntax_error(
                        format!("Unexpected {} in type", other.describe()),
                        Some(self.lexer.token_position()),
                    )),
                }
            }
            Token::Punctuator(Punctuator::LBrace) | Token::Punctuator(Punctuator::LBracket) => {
                self.skip_balanced()
            }
            Token::Punctuator(Punctuator::LParen) => {
                self.advance()?;
                self.skip_type()?;
                self.expect_punctuator(Punctuator::RParen)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// `.Name` segments and type arguments after a type name
    fn skip_type_reference_rest(&mut self) -> Result<(), JsError> {
        while self.eat_punctuator(Punctuator::Dot)? {
            self.expect_identifier_name()?;
        }
        if self.check_punctuator(Punctuator::Lt)? && !self.lexer.line_terminator_before_token {
            self.skip_type_arguments()?;
        }
        Ok(())
    }

    /// `import("module").Name<Args>`
    fn skip_import_type(&mut self) -> Result<(), JsError> {
        self.expect_keyword(Keyword::Import)?;
        self.skip_balanced()?;
        self.skip_type_reference_rest()
    }

    /// `<T extends U = V, ...>`
    pub(crate) fn skip_type_parameters(&mut self) -> Result<(), JsError> {
        self.skip_angle_brackets()
    }

    /// `<A, B>`
    pub(crate) fn skip_type_arguments(&mut self) -> Result<(), JsError> {
        self.skip_angle_brackets()
    }

    fn skip_angle_brackets(&mut self) -> Result<(), JsError> {
        if !self.check_punctuator(Punctuator::Lt)? {
            return Err(self.unexpected());
        }
        let saved = self.lexer.type_context;
        self.lexer.type_context = true;
        let result = self.skip_angle_brackets_inner();
        self.lexer.type_context = saved;
        result
    }

    fn skip_angle_brackets_inner(&mut self) -> Result<(), JsError> {
        self.advance()?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek()? {
                Token::Punctuator(Punctuator::Lt) => {
                    self.advance()?;
                    depth += 1;
                }
                Token::Punctuator(Punctuator::Gt) => {
                    self.advance()?;
                    depth -= 1;
                }
                Token::Punctuator(
                    Punctuator::LParen | Punctuator::LBracket | Punctuator::LBrace,
                )
                | Token::TemplateHead(_) => self.skip_balanced()?,
                Token::Punctuator(
                    Punctuator::Semicolon
                    | Punctuator::RParen
                    | Punctuator::RBracket
                    | Punctuator::RBrace,
                )
                | Token::EOF => return Err(self.unexpected()),
                _ => {
                    self.advance()?;
                }
            }
        }
        Ok(())
    }

    /// Skip a bracketed group starting at the current `(`, `[`, `{` or template head
    pub(crate) fn skip_balanced(&mut self) -> Result<(), JsError> {
        let mut stack: Vec<Closer> = Vec::new();
        loop {
            let token = self.peek()?.clone();
            match token {
                Token::EOF => return Err(self.unexpected()),
                Token::Punctuator(Punctuator::RBrace) if stack.last() == Some(&Closer::Template) => {
                    if let Token::TemplateTail(_) = self.lexer.rescan_template_continuation()? {
                        stack.pop();
                    }
                }
                Token::TemplateHead(_) => {
                    self.advance()?;
                    stack.push(Closer::Template);
                }
                Token::Punctuator(p @ (Punctuator::LParen | Punctuator::LBracket | Punctuator::LBrace)) => {
                    self.advance()?;
                    stack.push(match p {
                        Punctuator::LParen => Closer::Paren,
                        Punctuator::LBracket => Closer::Bracket,
                        _ => Closer::Brace,
                    });
                }
                Token::Punctuator(p @ (Punctuator::RParen | Punctuator::RBracket | Punctuator::RBrace)) => {
                    let expected = match p {
                        Punctuator::RParen => Closer::Paren,
                        Punctuator::RBracket => Closer::Bracket,
                        _ => Closer::Brace,
                    };
                    if stack.last() != Some(&expected) {
                        return Err(self.unexpected());
                    }
                    self.advance()?;
                    stack.pop();
                }
                _ => {
                    if stack.is_empty() {
                        return Err(self.unexpected());
                    }
                    self.advance()?;
                }
            }
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// `type Name<T> = ...;`
    pub(crate) fn parse_type_alias(&mut self) -> Result<Statement, JsError> {
        self.advance()?;
        let name = self.expect_identifier()?;
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
        }
        self.expect_punctuator(Punctuator::Assign)?;
        self.skip_type()?;
        self.consume_semicolon()?;
        Ok(Statement::TypeDeclaration { name: Some(name) })
    }

    /// `interface Name<T> extends A, B { ... }`
    pub(crate) fn parse_interface(&mut self) -> Result<Statement, JsError> {
        self.advance()?;
        let name = self.expect_identifier()?;
        if self.check_punctuator(Punctuator::Lt)? {
            self.skip_type_parameters()?;
        }
        if self.check_keyword(Keyword::Extends)? {
            self.advance()?;
            loop {
                self.skip_type()?;
                if !self.eat_punctuator(Punctuator::Comma)? {
                    break;
                }
            }
        }
        if !self.check_punctuator(Punctuator::LBrace)? {
            return Err(self.unexpected());
        }
        self.skip_balanced()?;
        Ok(Statement::TypeDeclaration { name: Some(name) })
    }

    /// `declare ...` ambient declarations, erased entirely
    pub(crate) fn parse_declare(&mut self) -> Result<Statement, JsError> {
        self.advance()?;

        let scope = ["module", "namespace", "global"];
        if let Token::Identifier(word) = self.peek()?.clone() {
            if scope.contains(&word.as_str()) {
                self.advance()?;
                if word != "global" {
                    match self.peek()? {
                        Token::String(_) => {
                            self.advance()?;
                        }
                        _ => {
                            self.expect_identifier()?;
                            while self.eat_punctuator(Punctuator::Dot)? {
                                self.expect_identifier()?;
                            }
                        }
                    }
                }
                if self.check_punctuator(Punctuator::LBrace)? {
                    self.skip_balanced()?;
                } else {
                    self.consume_semicolon()?;
                }
                return Ok(Statement::TypeDeclaration { name: None });
            }
        }

        let declaration = self.parse_statement()?;
        let name = match declaration {
            Statement::VariableDeclaration(decl) => decl
                .declarations
                .first()
                .and_then(|d| d.id.bound_names().into_iter().next()),
            Statement::FunctionDeclaration(function) => function.name,
            Statement::ClassDeclaration(class) => class.name,
            Statement::EnumDeclaration { name, .. } => Some(name),
            Statement::TypeDeclaration { name } => name,
            _ => return Err(self.error_here("Invalid ambient declaration")),
        };
        Ok(Statement::TypeDeclaration { name })
    }

    /// Enum body after the `enum` keyword
    pub(crate) fn parse_enum_declaration(&mut self) -> Result<Statement, JsError> {
        let name = self.expect_identifier()?;
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut members = Vec::new();
        while !self.eat_punctuator(Punctuator::RBrace)? {
            let member = match self.advance()? {
                Token::Identifier(n) => n,
                Token::Keyword(k) => k.as_str().to_string(),
                Token::String(s) => s,
                other => {
                    return Err(syntax_error(
                        format!("Unexpected {} in enum member", other.describe()),
                        Some(self.lexer.token_position()),
                    ))
                }
            };
            let init = if self.eat_punctuator(Punctuator::Assign)? {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            members.push(EnumMember { name: member, init });
            if !self.check_punctuator(Punctuator::RBrace)? {
                self.expect_punctuator(Punctuator::Comma)?;
            }
        }
        Ok(Statement::EnumDeclaration { name, members })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(source).parse_program().unwrap()
    }

    #[test]
    fn test_annotations_are_erased() {
        let program = parse(
            "let x: Map<string, Array<number>> = new Map();\nfunction f(a: number, b?: string, ...rest: any[]): void {}",
        );
        assert_eq!(program.body.len(), 2);
        match &program.body[1] {
            Statement::FunctionDeclaration(function) => assert_eq!(function.params.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_declarations_are_dropped_to_markers() {
        let program = parse(
            "type A<T> = { [K in keyof T]?: T[K] } | null;\ninterface B extends C<D> { x: number; y(): void }\ndeclare const z: number;\ndeclare module 'm' { export const q: string; }",
        );
        assert!(program
            .body
            .iter()
            .all(|stmt| matches!(stmt, Statement::TypeDeclaration { .. })));
    }

    #[test]
    fn test_function_and_conditional_types() {
        parse("type F = (x: number) => string;\ntype G<T> = T extends string ? 'a' : `b${T & string}`;\nlet h: new () => Foo;");
    }

    #[test]
    fn test_generic_call_and_arrow() {
        let program = parse("const id = <T,>(x: T): T => x;\nconst y = id<number>(1);");
        match &program.body[1] {
            Statement::VariableDeclaration(decl) => assert!(matches!(
                decl.declarations[0].init,
                Some(Expression::CallExpression { .. })
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_comparison_is_not_type_arguments() {
        let program = parse("const r = a < b && c > d;");
        match &program.body[0] {
            Statement::VariableDeclaration(decl) => assert!(matches!(
                decl.declarations[0].init,
                Some(Expression::LogicalExpression { .. })
            )),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_as_and_non_null_and_satisfies() {
        parse("const a = (x as unknown as string[])!.length;\nconst cfg = { a: 1 } satisfies Config;\nconst k = [1, 2] as const;");
    }

    #[test]
    fn test_type_predicate_return() {
        parse("function isStr(x: unknown): x is string { return typeof x === 'string'; }");
    }

    #[test]
    fn test_enum_members() {
        let program = parse("enum Color { Red, Green = 'g', Blue = 4 }");
        match &program.body[0] {
            Statement::EnumDeclaration { name, members } => {
                assert_eq!(name, "Color");
                assert_eq!(members.len(), 3);
                assert!(members[0].init.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_class_typescript_members() {
        let program = parse(
            "abstract class Shape<T> implements HasArea {\n  private readonly sides: number;\n  abstract area(): number;\n  [key: string]: unknown;\n  constructor(public name: string, private size = 1) { }\n  describe(): string { return this.name; }\n}",
        );
        match &program.body[0] {
            Statement::ClassDeclaration(class) => {
                assert_eq!(class.body.len(), 3);
                match &class.body[1] {
                    ClassElement::MethodDefinition { kind, value, .. } => {
                        assert_eq!(*kind, MethodKind::Constructor);
                        assert_eq!(value.body.len(), 2);
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_overloads_keep_only_implementation() {
        let program = parse(
            "function f(x: string): string;\nfunction f(x: number): number;\nfunction f(x: any) { return x; }",
        );
        assert!(matches!(program.body[0], Statement::TypeDeclaration { .. }));
        assert!(matches!(program.body[2], Statement::FunctionDeclaration(_)));
    }

    #[test]
    fn test_namespaces_are_rejected() {
        let err = Parser::new("namespace N { export const x = 1; }")
            .parse_program()
            .unwrap_err();
        assert!(err.message.contains("namespace"));
    }
}
