//! Import and export declarations

use crate::ast::*;
use crate::error::unexpected_token;
use crate::lexer::{Keyword, Punctuator, Token};
use crate::parser::Parser;
use core_types::JsError;

impl Parser {
    fn expect_contextual(&mut self, word: &str) -> Result<(), JsError> {
        if self.eat_identifier(word)? {
            return Ok(());
        }
        let got = self.peek()?.describe();
        Err(unexpected_token(
            &format!("`{}`", word),
            &got,
            Some(self.lexer.token_position()),
        ))
    }

    /// Import/export binding names may be identifiers, keywords or strings
    fn parse_module_export_name(&mut self) -> Result<String, JsError> {
        if let Token::String(_) = self.peek()? {
            return self.expect_string();
        }
        self.expect_identifier_name()
    }

    /// `with { type: "json" }` / `assert { ... }`
    fn skip_import_attributes(&mut self) -> Result<(), JsError> {
        let has_attributes = self.check_keyword(Keyword::With)?
            || (self.check_identifier("assert")? && !self.lexer.line_terminator_before_token);
        if has_attributes {
            self.advance()?;
            self.skip_balanced()?;
        }
        Ok(())
    }

    fn parse_module_source(&mut self) -> Result<String, JsError> {
        self.expect_contextual("from")?;
        let source = self.expect_string()?;
        self.skip_import_attributes()?;
        Ok(source)
    }

    /// True if the `type` keyword at the cursor marks a type-only specifier
    fn at_type_modifier(&mut self) -> Result<bool, JsError> {
        if !self.check_identifier("type")? {
            return Ok(false);
        }
        let (second, _) = self.peek_second()?;
        Ok(match second {
            Token::Identifier(word) => word != "as" && word != "from",
            Token::Keyword(_) | Token::String(_) => true,
            _ => false,
        })
    }

    pub(crate) fn parse_import_declaration(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::Import)?;

        if let Token::String(_) = self.peek()? {
            let source = self.expect_string()?;
            self.skip_import_attributes()?;
            self.consume_semicolon()?;
            return Ok(Statement::ImportDeclaration(ImportDeclaration {
                specifiers: Vec::new(),
                source,
            }));
        }

        let type_only = if self.check_identifier("type")? {
            let (second, _) = self.peek_second()?;
            match second {
                Token::Punctuator(Punctuator::LBrace) | Token::Punctuator(Punctuator::Star) => true,
                Token::Identifier(word) => word != "from",
                _ => false,
            }
        } else {
            false
        };
        if type_only {
            self.advance()?;
        }

        let mut specifiers = Vec::new();
        let mut erased_specifiers = 0usize;

        if let Token::Identifier(_) = self.peek()? {
            let local = self.expect_identifier()?;
            if self.check_punctuator(Punctuator::Assign)? {
                return Err(self.error_here("Import assignments are not supported"));
            }
            specifiers.push(ImportSpecifier::Default { local });
            if !self.eat_punctuator(Punctuator::Comma)? {
                return self.finish_import(specifiers, type_only, erased_specifiers);
            }
        }

        if self.eat_punctuator(Punctuator::Star)? {
            self.expect_contextual("as")?;
            let local = self.expect_identifier()?;
            specifiers.push(ImportSpecifier::Namespace { local });
        } else {
            self.expect_punctuator(Punctuator::LBrace)?;
            while !self.eat_punctuator(Punctuator::RBrace)? {
                let erased = self.at_type_modifier()?;
                if erased {
                    self.advance()?;
                }
                let imported = self.parse_module_export_name()?;
                let local = if self.eat_identifier("as")? {
                    self.expect_identifier()?
                } else {
                    imported.clone()
                };
                if erased {
                    erased_specifiers += 1;
                } else {
                    specifiers.push(ImportSpecifier::Named { imported, local });
                }
                if !self.check_punctuator(Punctuator::RBrace)? {
                    self.expect_punctuator(Punctuator::Comma)?;
                }
            }
        }

        self.finish_import(specifiers, type_only, erased_specifiers)
    }

    fn finish_import(
        &mut self,
        specifiers: Vec<ImportSpecifier>,
        type_only: bool,
        erased_specifiers: usize,
    ) -> Result<Statement, JsError> {
        let source = self.parse_module_source()?;
        self.consume_semicolon()?;
        if type_only || (specifiers.is_empty() && erased_specifiers > 0) {
            return Ok(Statement::TypeDeclaration { name: None });
        }
        Ok(Statement::ImportDeclaration(ImportDeclaration {
            specifiers,
            source,
        }))
    }

    pub(crate) fn parse_export_declaration(&mut self) -> Result<Statement, JsError> {
        self.expect_keyword(Keyword::Export)?;

        let token = self.peek()?.clone();
        match token {
            Token::Punctuator(Punctuator::Star) => {
                self.advance()?;
                let exported = if self.eat_identifier("as")? {
                    Some(self.parse_module_export_name()?)
                } else {
                    None
                };
                let source = self.parse_module_source()?;
                self.consume_semicolon()?;
                Ok(Statement::ExportAllDeclaration { exported, source })
            }
            Token::Punctuator(Punctuator::LBrace) => {
                let (specifiers, source) = self.parse_export_list()?;
                Ok(Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                    declaration: None,
                    specifiers,
                    source,
                }))
            }
            Token::Punctuator(Punctuator::Assign) => {
                Err(self.error_here("`export =` is not supported"))
            }
            Token::Keyword(Keyword::Import) => {
                Err(self.error_here("Import assignments are not supported"))
            }
            Token::Keyword(Keyword::Default) => {
                self.advance()?;
                self.parse_export_default()
            }
            Token::Identifier(ref word) if word == "type" => {
                let (second, _) = self.peek_second()?;
                match second {
                    Token::Punctuator(Punctuator::LBrace) => {
                        self.advance()?;
                        self.parse_export_list()?;
                        Ok(Statement::TypeDeclaration { name: None })
                    }
                    Token::Punctuator(Punctuator::Star) => {
                        self.advance()?;
                        self.advance()?;
                        if self.eat_identifier("as")? {
                            self.parse_module_export_name()?;
                        }
                        self.parse_module_source()?;
                        self.consume_semicolon()?;
                        Ok(Statement::TypeDeclaration { name: None })
                    }
                    _ => self.parse_exported_declaration(),
                }
            }
            Token::Identifier(ref word) if word == "as" => {
                // `export as namespace Lib;`
                self.advance()?;
                self.expect_contextual("namespace")?;
                self.expect_identifier()?;
                self.consume_semicolon()?;
                Ok(Statement::TypeDeclaration { name: None })
            }
            _ => self.parse_exported_declaration(),
        }
    }

    fn parse_exported_declaration(&mut self) -> Result<Statement, JsError> {
        let declaration = self.parse_statement()?;
        match declaration {
            Statement::VariableDeclaration(_)
            | Statement::FunctionDeclaration(_)
            | Statement::ClassDeclaration(_)
            | Statement::EnumDeclaration { .. }
            | Statement::TypeDeclaration { .. } => {
                Ok(Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                    declaration: Some(Box::new(declaration)),
                    specifiers: Vec::new(),
                    source: None,
                }))
            }
            _ => Err(self.error_here("Unexpected export")),
        }
    }

    /// `{ a, b as c } [from "m"];`
    fn parse_export_list(&mut self) -> Result<(Vec<ExportSpecifier>, Option<String>), JsError> {
        self.expect_punctuator(Punctuator::LBrace)?;
        let mut specifiers = Vec::new();
        while !self.eat_punctuator(Punctuator::RBrace)? {
            let erased = self.at_type_modifier()?;
            if erased {
                self.advance()?;
            }
            let local = self.parse_module_export_name()?;
            let exported = if self.eat_identifier("as")? {
                self.parse_module_export_name()?
            } else {
                local.clone()
            };
            if !erased {
                specifiers.push(ExportSpecifier { local, exported });
            }
            if !self.check_punctuator(Punctuator::RBrace)? {
                self.expect_punctuator(Punctuator::Comma)?;
            }
        }
        let source = if self.check_identifier("from")? {
            Some(self.parse_module_source()?)
        } else {
            None
        };
        self.consume_semicolon()?;
        Ok((specifiers, source))
    }

    fn parse_export_default(&mut self) -> Result<Statement, JsError> {
        let (second, newline) = self.peek_second()?;
        let is_async_function = self.check_identifier("async")?
            && !newline
            && second == Token::Keyword(Keyword::Function);

        if self.check_keyword(Keyword::Function)? || is_async_function {
            if is_async_function {
                self.advance()?;
            }
            self.advance()?;
            return match self.parse_function_rest(is_async_function, true)? {
                Some(function) => Ok(Statement::ExportDefaultDeclaration(ExportDefault::Function(
                    function,
                ))),
                None => Ok(Statement::TypeDeclaration { name: None }),
            };
        }

        let is_abstract_class =
            self.check_identifier("abstract")? && second == Token::Keyword(Keyword::Class);
        if self.check_keyword(Keyword::Class)? || is_abstract_class {
            if is_abstract_class {
                self.advance()?;
            }
            self.advance()?;
            let class = self.parse_class()?;
            return Ok(Statement::ExportDefaultDeclaration(ExportDefault::Class(class)));
        }

        if self.check_identifier("interface")? && matches!(second, Token::Identifier(_)) && !newline {
            return self.parse_interface();
        }

        let expression = self.parse_assignment_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::ExportDefaultDeclaration(ExportDefault::Expression(
            expression,
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parse_module;

    #[test]
    fn test_import_forms() {
        let program = parse_module(
            "import a from 'a';\nimport * as b from \"b\";\nimport c, { d, e as f, default as g } from 'c';\nimport 'side-effect';\nimport data from './data.json' with { type: 'json' };",
        )
        .unwrap();
        assert_eq!(program.body.len(), 5);
        match &program.body[2] {
            Statement::ImportDeclaration(import) => {
                assert_eq!(import.source, "c");
                assert_eq!(import.specifiers.len(), 4);
                assert_eq!(
                    import.specifiers[3],
                    ImportSpecifier::Named {
                        imported: "default".to_string(),
                        local: "g".to_string()
                    }
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        match &program.body[3] {
            Statement::ImportDeclaration(import) => assert!(import.specifiers.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_type_only_imports_are_erased() {
        let program = parse_module(
            "import type { A } from 'a';\nimport { type B, C } from 'b';\nimport { type D } from 'd';",
        )
        .unwrap();
        assert!(matches!(program.body[0], Statement::TypeDeclaration { .. }));
        match &program.body[1] {
            Statement::ImportDeclaration(import) => assert_eq!(import.specifiers.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(program.body[2], Statement::TypeDeclaration { .. }));
    }

    #[test]
    fn test_export_forms() {
        let program = parse_module(
            "export const x = 1;\nexport function run() {}\nexport { x as y, z };\nexport * from './all';\nexport * as ns from './ns';\nexport { w } from './w';\nexport default class {}",
        )
        .unwrap();
        assert_eq!(program.body.len(), 7);
        assert!(matches!(
            program.body[0],
            Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                declaration: Some(_),
                ..
            })
        ));
        assert!(matches!(
            &program.body[4],
            Statement::ExportAllDeclaration { exported: Some(name), .. } if name == "ns"
        ));
        assert!(matches!(
            &program.body[5],
            Statement::ExportNamedDeclaration(ExportNamedDeclaration { source: Some(s), .. }) if s == "./w"
        ));
        assert!(matches!(
            program.body[6],
            Statement::ExportDefaultDeclaration(ExportDefault::Class(_))
        ));
    }

    #[test]
    fn test_export_default_function_and_expression() {
        let program =
            parse_module("export default async function () { await 1; }").unwrap();
        assert!(matches!(
            &program.body[0],
            Statement::ExportDefaultDeclaration(ExportDefault::Function(f)) if f.is_async && f.name.is_none()
        ));
        let program = parse_module("export default (a, b) => a + b;").unwrap();
        assert!(matches!(
            program.body[0],
            Statement::ExportDefaultDeclaration(ExportDefault::Expression(
                Expression::ArrowFunctionExpression { .. }
            ))
        ));
    }

    #[test]
    fn test_dynamic_import_and_import_meta() {
        let program = parse_module("const m = await import('./m');\nconsole.log(import.meta.url);").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_export_type_list_is_erased() {
        let program = parse_module("export type { A, B } from './types';\nexport interface I {}").unwrap();
        assert!(matches!(program.body[0], Statement::TypeDeclaration { .. }));
        assert!(matches!(
            program.body[1],
            Statement::ExportNamedDeclaration(ExportNamedDeclaration {
                declaration: Some(_),
                ..
            })
        ));
    }
}
