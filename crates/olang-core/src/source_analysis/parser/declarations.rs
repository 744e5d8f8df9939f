// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing: programs, classes, members, and parameters.

use ecow::EcoString;

use super::Parser;
use crate::ast::{
    ClassDecl, ConstructorDecl, MemberDecl, MethodDecl, Parameter, Program, ReturnStatement,
    Statement, VariableDecl,
};
use crate::source_analysis::{Span, TokenKind};

impl Parser {
    /// Parses the entire program: `Program := { ClassDecl }`.
    pub(super) fn parse_program(&mut self) -> Program {
        let start = self.current_span();
        let mut classes = Vec::new();
        while !self.is_at_end() {
            if self.check(TokenKind::Class) {
                classes.push(self.parse_class());
            } else {
                self.error("Expected 'class' declaration at top level");
                self.advance();
            }
        }
        let span = start.merge(self.current_span());
        Program::new(classes, span)
    }

    /// Parses a class declaration:
    /// `ClassDecl := 'class' Id [ 'extends' Id ] 'is' { Member } 'end'`.
    fn parse_class(&mut self) -> ClassDecl {
        let class_token = self
            .expect(TokenKind::Class, "Expected 'class'")
            .expect("parse_class called without 'class' token");
        let start = class_token.span();

        let (name, name_span) = match self.expect(TokenKind::Identifier, "Expected class name") {
            Some(token) => (token.lexeme().clone(), token.span()),
            None => (EcoString::new(), self.current_span()),
        };

        let mut base_name = None;
        let mut base_span = None;
        if self.match_token(TokenKind::Extends) {
            if let Some(token) = self.expect(TokenKind::Identifier, "Expected base class name") {
                base_name = Some(token.lexeme().clone());
                base_span = Some(token.span());
            }
        }

        self.expect(TokenKind::Is, "Expected 'is'");

        let mut members = Vec::new();
        while !self.check(TokenKind::End) && !self.is_at_end() {
            match self.current_kind() {
                TokenKind::Var => members.push(MemberDecl::Variable(self.parse_var_decl())),
                TokenKind::Method => members.push(MemberDecl::Method(self.parse_method())),
                TokenKind::This => members.push(MemberDecl::Constructor(self.parse_constructor())),
                TokenKind::Class => {
                    // A 'class' keyword here almost always means a missing
                    // 'end'; stop so the next class still parses. The
                    // expect below reports the missing token.
                    break;
                }
                _ => {
                    self.error("Expected member declaration (var, method, or this)");
                    self.advance();
                }
            }
        }

        let end_span = match self.expect(TokenKind::End, "Expected 'end'") {
            Some(token) => token.span(),
            None => self.current_span(),
        };

        ClassDecl {
            name,
            name_span,
            base_name,
            base_span,
            base_class: None,
            members,
            span: start.merge(end_span),
        }
    }

    /// Parses a variable declaration: `VarDecl := 'var' Id ':' Expr`.
    ///
    /// Used for both class fields and statement-level locals.
    pub(super) fn parse_var_decl(&mut self) -> VariableDecl {
        let var_token = self
            .expect(TokenKind::Var, "Expected 'var'")
            .expect("parse_var_decl called without 'var' token");
        let start = var_token.span();

        let name = match self.expect(TokenKind::Identifier, "Expected variable name") {
            Some(token) => token.lexeme().clone(),
            None => EcoString::new(),
        };
        self.expect(TokenKind::Colon, "Expected ':'");

        let initializer = self.parse_expression();
        let span = start.merge(initializer.span);

        VariableDecl {
            id: self.next_var_id(),
            name,
            initializer,
            declared_type: None,
            span,
        }
    }

    /// Parses a method declaration:
    /// `MethodDecl := 'method' Id [ '(' Params ')' ] [ ':' TypeName ]
    ///  ( 'is' Body 'end' | '=>' Expr | ε )`.
    fn parse_method(&mut self) -> MethodDecl {
        let method_token = self
            .expect(TokenKind::Method, "Expected 'method'")
            .expect("parse_method called without 'method' token");
        let start = method_token.span();

        let name = match self.expect(TokenKind::Identifier, "Expected method name") {
            Some(token) => token.lexeme().clone(),
            None => EcoString::new(),
        };

        let parameters = if self.match_token(TokenKind::LeftParen) {
            self.parse_parameters()
        } else {
            Vec::new()
        };

        let return_type_name = if self.match_token(TokenKind::Colon) {
            self.parse_type_name().map(|(name, _)| name)
        } else {
            None
        };

        let mut end_span = self.previous_span(start);
        let body = if self.match_token(TokenKind::Is) {
            let statements = self.parse_body();
            end_span = match self.expect(TokenKind::End, "Expected 'end'") {
                Some(token) => token.span(),
                None => self.current_span(),
            };
            Some(statements)
        } else if self.match_token(TokenKind::FatArrow) {
            // `=> expr` is shorthand for a body of a single return.
            let value = self.parse_expression();
            let value_span = value.span;
            end_span = value_span;
            Some(vec![Statement::Return(ReturnStatement {
                value: Some(value),
                span: value_span,
            })])
        } else {
            // Forward declaration: no body at all.
            None
        };

        MethodDecl {
            name,
            parameters,
            return_type_name,
            return_type: None,
            body,
            span: start.merge(end_span),
        }
    }

    /// Parses a constructor declaration:
    /// `CtorDecl := 'this' [ '(' Params ')' ] 'is' Body 'end'`.
    fn parse_constructor(&mut self) -> ConstructorDecl {
        let this_token = self
            .expect(TokenKind::This, "Expected 'this'")
            .expect("parse_constructor called without 'this' token");
        let start = this_token.span();

        let parameters = if self.match_token(TokenKind::LeftParen) {
            self.parse_parameters()
        } else {
            Vec::new()
        };

        self.expect(TokenKind::Is, "Expected 'is'");
        let body = self.parse_body();
        let end_span = match self.expect(TokenKind::End, "Expected 'end'") {
            Some(token) => token.span(),
            None => self.current_span(),
        };

        ConstructorDecl {
            parameters,
            body,
            span: start.merge(end_span),
        }
    }

    /// Parses a parameter list after the opening `(`:
    /// `Params := Param { ',' Param }` with `Param := Id ':' TypeName`.
    fn parse_parameters(&mut self) -> Vec<Parameter> {
        let mut parameters = Vec::new();
        if self.match_token(TokenKind::RightParen) {
            return parameters;
        }
        loop {
            let (name, name_span) =
                match self.expect(TokenKind::Identifier, "Expected parameter name") {
                    Some(token) => (token.lexeme().clone(), token.span()),
                    None => (EcoString::new(), self.current_span()),
                };
            self.expect(TokenKind::Colon, "Expected ':'");
            let (type_name, type_span) = self
                .parse_type_name()
                .unwrap_or_else(|| (EcoString::new(), self.current_span()));

            parameters.push(Parameter {
                id: self.next_var_id(),
                name,
                type_name,
                resolved_type: None,
                span: name_span.merge(type_span),
            });

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "Expected ')'");
        parameters
    }

    /// Parses a type name: `TypeName := Id [ '[' TypeName ']' ]`.
    ///
    /// Bracketed forms are concatenated into a single synthetic name such as
    /// `"Array[Integer]"`; nesting is allowed (`"Array[Array[Real]]"`).
    pub(super) fn parse_type_name(&mut self) -> Option<(EcoString, Span)> {
        let token = self.expect(TokenKind::Identifier, "Expected type name")?;
        let mut name = token.lexeme().clone();
        let mut span = token.span();

        if self.match_token(TokenKind::LeftBracket) {
            let inner = self.parse_type_name();
            let close = self.expect(TokenKind::RightBracket, "Expected ']'");
            let (inner_name, _) = inner?;
            name.push('[');
            name.push_str(&inner_name);
            name.push(']');
            span = span.merge(close.map_or_else(|| self.current_span(), |t| t.span()));
        }

        Some((name, span))
    }

    /// Span of the most recently consumed token, or `fallback` if nothing
    /// has been consumed yet.
    fn previous_span(&self, fallback: Span) -> Span {
        if self.current == 0 {
            fallback
        } else {
            self.tokens[self.current - 1].span()
        }
    }
}
