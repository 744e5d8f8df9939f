// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing: bodies, control flow, assignments.

use super::Parser;
use crate::ast::{Assignment, IfStatement, ReturnStatement, Statement, WhileLoop};
use crate::source_analysis::TokenKind;

impl Parser {
    /// Parses a statement sequence up to (but not consuming) a terminating
    /// `end`, `else`, or end of input.
    pub(super) fn parse_body(&mut self) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::End) && !self.check(TokenKind::Else) && !self.is_at_end() {
            statements.push(self.parse_statement());
        }
        statements
    }

    /// Parses a single statement.
    ///
    /// An identifier followed by `:=` begins an assignment; any other
    /// expression-start token begins an expression statement. This is the
    /// only place the parser needs its one token of lookahead.
    fn parse_statement(&mut self) -> Statement {
        match self.current_kind() {
            TokenKind::Var => Statement::Variable(self.parse_var_decl()),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Identifier if self.peek_kind() == Some(TokenKind::Assign) => {
                self.parse_assignment()
            }
            _ if self.at_expression_start() => Statement::Expression(self.parse_expression()),
            _ => {
                let span = self.current_span();
                self.error("Expected statement");
                self.advance();
                Statement::Unknown(span)
            }
        }
    }

    /// Parses `return [expr]`.
    fn parse_return(&mut self) -> Statement {
        let return_token = self
            .expect(TokenKind::Return, "Expected 'return'")
            .expect("parse_return called without 'return' token");
        let mut span = return_token.span();

        let value = if self.at_expression_start() {
            let expr = self.parse_expression();
            span = span.merge(expr.span);
            Some(expr)
        } else {
            None
        };

        Statement::Return(ReturnStatement { value, span })
    }

    /// Parses `if Expr then Body [else Body] end`.
    fn parse_if(&mut self) -> Statement {
        let if_token = self
            .expect(TokenKind::If, "Expected 'if'")
            .expect("parse_if called without 'if' token");
        let start = if_token.span();

        let condition = self.parse_expression();
        self.expect(TokenKind::Then, "Expected 'then'");
        let then_branch = self.parse_body();

        let else_branch = if self.match_token(TokenKind::Else) {
            Some(self.parse_body())
        } else {
            None
        };

        let end_span = match self.expect(TokenKind::End, "Expected 'end'") {
            Some(token) => token.span(),
            None => self.current_span(),
        };

        Statement::If(IfStatement {
            condition,
            then_branch,
            else_branch,
            span: start.merge(end_span),
        })
    }

    /// Parses `while Expr loop Body end`.
    fn parse_while(&mut self) -> Statement {
        let while_token = self
            .expect(TokenKind::While, "Expected 'while'")
            .expect("parse_while called without 'while' token");
        let start = while_token.span();

        let condition = self.parse_expression();
        self.expect(TokenKind::Loop, "Expected 'loop'");
        let body = self.parse_body();
        let end_span = match self.expect(TokenKind::End, "Expected 'end'") {
            Some(token) => token.span(),
            None => self.current_span(),
        };

        Statement::While(WhileLoop {
            condition,
            body,
            span: start.merge(end_span),
        })
    }

    /// Parses `Id ':=' Expr`.
    fn parse_assignment(&mut self) -> Statement {
        let name_token = self
            .expect(TokenKind::Identifier, "Expected assignment target")
            .expect("parse_assignment called without identifier token");
        let start = name_token.span();

        self.expect(TokenKind::Assign, "Expected ':='");
        let value = self.parse_expression();
        let span = start.merge(value.span);

        Statement::Assignment(Assignment {
            target: name_token.lexeme().clone(),
            value,
            resolved_target: None,
            span,
        })
    }
}
