// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing.
//!
//! Expressions are a primary followed by a left-associative chain of `.`
//! selections; each selection with an argument list is a method call, one
//! without is a field access. An identifier followed by `(` at primary
//! position is a constructor call.

use super::Parser;
use crate::ast::{ExprKind, Expression};
use crate::source_analysis::TokenKind;

impl Parser {
    /// Parses an expression: `Expr := Primary { '.' Id [ '(' Args ')' ] }`.
    pub(super) fn parse_expression(&mut self) -> Expression {
        let mut expr = self.parse_primary();

        while self.match_token(TokenKind::Dot) {
            let Some(name_token) =
                self.expect(TokenKind::Identifier, "Expected member name after '.'")
            else {
                // Leave the chain as-is; the missing name is already reported.
                break;
            };
            let name = name_token.lexeme().clone();
            let mut span = expr.span.merge(name_token.span());

            if self.match_token(TokenKind::LeftParen) {
                let arguments = self.parse_arguments();
                let close = self.expect(TokenKind::RightParen, "Expected ')'");
                span = span.merge(close.map_or_else(|| self.current_span(), |t| t.span()));
                expr = Expression::new(
                    ExprKind::MethodCall {
                        target: Box::new(expr),
                        method_name: name,
                        arguments,
                        resolved_method: None,
                    },
                    span,
                );
            } else {
                expr = Expression::new(
                    ExprKind::MemberAccess {
                        target: Box::new(expr),
                        member_name: name,
                        resolved_field: None,
                    },
                    span,
                );
            }
        }

        expr
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Expression {
        match self.current_kind() {
            TokenKind::IntegerLiteral => {
                let token = self.advance();
                match token.lexeme().parse::<i32>() {
                    Ok(value) => {
                        Expression::new(ExprKind::IntegerLiteral(value), token.span())
                    }
                    Err(_) => {
                        self.error(format!("Invalid integer literal: {}", token.lexeme()));
                        Expression::new(ExprKind::IntegerLiteral(0), token.span())
                    }
                }
            }
            TokenKind::RealLiteral => {
                let token = self.advance();
                match token.lexeme().parse::<f64>() {
                    Ok(value) => Expression::new(ExprKind::RealLiteral(value), token.span()),
                    Err(_) => {
                        self.error(format!("Invalid real literal: {}", token.lexeme()));
                        Expression::new(ExprKind::RealLiteral(0.0), token.span())
                    }
                }
            }
            TokenKind::True => {
                let token = self.advance();
                Expression::new(ExprKind::BooleanLiteral(true), token.span())
            }
            TokenKind::False => {
                let token = self.advance();
                Expression::new(ExprKind::BooleanLiteral(false), token.span())
            }
            TokenKind::This => {
                let token = self.advance();
                Expression::new(ExprKind::This, token.span())
            }
            TokenKind::Identifier => self.parse_identifier_or_call(),
            _ => {
                self.error("Expected expression");
                Expression::unknown(self.current_span())
            }
        }
    }

    /// Parses an identifier primary: a bare name, a constructor call
    /// `Name(args…)`, or an array constructor `Array[T](size)`.
    fn parse_identifier_or_call(&mut self) -> Expression {
        let name_token = self
            .expect(TokenKind::Identifier, "Expected identifier")
            .expect("parse_identifier_or_call called without identifier token");
        let mut name = name_token.lexeme().clone();
        let mut span = name_token.span();

        // `Name[Inner]` in expression position is an array type name; fold
        // the brackets into the synthetic class name.
        if self.check(TokenKind::LeftBracket) {
            self.advance();
            if let Some((inner, _)) = self.parse_type_name() {
                name.push('[');
                name.push_str(&inner);
                name.push(']');
            }
            let close = self.expect(TokenKind::RightBracket, "Expected ']'");
            span = span.merge(close.map_or_else(|| self.current_span(), |t| t.span()));

            // An array type name must be called to mean anything.
            if !self.check(TokenKind::LeftParen) {
                self.error("Expected '(' after array type name");
                return Expression::unknown(span);
            }
        }

        if self.match_token(TokenKind::LeftParen) {
            let arguments = self.parse_arguments();
            let close = self.expect(TokenKind::RightParen, "Expected ')'");
            span = span.merge(close.map_or_else(|| self.current_span(), |t| t.span()));
            Expression::new(
                ExprKind::ConstructorCall {
                    class_name: name,
                    arguments,
                    resolved_class: None,
                    resolved_type: None,
                },
                span,
            )
        } else {
            Expression::new(
                ExprKind::Identifier {
                    name,
                    resolved: None,
                },
                span,
            )
        }
    }

    /// Parses a comma-separated argument list (after the opening `(`,
    /// leaving the closing `)` for the caller).
    fn parse_arguments(&mut self) -> Vec<Expression> {
        let mut arguments = Vec::new();
        if self.check(TokenKind::RightParen) {
            return arguments;
        }
        arguments.push(self.parse_expression());
        while self.match_token(TokenKind::Comma) {
            arguments.push(self.parse_expression());
        }
        arguments
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_source;
    use crate::ast::{ExprKind, MemberDecl, Statement};

    fn first_initializer(source: &str) -> crate::ast::Expression {
        let (program, diagnostics) = parse_source(source);
        assert!(diagnostics.is_empty(), "unexpected errors: {diagnostics:?}");
        let MemberDecl::Variable(field) = &program.classes[0].members[0] else {
            panic!("expected a field");
        };
        field.initializer.clone()
    }

    #[test]
    fn integer_wrapper_constructor() {
        let init = first_initializer("class A is var x : Integer(42) end");
        let ExprKind::ConstructorCall {
            class_name,
            arguments,
            ..
        } = &init.kind
        else {
            panic!("expected a constructor call");
        };
        assert_eq!(class_name, "Integer");
        assert!(matches!(arguments[0].kind, ExprKind::IntegerLiteral(42)));
    }

    #[test]
    fn negative_integer_literal() {
        let init = first_initializer("class A is var x : Integer(-17) end");
        let ExprKind::ConstructorCall { arguments, .. } = &init.kind else {
            panic!("expected a constructor call");
        };
        assert!(matches!(arguments[0].kind, ExprKind::IntegerLiteral(-17)));
    }

    #[test]
    fn boolean_literals() {
        let init = first_initializer("class A is var x : Boolean(true) end");
        let ExprKind::ConstructorCall { arguments, .. } = &init.kind else {
            panic!("expected a constructor call");
        };
        assert!(matches!(arguments[0].kind, ExprKind::BooleanLiteral(true)));
    }

    #[test]
    fn array_constructor_in_expression_position() {
        let init = first_initializer("class A is var xs : Array[Integer](10) end");
        let ExprKind::ConstructorCall {
            class_name,
            arguments,
            ..
        } = &init.kind
        else {
            panic!("expected a constructor call");
        };
        assert_eq!(class_name, "Array[Integer]");
        assert_eq!(arguments.len(), 1);
    }

    #[test]
    fn constructor_with_multiple_arguments() {
        let init = first_initializer("class A is var p : Point(Integer(1), Integer(2)) end");
        let ExprKind::ConstructorCall {
            class_name,
            arguments,
            ..
        } = &init.kind
        else {
            panic!("expected a constructor call");
        };
        assert_eq!(class_name, "Point");
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn this_method_call() {
        let (program, diagnostics) =
            parse_source("class A is method m() : Integer is return this.helper() end end");
        assert!(diagnostics.is_empty());
        let MemberDecl::Method(method) = &program.classes[0].members[0] else {
            panic!("expected a method");
        };
        let Statement::Return(ret) = &method.body.as_ref().unwrap()[0] else {
            panic!("expected a return");
        };
        let ExprKind::MethodCall { target, .. } = &ret.value.as_ref().unwrap().kind else {
            panic!("expected a method call");
        };
        assert!(matches!(target.kind, ExprKind::This));
    }

    #[test]
    fn empty_argument_list() {
        let init = first_initializer("class A is var p : Printer() end");
        let ExprKind::ConstructorCall { arguments, .. } = &init.kind else {
            panic!("expected a constructor call");
        };
        assert!(arguments.is_empty());
    }

    #[test]
    fn bare_array_name_is_an_error() {
        let (_, diagnostics) = parse_source("class A is var x : Array[Integer] end");
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("Expected '(' after array type name")));
    }

    #[test]
    fn missing_argument_recovers() {
        let (_, diagnostics) = parse_source("class A is var x : Integer( end");
        assert!(!diagnostics.is_empty());
    }
}
