// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for olang source code.
//!
//! This parser builds an AST from a stream of tokens, reporting every
//! problem it finds rather than stopping at the first.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - the parser always produces a
//!   [`Program`], substituting [`ExprKind::Unknown`]/[`Statement::Unknown`]
//!   placeholders for unparseable input
//! - **Multiple errors** - `expect` records a diagnostic and keeps going
//! - **One-token lookahead** - the only ambiguity (assignment vs expression
//!   statement) is resolved by peeking for `:=` after an identifier at
//!   statement start
//! - **Synchronization** - after a malformed member or statement the parser
//!   skips a single token and resumes at the next `class`/`end`/member/
//!   statement keyword
//!
//! # Grammar
//!
//! ```text
//! Program   := { ClassDecl }
//! ClassDecl := 'class' Id [ 'extends' Id ] 'is' { Member } 'end'
//! Member    := VarDecl | MethodDecl | CtorDecl
//! VarDecl   := 'var' Id ':' Expr
//! MethodDecl:= 'method' Id [ '(' Params ')' ] [ ':' TypeName ]
//!              ( 'is' Body 'end' | '=>' Expr | ε )
//! CtorDecl  := 'this' [ '(' Params ')' ] 'is' Body 'end'
//! TypeName  := Id [ '[' TypeName ']' ]
//! Body      := { Stmt }
//! Stmt      := VarDecl | Return | If | While | Assign | ExprStmt
//! Expr      := Primary { '.' Id [ '(' Args ')' ] }
//! Primary   := IntLit | RealLit | 'true' | 'false' | 'this'
//!            | Id [ '(' Args ')' ]
//! ```
//!
//! # Usage
//!
//! ```
//! use olang_core::source_analysis::{lex, parse};
//!
//! let (tokens, _) = lex("class A is this() is end end");
//! let (program, diagnostics) = parse(tokens);
//! assert!(diagnostics.is_empty());
//! assert_eq!(program.classes.len(), 1);
//! ```

use ecow::EcoString;

use crate::ast::{Program, VarId};
use crate::source_analysis::{Diagnostic, Span, Token, TokenKind};

mod declarations;
mod expressions;
mod statements;

/// Parses a token stream into a [`Program`].
///
/// Always returns a program, even for malformed input; check the returned
/// diagnostics for errors. The token list must end with an EOF token (the
/// lexer guarantees this).
#[must_use]
pub fn parse(tokens: Vec<Token>) -> (Program, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.diagnostics)
}

/// The parser state.
pub(super) struct Parser {
    /// The tokens being parsed.
    tokens: Vec<Token>,
    /// Current token index.
    current: usize,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// Counter for stamping unique [`VarId`]s on declarations.
    var_counter: u32,
}

impl Parser {
    /// Creates a new parser for the given tokens.
    fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind().is_eof()),
            "token stream must end with EOF"
        );
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            var_counter: 0,
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token {
        self.tokens
            .get(self.current)
            .or_else(|| self.tokens.last())
            .expect("parser has no tokens; expected at least an EOF token")
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> TokenKind {
        self.current_token().kind()
    }

    /// Returns the current token's span.
    pub(super) fn current_span(&self) -> Span {
        self.current_token().span()
    }

    /// Peeks at the next token kind without consuming.
    pub(super) fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current + 1).map(Token::kind)
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        self.current_kind().is_eof()
    }

    /// Advances to the next token and returns the consumed one.
    pub(super) fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.tokens[self.current - 1].clone()
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.current_kind() == kind
    }

    /// Consumes the current token if it matches the given kind.
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to match the given kind, advancing if it
    /// does. Otherwise records an error quoting the found lexeme and returns
    /// `None` without advancing.
    pub(super) fn expect(&mut self, kind: TokenKind, message: &str) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            let found = self.current_token();
            let quoted = if found.lexeme().is_empty() {
                found.kind().to_string()
            } else {
                format!("'{}'", found.lexeme())
            };
            let span = found.span();
            self.diagnostics
                .push(Diagnostic::error(format!("{message} (found {quoted})"), span));
            None
        }
    }

    /// Records an error at the current token.
    pub(super) fn error(&mut self, message: impl Into<EcoString>) {
        let span = self.current_span();
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    /// Allocates the next unique variable-declaration id.
    pub(super) fn next_var_id(&mut self) -> VarId {
        let id = VarId(self.var_counter);
        self.var_counter += 1;
        id
    }

    /// Returns `true` if the current token can begin an expression.
    pub(super) fn at_expression_start(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::IntegerLiteral
                | TokenKind::RealLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::This
                | TokenKind::Identifier
        )
    }
}
