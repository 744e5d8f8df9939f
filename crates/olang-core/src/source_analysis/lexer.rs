// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for olang source code.
//!
//! This module converts source text into a stream of [`Token`]s. The lexer
//! is hand-written for full control over error recovery.
//!
//! # Design Principles
//!
//! - **Error recovery**: never panic on malformed input; emit
//!   [`TokenKind::Error`] tokens and keep scanning so the parser can report
//!   every problem in one run
//! - **Precise spans**: every token carries its exact line/column range
//! - **EOF termination**: the token stream always ends with a single
//!   [`TokenKind::Eof`] token
//!
//! # Example
//!
//! ```
//! use olang_core::source_analysis::{lex, TokenKind};
//!
//! let (tokens, diagnostics) = lex("var x : Integer(42)");
//! assert!(diagnostics.is_empty());
//! assert_eq!(tokens.last().unwrap().kind(), TokenKind::Eof);
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use super::{Diagnostic, Span, Token, TokenKind};

/// Tokenizes the given source text.
///
/// Returns the token list (always ending in an EOF token) and any lexical
/// diagnostics. The token stream is parseable even when diagnostics are
/// present: invalid input becomes [`TokenKind::Error`] tokens.
#[must_use]
pub fn lex(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize()
}

/// A lexer over olang source text.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Current line (zero-based).
    line: u32,
    /// Current column (zero-based).
    column: u32,
    /// Tokens produced so far.
    tokens: Vec<Token>,
    /// Lexical errors produced so far.
    diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("line", &self.line)
            .field("column", &self.column)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            line: 0,
            column: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenizes the whole input.
    #[must_use]
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        while self.peek_char().is_some() {
            self.scan_token();
        }
        let eof_span = Span::empty(self.line, self.column);
        self.tokens.push(Token::new(TokenKind::Eof, "", eof_span));
        (self.tokens, self.diagnostics)
    }

    // ========================================================================
    // Character Management
    // ========================================================================

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (n=0 is the same as
    /// `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character, updating line and column tracking.
    ///
    /// Newlines advance the line counter and reset the column; they do not
    /// otherwise produce tokens.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Extracts the source text between two byte positions.
    fn text_between(&self, start: usize, end: usize) -> &'src str {
        &self.source[start..end]
    }

    // ========================================================================
    // Scanning
    // ========================================================================

    /// Scans one token (or skips trivia) from the current position.
    fn scan_token(&mut self) {
        let start = self.mark();
        let Some(c) = self.peek_char() else { return };

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                self.advance();
            }

            '(' => self.single(TokenKind::LeftParen),
            ')' => self.single(TokenKind::RightParen),
            '[' => self.single(TokenKind::LeftBracket),
            ']' => self.single(TokenKind::RightBracket),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),

            ':' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    self.push_token(TokenKind::Assign, start);
                } else {
                    self.push_token(TokenKind::Colon, start);
                }
            }

            '=' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    self.push_token(TokenKind::FatArrow, start);
                } else {
                    self.error_run(start, "Unexpected character '='", Some("did you mean '=>'?"));
                }
            }

            '-' => {
                if self.peek_char_n(1).is_some_and(|d| d.is_ascii_digit()) {
                    self.lex_number(start);
                } else {
                    self.advance();
                    self.error_run(start, "Unexpected character '-'", None);
                }
            }

            '/' => {
                self.advance();
                match self.peek_char() {
                    Some('/') => self.skip_line_comment(),
                    Some('*') => self.skip_block_comment(start),
                    _ => self.error_run(start, "Unexpected character '/'", None),
                }
            }

            '"' => self.lex_string(start),

            '0'..='9' => self.lex_number(start),

            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(start),

            other => {
                self.advance();
                self.error_run(start, format!("Unexpected character '{other}'"), None);
            }
        }
    }

    /// Skips a line comment (`// ...`), leaving the newline unconsumed.
    fn skip_line_comment(&mut self) {
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
    }

    /// Skips a block comment (`/* ... */`), which may span lines.
    ///
    /// The opening `/` is already consumed and `*` is the next character.
    fn skip_block_comment(&mut self, start: Mark) {
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => {
                    self.report_error("Unterminated block comment", start);
                    return;
                }
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Lexes an integer or real literal.
    ///
    /// An optional leading `-` has already been verified to be followed by a
    /// digit. A single `.` followed by a digit extends the literal into a
    /// real; a second `.`, or a `.` not followed by a digit, terminates the
    /// literal with an error (the offending dot is consumed into the error
    /// run).
    fn lex_number(&mut self, start: Mark) {
        if self.peek_char() == Some('-') {
            self.advance();
        }
        let mut has_dot = false;
        let mut invalid = false;
        loop {
            match self.peek_char() {
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                }
                Some('.') => {
                    if !has_dot && self.peek_char_n(1).is_some_and(|d| d.is_ascii_digit()) {
                        has_dot = true;
                        self.advance();
                    } else {
                        self.advance();
                        invalid = true;
                        break;
                    }
                }
                _ => break,
            }
        }

        if invalid {
            self.report_error("Invalid numeric literal", start);
            return;
        }

        let lexeme = self.text_between(start.position, self.position);
        // Integer is attempted first; an over-range digit run falls back to
        // the real parse, matching the language's numeric grammar.
        if lexeme.parse::<i32>().is_ok() {
            self.push_token(TokenKind::IntegerLiteral, start);
        } else if lexeme.parse::<f64>().is_ok() {
            self.push_token(TokenKind::RealLiteral, start);
        } else {
            self.report_error("Invalid numeric literal", start);
        }
    }

    /// Lexes a string literal. The lexeme keeps its surrounding quotes.
    ///
    /// A newline or end of input before the closing quote is an error; the
    /// newline itself is left for the main loop.
    fn lex_string(&mut self, start: Mark) {
        self.advance(); // opening quote
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.report_error("Unterminated string", start);
                    return;
                }
                Some('"') => {
                    self.advance();
                    self.push_token(TokenKind::StringLiteral, start);
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Lexes an identifier or keyword. Keyword lookup is exact-case.
    fn lex_identifier(&mut self, start: Mark) {
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text = self.text_between(start.position, self.position);
        let kind = TokenKind::from_keyword(text).unwrap_or(TokenKind::Identifier);
        self.push_token(kind, start);
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Consumes the rest of a problematic run (up to the next operator
    /// character or whitespace) and reports it as one error token.
    fn error_run(&mut self, start: Mark, message: impl Into<ecow::EcoString>, hint: Option<&str>) {
        while self
            .peek_char()
            .is_some_and(|c| !is_run_terminator(c))
        {
            self.advance();
        }
        let span = self.span_from(start);
        let mut diagnostic = Diagnostic::error(message, span);
        if let Some(hint) = hint {
            diagnostic = diagnostic.with_hint(hint);
        }
        self.diagnostics.push(diagnostic);
        let lexeme = self.text_between(start.position, self.position);
        self.tokens.push(Token::new(TokenKind::Error, lexeme, span));
    }

    /// Reports an error covering everything consumed since `start`, without
    /// consuming further input.
    fn report_error(&mut self, message: impl Into<ecow::EcoString>, start: Mark) {
        let span = self.span_from(start);
        self.diagnostics.push(Diagnostic::error(message, span));
        let lexeme = self.text_between(start.position, self.position);
        self.tokens.push(Token::new(TokenKind::Error, lexeme, span));
    }

    // ========================================================================
    // Token Construction
    // ========================================================================

    /// Captures the current position as a token start mark.
    fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    /// Builds the span from a start mark to the current position.
    fn span_from(&self, start: Mark) -> Span {
        Span::new(start.line, start.column, self.line, self.column)
    }

    /// Consumes one character and pushes a single-character token.
    fn single(&mut self, kind: TokenKind) {
        let start = self.mark();
        self.advance();
        self.push_token(kind, start);
    }

    /// Pushes a token spanning from `start` to the current position.
    fn push_token(&mut self, kind: TokenKind, start: Mark) {
        let lexeme = self.text_between(start.position, self.position);
        self.tokens
            .push(Token::new(kind, lexeme, self.span_from(start)));
    }
}

/// A captured source position (byte offset plus line/column).
#[derive(Debug, Clone, Copy)]
struct Mark {
    position: usize,
    line: u32,
    column: u32,
}

/// Characters that terminate an error run: whitespace and the
/// single-character operators.
fn is_run_terminator(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\r' | '\n' | '(' | ')' | '[' | ']' | '{' | '}' | ',' | '.' | ':'
    )
}
