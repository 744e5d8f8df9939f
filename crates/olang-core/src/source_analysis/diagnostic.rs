// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic messages shared by every compiler pass.
//!
//! All passes (lexer, parser, semantic analysis, optimizations) report
//! problems as [`Diagnostic`] values rather than failing eagerly. The
//! pipeline driver collects them per pass and refuses to run the next pass
//! when any error-severity diagnostic was recorded; warnings are reported
//! but never gate.

use ecow::EcoString;

use super::Span;

/// A diagnostic message (error or warning) with a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: Severity,
    /// The human-readable message.
    pub message: EcoString,
    /// The source location the message refers to.
    pub span: Span,
    /// Optional hint for how to fix the issue.
    pub hint: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    #[must_use]
    pub fn error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Creates a new warning diagnostic.
    #[must_use]
    pub fn warning(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            hint: None,
        }
    }

    /// Attaches a fix-it hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Returns `true` if this diagnostic is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An error that prevents later passes from running.
    Error,
    /// A warning that is reported but does not gate compilation.
    Warning,
}

/// Returns `true` if any diagnostic in the slice is an error.
#[must_use]
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_and_warning_constructors() {
        let err = Diagnostic::error("bad", Span::single(0, 0));
        assert_eq!(err.severity, Severity::Error);
        assert!(err.is_error());
        assert!(err.hint.is_none());

        let warn = Diagnostic::warning("odd", Span::single(0, 0));
        assert_eq!(warn.severity, Severity::Warning);
        assert!(!warn.is_error());
    }

    #[test]
    fn with_hint_attaches_hint() {
        let diag = Diagnostic::error("Unexpected character '='", Span::single(0, 3))
            .with_hint("did you mean '=>'?");
        assert_eq!(diag.hint.as_deref(), Some("did you mean '=>'?"));
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let warnings = vec![Diagnostic::warning("w", Span::single(0, 0))];
        assert!(!has_errors(&warnings));

        let mixed = vec![
            Diagnostic::warning("w", Span::single(0, 0)),
            Diagnostic::error("e", Span::single(0, 1)),
        ];
        assert!(has_errors(&mixed));
    }
}
