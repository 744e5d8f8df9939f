// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Terminal rendering of compiler diagnostics via miette.
//!
//! Core diagnostics carry line/column spans; miette labels want byte
//! offsets into the source text. [`byte_range`] performs that conversion,
//! and [`CompileDiagnostic`] packages one core diagnostic with its source
//! context for miette's fancy renderer.

use miette::{Diagnostic, SourceSpan};
use olang_core::source_analysis::{Diagnostic as CoreDiagnostic, Severity, Span};

/// A compilation diagnostic with rich source-context formatting.
#[derive(Debug, Diagnostic, thiserror::Error)]
#[error("{message}")]
#[diagnostic(code(olang::compile))]
pub struct CompileDiagnostic {
    /// Error or warning.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Source text for context rendering.
    #[source_code]
    pub src: miette::NamedSource<String>,
    /// Location of the problem.
    #[label("{label}")]
    pub span: SourceSpan,
    /// Label text shown at the span.
    pub label: String,
    /// Optional fix-it hint.
    #[help]
    pub hint: Option<String>,
}

impl CompileDiagnostic {
    /// Packages a core diagnostic with its source for rendering.
    pub fn from_core(diagnostic: &CoreDiagnostic, source_path: &str, source: &str) -> Self {
        let label = match diagnostic.severity {
            Severity::Error => "error here",
            Severity::Warning => "warning here",
        };
        Self {
            severity: diagnostic.severity,
            message: diagnostic.message.to_string(),
            src: miette::NamedSource::new(source_path, source.to_string()),
            span: byte_range(source, diagnostic.span).into(),
            label: label.to_string(),
            hint: diagnostic.hint.as_ref().map(ToString::to_string),
        }
    }
}

/// Converts a line/column span into a byte `(offset, length)` pair for the
/// given source text. Columns count characters; positions past the end of
/// the text clamp to its end.
pub fn byte_range(source: &str, span: Span) -> (usize, usize) {
    let start = byte_offset(source, span.start_line(), span.start_column());
    let end = byte_offset(source, span.end_line(), span.end_column());
    (start, end.saturating_sub(start))
}

fn byte_offset(source: &str, line: u32, column: u32) -> usize {
    let mut current_line = 0u32;
    let mut remaining_columns = column;
    for (offset, c) in source.char_indices() {
        if current_line == line {
            if remaining_columns == 0 {
                return offset;
            }
            if c == '\n' {
                // Position past the end of the line clamps to the newline
                return offset;
            }
            remaining_columns -= 1;
        } else if c == '\n' {
            current_line += 1;
        }
    }
    source.len()
}
