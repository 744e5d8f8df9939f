// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Every token and AST node carries a [`Span`] indicating its position in the
//! source file. Spans are line/column based: columns are half-open (`end`
//! exclusive), and both lines and columns are zero-based internally. Error
//! messages render them one-based via [`Span::to_error_string`].

use std::fmt;

/// A span of source text, as `(start_line, start_column, end_line, end_column)`.
///
/// The end column is exclusive. For a span confined to one line,
/// `end_column - start_column` is its width in characters.
///
/// # Examples
///
/// ```
/// use olang_core::source_analysis::Span;
///
/// let span = Span::new(0, 4, 0, 9);
/// assert_eq!(span.width(), Some(5));
/// assert!(span.contains(0, 6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start_line: u32,
    start_column: u32,
    end_line: u32,
    end_column: u32,
}

impl Span {
    /// Creates a new span.
    ///
    /// # Panics
    ///
    /// Panics if the end position precedes the start position. Spans are
    /// produced by the lexer and by [`Span::merge`], both of which uphold
    /// the ordering, so a violation is a compiler bug.
    #[must_use]
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        assert!(
            start_line < end_line || (start_line == end_line && start_column <= end_column),
            "span end ({end_line}:{end_column}) precedes start ({start_line}:{start_column})"
        );
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Creates a span covering a single character.
    #[must_use]
    pub fn single(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column + 1)
    }

    /// Creates a zero-width span at a position (for synthetic tokens).
    #[must_use]
    pub fn empty(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    /// Creates a span within a single line, from `start_column` to
    /// `end_column` (exclusive).
    #[must_use]
    pub fn on_line(line: u32, start_column: u32, end_column: u32) -> Self {
        Self::new(line, start_column, line, end_column)
    }

    /// Returns the starting line (zero-based).
    #[must_use]
    pub const fn start_line(self) -> u32 {
        self.start_line
    }

    /// Returns the starting column (zero-based).
    #[must_use]
    pub const fn start_column(self) -> u32 {
        self.start_column
    }

    /// Returns the ending line (zero-based).
    #[must_use]
    pub const fn end_line(self) -> u32 {
        self.end_line
    }

    /// Returns the ending column (zero-based, exclusive).
    #[must_use]
    pub const fn end_column(self) -> u32 {
        self.end_column
    }

    /// Returns the character width for single-line spans, `None` when the
    /// span crosses a line boundary.
    #[must_use]
    pub const fn width(self) -> Option<u32> {
        if self.start_line == self.end_line {
            Some(self.end_column - self.start_column)
        } else {
            None
        }
    }

    /// Returns true if the span covers no characters.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start_line == self.end_line && self.start_column == self.end_column
    }

    /// Creates the smallest span enclosing both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let (start_line, start_column) = if (self.start_line, self.start_column)
            <= (other.start_line, other.start_column)
        {
            (self.start_line, self.start_column)
        } else {
            (other.start_line, other.start_column)
        };
        let (end_line, end_column) =
            if (self.end_line, self.end_column) >= (other.end_line, other.end_column) {
                (self.end_line, self.end_column)
            } else {
                (other.end_line, other.end_column)
            };
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Returns true if the given position falls inside this span.
    #[must_use]
    pub fn contains(self, line: u32, column: u32) -> bool {
        (line, column) >= (self.start_line, self.start_column)
            && (line, column) < (self.end_line, self.end_column)
    }

    /// Returns true if the two spans overlap in at least one position.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        (self.start_line, self.start_column) < (other.end_line, other.end_column)
            && (other.start_line, other.start_column) < (self.end_line, self.end_column)
    }

    /// Formats this span for user-facing error messages, one-based.
    ///
    /// Single positions render as `line 5, column 10`; single-line ranges as
    /// `line 5, columns 10-15`; multi-line spans as `lines 5-7`.
    #[must_use]
    pub fn to_error_string(self) -> String {
        if self.start_line != self.end_line {
            return format!("lines {}-{}", self.start_line + 1, self.end_line + 1);
        }
        if self.end_column.saturating_sub(self.start_column) <= 1 {
            format!("line {}, column {}", self.start_line + 1, self.start_column + 1)
        } else {
            format!(
                "line {}, columns {}-{}",
                self.start_line + 1,
                self.start_column + 1,
                self.end_column
            )
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_accessors() {
        let span = Span::new(2, 5, 2, 15);
        assert_eq!(span.start_line(), 2);
        assert_eq!(span.start_column(), 5);
        assert_eq!(span.end_line(), 2);
        assert_eq!(span.end_column(), 15);
        assert_eq!(span.width(), Some(10));
        assert!(!span.is_empty());
    }

    #[test]
    fn span_empty() {
        let span = Span::empty(3, 7);
        assert!(span.is_empty());
        assert_eq!(span.width(), Some(0));
    }

    #[test]
    fn span_single() {
        let span = Span::single(0, 4);
        assert_eq!(span.width(), Some(1));
        assert!(span.contains(0, 4));
        assert!(!span.contains(0, 5));
    }

    #[test]
    fn merge_same_line() {
        let a = Span::on_line(1, 2, 6);
        let b = Span::on_line(1, 10, 14);
        let merged = a.merge(b);
        assert_eq!(merged, Span::on_line(1, 2, 14));
    }

    #[test]
    fn merge_across_lines() {
        let a = Span::on_line(1, 8, 12);
        let b = Span::on_line(4, 0, 3);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(1, 8, 4, 3));
        // Merge is commutative
        assert_eq!(b.merge(a), merged);
    }

    #[test]
    fn contains_multi_line() {
        let span = Span::new(1, 5, 3, 2);
        assert!(span.contains(1, 5));
        assert!(span.contains(2, 0));
        assert!(span.contains(2, 99));
        assert!(span.contains(3, 1));
        assert!(!span.contains(3, 2));
        assert!(!span.contains(1, 4));
    }

    #[test]
    fn overlaps() {
        let a = Span::on_line(0, 0, 5);
        let b = Span::on_line(0, 4, 8);
        let c = Span::on_line(0, 5, 8);
        assert!(a.overlaps(b));
        assert!(b.overlaps(a));
        assert!(!a.overlaps(c));
    }

    #[test]
    fn error_string_is_one_based() {
        assert_eq!(Span::single(4, 9).to_error_string(), "line 5, column 10");
        assert_eq!(
            Span::on_line(4, 9, 15).to_error_string(),
            "line 5, columns 10-15"
        );
        assert_eq!(Span::new(4, 9, 6, 0).to_error_string(), "lines 5-7");
    }

    #[test]
    fn empty_span_error_string() {
        assert_eq!(Span::empty(0, 0).to_error_string(), "line 1, column 1");
    }

    #[test]
    #[should_panic(expected = "precedes start")]
    fn reversed_span_panics() {
        let _ = Span::new(2, 4, 2, 1);
    }
}
