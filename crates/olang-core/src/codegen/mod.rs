// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Code generation.
//!
//! The [`assembly`] module lowers a fully analysed AST to stack-VM assembly
//! text, one file per class. Code generation assumes the semantic passes
//! ran cleanly: an unresolved slot or missing inferred type here is an
//! internal invariant violation, not a user error.

pub mod assembly;

#[cfg(test)]
mod property_tests;

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during code generation.
///
/// All of these are compiler bugs or pipeline misuse (running the emitter
/// on a tree that did not pass semantic analysis); none is a user-facing
/// diagnostic.
#[derive(Debug, Error, Diagnostic)]
pub enum CodeGenError {
    /// A semantic slot that should have been filled was empty.
    #[error("unresolved {what} encountered during lowering in {location}")]
    UnresolvedSlot {
        /// What kind of slot was missing (e.g. "inferred type").
        what: String,
        /// Where lowering was when it noticed (class.method).
        location: String,
    },

    /// The symbolic operand stack would go negative.
    #[error("operand stack underflow in {location}: depth would be {depth}")]
    StackUnderflow {
        /// Where lowering was (class.method).
        location: String,
        /// The depth the pop would have produced.
        depth: i64,
    },

    /// A statement left the operand stack unbalanced.
    #[error(
        "operand stack not neutral after statement in {location}: \
         expected depth {expected}, found {found}"
    )]
    UnbalancedStatement {
        /// Where lowering was (class.method).
        location: String,
        /// Depth before the statement.
        expected: u32,
        /// Depth after the statement.
        found: u32,
    },

    /// Any other internal inconsistency.
    #[error("code generation error: {0}")]
    Internal(String),
}

/// Result type for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;

pub use assembly::{generate, AssemblyFile};
