// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! The compilation pipeline driver.
//!
//! [`compile`] runs the whole pipeline over one compilation unit:
//!
//! ```text
//! lex → parse → symbol table → type check → optimise → emit
//! ```
//!
//! Each stage gates the next: compilation stops at the first stage that
//! records any error-severity diagnostic, and the failure reports that
//! stage's diagnostics. Lexical and syntactic errors are accumulated and
//! reported together (error tokens keep the stream parseable). Warnings
//! never gate; they accumulate across stages and ride along on both
//! success and failure results.

use std::fmt;

use crate::codegen::{self, AssemblyFile, CodeGenError};
use crate::optimise::optimise;
use crate::semantic_analysis::{build_symbol_table, check_types};
use crate::source_analysis::{lex, parse, Diagnostic};

/// The pipeline stage that rejected a compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Lexical or syntactic analysis.
    Syntax,
    /// Symbol table construction and name resolution.
    SymbolResolution,
    /// Type inference and checking.
    TypeChecking,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax analysis"),
            Self::SymbolResolution => write!(f, "name resolution"),
            Self::TypeChecking => write!(f, "type checking"),
        }
    }
}

/// A successfully compiled program.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    /// One assembly file per class, plus the synthetic entry point when a
    /// qualifying `Start` class exists.
    pub files: Vec<AssemblyFile>,
    /// Warnings accumulated across all passes.
    pub warnings: Vec<Diagnostic>,
}

/// Why a compilation failed.
#[derive(Debug)]
pub enum CompileError {
    /// A pass reported errors; later passes did not run.
    Rejected {
        /// The stage that rejected the unit.
        stage: Stage,
        /// The stage's error diagnostics (at least one).
        errors: Vec<Diagnostic>,
        /// Warnings collected up to and including the failing stage.
        warnings: Vec<Diagnostic>,
    },
    /// The emitter hit an internal invariant violation. This is a compiler
    /// bug, not a problem with the input program.
    Internal(CodeGenError),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { stage, errors, .. } => {
                write!(f, "{} failed with {} error(s)", stage, errors.len())
            }
            Self::Internal(err) => write!(f, "internal compiler error: {err}"),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected { .. } => None,
            Self::Internal(err) => Some(err),
        }
    }
}

/// Compiles one source text to assembly files.
///
/// # Errors
///
/// Returns [`CompileError::Rejected`] when any pass reports errors, and
/// [`CompileError::Internal`] on emitter invariant violations.
pub fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
    let mut warnings = Vec::new();

    // Lexical and syntactic diagnostics are reported together.
    let (tokens, lex_diagnostics) = lex(source);
    let (mut program, parse_diagnostics) = parse(tokens);
    let mut syntax = lex_diagnostics;
    syntax.extend(parse_diagnostics);
    gate(Stage::Syntax, syntax, &mut warnings)?;

    let (mut index, symbol_diagnostics) = build_symbol_table(&mut program);
    gate(Stage::SymbolResolution, symbol_diagnostics, &mut warnings)?;

    let type_diagnostics = check_types(&mut program, &mut index);
    gate(Stage::TypeChecking, type_diagnostics, &mut warnings)?;

    let report = optimise(&mut program);
    warnings.extend(report.diagnostics);

    let files = codegen::generate(&program, &index).map_err(CompileError::Internal)?;
    Ok(CompiledProgram { files, warnings })
}

/// Collects a stage's warnings; fails the compilation when the stage
/// produced any error.
fn gate(
    stage: Stage,
    diagnostics: Vec<Diagnostic>,
    warnings: &mut Vec<Diagnostic>,
) -> Result<(), CompileError> {
    let (errors, stage_warnings): (Vec<_>, Vec<_>) =
        diagnostics.into_iter().partition(Diagnostic::is_error);
    warnings.extend(stage_warnings);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CompileError::Rejected {
            stage,
            errors,
            warnings: std::mem::take(warnings),
        })
    }
}
