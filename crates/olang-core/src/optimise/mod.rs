// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! AST-level optimizations.
//!
//! Two passes run between type checking and code generation:
//!
//! - [`dead_code`] removes statements that follow a `return` in the same
//!   block. One linear pass.
//! - [`const_fold`] folds built-in wrapper arithmetic, comparisons, and
//!   logic over literal operands. The rewriter is run repeatedly until it
//!   reports no change; a fixed iteration cap bounds pathological inputs,
//!   and hitting it is reported as a warning rather than an error.
//!
//! Both passes preserve the typing invariants: rewritten nodes carry the
//! inferred types the emitter relies on.

pub mod const_fold;
pub mod dead_code;

use crate::ast::Program;
use crate::source_analysis::Diagnostic;

/// Upper bound on constant-folding sweeps over the whole program.
const MAX_FOLD_ITERATIONS: usize = 10;

/// Summary of an optimization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimisationReport {
    /// Unreachable statements removed by dead-code elimination.
    pub statements_removed: usize,
    /// Expressions simplified by the constant folder, over all iterations.
    pub expressions_folded: usize,
    /// Number of folding sweeps performed.
    pub fold_iterations: usize,
    /// Warnings (the iteration cap); never contains errors.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs both optimizations in order: dead-code elimination once, then
/// constant folding to a fixed point (bounded by the iteration cap).
pub fn optimise(program: &mut Program) -> OptimisationReport {
    let mut report = OptimisationReport {
        statements_removed: dead_code::eliminate_dead_code(program),
        ..OptimisationReport::default()
    };

    loop {
        let outcome = const_fold::fold_constants(program);
        report.expressions_folded += outcome.folded;
        report.fold_iterations += 1;
        if !outcome.changed {
            break;
        }
        if report.fold_iterations >= MAX_FOLD_ITERATIONS {
            report.diagnostics.push(Diagnostic::warning(
                format!("Constant folding did not settle after {MAX_FOLD_ITERATIONS} iterations"),
                program.span,
            ));
            break;
        }
    }

    report
}
