// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! Semantic analysis: symbol tables, name resolution, and type checking.
//!
//! Analysis runs in two gated passes over the parsed AST:
//!
//! 1. [`symbol_table::build_symbol_table`] - registers classes, wires up
//!    inheritance (rejecting self-extension, unknown bases, built-in bases,
//!    and cycles), builds per-class member tables in the [`ProgramIndex`],
//!    and resolves every name in member bodies.
//! 2. [`type_checker::check_types`] - resolves declared type names, infers
//!    expression types bottom-up, resolves method overloads, and validates
//!    the type rules.
//!
//! The type checker only runs when pass 1 produced no errors; the pipeline
//! driver enforces this. Both passes fill "resolved slots" on the AST nodes
//! in place; everything that must survive across class boundaries (field
//! and method tables, base links) lives in the [`ProgramIndex`] side
//! registry instead, keyed by plain ids.

pub mod program_index;
pub mod scope;
pub mod stdlib;
pub mod symbol_table;
pub mod type_checker;
pub mod types;

pub use program_index::ProgramIndex;
pub use scope::{GlobalScope, GlobalSymbol, Scope};
pub use stdlib::{standard_library, BuiltInMethod, StandardLibrary};
pub use symbol_table::build_symbol_table;
pub use type_checker::check_types;
pub use types::Type;
