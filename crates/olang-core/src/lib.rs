// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! olang compiler core.
//!
//! This crate contains the whole compilation pipeline for the olang
//! language:
//!
//! - Lexical analysis and parsing ([`source_analysis`])
//! - The AST data model ([`ast`])
//! - Symbol tables, name resolution, and type checking
//!   ([`semantic_analysis`])
//! - Dead-code elimination and constant folding ([`optimise`])
//! - Stack-VM assembly emission ([`codegen`])
//!
//! The [`pipeline`] module ties the passes together; [`compile`] is the
//! one-call entry point used by the CLI.
//!
//! # Example
//!
//! ```
//! let compiled = olang_core::compile(
//!     "class SimpleClass is var value : Integer(42) this() is end end",
//! )
//! .expect("compilation failed");
//! assert_eq!(compiled.files.len(), 1);
//! assert!(compiled.files[0].text.contains(".class public SimpleClass"));
//! ```

pub mod ast;
pub mod codegen;
pub mod optimise;
pub mod pipeline;
pub mod semantic_analysis;
pub mod source_analysis;

pub use codegen::AssemblyFile;
pub use pipeline::{compile, CompileError, CompiledProgram, Stage};
