// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! The `compile` subcommand: run the whole pipeline against one source
//! file and write the generated assembly files.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result, WrapErr};
use olang_core::pipeline::CompileError;
use olang_core::source_analysis::Diagnostic;
use tracing::{debug, info};

use crate::diagnostic::CompileDiagnostic;

/// Exit code for successful compilation.
const EXIT_OK: i32 = 0;
/// Exit code when any diagnostic was reported.
const EXIT_DIAGNOSTICS: i32 = 1;
/// Exit code for internal failures (I/O, emitter invariants).
const EXIT_INTERNAL: i32 = 2;

/// Runs the compiler, returning the process exit code.
pub fn run(source_path: &str, out_dir: &str) -> i32 {
    let source_path = Utf8PathBuf::from(source_path);
    let out_dir = Utf8PathBuf::from(out_dir);
    match compile_file(&source_path, &out_dir) {
        Ok(()) => EXIT_OK,
        Err(Failure::Rejected) => EXIT_DIAGNOSTICS,
        Err(Failure::Internal(report)) => {
            eprintln!("{report:?}");
            EXIT_INTERNAL
        }
    }
}

enum Failure {
    /// Diagnostics were printed; the program was rejected.
    Rejected,
    /// An internal failure (not a problem with the input program).
    Internal(miette::Report),
}

impl From<miette::Report> for Failure {
    fn from(report: miette::Report) -> Self {
        Self::Internal(report)
    }
}

fn compile_file(source_path: &Utf8Path, out_dir: &Utf8Path) -> Result<(), Failure> {
    info!(%source_path, "Compiling");
    let source = fs::read_to_string(source_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read source file '{source_path}'"))?;

    match olang_core::compile(&source) {
        Ok(compiled) => {
            report_diagnostics(&compiled.warnings, source_path.as_str(), &source);
            write_output(&compiled.files, out_dir)?;
            info!(files = compiled.files.len(), "Compilation succeeded");
            Ok(())
        }
        Err(CompileError::Rejected {
            stage,
            errors,
            warnings,
        }) => {
            report_diagnostics(&errors, source_path.as_str(), &source);
            report_diagnostics(&warnings, source_path.as_str(), &source);
            eprintln!("error: {stage} failed with {} error(s)", errors.len());
            Err(Failure::Rejected)
        }
        Err(CompileError::Internal(err)) => {
            Err(Failure::Internal(miette::Report::new(err)))
        }
    }
}

/// Renders diagnostics with source context to stderr.
fn report_diagnostics(diagnostics: &[Diagnostic], source_path: &str, source: &str) {
    for diagnostic in diagnostics {
        let rendered = CompileDiagnostic::from_core(diagnostic, source_path, source);
        eprintln!("{:?}", miette::Report::new(rendered));
    }
}

/// Writes one `<ClassName>.assembly` file per compiled class, creating the
/// output directory if needed.
fn write_output(files: &[olang_core::AssemblyFile], out_dir: &Utf8Path) -> Result<(), Failure> {
    fs::create_dir_all(out_dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to create output directory '{out_dir}'"))?;

    for file in files {
        let path = out_dir.join(format!("{}.assembly", file.class_name));
        debug!(%path, "Writing");
        fs::write(&path, &file.text)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to write '{path}'"))?;
    }
    Ok(())
}
