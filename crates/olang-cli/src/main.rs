// Copyright 2026 The olang Authors
// SPDX-License-Identifier: Apache-2.0

//! olang compiler command-line interface.
//!
//! This is the entry point for the `olang` command.

use clap::{Parser, Subcommand};

mod commands;
mod diagnostic;

/// olang: a compiler for a small object-oriented teaching language
#[derive(Debug, Parser)]
#[command(name = "olang")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a source file to stack-VM assembly
    Compile {
        /// Source file to compile
        source: String,

        /// Directory for the generated .assembly files (created if absent)
        #[arg(long, default_value = "out")]
        out: String,
    },
}

fn main() {
    // Initialize the tracing subscriber only when RUST_LOG is explicitly
    // set, so normal runs stay quiet on stderr.
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .try_init();
    }

    // Install miette's fancy error handler for diagnostic rendering
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }));

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Compile { source, out } => commands::compile::run(&source, &out),
    };
    std::process::exit(exit_code);
}
