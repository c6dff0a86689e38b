// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! yasl - compiler driver for the YASL scripting language
//!
//! Compiles a source file (or inline code) into a module file for the VM.
//! Without arguments it starts an interactive REPL that compiles each line
//! against one persistent compiler.

mod driver;
mod repl;

use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use driver::BuildOptions;

#[derive(Parser, Debug)]
#[command(
    name = "yasl",
    about = "Compiles YASL source into VM bytecode",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Source file to compile. Starts the REPL when omitted.
    file: Option<PathBuf>,

    /// Where to write the compiled module
    #[arg(short, long, env = "YASL_OUTPUT", default_value = "source.yb")]
    output: PathBuf,

    /// Compile code given on the command line
    #[arg(short, long, value_name = "CODE", conflicts_with = "file")]
    eval: Option<String>,

    /// Print a disassembly of the compiled module
    #[arg(long)]
    disasm: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = BuildOptions {
        output: &cli.output,
        disasm: cli.disasm,
    };
    let result = match (&cli.eval, &cli.file) {
        (Some(code), _) => driver::build(code, options),
        (None, Some(path)) => driver::build_file(path, options),
        (None, None) => return run_repl(),
    };

    match result {
        Ok(listing) => {
            if let Some(listing) = listing {
                print!("{}", listing);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "yasl=debug,yasl_compiler=debug"
    } else {
        "yasl=warn,yasl_compiler=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_repl() -> ExitCode {
    match repl::Repl::new() {
        Ok(mut repl) => {
            if let Err(e) = repl.run() {
                eprintln!("{}: {:?}", "REPL Error".red().bold(), e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!(
                "{}: Failed to initialize REPL: {:?}",
                "Error".red().bold(),
                e
            );
            ExitCode::FAILURE
        }
    }
}

fn print_error(error: &anyhow::Error) {
    // The innermost error carries the `LexError:`-style prefix
    let message = error.root_cause().to_string();
    match message.split_once(':') {
        Some((kind, rest)) => eprintln!("{}:{}", kind.red().bold(), rest),
        None => eprintln!("{}: {}", "Error".red().bold(), message),
    }
    for context in error.chain().rev().skip(1) {
        eprintln!("  {} {}", "-->".dimmed(), context);
    }
}
