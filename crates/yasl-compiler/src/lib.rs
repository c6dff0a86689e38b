// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # yasl-compiler
//!
//! The front end and code generator of the YASL scripting language.
//!
//! ## Overview
//!
//! Compilation is one synchronous pass per stage:
//! - `lexer`: source text to tokens, with newline-sensitive terminators
//! - `parser`: tokens to an [`ast::Program`]
//! - `compiler`: AST to module bytes for the stack VM
//!
//! ## Quick Start
//!
//! ```rust
//! use yasl_compiler::{compile_source, disassemble};
//!
//! let module = compile_source("let x = 2\nif x > 1 { print x }").unwrap();
//! let listing = disassemble(&module).unwrap();
//! assert!(listing.contains("GSTORE_1"));
//! ```
//!
//! A [`Compiler`] keeps its globals and functions between calls, so a
//! program can also be compiled one piece at a time:
//!
//! ```rust
//! use yasl_compiler::{compile_with, Compiler};
//!
//! let mut compiler = Compiler::new();
//! compile_with(&mut compiler, "func double: n -> { return n * 2 }").unwrap();
//! compile_with(&mut compiler, "print double(21)").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;

pub use compiler::{Compiler, decode, disassemble};
pub use error::{Error, ErrorKind, Result};

use tracing::instrument;

/// Compiles source text into a complete module with a fresh compiler.
pub fn compile_source(source: &str) -> Result<Vec<u8>> {
    compile_with(&mut Compiler::new(), source)
}

/// Compiles source text with an existing compiler.
///
/// Declarations made by earlier calls stay visible. A failed call leaves the
/// compiler unchanged.
#[instrument(skip_all)]
pub fn compile_with(compiler: &mut Compiler, source: &str) -> Result<Vec<u8>> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::Parser::new(tokens).parse_program()?;
    compiler.compile(&program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_source_empty() {
        let module = compile_source("").unwrap();
        assert_eq!(module.len(), 17);
        assert_eq!(module[16], compiler::OpCode::Halt.byte());
    }

    #[test]
    fn test_errors_come_from_each_stage() {
        assert_eq!(compile_source("@").unwrap_err().kind(), ErrorKind::Lex);
        assert_eq!(compile_source("let = 1").unwrap_err().kind(), ErrorKind::Parse);
        assert_eq!(compile_source("print y").unwrap_err().kind(), ErrorKind::Compile);
    }

    #[test]
    fn test_compile_with_keeps_state() {
        let mut compiler = Compiler::new();
        compile_with(&mut compiler, "let a = 1").unwrap();
        compile_with(&mut compiler, "print a").unwrap();
        assert_eq!(compiler.globals().size(), 1);
    }
}
