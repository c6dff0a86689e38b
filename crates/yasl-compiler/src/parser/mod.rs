//! Parser for YASL source code.
//!
//! Transforms the token vector produced by the lexer into an Abstract Syntax
//! Tree (AST).
//!
//! ## Structure
//!
//! - `parser` - Cursor, statement parsing and token helpers
//! - `expressions` - Expression parsing by precedence climbing
//!
//! ## Usage
//!
//! ```rust
//! use yasl_compiler::lexer::tokenize;
//! use yasl_compiler::parser::Parser;
//!
//! let tokens = tokenize("let x = 1 + 2").unwrap();
//! let program = Parser::new(tokens).parse_program().expect("Should parse");
//! assert_eq!(program.body.len(), 1);
//! ```

mod expressions;
mod parser;

pub use parser::Parser;
