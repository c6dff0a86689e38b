//! Lexical analysis (tokenization) for YASL source code.
//!
//! The lexer transforms source text into the token vector consumed by the
//! parser. The whole source is scanned up front; the vector always ends in
//! [`TokenKind::Eof`].
//!
//! ## Structure
//!
//! - `scanner.rs` - Main `Scanner` struct that produces tokens
//! - `token.rs` - `Token` and `TokenKind` definitions
//! - `operators` - Longest-match operator tables
//!
//! ## Statement terminators
//!
//! A newline after a token for which [`TokenKind::ends_statement`] holds is
//! emitted as a [`TokenKind::Semicolon`]. Newlines anywhere else are blank.
//!
//! ## Usage
//!
//! ```rust
//! use yasl_compiler::lexer::{tokenize, TokenKind};
//!
//! let tokens = tokenize("let x = 42\nprint x").unwrap();
//! assert!(matches!(tokens[4].kind, TokenKind::Semicolon));
//! assert!(matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)));
//! ```

mod scanner;
mod token;

pub mod operators;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};

use crate::error::Result;
use tracing::trace;

/// Tokenizes `source` completely, including the trailing `Eof` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = scanner.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }

    trace!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_ends_in_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_line_numbers_never_decrease() {
        let src = "let a = 1\n$* block\ncomment *$\nlet b = \"two\nlines\"\n\n\nprint a + b $$ tail\n";
        let tokens = tokenize(src).unwrap();
        assert!(tokens.windows(2).all(|pair| pair[0].line <= pair[1].line));
        assert_eq!(tokens.last().unwrap().line, 9);
    }

    #[test]
    fn test_tokenize_propagates_errors() {
        assert!(tokenize("let s = \"open").is_err());
    }
}
