// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the compiler pipeline.

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// The pipeline stage an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while tokenizing
    Lex,
    /// Raised while building the AST
    Parse,
    /// Raised while generating bytecode
    Compile,
    /// Raised while decoding an emitted module
    Bytecode,
}

/// Errors that can occur while compiling source text to module bytes.
///
/// Every stage fails fast: the first error aborts the compilation and is the
/// only one reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Character that starts no token
    #[error("LexError: unknown character '{ch}' (line {line})")]
    UnknownCharacter {
        /// The offending character
        ch: char,
        /// Source line
        line: usize,
    },

    /// String literal missing its closing quote
    #[error("LexError: unterminated string literal (line {line})")]
    UnterminatedString {
        /// Line where the string starts
        line: usize,
    },

    /// Backslash escape outside the escape table
    #[error("LexError: invalid escape sequence '\\{escape}' (line {line})")]
    InvalidEscape {
        /// Character following the backslash
        escape: char,
        /// Source line
        line: usize,
    },

    /// Block comment missing its closing `*$`
    #[error("LexError: unterminated block comment (line {line})")]
    UnterminatedComment {
        /// Line where the comment starts
        line: usize,
    },

    /// Numeric literal that is malformed or out of range
    #[error("LexError: invalid number literal '{literal}' (line {line})")]
    InvalidNumber {
        /// The literal text as written
        literal: String,
        /// Source line
        line: usize,
    },

    /// Token of the wrong kind
    #[error("ParseError: expected {expected}, found {found} (line {line})")]
    UnexpectedToken {
        /// Description of what the grammar required
        expected: String,
        /// Description of the token that was present
        found: String,
        /// Source line
        line: usize,
    },

    /// Left-hand side of `=` that is neither a variable nor an index
    #[error("ParseError: invalid assignment target (line {line})")]
    InvalidAssignmentTarget {
        /// Source line
        line: usize,
    },

    /// Reference to a name declared in no reachable scope
    #[error("CompileError: undeclared variable `{name}` (line {line})")]
    UndeclaredVariable {
        /// Variable name
        name: String,
        /// Source line
        line: usize,
    },

    /// Call to a name that is neither a builtin nor a declared function
    #[error("CompileError: undefined function `{name}` (line {line})")]
    UndefinedFunction {
        /// Function name
        name: String,
        /// Source line
        line: usize,
    },

    /// Second declaration of an existing function
    #[error("CompileError: invalid redefinition of function `{name}` (line {line})")]
    FunctionRedefinition {
        /// Function name
        name: String,
        /// Source line
        line: usize,
    },

    /// Function declared inside another function's body
    #[error("CompileError: cannot declare function `{name}` inside another function (line {line})")]
    NestedFunction {
        /// Function name
        name: String,
        /// Source line
        line: usize,
    },

    /// Call with the wrong number of arguments
    #[error("CompileError: `{name}` takes {expected} argument(s) but {found} were given (line {line})")]
    ArityMismatch {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
        /// Source line
        line: usize,
    },

    /// Method name missing from the method table
    #[error("CompileError: unknown method `{name}` (line {line})")]
    UnknownMethod {
        /// Method name
        name: String,
        /// Source line
        line: usize,
    },

    /// `return` at top level
    #[error("CompileError: return outside of function (line {line})")]
    ReturnOutsideFunction {
        /// Source line
        line: usize,
    },

    /// Parameter list naming the same parameter twice
    #[error("CompileError: duplicate parameter `{name}` (line {line})")]
    DuplicateParameter {
        /// Parameter name
        name: String,
        /// Source line
        line: usize,
    },

    /// More variables than a one-byte slot operand can address
    #[error("CompileError: too many variables in scope, `{name}` has no free slot (line {line})")]
    SlotOverflow {
        /// Name that could not be allocated
        name: String,
        /// Source line
        line: usize,
    },

    /// Module bytes that cannot be decoded
    #[error("BytecodeError: {message} at offset {offset}")]
    Bytecode {
        /// What went wrong
        message: String,
        /// Byte offset into the module
        offset: usize,
    },
}

impl Error {
    /// Returns the pipeline stage that produced this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownCharacter { .. }
            | Error::UnterminatedString { .. }
            | Error::InvalidEscape { .. }
            | Error::UnterminatedComment { .. }
            | Error::InvalidNumber { .. } => ErrorKind::Lex,
            Error::UnexpectedToken { .. } | Error::InvalidAssignmentTarget { .. } => {
                ErrorKind::Parse
            }
            Error::Bytecode { .. } => ErrorKind::Bytecode,
            _ => ErrorKind::Compile,
        }
    }

    /// Returns the source line the error refers to, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::UnknownCharacter { line, .. }
            | Error::UnterminatedString { line }
            | Error::InvalidEscape { line, .. }
            | Error::UnterminatedComment { line }
            | Error::InvalidNumber { line, .. }
            | Error::UnexpectedToken { line, .. }
            | Error::InvalidAssignmentTarget { line }
            | Error::UndeclaredVariable { line, .. }
            | Error::UndefinedFunction { line, .. }
            | Error::FunctionRedefinition { line, .. }
            | Error::NestedFunction { line, .. }
            | Error::ArityMismatch { line, .. }
            | Error::UnknownMethod { line, .. }
            | Error::ReturnOutsideFunction { line }
            | Error::DuplicateParameter { line, .. }
            | Error::SlotOverflow { line, .. } => Some(*line),
            Error::Bytecode { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_line() {
        let err = Error::UndeclaredVariable {
            name: "x".to_string(),
            line: 3,
        };
        assert_eq!(err.to_string(), "CompileError: undeclared variable `x` (line 3)");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_parse_error_names_expected_and_found() {
        let err = Error::UnexpectedToken {
            expected: "'{'".to_string(),
            found: "end of input".to_string(),
            line: 1,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("ParseError"));
        assert!(msg.contains("'{'"));
        assert!(msg.contains("end of input"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::UnterminatedString { line: 1 }.kind(), ErrorKind::Lex);
        assert_eq!(Error::InvalidAssignmentTarget { line: 1 }.kind(), ErrorKind::Parse);
        assert_eq!(Error::ReturnOutsideFunction { line: 1 }.kind(), ErrorKind::Compile);
        let bytecode = Error::Bytecode {
            message: "truncated".to_string(),
            offset: 4,
        };
        assert_eq!(bytecode.kind(), ErrorKind::Bytecode);
        assert_eq!(bytecode.line(), None);
    }
}
