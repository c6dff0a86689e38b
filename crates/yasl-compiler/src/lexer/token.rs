//! Token definitions for the YASL lexer.

use std::fmt;

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// The 1-based line the token starts on
    pub line: usize,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, line: usize) -> Self {
        Self { kind, span, line }
    }
}

/// The different kinds of tokens in YASL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Int(i64),
    /// Floating point literal
    Float(f64),
    /// `true` or `false`
    Bool(bool),
    /// String literal, escapes already resolved
    Str(String),
    /// `undef`
    Undef,

    // Identifiers and Keywords
    /// Identifier
    Identifier(String),

    // Keywords
    Let,
    Print,
    If,
    Elseif,
    Else,
    While,
    Func,
    Return,
    And,
    Or,

    // Punctuation
    /// `;`, also produced for an implicit terminator on newline
    Semicolon,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Dot,
    Comma,
    Colon,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    Hash,
    Bang,
    Tilde,
    Caret,
    Ampersand,
    Pipe,
    DoublePipe,
    TriplePipe,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    DoubleLess,
    DoubleGreater,
    EqualEqual,
    TripleEqual,
    BangEqual,
    BangDoubleEqual,
    Question,
    DoubleQuestion,
    /// `->`
    Arrow,
    /// `<-`
    LeftArrow,

    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    DoubleSlashEqual,
    PercentEqual,
    DoubleStarEqual,
    CaretEqual,
    AmpersandEqual,
    PipeEqual,
    TildeEqual,
    DoubleLessEqual,
    DoubleGreaterEqual,
    DoublePipeEqual,
    TriplePipeEqual,
    DoubleQuestionEqual,

    // Special
    /// End of input
    Eof,
}

impl TokenKind {
    /// Returns true if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Print
                | TokenKind::If
                | TokenKind::Elseif
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Func
                | TokenKind::Return
                | TokenKind::And
                | TokenKind::Or
        )
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Bool(_)
                | TokenKind::Str(_)
                | TokenKind::Undef
        )
    }

    /// Returns true if a newline directly after this token terminates the
    /// current statement.
    pub fn ends_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Bool(_)
                | TokenKind::Undef
                | TokenKind::Identifier(_)
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
        )
    }

    /// Returns the keyword token for `word`, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "let" => TokenKind::Let,
            "print" => TokenKind::Print,
            "if" => TokenKind::If,
            "elseif" => TokenKind::Elseif,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "func" => TokenKind::Func,
            "return" => TokenKind::Return,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "undef" => TokenKind::Undef,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the source spelling of fixed-text tokens.
    pub fn lexeme(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Undef => "undef",
            TokenKind::Let => "let",
            TokenKind::Print => "print",
            TokenKind::If => "if",
            TokenKind::Elseif => "elseif",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Func => "func",
            TokenKind::Return => "return",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Semicolon => ";",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::DoubleStar => "**",
            TokenKind::Hash => "#",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Caret => "^",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::DoublePipe => "||",
            TokenKind::TriplePipe => "|||",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::DoubleLess => "<<",
            TokenKind::DoubleGreater => ">>",
            TokenKind::EqualEqual => "==",
            TokenKind::TripleEqual => "===",
            TokenKind::BangEqual => "!=",
            TokenKind::BangDoubleEqual => "!==",
            TokenKind::Question => "?",
            TokenKind::DoubleQuestion => "??",
            TokenKind::Arrow => "->",
            TokenKind::LeftArrow => "<-",
            TokenKind::Equal => "=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::SlashEqual => "/=",
            TokenKind::DoubleSlashEqual => "//=",
            TokenKind::PercentEqual => "%=",
            TokenKind::DoubleStarEqual => "**=",
            TokenKind::CaretEqual => "^=",
            TokenKind::AmpersandEqual => "&=",
            TokenKind::PipeEqual => "|=",
            TokenKind::TildeEqual => "~=",
            TokenKind::DoubleLessEqual => "<<=",
            TokenKind::DoubleGreaterEqual => ">>=",
            TokenKind::DoublePipeEqual => "||=",
            TokenKind::TriplePipeEqual => "|||=",
            TokenKind::DoubleQuestionEqual => "??=",
            TokenKind::Int(_)
            | TokenKind::Float(_)
            | TokenKind::Bool(_)
            | TokenKind::Str(_)
            | TokenKind::Identifier(_)
            | TokenKind::Eof => return None,
        };
        Some(text)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "integer {}", n),
            TokenKind::Float(n) => write!(f, "float {}", n),
            TokenKind::Bool(b) => write!(f, "boolean {}", b),
            TokenKind::Str(s) => write!(f, "string {:?}", s),
            TokenKind::Identifier(name) => write!(f, "identifier `{}`", name),
            TokenKind::Eof => write!(f, "end of input"),
            other => match other.lexeme() {
                Some(text) => write!(f, "'{}'", text),
                None => write!(f, "{:?}", other),
            },
        }
    }
}
