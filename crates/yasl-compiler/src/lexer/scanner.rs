//! The scanner that produces tokens from source text.

use super::{operators, Span, Token, TokenKind};
use crate::error::{Error, Result};

/// A scanner that tokenizes YASL source code.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    /// Whether the last emitted token may end a statement on newline
    pending_end: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            pending_end: false,
        }
    }

    /// Returns the next token from the source.
    ///
    /// Once the input is exhausted every call returns [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Result<Token> {
        if let Some(terminator) = self.skip_whitespace_and_comments()? {
            return Ok(terminator);
        }

        let start = self.pos;
        let line = self.line;

        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start, line));
        };

        let kind = match ch {
            '"' => self.scan_string()?,
            '0'..='9' => self.scan_number()?,
            _ if is_id_start(ch) => self.scan_identifier(),
            _ => match operators::longest_match(self.rest()) {
                Some((kind, width)) => {
                    self.pos += width;
                    kind
                }
                None => return Err(Error::UnknownCharacter { ch, line }),
            },
        };

        Ok(self.token(kind, start, line))
    }

    fn token(&mut self, kind: TokenKind, start: usize, line: usize) -> Token {
        self.pending_end = kind.ends_statement();
        Token::new(kind, Span::new(start, self.pos), line)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    /// Skips blanks and comments. Returns an implicit terminator when a
    /// newline follows a token that may end a statement.
    fn skip_whitespace_and_comments(&mut self) -> Result<Option<Token>> {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    let start = self.pos;
                    let line = self.line;
                    self.advance();
                    self.line += 1;
                    if self.pending_end {
                        return Ok(Some(self.token(TokenKind::Semicolon, start, line)));
                    }
                }
                Some('$') => match self.peek_next() {
                    Some('$') => {
                        // Line comment: the newline itself is left in place
                        while let Some(ch) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        let start = self.pos;
                        let line = self.line;
                        self.advance();
                        self.advance();
                        let mut crossed_newline = false;
                        loop {
                            match self.advance() {
                                None => return Err(Error::UnterminatedComment { line }),
                                Some('\n') => {
                                    self.line += 1;
                                    crossed_newline = true;
                                }
                                Some('*') if self.peek() == Some('$') => {
                                    self.advance();
                                    break;
                                }
                                Some(_) => {}
                            }
                        }
                        if crossed_newline && self.pending_end {
                            return Ok(Some(self.token(TokenKind::Semicolon, start, line)));
                        }
                    }
                    _ => return Ok(None),
                },
                _ => return Ok(None),
            }
        }
    }

    fn scan_string(&mut self) -> Result<TokenKind> {
        let line = self.line;
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                None => return Err(Error::UnterminatedString { line }),
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(other) => {
                            return Err(Error::InvalidEscape {
                                escape: other,
                                line: self.line,
                            });
                        }
                        None => return Err(Error::UnterminatedString { line }),
                    };
                    value.push(escaped);
                }
                Some('\n') => {
                    self.line += 1;
                    value.push('\n');
                }
                Some(ch) => value.push(ch),
            }
        }

        Ok(TokenKind::Str(value))
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let line = self.line;

        if self.peek() == Some('0') {
            let radix = match self.peek_next() {
                Some('x') => Some(16),
                Some('b') => Some(2),
                Some('o') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance(); // consume '0'
                self.advance(); // consume radix marker
                let digits = self.take_digits(radix);
                // Radix literals denote a 64-bit pattern, so 0xffff_ffff_ffff_ffff is -1
                return u64::from_str_radix(&digits, radix)
                    .map(|n| TokenKind::Int(n as i64))
                    .map_err(|_| self.invalid_number(start, line));
            }
        }

        let integer = self.take_digits(10);

        // A dot only continues the literal when a digit follows it
        if self.peek() == Some('.') && self.peek_next().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance(); // consume '.'
            let fraction = self.take_digits(10);
            return format!("{}.{}", integer, fraction)
                .parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.invalid_number(start, line));
        }

        integer
            .parse::<i64>()
            .map(TokenKind::Int)
            .map_err(|_| self.invalid_number(start, line))
    }

    /// Consumes digits of `radix`, dropping `_` separators.
    fn take_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                digits.push(ch);
            } else if ch != '_' {
                break;
            }
            self.advance();
        }
        digits
    }

    fn invalid_number(&self, start: usize, line: usize) -> Error {
        Error::InvalidNumber {
            literal: self.source[start..self.pos].to_string(),
            line,
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                self.advance();
            } else {
                break;
            }
        }

        let name = &self.source[start..self.pos];
        TokenKind::keyword(name).unwrap_or_else(|| TokenKind::Identifier(name.to_string()))
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(src);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token().unwrap();
            if token.kind == TokenKind::Eof {
                break;
            }
            kinds.push(token.kind);
        }
        kinds
    }

    fn scan_err(src: &str) -> Error {
        let mut scanner = Scanner::new(src);
        loop {
            match scanner.next_token() {
                Ok(token) if token.kind == TokenKind::Eof => panic!("expected a lex error"),
                Ok(_) => continue,
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn test_simple_tokens() {
        let mut scanner = Scanner::new("{ } ( )");
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::LeftBrace));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::RightBrace));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::LeftParen));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::RightParen));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Eof));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Eof));
    }

    #[test]
    fn test_numbers() {
        let mut scanner = Scanner::new("42 3.25 0xff 0b1010 0o17 1_000_000 0xdead_beef");
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(42)));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Float(n) if n == 3.25));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(255)));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(10)));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(15)));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(1_000_000)));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Int(0xdead_beef)));
    }

    #[test]
    fn test_integer_followed_by_dot() {
        assert_eq!(
            kinds("5.tostr()"),
            vec![
                TokenKind::Int(5),
                TokenKind::Dot,
                TokenKind::Identifier("tostr".to_string()),
                TokenKind::LeftParen,
                TokenKind::RightParen,
            ]
        );
        assert_eq!(kinds("5."), vec![TokenKind::Int(5), TokenKind::Dot]);
    }

    #[test]
    fn test_hex_requires_digits() {
        assert!(matches!(scan_err("0x"), Error::InvalidNumber { .. }));
        assert!(matches!(scan_err("0x_"), Error::InvalidNumber { .. }));
    }

    #[test]
    fn test_hex_full_width_pattern() {
        assert_eq!(kinds("0xffff_ffff_ffff_ffff"), vec![TokenKind::Int(-1)]);
    }

    #[test]
    fn test_integer_overflow() {
        let err = scan_err("99999999999999999999");
        assert!(matches!(err, Error::InvalidNumber { line: 1, .. }));
    }

    #[test]
    fn test_strings() {
        let mut scanner = Scanner::new(r#""hello" "a\tb\n\"q\"\\""#);
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Str(s) if s == "hello"));
        assert!(
            matches!(scanner.next_token().unwrap().kind, TokenKind::Str(s) if s == "a\tb\n\"q\"\\")
        );
    }

    #[test]
    fn test_invalid_escape() {
        let err = scan_err(r#""bad \q escape""#);
        assert_eq!(err, Error::InvalidEscape { escape: 'q', line: 1 });
    }

    #[test]
    fn test_unterminated_string() {
        let err = scan_err("\n\"never closed");
        assert_eq!(err, Error::UnterminatedString { line: 2 });
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("let print if elseif else while func return and or"),
            vec![
                TokenKind::Let,
                TokenKind::Print,
                TokenKind::If,
                TokenKind::Elseif,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Func,
                TokenKind::Return,
                TokenKind::And,
                TokenKind::Or,
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        let mut scanner = Scanner::new("foo _bar baz9 naïve");
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Identifier(s) if s == "foo"));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Identifier(s) if s == "_bar"));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Identifier(s) if s == "baz9"));
        assert!(matches!(scanner.next_token().unwrap().kind, TokenKind::Identifier(s) if s == "naïve"));
    }

    #[test]
    fn test_implicit_terminator_after_identifier() {
        assert_eq!(
            kinds("x\ny"),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Semicolon,
                TokenKind::Identifier("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_terminator_after_operator() {
        assert_eq!(
            kinds("x +\ny"),
            vec![
                TokenKind::Identifier("x".to_string()),
                TokenKind::Plus,
                TokenKind::Identifier("y".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_terminator_after_open_brace() {
        assert_eq!(
            kinds("{\n}\n"),
            vec![TokenKind::LeftBrace, TokenKind::RightBrace, TokenKind::Semicolon]
        );
    }

    #[test]
    fn test_blank_lines_produce_one_terminator() {
        assert_eq!(
            kinds("x\n\n\n"),
            vec![TokenKind::Identifier("x".to_string()), TokenKind::Semicolon]
        );
    }

    #[test]
    fn test_line_comments() {
        assert_eq!(
            kinds("42 $$ this is a comment\n43"),
            vec![TokenKind::Int(42), TokenKind::Semicolon, TokenKind::Int(43)]
        );
    }

    #[test]
    fn test_block_comments() {
        assert_eq!(
            kinds("1 $* comment *$ 2"),
            vec![TokenKind::Int(1), TokenKind::Int(2)]
        );
        assert_eq!(
            kinds("1 $* multi\nline *$ 2"),
            vec![TokenKind::Int(1), TokenKind::Semicolon, TokenKind::Int(2)]
        );
    }

    #[test]
    fn test_block_comment_advances_line() {
        let mut scanner = Scanner::new("+ $* a\nb\nc *$ x");
        assert_eq!(scanner.next_token().unwrap().line, 1);
        let x = scanner.next_token().unwrap();
        assert!(matches!(x.kind, TokenKind::Identifier(_)));
        assert_eq!(x.line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(scan_err("$* open"), Error::UnterminatedComment { line: 1 });
    }

    #[test]
    fn test_unknown_character() {
        assert_eq!(scan_err("let x = @"), Error::UnknownCharacter { ch: '@', line: 1 });
        assert_eq!(scan_err("$x"), Error::UnknownCharacter { ch: '$', line: 1 });
    }

    #[test]
    fn test_division_and_integer_division() {
        assert_eq!(
            kinds("6 / 2 // 1"),
            vec![
                TokenKind::Int(6),
                TokenKind::Slash,
                TokenKind::Int(2),
                TokenKind::DoubleSlash,
                TokenKind::Int(1),
            ]
        );
    }

    #[test]
    fn test_token_spans() {
        let mut scanner = Scanner::new("let abc");
        let let_kw = scanner.next_token().unwrap();
        let name = scanner.next_token().unwrap();
        assert_eq!(let_kw.span, Span::new(0, 3));
        assert_eq!(name.span, Span::new(4, 7));
    }
}
