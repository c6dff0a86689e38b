//! Operator tables for longest-match scanning.
//!
//! The scanner tries each table in turn, longest spelling first:
//!
//! | Width | Spellings |
//! |-------|-----------|
//! | 4 | `\|\|\|=` |
//! | 3 | `<<=` `>>=` `===` `!==` `**=` `//=` `\|\|=` `\|\|\|` `??=` |
//! | 2 | `^=` `+=` `-=` `->` `==` `!=` `~=` `*=` `**` `/=` `//` `%=` `<=` `<<` `<-` `>=` `>>` `&=` `\|=` `\|\|` `??` |
//! | 1 | `;` `(` `)` `[` `]` `{` `}` `.` `,` `^` `+` `-` `#` `!` `~` `*` `/` `%` `<` `>` `=` `&` `\|` `?` `:` |
//!
//! So `|||=` is a single token, and `a??=b` lexes as `a`, `??=`, `b`.

use super::TokenKind;

/// Widest operator spelling.
pub const MAX_WIDTH: usize = 4;

fn four_chars(text: &str) -> Option<TokenKind> {
    match text {
        "|||=" => Some(TokenKind::TriplePipeEqual),
        _ => None,
    }
}

fn three_chars(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "<<=" => TokenKind::DoubleLessEqual,
        ">>=" => TokenKind::DoubleGreaterEqual,
        "===" => TokenKind::TripleEqual,
        "!==" => TokenKind::BangDoubleEqual,
        "**=" => TokenKind::DoubleStarEqual,
        "//=" => TokenKind::DoubleSlashEqual,
        "||=" => TokenKind::DoublePipeEqual,
        "|||" => TokenKind::TriplePipe,
        "??=" => TokenKind::DoubleQuestionEqual,
        _ => return None,
    };
    Some(kind)
}

fn two_chars(text: &str) -> Option<TokenKind> {
    let kind = match text {
        "^=" => TokenKind::CaretEqual,
        "+=" => TokenKind::PlusEqual,
        "-=" => TokenKind::MinusEqual,
        "->" => TokenKind::Arrow,
        "==" => TokenKind::EqualEqual,
        "!=" => TokenKind::BangEqual,
        "~=" => TokenKind::TildeEqual,
        "*=" => TokenKind::StarEqual,
        "**" => TokenKind::DoubleStar,
        "/=" => TokenKind::SlashEqual,
        "//" => TokenKind::DoubleSlash,
        "%=" => TokenKind::PercentEqual,
        "<=" => TokenKind::LessEqual,
        "<<" => TokenKind::DoubleLess,
        "<-" => TokenKind::LeftArrow,
        ">=" => TokenKind::GreaterEqual,
        ">>" => TokenKind::DoubleGreater,
        "&=" => TokenKind::AmpersandEqual,
        "|=" => TokenKind::PipeEqual,
        "||" => TokenKind::DoublePipe,
        "??" => TokenKind::DoubleQuestion,
        _ => return None,
    };
    Some(kind)
}

fn one_char(text: &str) -> Option<TokenKind> {
    let kind = match text {
        ";" => TokenKind::Semicolon,
        "(" => TokenKind::LeftParen,
        ")" => TokenKind::RightParen,
        "[" => TokenKind::LeftBracket,
        "]" => TokenKind::RightBracket,
        "{" => TokenKind::LeftBrace,
        "}" => TokenKind::RightBrace,
        "." => TokenKind::Dot,
        "," => TokenKind::Comma,
        "^" => TokenKind::Caret,
        "+" => TokenKind::Plus,
        "-" => TokenKind::Minus,
        "#" => TokenKind::Hash,
        "!" => TokenKind::Bang,
        "~" => TokenKind::Tilde,
        "*" => TokenKind::Star,
        "/" => TokenKind::Slash,
        "%" => TokenKind::Percent,
        "<" => TokenKind::Less,
        ">" => TokenKind::Greater,
        "=" => TokenKind::Equal,
        "&" => TokenKind::Ampersand,
        "|" => TokenKind::Pipe,
        "?" => TokenKind::Question,
        ":" => TokenKind::Colon,
        _ => return None,
    };
    Some(kind)
}

/// Matches the longest operator or punctuation spelling at the start of
/// `rest`, returning the token kind and its width in bytes.
pub fn longest_match(rest: &str) -> Option<(TokenKind, usize)> {
    let tables: [(usize, fn(&str) -> Option<TokenKind>); MAX_WIDTH] = [
        (4, four_chars),
        (3, three_chars),
        (2, two_chars),
        (1, one_char),
    ];

    tables.iter().find_map(|&(width, table)| {
        rest.get(..width)
            .and_then(table)
            .map(|kind| (kind, width))
    })
}
