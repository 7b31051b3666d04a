//! Tokenizer for calculator expressions.
//!
//! Turns source text into a flat list of [`Token`]s terminated by
//! [`TokenKind::End`]. Only characters that can appear in a valid expression
//! are accepted; anything else is rejected here, before parsing.

use std::fmt;

use super::error::LexError;

/// A classified lexical unit.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "number {}", n),
            Self::Ident(name) => write!(f, "name '{}'", name),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Star => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::Caret => write!(f, "'^'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
            Self::End => write!(f, "end of input"),
        }
    }
}

/// A token together with the character offset where it starts.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Split `source` into tokens.
///
/// Numbers accept an optional fractional part and exponent (`1.5`, `.5`,
/// `2e10`, `3E-2`). An `e` that is not followed by digits ends the number, so
/// `2e` lexes as the number `2` followed by the identifier `e`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token { kind, position: i });
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            tokens.push(Token {
                kind: TokenKind::Ident(name),
                position: start,
            });
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()));
        if starts_number {
            let start = i;
            i = scan_number(&chars, i);
            let text: String = chars[start..i].iter().collect();
            // The scanned text is always a valid float literal.
            let value = text.parse::<f64>().map_err(|_| LexError {
                position: start,
                character: c,
            })?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                position: start,
            });
            continue;
        }

        return Err(LexError {
            position: i,
            character: c,
        });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        position: chars.len(),
    });
    Ok(tokens)
}

/// Return the index one past the end of the number starting at `i`.
fn scan_number(chars: &[char], mut i: usize) -> usize {
    let digits = |chars: &[char], mut i: usize| {
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    i = digits(chars, i);
    if chars.get(i) == Some(&'.') {
        i = digits(chars, i + 1);
    }

    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
            i = digits(chars, j);
        }
    }

    i
}
