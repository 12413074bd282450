//! Scanner for option clauses.
//!
//! Item names may contain spaces and hyphens, so a hyphen is only read as the
//! per-model operator when the text before it is a complete armoury entry. Each
//! name run is matched longest-first: the whole run, then every prefix that ends
//! just before a hyphen.

use std::fmt;

use crate::catalog::Armoury;
use crate::options::OptionError;
use crate::wargear::Item;

/// Largest count, pick limit or model multiple a clause may state.
pub const MAX_NUMBER: u32 = 999;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Item(Item),
    Number(u32),
    Plus,
    Minus,
    Star,
    Slash,
    Hash,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(item) => write!(f, "item '{}'", item.name()),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Plus => write!(f, "'+'"),
            Self::Minus => write!(f, "'-'"),
            Self::Star => write!(f, "'*'"),
            Self::Slash => write!(f, "'/'"),
            Self::Hash => write!(f, "'#'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token start.
    pub position: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == ' ' || c == '-'
}

pub struct Lexer<'a> {
    armoury: &'a Armoury,
    source: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(armoury: &'a Armoury, source: &'a str) -> Self {
        Self {
            armoury,
            source,
            position: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, OptionError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token?);
        }
        Ok(tokens)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.position..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.position += rest.len() - rest.trim_start().len();
    }

    fn next_token(&mut self) -> Option<Result<Token, OptionError>> {
        self.skip_whitespace();
        let start = self.position;
        let ch = self.rest().chars().next()?;
        let single = match ch {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '#' => Some(TokenKind::Hash),
            _ => None,
        };
        if let Some(kind) = single {
            self.position += 1;
            return Some(Ok(Token {
                kind,
                position: start,
            }));
        }
        if ch.is_ascii_digit() {
            return Some(self.number(start));
        }
        if ch.is_alphabetic() {
            return Some(self.item(start));
        }
        Some(Err(OptionError::UnexpectedCharacter {
            ch,
            position: start,
        }))
    }

    /// `0` or a digit run without a leading zero, at most [`MAX_NUMBER`].
    fn number(&mut self, start: usize) -> Result<Token, OptionError> {
        let rest = self.rest();
        let len = if rest.starts_with('0') {
            1
        } else {
            rest.bytes().take_while(u8::is_ascii_digit).count()
        };
        let text = &rest[..len];
        self.position += len;
        let value = text
            .parse::<u32>()
            .ok()
            .filter(|value| *value <= MAX_NUMBER)
            .ok_or_else(|| OptionError::NumberOutOfRange {
                text: text.to_string(),
                position: start,
            })?;
        Ok(Token {
            kind: TokenKind::Number(value),
            position: start,
        })
    }

    fn item(&mut self, start: usize) -> Result<Token, OptionError> {
        let rest = self.rest();
        let run_len = rest
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map_or(rest.len(), |(index, _)| index);
        let run = &rest[..run_len];

        let hyphens = run
            .char_indices()
            .rev()
            .filter(|(_, c)| *c == '-')
            .map(|(index, _)| index);
        for end in std::iter::once(run.len()).chain(hyphens) {
            let candidate = run[..end].trim_end();
            if candidate.is_empty() {
                continue;
            }
            if let Ok(entry) = self.armoury.lookup(candidate) {
                self.position = start + candidate.len();
                let item = Item::new(entry.name.clone(), entry.cost, entry.category);
                return Ok(Token {
                    kind: TokenKind::Item(item),
                    position: start,
                });
            }
        }
        Err(OptionError::UnknownItem {
            name: run.trim_end().to_string(),
            position: start,
        })
    }
}

pub fn tokenize(armoury: &Armoury, source: &str) -> Result<Vec<Token>, OptionError> {
    Lexer::new(armoury, source).tokenize()
}
