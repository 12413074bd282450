//! Wargear option grammar: lexing, parsing, rendering and selection.
//!
//! A catalog option entry such as `"Gauss cannon/Heavy gauss cannon-3"` is split
//! into comma-separated clauses; each clause is tokenized against the armoury,
//! parsed into an [`OptionExpr`] and wrapped in a [`WargearOption`] that tracks
//! what the player picked.

pub mod clause;
mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;

pub use clause::{OverselectPolicy, Selection, WargearOption};
pub use error::{OptionError, SelectionError};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse_clause, parse_wargear, split_clauses, OptionExpr, Parser};
pub use resolver::{RenderContext, RenderedChoice, RenderedOption, Scope};

use crate::catalog::Armoury;

/// Outcome of parsing one clause of a catalog option entry.
#[derive(Debug, Clone)]
pub struct ParsedClause {
    pub clause: String,
    pub result: Result<WargearOption, OptionError>,
}

/// Parses every clause of every entry, keeping failures alongside successes so a
/// caller can decide whether one bad clause should sink the rest.
pub fn parse_options(armoury: &Armoury, entries: &[String], ctx: &RenderContext<'_>) -> Vec<ParsedClause> {
    entries
        .iter()
        .flat_map(|entry| split_clauses(entry))
        .map(|clause| ParsedClause {
            clause: clause.to_string(),
            result: WargearOption::parse(armoury, clause, ctx),
        })
        .collect()
}
