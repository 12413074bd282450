//! Pratt parser for option clauses.
//!
//! Binding powers, loosest first (all left-associative):
//!
//! | op  | meaning                                   | power |
//! |-----|-------------------------------------------|-------|
//! | `#` | `K#expr`: pick K times from expr          | 10    |
//! | `-` | `expr-N` per N models, `expr-` per model  | 20    |
//! | `/` | alternatives                              | 30    |
//! | `+` | bundle                                    | 40    |
//! | `*` | `N*item`: N copies                        | 50    |
//!
//! Shape rules: `/` and `+` take plain wargear on both sides, `*` takes a single
//! item, `-` applies once to wargear or a choice, and `#` only at the outermost
//! level. Violations surface as [`OptionError::UnexpectedToken`] at the operator.

use crate::catalog::Armoury;
use crate::options::lexer::{tokenize, Token, TokenKind};
use crate::options::OptionError;
use crate::wargear::{CompositeItem, Item, Wargear};

const BP_HASH: u8 = 10;
const BP_MINUS: u8 = 20;
const BP_SLASH: u8 = 30;
const BP_PLUS: u8 = 40;
const BP_STAR: u8 = 50;

/// Parsed form of one option clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionExpr {
    Item(Item),
    Bundle(CompositeItem),
    /// Alternatives in source order; nested choices are flattened.
    Choice(Vec<OptionExpr>),
    /// `per: Some(n)` is "for every n models"; `None` is "any model".
    PerModels {
        inner: Box<OptionExpr>,
        per: Option<u32>,
    },
    Picks {
        count: u32,
        inner: Box<OptionExpr>,
    },
}

impl OptionExpr {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Item(_) | Self::Bundle(_))
    }

    pub fn as_wargear(&self) -> Option<Wargear> {
        match self {
            Self::Item(item) => Some(Wargear::Item(item.clone())),
            Self::Bundle(bundle) => Some(Wargear::Composite(bundle.clone())),
            _ => None,
        }
    }

    /// Every piece of wargear the clause mentions, left to right.
    pub fn leaves(&self) -> Vec<Wargear> {
        let mut leaves = Vec::new();
        self.collect_leaves(&mut leaves);
        leaves
    }

    fn collect_leaves(&self, out: &mut Vec<Wargear>) {
        match self {
            Self::Item(_) | Self::Bundle(_) => out.extend(self.as_wargear()),
            Self::Choice(alternatives) => {
                for alternative in alternatives {
                    alternative.collect_leaves(out);
                }
            }
            Self::PerModels { inner, .. } | Self::Picks { inner, .. } => inner.collect_leaves(out),
        }
    }

    pub fn has_choice(&self) -> bool {
        match self {
            Self::Choice(_) => true,
            Self::PerModels { inner, .. } | Self::Picks { inner, .. } => inner.has_choice(),
            _ => false,
        }
    }

    pub fn picks_allowed(&self) -> u32 {
        match self {
            Self::Picks { count, .. } => *count,
            _ => 1,
        }
    }

    /// N for "for every N models"; 1 otherwise.
    pub fn models_required_per(&self) -> u32 {
        match self {
            Self::PerModels { per: Some(n), .. } => *n,
            Self::Picks { inner, .. } => inner.models_required_per(),
            _ => 1,
        }
    }

    pub fn per_model(&self) -> bool {
        match self {
            Self::PerModels { per: None, .. } => true,
            Self::Picks { inner, .. } => inner.per_model(),
            _ => false,
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    source_len: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, source_len: usize) -> Self {
        Self {
            tokens,
            cursor: 0,
            source_len,
        }
    }

    pub fn parse(mut self) -> Result<OptionExpr, OptionError> {
        let expr = self.expression(0)?;
        match self.peek() {
            Some(token) => Err(unexpected(token)),
            None => Ok(expr),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Result<Token, OptionError> {
        let token = self
            .tokens
            .get(self.cursor)
            .cloned()
            .ok_or(OptionError::UnexpectedEnd {
                position: self.source_len,
            })?;
        self.cursor += 1;
        Ok(token)
    }

    fn expression(&mut self, min_bp: u8) -> Result<OptionExpr, OptionError> {
        let mut left = self.prefix(min_bp)?;
        while let Some(token) = self.peek() {
            let bp = match token.kind {
                TokenKind::Plus => BP_PLUS,
                TokenKind::Slash => BP_SLASH,
                TokenKind::Minus => BP_MINUS,
                _ => return Err(unexpected(token)),
            };
            if bp <= min_bp {
                break;
            }
            let operator = self.advance()?;
            left = match operator.kind {
                TokenKind::Plus => self.bundle(left, &operator)?,
                TokenKind::Slash => self.choice(left, &operator)?,
                _ => self.per_models(left, &operator)?,
            };
        }
        Ok(left)
    }

    fn prefix(&mut self, min_bp: u8) -> Result<OptionExpr, OptionError> {
        let token = self.advance()?;
        let count = match token.kind {
            TokenKind::Item(item) => return Ok(OptionExpr::Item(item)),
            TokenKind::Number(n) => n,
            _ => return Err(unexpected(&token)),
        };
        let operator = self.advance()?;
        match operator.kind {
            TokenKind::Star => {
                if count == 0 {
                    return Err(unexpected(&token));
                }
                match self.expression(BP_STAR)? {
                    OptionExpr::Item(item) => Ok(OptionExpr::Item(item.times(count))),
                    _ => Err(unexpected(&operator)),
                }
            }
            TokenKind::Hash => {
                if min_bp >= BP_HASH {
                    return Err(unexpected(&operator));
                }
                if count == 0 {
                    return Err(unexpected(&token));
                }
                let inner = self.expression(BP_HASH)?;
                Ok(OptionExpr::Picks {
                    count,
                    inner: Box::new(inner),
                })
            }
            _ => Err(unexpected(&operator)),
        }
    }

    fn bundle(&mut self, left: OptionExpr, operator: &Token) -> Result<OptionExpr, OptionError> {
        let right = self.expression(BP_PLUS)?;
        match (left.as_wargear(), right.as_wargear()) {
            (Some(left), Some(right)) => match left.bundle(right) {
                Wargear::Composite(bundle) => Ok(OptionExpr::Bundle(bundle)),
                Wargear::Item(item) => Ok(OptionExpr::Item(item)),
            },
            _ => Err(unexpected(operator)),
        }
    }

    fn choice(&mut self, left: OptionExpr, operator: &Token) -> Result<OptionExpr, OptionError> {
        let mut alternatives = match left {
            OptionExpr::Choice(alternatives) => alternatives,
            leaf if leaf.is_leaf() => vec![leaf],
            _ => return Err(unexpected(operator)),
        };
        let right = self.expression(BP_SLASH)?;
        if !right.is_leaf() {
            return Err(unexpected(operator));
        }
        alternatives.push(right);
        Ok(OptionExpr::Choice(alternatives))
    }

    fn per_models(&mut self, left: OptionExpr, operator: &Token) -> Result<OptionExpr, OptionError> {
        if !(left.is_leaf() || matches!(left, OptionExpr::Choice(_))) {
            return Err(unexpected(operator));
        }
        let per = match self.peek().map(|token| &token.kind) {
            Some(TokenKind::Number(n)) => {
                let n = *n;
                let number = self.advance()?;
                if n == 0 {
                    return Err(unexpected(&number));
                }
                Some(n)
            }
            _ => None,
        };
        Ok(OptionExpr::PerModels {
            inner: Box::new(left),
            per,
        })
    }
}

fn unexpected(token: &Token) -> OptionError {
    OptionError::UnexpectedToken {
        token: token.kind.to_string(),
        position: token.position,
    }
}

/// Parses one clause (no commas) against the armoury.
pub fn parse_clause(armoury: &Armoury, clause: &str) -> Result<OptionExpr, OptionError> {
    let tokens = tokenize(armoury, clause)?;
    Parser::new(tokens, clause.len()).parse()
}

/// Parses a loadout entry such as `Gauss blaster`, `2*Heat ray` or `Voidblade+Dispersion shield`.
pub fn parse_wargear(armoury: &Armoury, entry: &str) -> Result<Wargear, OptionError> {
    parse_clause(armoury, entry)?
        .as_wargear()
        .ok_or_else(|| OptionError::NotWargear {
            entry: entry.trim().to_string(),
        })
}

/// Splits a catalog option entry into its comma-separated clauses.
pub fn split_clauses(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|clause| !clause.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wargear::Category;

    fn armoury() -> Armoury {
        Armoury::new()
            .with_item("Warscythe", 11, Category::Melee)
            .with_item("Voidblade", 0, Category::Melee)
            .with_item("Dispersion shield", 10, Category::Other)
            .with_item("Hyperphase sword", 11, Category::Melee)
            .with_item("Gauss cannon", 20, Category::Ranged)
            .with_item("Heavy gauss cannon", 27, Category::Ranged)
            .with_item("Heat ray", 54, Category::Ranged)
    }

    fn parse(clause: &str) -> Result<OptionExpr, OptionError> {
        parse_clause(&armoury(), clause)
    }

    #[test]
    fn bundle_binds_tighter_than_choice() {
        let expr = parse("Warscythe/Voidblade+Dispersion shield").unwrap();
        let OptionExpr::Choice(alternatives) = &expr else {
            panic!("expected a choice, got {expr:?}");
        };
        assert_eq!(alternatives.len(), 2);
        assert!(matches!(alternatives[1], OptionExpr::Bundle(_)));
        assert_eq!(expr.leaves()[1].cost(), 10);
    }

    #[test]
    fn choices_flatten_left_to_right() {
        let expr = parse("Warscythe/Voidblade/Gauss cannon").unwrap();
        let names: Vec<String> = expr.leaves().iter().map(Wargear::name).collect();
        assert_eq!(names, vec!["Warscythe", "Voidblade", "Gauss cannon"]);
    }

    #[test]
    fn per_models_wraps_whole_choice() {
        let expr = parse("Gauss cannon/Heavy gauss cannon-3").unwrap();
        assert_eq!(expr.models_required_per(), 3);
        assert!(!expr.per_model());
        assert!(matches!(&expr, OptionExpr::PerModels { inner, per: Some(3) } if inner.has_choice()));

        let any = parse("Gauss cannon-").unwrap();
        assert!(any.per_model());
        assert_eq!(any.models_required_per(), 1);
    }

    #[test]
    fn hash_is_loosest() {
        let expr = parse("2#Gauss cannon/Heat ray-5").unwrap();
        assert_eq!(expr.picks_allowed(), 2);
        assert_eq!(expr.models_required_per(), 5);
        assert_eq!(expr.leaves().len(), 2);
    }

    #[test]
    fn star_multiplies_single_items() {
        let expr = parse("2*Heat ray").unwrap();
        let wargear = expr.as_wargear().unwrap();
        assert_eq!(wargear.cost(), 108);
        assert_eq!(wargear.label(), "2 Heat rays");
    }

    #[test]
    fn shape_violations_point_at_the_operator() {
        assert_eq!(
            parse("Warscythe/Gauss cannon-2/Heat ray"),
            Err(OptionError::UnexpectedToken {
                token: "'/'".to_string(),
                position: 24
            })
        );
        assert_eq!(
            parse("Warscythe-2-3"),
            Err(OptionError::UnexpectedToken {
                token: "'-'".to_string(),
                position: 11
            })
        );
        assert_eq!(
            parse("Warscythe/2#Heat ray"),
            Err(OptionError::UnexpectedToken {
                token: "'#'".to_string(),
                position: 11
            })
        );
        assert!(matches!(parse("0*Heat ray"), Err(OptionError::UnexpectedToken { position: 0, .. })));
    }

    #[test]
    fn trailing_and_missing_tokens() {
        assert_eq!(parse(""), Err(OptionError::UnexpectedEnd { position: 0 }));
        assert_eq!(parse("Warscythe/"), Err(OptionError::UnexpectedEnd { position: 10 }));
        assert_eq!(
            parse("Warscythe 3"),
            Err(OptionError::UnknownItem {
                name: "Warscythe 3".to_string(),
                position: 0
            })
        );
        assert_eq!(
            parse("Warscythe*2"),
            Err(OptionError::UnexpectedToken {
                token: "'*'".to_string(),
                position: 9
            })
        );
    }

    #[test]
    fn wargear_entries_must_be_plain() {
        let armoury = armoury();
        let sword = parse_wargear(&armoury, "Hyperphase sword+Dispersion shield").unwrap();
        assert_eq!(sword.cost(), 21);
        assert_eq!(
            parse_wargear(&armoury, "Warscythe/Voidblade"),
            Err(OptionError::NotWargear {
                entry: "Warscythe/Voidblade".to_string()
            })
        );
    }

    #[test]
    fn clauses_split_on_commas() {
        let clauses: Vec<&str> = split_clauses("Warscythe/Voidblade, Heat ray-,").collect();
        assert_eq!(clauses, vec!["Warscythe/Voidblade", "Heat ray-"]);
    }
}
