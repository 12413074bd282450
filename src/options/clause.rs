//! A parsed option together with the player's current picks.

use std::ops::Index;

use crate::catalog::Armoury;
use crate::options::resolver::{self, RenderContext, RenderedOption};
use crate::options::{parse_clause, OptionError, OptionExpr, SelectionError};
use crate::wargear::Wargear;

/// How a choice is identified when selecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Index(usize),
    Letter(char),
    Item(Wargear),
}

/// What to do when a selection would exceed the picks allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverselectPolicy {
    #[default]
    Reject,
    /// Drop the oldest pick to make room.
    EvictOldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pick {
    index: usize,
    count: u32,
}

#[derive(Debug, Clone)]
pub struct WargearOption {
    source: String,
    expr: OptionExpr,
    items_involved: Vec<Wargear>,
    header: String,
    picks: Vec<Pick>,
}

impl WargearOption {
    pub fn parse(armoury: &Armoury, clause: &str, ctx: &RenderContext<'_>) -> Result<Self, OptionError> {
        let expr = parse_clause(armoury, clause)?;
        Ok(Self::from_expr(clause.trim(), expr, ctx))
    }

    /// The header is rendered once against `ctx`, the wargear the option was offered for.
    pub fn from_expr(source: impl Into<String>, expr: OptionExpr, ctx: &RenderContext<'_>) -> Self {
        let items_involved = expr.leaves();
        let header = resolver::render_header(&expr, &items_involved, ctx);
        Self {
            source: source.into(),
            expr,
            items_involved,
            header,
            picks: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &OptionExpr {
        &self.expr
    }

    pub fn items_involved(&self) -> &[Wargear] {
        &self.items_involved
    }

    pub fn picks_allowed(&self) -> u32 {
        self.expr.picks_allowed()
    }

    pub fn models_required_per(&self) -> u32 {
        self.expr.models_required_per()
    }

    pub fn per_model(&self) -> bool {
        self.expr.per_model()
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.items_involved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items_involved.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Wargear> {
        self.items_involved.get(index)
    }

    pub fn index_of(&self, wargear: &Wargear) -> Option<usize> {
        self.items_involved.iter().position(|item| item == wargear)
    }

    /// Selected wargear with repeated picks folded into quantity.
    pub fn selected(&self) -> Vec<Wargear> {
        self.picks
            .iter()
            .filter_map(|pick| {
                self.items_involved
                    .get(pick.index)
                    .map(|item| if pick.count > 1 { item.times(pick.count) } else { item.clone() })
            })
            .collect()
    }

    /// Selected indices, one entry per pick.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.picks
            .iter()
            .flat_map(|pick| std::iter::repeat(pick.index).take(pick.count as usize))
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        !self.picks.is_empty()
    }

    pub fn total_picks(&self) -> u32 {
        self.picks.iter().map(|pick| pick.count).sum()
    }

    /// Distinct choices picked; this is what `picks_allowed` bounds.
    pub fn distinct_picks(&self) -> u32 {
        self.picks.len() as u32
    }

    fn is_picked(&self, index: usize) -> bool {
        self.picks.iter().any(|pick| pick.index == index)
    }

    fn resolve(&self, choice: &Selection) -> Result<usize, SelectionError> {
        let index = match choice {
            Selection::Index(index) => Some(*index),
            Selection::Letter(letter) => resolver::letter_index(*letter),
            Selection::Item(wargear) => self.index_of(wargear),
        };
        index
            .filter(|index| *index < self.items_involved.len())
            .ok_or_else(|| SelectionError::NotOffered {
                choice: match choice {
                    Selection::Index(index) => format!("choice {index}"),
                    Selection::Letter(letter) => format!("choice '{letter}'"),
                    Selection::Item(wargear) => format!("'{}'", wargear.label()),
                },
            })
    }

    pub fn select(&mut self, choice: Selection) -> Result<(), SelectionError> {
        self.select_with(choice, OverselectPolicy::Reject)
    }

    /// Records one pick. Picking the same choice again raises its quantity and never
    /// counts against the limit. With [`OverselectPolicy::Reject`] an over-limit pick
    /// leaves the selection untouched.
    pub fn select_with(&mut self, choice: Selection, policy: OverselectPolicy) -> Result<(), SelectionError> {
        let index = self.resolve(&choice)?;
        let attempted = self.distinct_picks() + u32::from(!self.is_picked(index));
        if attempted > self.picks_allowed() {
            match policy {
                OverselectPolicy::Reject => {
                    return Err(SelectionError::Overselection {
                        picks_allowed: self.picks_allowed(),
                        attempted,
                    })
                }
                OverselectPolicy::EvictOldest => self.evict_oldest(),
            }
        }
        self.add_pick(index);
        Ok(())
    }

    fn evict_oldest(&mut self) {
        if !self.picks.is_empty() {
            self.picks.remove(0);
        }
    }

    fn add_pick(&mut self, index: usize) {
        match self.picks.iter_mut().find(|pick| pick.index == index) {
            Some(pick) => pick.count += 1,
            None => self.picks.push(Pick { index, count: 1 }),
        }
    }

    /// Replaces the selection with `indices` without checking the pick limit;
    /// [`check_picks`](Self::check_picks) reports it later. Fails without changes on an
    /// index that is not offered.
    pub fn select_list(&mut self, indices: &[usize]) -> Result<(), SelectionError> {
        if let Some(bad) = indices.iter().find(|index| **index >= self.items_involved.len()) {
            return Err(SelectionError::NotOffered {
                choice: format!("choice {bad}"),
            });
        }
        self.picks.clear();
        for index in indices {
            self.add_pick(*index);
        }
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.picks.clear();
    }

    pub fn check_picks(&self) -> Result<(), SelectionError> {
        let attempted = self.distinct_picks();
        if attempted > self.picks_allowed() {
            return Err(SelectionError::Overselection {
                picks_allowed: self.picks_allowed(),
                attempted,
            });
        }
        Ok(())
    }

    /// Full text against `ctx`. Rendering never touches the selection.
    pub fn render(&self, ctx: &RenderContext<'_>) -> String {
        resolver::render(&self.expr, &self.items_involved, ctx)
    }

    pub fn describe(&self, index: usize, ctx: &RenderContext<'_>) -> RenderedOption {
        let exchange = resolver::exchange_target(&self.expr, &self.items_involved, ctx).map(Wargear::label);
        RenderedOption {
            index,
            header: resolver::render_header(&self.expr, &self.items_involved, ctx),
            picks_allowed: self.picks_allowed(),
            models_required_per: self.models_required_per(),
            per_model: self.per_model(),
            exchange,
            choices: resolver::describe_choices(&self.expr, &self.items_involved, ctx),
            selected: self.selected().iter().map(Wargear::label).collect(),
            text: self.render(ctx),
        }
    }
}

impl Index<usize> for WargearOption {
    type Output = Wargear;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items_involved[index]
    }
}
