//! Turns a parsed clause into the text a player reads.
//!
//! Rendering depends on the wargear the option is offered against: when one of the
//! clause's items is already carried, the option reads as an exchange and every
//! choice shows its net point change instead of its absolute cost.

use serde::Serialize;

use crate::options::OptionExpr;
use crate::wargear::Wargear;

/// Who the option is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// A multi-model unit.
    Unit,
    /// A single model, e.g. a character.
    Model,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub wargear: &'a [Wargear],
    pub scope: Scope,
}

impl<'a> RenderContext<'a> {
    pub fn unit(wargear: &'a [Wargear]) -> Self {
        Self {
            wargear,
            scope: Scope::Unit,
        }
    }

    pub fn model(wargear: &'a [Wargear]) -> Self {
        Self {
            wargear,
            scope: Scope::Model,
        }
    }

    pub fn empty() -> Self {
        Self::unit(&[])
    }
}

#[derive(Debug, Clone, Copy)]
enum Subject {
    WholeUnit,
    Model,
    AnyModel,
    EveryN(u32),
}

impl Subject {
    fn phrase(self) -> String {
        match self {
            Self::WholeUnit => "The whole unit may".to_string(),
            Self::Model => "You may".to_string(),
            Self::AnyModel => "Any model may".to_string(),
            Self::EveryN(n) => format!("For every {n} models, you may"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedChoice {
    pub letter: char,
    pub label: String,
    pub cost: u32,
    /// Point change against the exchanged item, when the option is an exchange.
    pub net: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOption {
    pub index: usize,
    pub header: String,
    pub picks_allowed: u32,
    pub models_required_per: u32,
    pub per_model: bool,
    pub exchange: Option<String>,
    pub choices: Vec<RenderedChoice>,
    pub selected: Vec<String>,
    pub text: String,
}

pub fn choice_letter(index: usize) -> char {
    u32::try_from(index)
        .ok()
        .and_then(|offset| char::from_u32('a' as u32 + offset))
        .unwrap_or('?')
}

pub fn letter_index(letter: char) -> Option<usize> {
    let letter = letter.to_ascii_lowercase();
    letter
        .is_ascii_lowercase()
        .then(|| (letter as u8 - b'a') as usize)
}

/// Left-most offered item that the context already carries.
pub fn exchange_target<'w>(expr: &OptionExpr, items: &'w [Wargear], ctx: &RenderContext<'_>) -> Option<&'w Wargear> {
    if !expr.has_choice() {
        return None;
    }
    items.iter().find(|item| ctx.wargear.contains(item))
}

pub fn render_header(expr: &OptionExpr, items: &[Wargear], ctx: &RenderContext<'_>) -> String {
    let subject = match ctx.scope {
        Scope::Unit => Subject::WholeUnit,
        Scope::Model => Subject::Model,
    };
    phrase(expr, subject, 1, exchange_target(expr, items, ctx))
}

fn phrase(expr: &OptionExpr, subject: Subject, picks: u32, target: Option<&Wargear>) -> String {
    match expr {
        OptionExpr::Picks { count, inner } => phrase(inner, subject, *count, target),
        OptionExpr::PerModels { inner, per: Some(n) } => phrase(inner, Subject::EveryN(*n), picks, target),
        OptionExpr::PerModels { inner, per: None } => phrase(inner, Subject::AnyModel, picks, target),
        OptionExpr::Choice(_) => {
            let amount = if picks == 1 {
                "one".to_string()
            } else {
                picks.to_string()
            };
            match target {
                Some(target) => format!(
                    "{} exchange {} for {amount} of the following:",
                    subject.phrase(),
                    target.label()
                ),
                None => format!("{} take {amount} of the following:", subject.phrase()),
            }
        }
        leaf => {
            let offered = leaf
                .as_wargear()
                .map(|wargear| wargear.to_string())
                .unwrap_or_default();
            if picks > 1 {
                format!("{} take up to {picks} x {offered}", subject.phrase())
            } else {
                format!("{} take {offered}", subject.phrase())
            }
        }
    }
}

pub fn describe_choices(expr: &OptionExpr, items: &[Wargear], ctx: &RenderContext<'_>) -> Vec<RenderedChoice> {
    let target = exchange_target(expr, items, ctx);
    items
        .iter()
        .enumerate()
        .map(|(index, item)| RenderedChoice {
            letter: choice_letter(index),
            label: item.label(),
            cost: item.cost(),
            net: target.map(|target| i64::from(item.cost()) - i64::from(target.cost())),
        })
        .collect()
}

fn choice_line(choice: &RenderedChoice) -> String {
    match choice.net {
        Some(net) => format!("{}) {} (net {:+}pts)", choice.letter, choice.label, net),
        None if choice.cost > 0 => format!("{}) {} ({}pts)", choice.letter, choice.label, choice.cost),
        None => format!("{}) {}", choice.letter, choice.label),
    }
}

/// Header plus one lettered line per choice. Single-item options are one line.
pub fn render(expr: &OptionExpr, items: &[Wargear], ctx: &RenderContext<'_>) -> String {
    let mut text = render_header(expr, items, ctx);
    if expr.has_choice() {
        for choice in describe_choices(expr, items, ctx) {
            text.push_str("\n    ");
            text.push_str(&choice_line(&choice));
        }
    }
    text
}
