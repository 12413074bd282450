//! Editing workflow around a single unit.
//!
//! ```text
//! Viewing -> OptionsListed -> SelectionPending -> Applied -> Viewing
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::options::{RenderedOption, Selection};
use crate::roster::{RosterError, Unit, UnitSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Viewing,
    OptionsListed,
    SelectionPending,
    Applied,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viewing => "viewing",
            Self::OptionsListed => "options_listed",
            Self::SelectionPending => "selection_pending",
            Self::Applied => "applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("cannot {action} while {}", .state.as_str())]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error(transparent)]
    Roster(#[from] RosterError),
}

#[derive(Debug, Clone)]
pub struct EditSession {
    unit: Unit,
    state: SessionState,
}

impl EditSession {
    pub fn new(unit: Unit) -> Self {
        Self {
            unit,
            state: SessionState::Viewing,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn into_unit(self) -> Unit {
        self.unit
    }

    pub fn summary(&self) -> UnitSummary {
        self.unit.summary()
    }

    fn require(&self, allowed: &[SessionState], action: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            })
        }
    }

    /// Lists options. Listing again while choosing keeps the pending picks.
    pub fn list_options(&mut self) -> Result<Vec<RenderedOption>, SessionError> {
        self.require(
            &[
                SessionState::Viewing,
                SessionState::OptionsListed,
                SessionState::SelectionPending,
            ],
            "list options",
        )?;
        let rendered = self.unit.render_options()?;
        if self.state == SessionState::Viewing {
            self.state = SessionState::OptionsListed;
        }
        Ok(rendered)
    }

    pub fn select(&mut self, option: usize, choice: Selection) -> Result<(), SessionError> {
        self.require(
            &[SessionState::OptionsListed, SessionState::SelectionPending],
            "select",
        )?;
        self.unit
            .option_mut(option)?
            .select(choice)
            .map_err(RosterError::from)?;
        self.state = SessionState::SelectionPending;
        Ok(())
    }

    /// Replaces an option's picks wholesale; the pick limit is checked on [`apply`](Self::apply).
    pub fn select_list(&mut self, option: usize, indices: &[usize]) -> Result<(), SessionError> {
        self.require(
            &[SessionState::OptionsListed, SessionState::SelectionPending],
            "select",
        )?;
        self.unit
            .option_mut(option)?
            .select_list(indices)
            .map_err(RosterError::from)?;
        self.state = SessionState::SelectionPending;
        Ok(())
    }

    /// Applies every pending selection. On failure the unit is unchanged and the
    /// picks stay pending so they can be corrected.
    pub fn apply(&mut self) -> Result<u32, SessionError> {
        self.require(&[SessionState::SelectionPending], "apply")?;
        self.unit.apply_selected()?;
        self.state = SessionState::Applied;
        tracing::info!(unit = %self.unit.name(), points = self.unit.points(), "selection applied");
        Ok(self.unit.points())
    }

    pub fn finish(&mut self) -> Result<(), SessionError> {
        self.require(&[SessionState::Applied], "finish")?;
        self.state = SessionState::Viewing;
        Ok(())
    }

    /// Drops pending picks and returns to viewing.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        self.require(
            &[SessionState::OptionsListed, SessionState::SelectionPending],
            "cancel",
        )?;
        self.unit.clear_selections();
        self.state = SessionState::Viewing;
        Ok(())
    }

    pub fn resize(&mut self, size: u32) -> Result<u32, SessionError> {
        self.require(&[SessionState::Viewing, SessionState::OptionsListed], "resize")?;
        self.unit.resize(size)?;
        Ok(self.unit.points())
    }

    pub fn resize_models(&mut self, counts: &[u32]) -> Result<u32, SessionError> {
        self.require(&[SessionState::Viewing, SessionState::OptionsListed], "resize")?;
        self.unit.resize_models(counts)?;
        Ok(self.unit.points())
    }

    /// Back to catalog defaults from any state.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.unit.reset()?;
        self.state = SessionState::Viewing;
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.unit.rename(name);
    }
}
