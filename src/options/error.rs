use thiserror::Error;

/// Failures while reading an option clause. Positions are byte offsets into the clause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("unknown item '{name}' at position {position}")]
    UnknownItem { name: String, position: usize },
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("number '{text}' at position {position} is out of range")]
    NumberOutOfRange { text: String, position: usize },
    #[error("unexpected {token} at position {position}")]
    UnexpectedToken { token: String, position: usize },
    #[error("unexpected end of input at position {position}")]
    UnexpectedEnd { position: usize },
    #[error("'{entry}' is an option, not a piece of wargear")]
    NotWargear { entry: String },
}

impl OptionError {
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::UnknownItem { position, .. }
            | Self::UnexpectedCharacter { position, .. }
            | Self::NumberOutOfRange { position, .. }
            | Self::UnexpectedToken { position, .. }
            | Self::UnexpectedEnd { position } => Some(*position),
            Self::NotWargear { .. } => None,
        }
    }

    /// True when the clause itself is well formed but names something the armoury lacks.
    pub fn is_catalog_error(&self) -> bool {
        matches!(self, Self::UnknownItem { .. })
    }
}

/// Failures while recording a selection against an option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("this option allows {picks_allowed} pick(s) but {attempted} were selected")]
    Overselection { picks_allowed: u32, attempted: u32 },
    #[error("{choice} is not offered by this option")]
    NotOffered { choice: String },
}
