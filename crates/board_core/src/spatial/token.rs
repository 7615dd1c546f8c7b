use serde::{Deserialize, Serialize};
use std::fmt;

use super::position::Position;
use crate::formation::{Role, SlotId};

/// Stable token identifier supplied by the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A placed entity on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub position: Position,
    pub role: Role,
    /// Locked tokens cannot be dragged and are never pushed by auto-resolve
    pub locked: bool,
    /// Slot the token is anchored to (formation/hybrid modes)
    pub slot: Option<SlotId>,
}

/// Roster entry handed to the board when a token enters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSpec {
    pub id: TokenId,
    pub role: Role,
    #[serde(default)]
    pub locked: bool,
    /// Starting point; slot-based modes pick the nearest fitting slot
    #[serde(default)]
    pub position: Option<Position>,
}

impl TokenSpec {
    pub fn new(id: impl Into<TokenId>, role: Role) -> Self {
        Self { id: id.into(), role, locked: false, position: None }
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Target state for one token inside an atomic mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub token_id: TokenId,
    pub position: Position,
    pub slot: Option<SlotId>,
}

impl Placement {
    pub fn new(token_id: TokenId, position: Position, slot: Option<SlotId>) -> Self {
        Self { token_id, position, slot }
    }
}

/// Before/after record of one token inside a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDelta {
    pub token_id: TokenId,
    pub from: Position,
    pub to: Position,
    pub from_slot: Option<SlotId>,
    pub to_slot: Option<SlotId>,
}

impl TokenDelta {
    pub fn forward(&self) -> Placement {
        Placement::new(self.token_id.clone(), self.to, self.to_slot.clone())
    }

    pub fn inverse(&self) -> Placement {
        Placement::new(self.token_id.clone(), self.from, self.from_slot.clone())
    }

    /// The same change seen from the other direction (undo events).
    pub fn reversed(&self) -> TokenDelta {
        TokenDelta {
            token_id: self.token_id.clone(),
            from: self.to,
            to: self.from,
            from_slot: self.to_slot.clone(),
            to_slot: self.from_slot.clone(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.from.approx_eq(&self.to) && self.from_slot == self.to_slot
    }
}
