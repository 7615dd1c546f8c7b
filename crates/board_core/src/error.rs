use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formation::SlotId;
use crate::spatial::TokenId;

/// Why a position was refused by the spatial model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionFault {
    /// Outside `[0,1]×[0,1]` (or not a finite number)
    OutOfBounds,
    /// Formation mode only: not exactly on a slot target
    NotOnSlot,
}

/// Which history stack an undo/redo request found empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackSide {
    Undo,
    Redo,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    #[error("Invalid position ({x:.3}, {y:.3}) for token {token_id}: {fault:?}")]
    InvalidPosition { token_id: TokenId, x: f32, y: f32, fault: PositionFault },

    #[error("Collision unresolved for token {token_id} at ({x:.3}, {y:.3}) after {iterations} iterations")]
    CollisionUnresolved { token_id: TokenId, x: f32, y: f32, iterations: u32 },

    #[error("Nothing to {0:?}")]
    EmptyStack(StackSide),

    #[error("Capacity mismatch: formation has {capacity} slots, board has {tokens} tokens")]
    CapacityMismatch { capacity: usize, tokens: usize },

    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),

    #[error("Duplicate token id: {0}")]
    DuplicateToken(TokenId),

    #[error("Slot not found: {0}")]
    SlotNotFound(SlotId),

    #[error("Duplicate slot id: {0}")]
    DuplicateSlot(SlotId),

    #[error("Slot {slot} claimed by more than one token: {tokens:?}")]
    SlotConflict { slot: SlotId, tokens: Vec<TokenId> },

    #[error("Slot {slot} is held by {occupant}")]
    SlotOccupied { slot: SlotId, occupant: TokenId },

    #[error("Token is locked: {0}")]
    TokenLocked(TokenId),

    #[error("A drag gesture is in progress")]
    DragInProgress,

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Finalize blocked by {errors} validation error(s)")]
    FinalizeBlocked { errors: usize },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl BoardError {
    /// Programming-invariant violations, as opposed to expected user-input
    /// failures such as an invalid drop or an empty undo stack.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BoardError::TokenNotFound(_)
                | BoardError::DuplicateSlot(_)
                | BoardError::SlotConflict { .. }
        )
    }
}

impl From<serde_json::Error> for BoardError {
    fn from(err: serde_json::Error) -> Self {
        BoardError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for BoardError {
    fn from(err: serde_yaml::Error) -> Self {
        BoardError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
