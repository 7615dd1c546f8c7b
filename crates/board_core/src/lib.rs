//! # board_core - Tactics Board Positioning Engine
//!
//! Headless engine behind the tactics board: where tokens (players) may sit
//! on a normalized 2D pitch, how a drag gesture resolves to a slot or free
//! spot, and how committed moves are validated and undone.
//!
//! ## Features
//! - Three positioning modes: formation, freeform, hybrid
//! - Deterministic snap resolution (distance, then priority, then slot id)
//! - Single-gesture drag state machine with atomic swaps
//! - Formation validator with localization keys, never blocking edits
//! - Bounded undo/redo over delta records
//!
//! ## Example
//! ```rust
//! use board_core::{Board, BoardConfig, FormationPreset, Position, TokenId, TokenSpec};
//!
//! let roster: Vec<TokenSpec> = FormationPreset::T442
//!     .formation()
//!     .slots()
//!     .iter()
//!     .map(|slot| TokenSpec::new(format!("p-{}", slot.id), slot.role))
//!     .collect();
//! let mut board = Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster)?;
//!
//! let keeper = TokenId::new("p-GK");
//! board.pointer_down(Some(&keeper), Position::new(0.5, 0.95))?;
//! board.pointer_up(Position::new(0.51, 0.94));
//! assert_eq!(board.get_position(&keeper)?, Position::new(0.5, 0.95));
//! # Ok::<(), board_core::BoardError>(())
//! ```

// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]
// Outcome enums carry a full session snapshot by value
#![allow(clippy::large_enum_variant)]

pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod events;
pub mod formation;
pub mod history;
pub mod snap;
pub mod spatial;
pub mod validator;


pub use board::Board;
pub use config::{BoardConfig, PositioningMode};
pub use drag::{CancelReason, Commit, DragController, DragOutcome, DragSession, DragState};
pub use error::{BoardError, PositionFault, Result, StackSide};
pub use events::{InputEvent, InputKind, MutationEvent, MutationKind, MutationSink};
pub use formation::{
    assign_tokens, Formation, FormationPreset, Role, RoleCategory, Slot, SlotAssignment, SlotId,
};
pub use history::{HistoryEntry, HistoryManager};
pub use snap::{CandidateTarget, CandidateValidity, RejectReason, SnapCandidate, SnapResolver};
pub use spatial::{distance, Position, SpatialModel, Token, TokenDelta, TokenId, TokenSpec};
pub use validator::{Finding, FormationValidator, Severity, ValidationReport, ValidationRules};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
