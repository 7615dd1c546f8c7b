use serde::{Deserialize, Serialize};

use crate::formation::SlotId;
use crate::snap::{CandidateTarget, CandidateValidity, SnapCandidate};
use crate::spatial::{Position, TokenId};

/// Controller state. `Committed` and `Cancelled` are transitions reported
/// through [`super::DragOutcome`], not resting states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
    Resolving,
}

impl DragState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging => "dragging",
            Self::Resolving => "resolving",
        }
    }
}

/// Transient description of the gesture in progress.
///
/// Handed out by value so observers never alias controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSession {
    pub token_id: TokenId,
    pub origin: Position,
    pub origin_slot: Option<SlotId>,
    /// Latest pointer position
    pub live: Position,
    pub candidate: SnapCandidate,
}

impl DragSession {
    pub fn target(&self) -> Option<&CandidateTarget> {
        self.candidate.target.as_ref()
    }

    pub fn validity(&self) -> CandidateValidity {
        self.candidate.validity
    }

    /// Token currently on the candidate target (swap partner).
    pub fn occupant(&self) -> Option<&TokenId> {
        self.candidate.occupant.as_ref()
    }
}
