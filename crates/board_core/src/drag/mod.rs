//! Drag Controller
//!
//! Owns the lifecycle of one drag gesture per board.
//!
//! ```text
//!            pointer_down (unlocked token)
//!   Idle ───────────────────────────────▶ Dragging ◀──┐ pointer_move
//!    ▲                                      │  │      │ (candidate refreshed)
//!    │        cancel / leaves cancel region │  └──────┘
//!    ├──────────────── Cancelled ◀──────────┤
//!    │                                      │ pointer_up
//!    │                                      ▼
//!    ├──────────────── Cancelled ◀──── Resolving
//!    │        invalid / no change / rejected │
//!    └──────────────── Committed ◀───────────┘
//!                       valid or swap, applied atomically
//! ```
//!
//! While dragging the canonical model is never touched; only the session
//! changes. Resolution re-runs the snap resolver against the latest pointer
//! position and the current model, so a candidate computed before an
//! external change can never be applied blindly.

mod coalescer;
mod session;

pub use coalescer::MoveCoalescer;
pub use session::{DragSession, DragState};

use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::events::MutationKind;
use crate::snap::{CandidateValidity, RejectReason, SnapCandidate, SnapResolver};
use crate::spatial::{distance_sq, Placement, Position, SpatialModel, TokenDelta, TokenId};

/// Why an input did not change the controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Only one session at a time; the press is dropped, not queued
    AlreadyDragging,
    NotDragging,
    NoTokenHit,
    TokenLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CancelReason {
    /// Escape key or host cancel signal
    Explicit,
    LeftCancelRegion,
    Invalid(Option<RejectReason>),
    /// Dropped back where it started
    NoChange,
    /// The model refused the commit (e.g. changed under the gesture)
    Rejected(BoardError),
    /// Formation reload or roster change aborted the gesture
    Reset,
}

/// A committed drag: one move or one swap.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub kind: MutationKind,
    pub deltas: Vec<TokenDelta>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Ignored(IgnoreReason),
    /// Pointer move held until the frame ends
    Coalesced,
    Started(DragSession),
    Updated(DragSession),
    Committed(Commit),
    Cancelled(CancelReason),
}

impl DragOutcome {
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

#[derive(Debug, Clone)]
pub struct DragController {
    resolver: SnapResolver,
    pick_radius: f32,
    cancel_margin: f32,
    state: DragState,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            resolver: SnapResolver::new(config),
            pick_radius: config.pick_radius,
            cancel_margin: config.cancel_margin,
            state: DragState::Idle,
            session: None,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn resolver(&self) -> &SnapResolver {
        &self.resolver
    }

    /// Nearest unlocked token within the pick radius (ties by id).
    pub fn pick(&self, model: &SpatialModel, at: Position) -> Option<TokenId> {
        let limit = self.pick_radius * self.pick_radius;
        model
            .tokens()
            .iter()
            .filter(|t| !t.locked)
            .map(|t| (distance_sq(at, t.position), &t.id))
            .filter(|(d2, _)| *d2 <= limit)
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, id)| id.clone())
    }

    // ========================
    // Transitions
    // ========================

    /// Start a gesture. Without an explicit token the nearest one under the
    /// pointer is picked. An unknown explicit id is a caller bug.
    pub fn pointer_down(
        &mut self,
        model: &SpatialModel,
        token: Option<&TokenId>,
        at: Position,
    ) -> Result<DragOutcome> {
        if self.state != DragState::Idle {
            log::debug!("pointer_down ignored: already {}", self.state.as_str());
            return Ok(DragOutcome::Ignored(IgnoreReason::AlreadyDragging));
        }

        let id = match token {
            Some(id) => id.clone(),
            None => match self.pick(model, at) {
                Some(id) => id,
                None => return Ok(DragOutcome::Ignored(IgnoreReason::NoTokenHit)),
            },
        };
        let picked = model.token(&id).ok_or_else(|| BoardError::TokenNotFound(id.clone()))?;
        if picked.locked {
            return Ok(DragOutcome::Ignored(IgnoreReason::TokenLocked));
        }

        let session = DragSession {
            token_id: id.clone(),
            origin: picked.position,
            origin_slot: picked.slot.clone(),
            live: at,
            candidate: self.resolver.resolve(model, &id, at),
        };
        log::debug!("drag start {} at ({:.3}, {:.3})", id, at.x, at.y);
        self.state = DragState::Dragging;
        self.session = Some(session.clone());
        Ok(DragOutcome::Started(session))
    }

    /// Track the pointer and refresh the candidate. Never mutates the model.
    pub fn pointer_move(&mut self, model: &SpatialModel, at: Position) -> DragOutcome {
        if self.state != DragState::Dragging {
            return DragOutcome::Ignored(IgnoreReason::NotDragging);
        }
        if !at.within_margin(self.cancel_margin) {
            return self.abort(CancelReason::LeftCancelRegion);
        }
        let Some(session) = self.session.as_mut() else {
            self.state = DragState::Idle;
            return DragOutcome::Ignored(IgnoreReason::NotDragging);
        };
        session.live = at;
        session.candidate = self.resolver.resolve(model, &session.token_id, at);
        DragOutcome::Updated(session.clone())
    }

    /// Finish the gesture: commit a valid move or swap atomically, otherwise
    /// cancel. `at`, when given, is treated as a final pointer move.
    pub fn pointer_up(&mut self, model: &mut SpatialModel, at: Option<Position>) -> DragOutcome {
        if self.state != DragState::Dragging {
            return DragOutcome::Ignored(IgnoreReason::NotDragging);
        }
        if let Some(at) = at {
            if !at.within_margin(self.cancel_margin) {
                return self.abort(CancelReason::LeftCancelRegion);
            }
            if let Some(session) = self.session.as_mut() {
                session.live = at;
            }
        }
        let Some(session) = self.session.take() else {
            self.state = DragState::Idle;
            return DragOutcome::Ignored(IgnoreReason::NotDragging);
        };

        self.state = DragState::Resolving;
        let candidate = self.resolver.resolve(model, &session.token_id, session.live);
        let outcome = commit_candidate(model, &session, &candidate);
        self.state = DragState::Idle;

        match &outcome {
            DragOutcome::Committed(commit) => log::info!(
                "drag commit {} ({}, {} token(s))",
                session.token_id,
                commit.kind.as_str(),
                commit.deltas.len()
            ),
            DragOutcome::Cancelled(reason) => {
                log::debug!("drag cancelled {}: {:?}", session.token_id, reason)
            }
            _ => {}
        }
        outcome
    }

    /// Explicit cancel. Idempotent: on an idle controller nothing happens.
    pub fn cancel(&mut self) -> DragOutcome {
        if self.state == DragState::Idle {
            return DragOutcome::Ignored(IgnoreReason::NotDragging);
        }
        self.abort(CancelReason::Explicit)
    }

    /// Drop any gesture because the model changed underneath it.
    pub fn reset(&mut self) -> Option<DragSession> {
        self.state = DragState::Idle;
        let dropped = self.session.take();
        if let Some(session) = dropped.as_ref() {
            log::debug!("drag of {} reset", session.token_id);
        }
        dropped
    }

    fn abort(&mut self, reason: CancelReason) -> DragOutcome {
        if let Some(session) = self.session.take() {
            log::debug!("drag cancelled {}: {:?}", session.token_id, reason);
        }
        self.state = DragState::Idle;
        DragOutcome::Cancelled(reason)
    }
}

/// Apply a freshly resolved candidate. Both-or-neither for swaps.
fn commit_candidate(
    model: &mut SpatialModel,
    session: &DragSession,
    candidate: &SnapCandidate,
) -> DragOutcome {
    let Some(target) = candidate.target.as_ref() else {
        return DragOutcome::Cancelled(CancelReason::Invalid(candidate.reason));
    };
    let dragged = Placement::new(
        session.token_id.clone(),
        target.position(),
        target.slot_id().cloned(),
    );

    let (kind, placements) = match candidate.validity {
        CandidateValidity::Invalid => {
            return DragOutcome::Cancelled(CancelReason::Invalid(candidate.reason));
        }
        CandidateValidity::Valid => (MutationKind::Move, vec![dragged]),
        CandidateValidity::Swap => {
            let Some(partner) = candidate.occupant.clone() else {
                return DragOutcome::Cancelled(CancelReason::Invalid(candidate.reason));
            };
            let Some(current) = model.token(&session.token_id) else {
                let err = BoardError::TokenNotFound(session.token_id.clone());
                return DragOutcome::Cancelled(CancelReason::Rejected(err));
            };
            // Partner takes the dragged token's place as it is now
            let partner = Placement::new(partner, current.position, current.slot.clone());
            (MutationKind::Swap, vec![dragged, partner])
        }
    };

    match model.apply(&placements) {
        Ok(deltas) if deltas.iter().all(TokenDelta::is_noop) => {
            DragOutcome::Cancelled(CancelReason::NoChange)
        }
        Ok(deltas) => DragOutcome::Committed(Commit { kind, deltas }),
        Err(err) => {
            log::warn!("commit of {} degraded to cancel: {}", session.token_id, err);
            DragOutcome::Cancelled(CancelReason::Rejected(err))
        }
    }
}
