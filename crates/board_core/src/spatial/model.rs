//! Spatial Model & Invariant Checker
//!
//! Holds the canonical token → position map for one board. Every mutation is
//! all-or-nothing: a batch of placements is checked in full before a single
//! token moves.
//!
//! ## Invariants (after any accepted mutation)
//! 1. Formation mode: every anchored token sits exactly on its slot target and
//!    no slot is claimed twice.
//! 2. Token ids are unique; a token's identity never changes.
//!
//! The minimum-distance rule of freeform/hybrid modes is enforced by the
//! callers that commit user moves (see [`SpatialModel::find_overlaps`] and
//! [`SpatialModel::auto_resolve_overlap`]); initial roster placement is not
//! subject to it.

use fxhash::FxHashMap;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::position::{distance_sq, Position, POSITION_EPSILON};
use super::token::{Placement, Token, TokenDelta, TokenId, TokenSpec};
use crate::config::PositioningMode;
use crate::error::{BoardError, PositionFault, Result};
use crate::formation::{Formation, SlotId};

/// Extra clearance added when pushing a token away, so the result survives
/// float rounding on the next overlap query.
const PUSH_CLEARANCE: f32 = 1e-4;

/// Parameters for [`SpatialModel::auto_resolve_overlap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolveParams {
    pub min_distance: f32,
    pub max_iterations: u32,
    /// Upper bound on how far the result may drift from the requested point
    pub max_displacement: f32,
}

/// A pair of tokens closer than the minimum distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingViolation {
    pub a: TokenId,
    pub b: TokenId,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct SpatialModel {
    mode: PositioningMode,
    formation: Formation,
    /// Registration order is the snapshot order
    tokens: Vec<Token>,
    index: FxHashMap<TokenId, usize>,
}

impl SpatialModel {
    pub fn new(mode: PositioningMode, formation: Formation) -> Self {
        Self { mode, formation, tokens: Vec::new(), index: FxHashMap::default() }
    }

    pub fn mode(&self) -> PositioningMode {
        self.mode
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: &TokenId) -> Option<&Token> {
        self.index.get(id).map(|&i| &self.tokens[i])
    }

    pub fn contains(&self, id: &TokenId) -> bool {
        self.index.contains_key(id)
    }

    // ========================
    // Queries
    // ========================

    pub fn get_position(&self, id: &TokenId) -> Result<Position> {
        self.token(id).map(|t| t.position).ok_or_else(|| BoardError::TokenNotFound(id.clone()))
    }

    /// Slot the token is anchored to, if any.
    pub fn slot_of(&self, id: &TokenId) -> Option<&SlotId> {
        self.token(id).and_then(|t| t.slot.as_ref())
    }

    /// Token anchored to `slot`, if any.
    pub fn occupant(&self, slot: &SlotId) -> Option<&TokenId> {
        self.tokens.iter().find(|t| t.slot.as_ref() == Some(slot)).map(|t| &t.id)
    }

    /// Ordered (token, position) snapshot.
    pub fn positions(&self) -> Vec<(TokenId, Position)> {
        self.tokens.iter().map(|t| (t.id.clone(), t.position)).collect()
    }

    /// Tokens strictly closer than `min_distance` to `position`, nearest first
    /// (ties by id).
    pub fn find_overlaps(
        &self,
        position: Position,
        excluding: Option<&TokenId>,
        min_distance: f32,
    ) -> Vec<TokenId> {
        let limit = min_distance * min_distance;
        let mut hits: Vec<(f32, &TokenId)> = self
            .tokens
            .iter()
            .filter(|t| Some(&t.id) != excluding)
            .map(|t| (distance_sq(position, t.position), &t.id))
            .filter(|(d2, _)| *d2 < limit)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        hits.into_iter().map(|(_, id)| id.clone()).collect()
    }

    /// Pairs of unlocked tokens closer than `min_distance`.
    pub fn spacing_violations(&self, min_distance: f32) -> Vec<SpacingViolation> {
        let limit = (min_distance - POSITION_EPSILON).max(0.0);
        let mut out = Vec::new();
        for (i, a) in self.tokens.iter().enumerate() {
            if a.locked {
                continue;
            }
            for b in self.tokens[i + 1..].iter().filter(|b| !b.locked) {
                let d = distance_sq(a.position, b.position).sqrt();
                if d < limit {
                    out.push(SpacingViolation { a: a.id.clone(), b: b.id.clone(), distance: d });
                }
            }
        }
        out
    }

    /// Check the structural invariants that must hold after every commit.
    pub fn check_invariants(&self) -> Result<()> {
        let mut claimed: FxHashMap<&SlotId, &TokenId> = FxHashMap::default();
        for token in &self.tokens {
            if !token.position.in_bounds() {
                return Err(self.invalid(&token.id, token.position, PositionFault::OutOfBounds));
            }
            let Some(slot_id) = token.slot.as_ref() else {
                continue;
            };
            let slot = self
                .formation
                .slot(slot_id)
                .ok_or_else(|| BoardError::SlotNotFound(slot_id.clone()))?;
            if self.mode == PositioningMode::Formation && !slot.position.approx_eq(&token.position)
            {
                return Err(self.invalid(&token.id, token.position, PositionFault::NotOnSlot));
            }
            if let Some(other) = claimed.insert(slot_id, &token.id) {
                return Err(BoardError::SlotConflict {
                    slot: slot_id.clone(),
                    tokens: vec![other.clone(), token.id.clone()],
                });
            }
        }
        Ok(())
    }

    // ========================
    // Mutations
    // ========================

    /// Register a token. Position must already be on the pitch.
    pub fn insert_token(
        &mut self,
        spec: &TokenSpec,
        position: Position,
        slot: Option<SlotId>,
    ) -> Result<()> {
        if self.contains(&spec.id) {
            return Err(BoardError::DuplicateToken(spec.id.clone()));
        }
        if !position.in_bounds() {
            return Err(self.invalid(&spec.id, position, PositionFault::OutOfBounds));
        }
        if let Some(slot_id) = slot.as_ref() {
            if self.formation.slot(slot_id).is_none() {
                return Err(BoardError::SlotNotFound(slot_id.clone()));
            }
            if let Some(holder) = self.occupant(slot_id) {
                return Err(BoardError::SlotConflict {
                    slot: slot_id.clone(),
                    tokens: vec![holder.clone(), spec.id.clone()],
                });
            }
        }
        self.index.insert(spec.id.clone(), self.tokens.len());
        self.tokens.push(Token {
            id: spec.id.clone(),
            position,
            role: spec.role,
            locked: spec.locked,
            slot,
        });
        Ok(())
    }

    pub fn remove_token(&mut self, id: &TokenId) -> Result<Token> {
        let idx = self.index.remove(id).ok_or_else(|| BoardError::TokenNotFound(id.clone()))?;
        let token = self.tokens.remove(idx);
        for (i, t) in self.tokens.iter().enumerate().skip(idx) {
            self.index.insert(t.id.clone(), i);
        }
        Ok(token)
    }

    pub fn set_locked(&mut self, id: &TokenId, locked: bool) -> Result<()> {
        let idx = *self.index.get(id).ok_or_else(|| BoardError::TokenNotFound(id.clone()))?;
        self.tokens[idx].locked = locked;
        Ok(())
    }

    /// Move one token. In formation mode the position must be a slot target;
    /// in hybrid mode an exact slot hit re-anchors, otherwise the anchor stays.
    pub fn set_position(&mut self, id: &TokenId, position: Position) -> Result<()> {
        let current = self.token(id).ok_or_else(|| BoardError::TokenNotFound(id.clone()))?;
        let slot = match self.mode {
            PositioningMode::Formation => Some(
                self.formation
                    .slot_at(position)
                    .map(|s| s.id.clone())
                    .ok_or_else(|| self.invalid(id, position, PositionFault::NotOnSlot))?,
            ),
            PositioningMode::Hybrid => self
                .formation
                .slot_at(position)
                .map(|s| s.id.clone())
                .or_else(|| current.slot.clone()),
            PositioningMode::Freeform => None,
        };
        self.apply(&[Placement::new(id.clone(), position, slot)]).map(|_| ())
    }

    /// Apply a batch of placements atomically under the active mode's rules.
    ///
    /// Returns one delta per placement. Nothing changes on error.
    pub fn apply(&mut self, placements: &[Placement]) -> Result<Vec<TokenDelta>> {
        let mut staged: Vec<(usize, Position, Option<SlotId>)> =
            Vec::with_capacity(placements.len());
        for placement in placements {
            let idx = *self
                .index
                .get(&placement.token_id)
                .ok_or_else(|| BoardError::TokenNotFound(placement.token_id.clone()))?;
            if staged.iter().any(|(i, _, _)| *i == idx) {
                return Err(BoardError::DuplicateToken(placement.token_id.clone()));
            }
            if !placement.position.in_bounds() {
                return Err(self.invalid(
                    &placement.token_id,
                    placement.position,
                    PositionFault::OutOfBounds,
                ));
            }

            let (position, slot) = match (self.mode, placement.slot.as_ref()) {
                (PositioningMode::Freeform, _) => (placement.position, None),
                (PositioningMode::Formation, None) => {
                    return Err(self.invalid(
                        &placement.token_id,
                        placement.position,
                        PositionFault::NotOnSlot,
                    ));
                }
                (mode, Some(slot_id)) => {
                    let slot = self
                        .formation
                        .slot(slot_id)
                        .ok_or_else(|| BoardError::SlotNotFound(slot_id.clone()))?;
                    if mode == PositioningMode::Formation {
                        if !slot.position.approx_eq(&placement.position) {
                            return Err(self.invalid(
                                &placement.token_id,
                                placement.position,
                                PositionFault::NotOnSlot,
                            ));
                        }
                        // Tokens sit exactly on the target
                        (slot.position, Some(slot_id.clone()))
                    } else {
                        (placement.position, Some(slot_id.clone()))
                    }
                }
                (PositioningMode::Hybrid, None) => (placement.position, None),
            };
            staged.push((idx, position, slot));
        }

        self.check_slot_claims(&staged)?;
        Ok(self.commit_staged(staged))
    }

    /// Restore previously valid placements (undo/redo path).
    ///
    /// Only existence and bounds are checked; the state being restored was
    /// accepted when it was recorded.
    pub fn restore(&mut self, placements: &[Placement]) -> Result<Vec<TokenDelta>> {
        let mut staged = Vec::with_capacity(placements.len());
        for placement in placements {
            let idx = *self
                .index
                .get(&placement.token_id)
                .ok_or_else(|| BoardError::TokenNotFound(placement.token_id.clone()))?;
            if !placement.position.in_bounds() {
                return Err(self.invalid(
                    &placement.token_id,
                    placement.position,
                    PositionFault::OutOfBounds,
                ));
            }
            staged.push((idx, placement.position, placement.slot.clone()));
        }
        Ok(self.commit_staged(staged))
    }

    /// Swap in a new formation. Callers re-place tokens right after.
    pub(crate) fn replace_formation(&mut self, formation: Formation) -> Formation {
        for token in &mut self.tokens {
            if let Some(slot) = token.slot.as_ref() {
                if formation.slot(slot).is_none() {
                    token.slot = None;
                }
            }
        }
        std::mem::replace(&mut self.formation, formation)
    }

    /// Push `id` radially away from the nearest conflicting token until it
    /// clears `min_distance` from everyone, or give up.
    ///
    /// Returns the (possibly unchanged) position on success. After
    /// `max_iterations` passes, or once the push would drift further than
    /// `max_displacement` from `position`, the result is
    /// `CollisionUnresolved` and the caller must treat the move as invalid.
    pub fn auto_resolve_overlap(
        &self,
        id: &TokenId,
        position: Position,
        params: &ResolveParams,
    ) -> Result<Position> {
        if !self.contains(id) {
            return Err(BoardError::TokenNotFound(id.clone()));
        }
        let requested = position.to_vector();
        let mut candidate = requested;
        let max_drift = params.max_displacement * (1.0 + PUSH_CLEARANCE) + POSITION_EPSILON;
        let max_drift_sq = max_drift * max_drift;

        for iteration in 0..params.max_iterations {
            let here = Position::from_vector(candidate);
            let overlaps = self.find_overlaps(here, Some(id), params.min_distance);
            let Some(nearest) = overlaps.first() else {
                if iteration > 0 {
                    log::debug!(
                        "auto-resolve moved {} to ({:.3}, {:.3}) in {} pass(es)",
                        id,
                        here.x,
                        here.y,
                        iteration
                    );
                }
                return Ok(here);
            };

            let obstacle = self.get_position(nearest)?.to_vector();
            let direction = push_direction(candidate, obstacle);
            let pushed = obstacle + direction * (params.min_distance * (1.0 + PUSH_CLEARANCE));
            let pushed = Position::from_vector(pushed).clamped().to_vector();

            if (pushed - requested).norm_squared() > max_drift_sq {
                break;
            }
            candidate = pushed;
        }

        // The final pass may have landed on a clear spot
        let here = Position::from_vector(candidate);
        if self.find_overlaps(here, Some(id), params.min_distance).is_empty() {
            return Ok(here);
        }

        log::warn!(
            "auto-resolve gave up for {} at ({:.3}, {:.3})",
            id,
            position.x,
            position.y
        );
        Err(BoardError::CollisionUnresolved {
            token_id: id.clone(),
            x: position.x,
            y: position.y,
            iterations: params.max_iterations,
        })
    }

    // ========================
    // Internals
    // ========================

    fn invalid(&self, id: &TokenId, position: Position, fault: PositionFault) -> BoardError {
        BoardError::InvalidPosition { token_id: id.clone(), x: position.x, y: position.y, fault }
    }

    /// No slot may be claimed by two tokens once `staged` is applied.
    fn check_slot_claims(&self, staged: &[(usize, Position, Option<SlotId>)]) -> Result<()> {
        let mut claimed: FxHashMap<&SlotId, usize> = FxHashMap::default();
        for (i, token) in self.tokens.iter().enumerate() {
            let slot = match staged.iter().find(|(idx, _, _)| *idx == i) {
                Some((_, _, slot)) => slot.as_ref(),
                None => token.slot.as_ref(),
            };
            if let Some(slot) = slot {
                if let Some(other) = claimed.insert(slot, i) {
                    return Err(BoardError::SlotConflict {
                        slot: slot.clone(),
                        tokens: vec![self.tokens[other].id.clone(), token.id.clone()],
                    });
                }
            }
        }
        Ok(())
    }

    fn commit_staged(&mut self, staged: Vec<(usize, Position, Option<SlotId>)>) -> Vec<TokenDelta> {
        staged
            .into_iter()
            .map(|(idx, position, slot)| {
                let token = &mut self.tokens[idx];
                let delta = TokenDelta {
                    token_id: token.id.clone(),
                    from: token.position,
                    to: position,
                    from_slot: token.slot.clone(),
                    to_slot: slot.clone(),
                };
                token.position = position;
                token.slot = slot;
                delta
            })
            .collect()
    }
}

/// Unit vector pointing from `obstacle` towards `from`. Coincident points
/// push towards the pitch centre (or straight up the pitch from the centre).
fn push_direction(from: Vector2<f32>, obstacle: Vector2<f32>) -> Vector2<f32> {
    let away = from - obstacle;
    if away.norm_squared() > POSITION_EPSILON * POSITION_EPSILON {
        return away.normalize();
    }
    let to_center = Position::CENTER.to_vector() - obstacle;
    if to_center.norm_squared() > POSITION_EPSILON * POSITION_EPSILON {
        to_center.normalize()
    } else {
        Vector2::new(0.0, -1.0)
    }
}
