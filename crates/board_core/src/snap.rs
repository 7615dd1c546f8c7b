//! Snap Resolver
//!
//! Maps a raw drop point to the best candidate target under the active
//! positioning mode. The resolver only reads the spatial model; it never
//! mutates it.
//!
//! ## Formation mode
//! 1. Distance from the drop point to every slot target
//! 2. Keep slots within `snap_distance`
//! 3. None left → `invalid`
//! 4. Nearest wins; ties by priority (lower first), then slot id
//! 5. Winner occupied by another token → `swap`
//!
//! ## Freeform mode
//! The drop point itself is the candidate. Overlaps make it a `swap` when the
//! cursor is within `swap_tolerance` of exactly one token centre, otherwise
//! auto-resolve gets a chance before the drop is `invalid`.
//!
//! ## Hybrid mode
//! Anchored tokens dragged less than `detach_distance` from their slot are
//! nudged freely around it; anything further re-runs the formation search.

use serde::{Deserialize, Serialize};

use crate::config::{BoardConfig, PositioningMode};
use crate::error::{BoardError, PositionFault, Result};
use crate::formation::{Slot, SlotId};
use crate::spatial::{distance, distance_sq, Position, ResolveParams, SpatialModel, TokenId};

/// Squared distances closer than this are treated as a tie.
const SNAP_TIE_EPSILON: f32 = 1e-7;

/// Where a drop would land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateTarget {
    /// Snap onto a slot target
    Slot { slot_id: SlotId, position: Position },
    /// Free coordinate (freeform)
    Free { position: Position },
    /// Free coordinate that keeps the token's slot anchor (hybrid nudge)
    Nudge { slot_id: SlotId, position: Position },
}

impl CandidateTarget {
    pub fn position(&self) -> Position {
        match self {
            Self::Slot { position, .. } | Self::Free { position } | Self::Nudge { position, .. } => {
                *position
            }
        }
    }

    pub fn slot_id(&self) -> Option<&SlotId> {
        match self {
            Self::Slot { slot_id, .. } | Self::Nudge { slot_id, .. } => Some(slot_id),
            Self::Free { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateValidity {
    Valid,
    Invalid,
    Swap,
}

/// Why a candidate was classified `invalid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NoSlotInRange,
    OutOfBounds,
    OccupantLocked,
    /// Formation mode: a token without a slot has nothing to trade with the occupant
    UnanchoredSwap,
    Overlap,
    CollisionUnresolved,
    NudgeTooFar,
}

/// Resolver verdict for one drop point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapCandidate {
    pub target: Option<CandidateTarget>,
    pub validity: CandidateValidity,
    /// Token currently on the target (swap partner)
    pub occupant: Option<TokenId>,
    /// Euclidean distance from the drop point to the chosen target
    pub distance: Option<f32>,
    pub reason: Option<RejectReason>,
}

impl SnapCandidate {
    pub fn valid(target: CandidateTarget, distance: f32) -> Self {
        Self {
            target: Some(target),
            validity: CandidateValidity::Valid,
            occupant: None,
            distance: Some(distance),
            reason: None,
        }
    }

    pub fn swap(target: CandidateTarget, occupant: TokenId, distance: f32) -> Self {
        Self {
            target: Some(target),
            validity: CandidateValidity::Swap,
            occupant: Some(occupant),
            distance: Some(distance),
            reason: None,
        }
    }

    pub fn invalid(reason: RejectReason) -> Self {
        Self {
            target: None,
            validity: CandidateValidity::Invalid,
            occupant: None,
            distance: None,
            reason: Some(reason),
        }
    }

    fn invalid_at(target: CandidateTarget, distance: f32, reason: RejectReason) -> Self {
        Self {
            target: Some(target),
            validity: CandidateValidity::Invalid,
            occupant: None,
            distance: Some(distance),
            reason: Some(reason),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.validity == CandidateValidity::Invalid
    }
}

#[derive(Debug, Clone)]
pub struct SnapResolver {
    mode: PositioningMode,
    snap_distance: f32,
    swap_tolerance: f32,
    detach_distance: f32,
    resolve: ResolveParams,
}

impl SnapResolver {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            mode: config.mode,
            snap_distance: config.snap_distance,
            swap_tolerance: config.swap_tolerance,
            detach_distance: config.detach_distance,
            resolve: config.resolve_params(),
        }
    }

    pub fn mode(&self) -> PositioningMode {
        self.mode
    }

    /// Best slot within `snap_distance` of `drop` together with its true
    /// distance. Deterministic regardless of slot order.
    pub fn nearest_slot<'a>(&self, drop: Position, slots: &'a [Slot]) -> Option<(&'a Slot, f32)> {
        let limit = self.snap_distance * self.snap_distance;
        let mut best: Option<(&Slot, f32)> = None;
        for slot in slots {
            let d2 = distance_sq(drop, slot.position);
            if d2 > limit {
                continue;
            }
            best = match best {
                None => Some((slot, d2)),
                Some((current, current_d2)) => {
                    if beats(slot, d2, current, current_d2) {
                        Some((slot, d2))
                    } else {
                        Some((current, current_d2))
                    }
                }
            };
        }
        best.map(|(slot, d2)| (slot, d2.sqrt()))
    }

    /// Classify a drop of `token` at `drop` against the current model.
    pub fn resolve(&self, model: &SpatialModel, token: &TokenId, drop: Position) -> SnapCandidate {
        if !drop.in_bounds() {
            return SnapCandidate::invalid(RejectReason::OutOfBounds);
        }
        let candidate = match self.mode {
            PositioningMode::Formation => self.resolve_slot(model, token, drop, false),
            PositioningMode::Freeform => self.resolve_free(model, token, drop),
            PositioningMode::Hybrid => self.resolve_hybrid(model, token, drop),
        };
        log::trace!(
            "snap {} at ({:.3}, {:.3}) -> {:?}",
            token,
            drop.x,
            drop.y,
            candidate.validity
        );
        candidate
    }

    /// Programmatic placement (no pointer gesture involved).
    ///
    /// Same rules as a drop, except that a would-be swap is refused with
    /// `SlotOccupied` and freeform overlaps go straight to auto-resolve.
    pub fn resolve_direct(
        &self,
        model: &SpatialModel,
        token: &TokenId,
        position: Position,
    ) -> Result<CandidateTarget> {
        let refuse = |fault: PositionFault| BoardError::InvalidPosition {
            token_id: token.clone(),
            x: position.x,
            y: position.y,
            fault,
        };
        if !position.in_bounds() {
            return Err(refuse(PositionFault::OutOfBounds));
        }
        if self.mode == PositioningMode::Freeform {
            let resolved = model.auto_resolve_overlap(token, position, &self.resolve)?;
            return Ok(CandidateTarget::Free { position: resolved });
        }

        let candidate = self.resolve(model, token, position);
        match (candidate.validity, candidate.reason) {
            (CandidateValidity::Valid, _) => {
                candidate.target.ok_or_else(|| refuse(PositionFault::NotOnSlot))
            }
            (CandidateValidity::Swap, _)
            | (_, Some(RejectReason::OccupantLocked))
            | (_, Some(RejectReason::UnanchoredSwap)) => {
                let slot = candidate
                    .target
                    .as_ref()
                    .and_then(|t| t.slot_id().cloned())
                    .unwrap_or_else(|| SlotId::new("?"));
                let occupant = candidate
                    .occupant
                    .or_else(|| model.occupant(&slot).cloned())
                    .unwrap_or_else(|| token.clone());
                Err(BoardError::SlotOccupied { slot, occupant })
            }
            (
                _,
                Some(RejectReason::Overlap)
                | Some(RejectReason::CollisionUnresolved)
                | Some(RejectReason::NudgeTooFar),
            ) => Err(BoardError::CollisionUnresolved {
                token_id: token.clone(),
                x: position.x,
                y: position.y,
                iterations: self.resolve.max_iterations,
            }),
            (_, Some(RejectReason::OutOfBounds)) => Err(refuse(PositionFault::OutOfBounds)),
            (_, Some(RejectReason::NoSlotInRange)) | (_, None) => {
                Err(refuse(PositionFault::NotOnSlot))
            }
        }
    }

    fn resolve_slot(
        &self,
        model: &SpatialModel,
        token: &TokenId,
        drop: Position,
        check_spacing: bool,
    ) -> SnapCandidate {
        let Some((slot, dist)) = self.nearest_slot(drop, model.formation().slots()) else {
            return SnapCandidate::invalid(RejectReason::NoSlotInRange);
        };
        let target = CandidateTarget::Slot { slot_id: slot.id.clone(), position: slot.position };

        let occupant = model.occupant(&slot.id).filter(|holder| *holder != token).cloned();
        if let Some(holder) = occupant.as_ref() {
            if model.token(holder).map(|t| t.locked).unwrap_or(false) {
                return SnapCandidate::invalid_at(target, dist, RejectReason::OccupantLocked);
            }
            if self.mode == PositioningMode::Formation && model.slot_of(token).is_none() {
                return SnapCandidate::invalid_at(target, dist, RejectReason::UnanchoredSwap);
            }
        }

        if check_spacing {
            // The swap partner ends up where the dragged token was, so it is
            // not an obstacle at the slot target.
            let blocked = model
                .find_overlaps(slot.position, Some(token), self.resolve.min_distance)
                .into_iter()
                .any(|other| Some(&other) != occupant.as_ref());
            if blocked {
                return SnapCandidate::invalid_at(target, dist, RejectReason::Overlap);
            }
        }

        match occupant {
            Some(holder) => SnapCandidate::swap(target, holder, dist),
            None => SnapCandidate::valid(target, dist),
        }
    }

    fn resolve_free(&self, model: &SpatialModel, token: &TokenId, drop: Position) -> SnapCandidate {
        let overlaps = model.find_overlaps(drop, Some(token), self.resolve.min_distance);
        if overlaps.is_empty() {
            return SnapCandidate::valid(CandidateTarget::Free { position: drop }, 0.0);
        }

        if let Some(partner) = self.swap_partner(model, &overlaps, drop) {
            let position = model.token(&partner).map(|t| t.position).unwrap_or(drop);
            return SnapCandidate::swap(
                CandidateTarget::Free { position },
                partner,
                distance(drop, position),
            );
        }

        match model.auto_resolve_overlap(token, drop, &self.resolve) {
            Ok(resolved) => SnapCandidate::valid(
                CandidateTarget::Free { position: resolved },
                distance(drop, resolved),
            ),
            Err(_) => SnapCandidate::invalid_at(
                CandidateTarget::Free { position: drop },
                0.0,
                RejectReason::CollisionUnresolved,
            ),
        }
    }

    fn resolve_hybrid(
        &self,
        model: &SpatialModel,
        token: &TokenId,
        drop: Position,
    ) -> SnapCandidate {
        let detach_sq = self.detach_distance * self.detach_distance;
        let anchor = model
            .slot_of(token)
            .and_then(|slot_id| model.formation().slot(slot_id))
            .filter(|slot| distance_sq(drop, slot.position) <= detach_sq);

        let Some(anchor) = anchor else {
            return self.resolve_slot(model, token, drop, true);
        };

        let nudge = |position: Position| CandidateTarget::Nudge {
            slot_id: anchor.id.clone(),
            position,
        };
        let overlaps = model.find_overlaps(drop, Some(token), self.resolve.min_distance);
        if overlaps.is_empty() {
            return SnapCandidate::valid(nudge(drop), distance(drop, anchor.position));
        }

        match model.auto_resolve_overlap(token, drop, &self.resolve) {
            Ok(resolved) if distance_sq(resolved, anchor.position) <= detach_sq => {
                SnapCandidate::valid(nudge(resolved), distance(resolved, anchor.position))
            }
            Ok(_) => SnapCandidate::invalid_at(nudge(drop), 0.0, RejectReason::NudgeTooFar),
            Err(_) => {
                SnapCandidate::invalid_at(nudge(drop), 0.0, RejectReason::CollisionUnresolved)
            }
        }
    }

    /// Exactly one unlocked token within `swap_tolerance` of the cursor.
    fn swap_partner(
        &self,
        model: &SpatialModel,
        overlaps: &[TokenId],
        drop: Position,
    ) -> Option<TokenId> {
        let limit = self.swap_tolerance * self.swap_tolerance;
        let mut close = overlaps.iter().filter(|id| {
            model.token(id).map(|t| distance_sq(drop, t.position) <= limit).unwrap_or(false)
        });
        let partner = close.next()?;
        if close.next().is_some() {
            // Ambiguous gesture
            return None;
        }
        match model.token(partner) {
            Some(t) if !t.locked => Some(partner.clone()),
            _ => None,
        }
    }
}

/// Does `slot` at squared distance `d2` win over `current`?
fn beats(slot: &Slot, d2: f32, current: &Slot, current_d2: f32) -> bool {
    if (d2 - current_d2).abs() > SNAP_TIE_EPSILON {
        return d2 < current_d2;
    }
    (slot.priority, &slot.id) < (current.priority, &current.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::{Formation, FormationPreset, Role};
    use crate::spatial::TokenSpec;

    fn resolver(config: BoardConfig) -> SnapResolver {
        SnapResolver::new(&config)
    }

    fn formation_model() -> SpatialModel {
        let formation = FormationPreset::T442.formation();
        let mut model = SpatialModel::new(PositioningMode::Formation, formation.clone());
        for slot in formation.slots() {
            let spec = TokenSpec::new(format!("p-{}", slot.id), slot.role);
            model.insert_token(&spec, slot.position, Some(slot.id.clone())).unwrap();
        }
        model
    }

    #[test]
    fn test_tie_break_by_priority_regardless_of_order() {
        let r = resolver(BoardConfig::default());
        let a = Slot::new("A", Role::MidfielderCenter, 0.25, 0.5, 2);
        let b = Slot::new("B", Role::MidfielderCenter, 0.75, 0.5, 1);
        let drop = Position::new(0.5, 0.5);
        let r = SnapResolver { snap_distance: 0.3, ..r };

        let forward = vec![a.clone(), b.clone()];
        let backward = vec![b.clone(), a.clone()];
        assert_eq!(r.nearest_slot(drop, &forward).unwrap().0.id, SlotId::new("B"));
        assert_eq!(r.nearest_slot(drop, &backward).unwrap().0.id, SlotId::new("B"));
    }

    #[test]
    fn test_tie_break_by_id_when_priority_equal() {
        let r = SnapResolver { snap_distance: 0.3, ..resolver(BoardConfig::default()) };
        let a = Slot::new("Z", Role::MidfielderCenter, 0.25, 0.5, 1);
        let b = Slot::new("M", Role::MidfielderCenter, 0.75, 0.5, 1);
        let slots = vec![a, b];
        let (winner, _) = r.nearest_slot(Position::new(0.5, 0.5), &slots).unwrap();
        assert_eq!(winner.id, SlotId::new("M"));
    }

    #[test]
    fn test_nearest_slot_reports_true_distance() {
        let r = resolver(BoardConfig::default());
        let slots = vec![Slot::new("GK", Role::Goalkeeper, 0.5, 0.95, 0)];
        let (_, d) = r.nearest_slot(Position::new(0.53, 0.91), &slots).unwrap();
        assert!((d - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_formation_snap_swap_flag() {
        let model = formation_model();
        let r = resolver(BoardConfig::default());
        let lb = TokenId::new("p-LB");
        let c = r.resolve(&model, &lb, Position::new(0.42, 0.79));
        assert_eq!(c.validity, CandidateValidity::Swap);
        assert_eq!(c.occupant, Some(TokenId::new("p-LCB")));
        assert_eq!(c.target.unwrap().slot_id(), Some(&SlotId::new("LCB")));

        // Own slot is a plain valid drop
        let c = r.resolve(&model, &lb, Position::new(0.21, 0.8));
        assert_eq!(c.validity, CandidateValidity::Valid);
    }

    #[test]
    fn test_formation_no_slot_in_range() {
        let model = formation_model();
        let r = resolver(BoardConfig::default());
        let c = r.resolve(&model, &TokenId::new("p-GK"), Position::new(0.5, 0.5));
        assert!(c.is_invalid());
        assert_eq!(c.reason, Some(RejectReason::NoSlotInRange));
    }

    #[test]
    fn test_locked_occupant_is_not_swapped() {
        let mut model = formation_model();
        model.set_locked(&TokenId::new("p-LCB"), true).unwrap();
        let r = resolver(BoardConfig::default());
        let c = r.resolve(&model, &TokenId::new("p-LB"), Position::new(0.4, 0.8));
        assert_eq!(c.reason, Some(RejectReason::OccupantLocked));
    }

    fn freeform_model() -> SpatialModel {
        let formation = Formation::new("empty", vec![]).unwrap();
        let mut model = SpatialModel::new(PositioningMode::Freeform, formation);
        for (id, x, y) in [("a", 0.30, 0.3), ("b", 0.32, 0.3), ("c", 0.7, 0.7), ("m", 0.9, 0.1)] {
            let spec = TokenSpec::new(id, Role::MidfielderCenter);
            model.insert_token(&spec, Position::new(x, y), None).unwrap();
        }
        model
    }

    #[test]
    fn test_freeform_swap_gesture() {
        let model = freeform_model();
        let r = resolver(BoardConfig::freeform());
        let c = r.resolve(&model, &TokenId::new("m"), Position::new(0.71, 0.7));
        assert_eq!(c.validity, CandidateValidity::Swap);
        assert_eq!(c.occupant, Some(TokenId::new("c")));
        assert_eq!(c.target.unwrap().position(), Position::new(0.7, 0.7));
    }

    #[test]
    fn test_freeform_ambiguous_swap_falls_back_to_invalid() {
        let model = freeform_model();
        let r = resolver(BoardConfig::freeform());
        let c = r.resolve(&model, &TokenId::new("m"), Position::new(0.31, 0.3));
        assert!(c.is_invalid());
        assert_eq!(c.reason, Some(RejectReason::CollisionUnresolved));
    }

    #[test]
    fn test_freeform_auto_resolve_nudges_valid() {
        let model = freeform_model();
        let r = resolver(BoardConfig::freeform());
        let c = r.resolve(&model, &TokenId::new("m"), Position::new(0.7, 0.74));
        assert_eq!(c.validity, CandidateValidity::Valid);
        let p = c.target.unwrap().position();
        assert!(distance(p, Position::new(0.7, 0.7)) >= 0.05);
    }

    #[test]
    fn test_hybrid_nudge_and_detach() {
        let formation = FormationPreset::T442.formation();
        let mut model = SpatialModel::new(PositioningMode::Hybrid, formation.clone());
        let lb = formation.slot(&SlotId::new("LB")).unwrap();
        let spec = TokenSpec::new("x", Role::DefenderLeft);
        model.insert_token(&spec, lb.position, Some(lb.id.clone())).unwrap();
        let r = resolver(BoardConfig::hybrid());

        let c = r.resolve(&model, &spec.id, Position::new(0.23, 0.78));
        assert_eq!(c.validity, CandidateValidity::Valid);
        assert!(matches!(c.target, Some(CandidateTarget::Nudge { .. })));

        let c = r.resolve(&model, &spec.id, Position::new(0.39, 0.79));
        assert_eq!(c.validity, CandidateValidity::Valid);
        assert_eq!(c.target.unwrap().slot_id(), Some(&SlotId::new("LCB")));
    }

    #[test]
    fn test_resolve_direct_refuses_swaps() {
        let model = formation_model();
        let r = resolver(BoardConfig::default());
        let err = r
            .resolve_direct(&model, &TokenId::new("p-LB"), Position::new(0.4, 0.8))
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::SlotOccupied {
                slot: SlotId::new("LCB"),
                occupant: TokenId::new("p-LCB")
            }
        );

        let err = r
            .resolve_direct(&model, &TokenId::new("p-LB"), Position::new(0.5, 0.5))
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidPosition { fault: PositionFault::NotOnSlot, .. }));
    }

    #[test]
    fn test_unanchored_token_cannot_swap_in_formation_mode() {
        let mut model = formation_model();
        let sub = TokenId::new("sub");
        let spec = TokenSpec::new(sub.clone(), Role::ForwardLeft);
        model.insert_token(&spec, Position::new(0.0, 0.1), None).unwrap();
        let r = resolver(BoardConfig::default());

        let c = r.resolve(&model, &sub, Position::new(0.36, 0.2));
        assert_eq!(c.validity, CandidateValidity::Invalid);
        assert_eq!(c.reason, Some(RejectReason::UnanchoredSwap));
        assert_eq!(c.occupant, None);
        assert_eq!(c.target.as_ref().and_then(|t| t.slot_id()), Some(&SlotId::new("LW")));

        // An empty slot is still a plain move
        model.remove_token(&TokenId::new("p-LW")).unwrap();
        let c = r.resolve(&model, &sub, Position::new(0.36, 0.2));
        assert_eq!(c.validity, CandidateValidity::Valid);
    }

    #[test]
    fn test_resolve_direct_freeform_collision() {
        let model = freeform_model();
        let r = resolver(BoardConfig::freeform());
        let err = r
            .resolve_direct(&model, &TokenId::new("m"), Position::new(0.31, 0.3))
            .unwrap_err();
        assert!(matches!(err, BoardError::CollisionUnresolved { .. }));
    }

    #[test]
    fn test_out_of_bounds_drop() {
        let model = freeform_model();
        let r = resolver(BoardConfig::freeform());
        let c = r.resolve(&model, &TokenId::new("m"), Position::new(1.02, 0.5));
        assert_eq!(c.reason, Some(RejectReason::OutOfBounds));
    }
}
