//! Board facade
//!
//! One `Board` is one independent editing session: it owns the spatial
//! model, the drag controller, history, the latest validation report and an
//! outbox of mutation events. Several boards with different configurations
//! can live side by side.
//!
//! ## Flow
//! ```text
//! InputEvent ─▶ DragController ─▶ SnapResolver
//!                    │ commit
//!                    ▼
//!              SpatialModel ─▶ HistoryManager::record
//!                    │
//!                    ├─▶ FormationValidator (report refreshed)
//!                    └─▶ MutationEvent (outbox + sinks)
//! ```

use std::fmt;

use crate::config::{BoardConfig, PositioningMode};
use crate::drag::{
    CancelReason, DragController, DragOutcome, DragSession, DragState, IgnoreReason, MoveCoalescer,
};
use crate::error::{BoardError, Result};
use crate::events::{InputEvent, InputKind, MutationEvent, MutationKind, MutationSink};
use crate::formation::{
    assign_tokens, Assignee, Formation, FormationPreset, SlotAssignment, SlotId,
};
use crate::history::{HistoryEntry, HistoryManager};
use crate::spatial::{Placement, Position, SpatialModel, Token, TokenDelta, TokenId, TokenSpec};
use crate::validator::{Finding, FormationValidator, ValidationReport, KEY_CAPACITY_MISMATCH};

/// Unplaced tokens wait on the left touchline, spread down the pitch.
fn parking_spot(index: usize) -> Position {
    Position::new(0.0, (0.1 + 0.08 * index as f32).min(1.0))
}

pub struct Board {
    config: BoardConfig,
    model: SpatialModel,
    drag: DragController,
    coalescer: MoveCoalescer,
    history: HistoryManager,
    validator: FormationValidator,
    report: ValidationReport,
    outbox: Vec<MutationEvent>,
    sinks: Vec<Box<dyn MutationSink>>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("mode", &self.config.mode)
            .field("formation", &self.model.formation().name())
            .field("tokens", &self.model.len())
            .field("drag_state", &self.drag.state())
            .field("undo_depth", &self.history.undo_depth())
            .field("redo_depth", &self.history.redo_depth())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Board {
    /// Build a board and place the roster.
    ///
    /// Slot modes assign tokens to slots by minimum cost; freeform uses each
    /// token's requested position, falling back to the assigned slot target.
    /// Tokens that find no slot are parked and surface as a capacity error.
    pub fn new(config: BoardConfig, formation: Formation, roster: Vec<TokenSpec>) -> Result<Self> {
        config.validate()?;
        for (i, spec) in roster.iter().enumerate() {
            if roster[..i].iter().any(|other| other.id == spec.id) {
                return Err(BoardError::DuplicateToken(spec.id.clone()));
            }
        }

        let mut model = SpatialModel::new(config.mode, formation);
        let assignees: Vec<Assignee> = roster.iter().map(Assignee::from).collect();
        let assignment = assign_tokens(&assignees, model.formation());
        let mut parked = 0;
        for spec in &roster {
            let slot = assignment
                .slot_for(&spec.id)
                .and_then(|id| model.formation().slot(id))
                .map(|s| (s.id.clone(), s.position));
            let (position, anchor) = match (config.mode.uses_slots(), slot, spec.position) {
                (true, Some((id, target)), _) => (target, Some(id)),
                (false, _, Some(requested)) if requested.in_bounds() => (requested, None),
                (false, Some((_, target)), _) => (target, None),
                (_, _, requested) => {
                    parked += 1;
                    let spot = requested
                        .filter(|p| p.in_bounds() && !config.mode.uses_slots())
                        .unwrap_or_else(|| parking_spot(parked - 1));
                    (spot, None)
                }
            };
            model.insert_token(spec, position, anchor)?;
        }

        let validator = FormationValidator::new(config.validation.clone());
        let report = validator.validate(&model);
        log::info!(
            "board ready: {} mode, '{}', {} token(s), {} parked",
            config.mode.as_str(),
            model.formation().name(),
            model.len(),
            parked
        );

        Ok(Self {
            drag: DragController::new(&config),
            history: HistoryManager::new(config.history_depth),
            coalescer: MoveCoalescer::new(),
            config,
            model,
            validator,
            report,
            outbox: Vec::new(),
            sinks: Vec::new(),
        })
    }

    pub fn with_preset(
        config: BoardConfig,
        preset: FormationPreset,
        roster: Vec<TokenSpec>,
    ) -> Result<Self> {
        Self::new(config, preset.formation(), roster)
    }

    // ========================
    // Input
    // ========================

    /// Route one normalized pointer event.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<DragOutcome> {
        match event.kind {
            InputKind::Cancel => Ok(self.cancel()),
            InputKind::Down => self.pointer_down(event.token_id.as_ref(), event.pointer()?),
            InputKind::Move => Ok(self.pointer_move(event.pointer()?)),
            InputKind::Up => Ok(self.pointer_up(event.pointer()?)),
        }
    }

    pub fn pointer_down(&mut self, token: Option<&TokenId>, at: Position) -> Result<DragOutcome> {
        if !self.drag.is_dragging() {
            self.coalescer.clear();
        }
        self.drag.pointer_down(&self.model, token, at)
    }

    /// Held until [`Board::end_frame`] when coalescing is on.
    pub fn pointer_move(&mut self, at: Position) -> DragOutcome {
        if self.config.coalesce_moves && self.drag.is_dragging() {
            self.coalescer.push(at);
            return DragOutcome::Coalesced;
        }
        self.drag.pointer_move(&self.model, at)
    }

    /// Flush the coalesced pointer move, if any.
    pub fn end_frame(&mut self) -> Option<DragOutcome> {
        let at = self.coalescer.flush()?;
        Some(self.drag.pointer_move(&self.model, at))
    }

    pub fn pointer_up(&mut self, at: Position) -> DragOutcome {
        if let Some(outcome) = self.end_frame() {
            if matches!(outcome, DragOutcome::Cancelled(_)) {
                return outcome;
            }
        }
        let outcome = self.drag.pointer_up(&mut self.model, Some(at));
        if let DragOutcome::Committed(commit) = &outcome {
            self.on_commit(HistoryEntry::moves(commit.kind, commit.deltas.clone()));
        }
        outcome
    }

    /// Escape / host cancel. Safe to call at any time.
    pub fn cancel(&mut self) -> DragOutcome {
        self.coalescer.clear();
        self.drag.cancel()
    }

    /// Abort an in-flight gesture without touching the model.
    pub fn reset_drag(&mut self) -> DragOutcome {
        self.coalescer.clear();
        match self.drag.reset() {
            Some(_) => DragOutcome::Cancelled(CancelReason::Reset),
            None => DragOutcome::Ignored(IgnoreReason::NotDragging),
        }
    }

    // ========================
    // Programmatic mutations
    // ========================

    /// Move a token directly under the active mode's rules. Never treated
    /// as a swap gesture. Returns where the token ended up.
    pub fn move_token(&mut self, id: &TokenId, position: Position) -> Result<Position> {
        if self.drag.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        let token = self.model.token(id).ok_or_else(|| BoardError::TokenNotFound(id.clone()))?;
        if token.locked {
            return Err(BoardError::TokenLocked(id.clone()));
        }

        let target = self.drag.resolver().resolve_direct(&self.model, id, position)?;
        let placement = Placement::new(id.clone(), target.position(), target.slot_id().cloned());
        let deltas = self.model.apply(&[placement])?;
        if !deltas.iter().all(TokenDelta::is_noop) {
            self.on_commit(HistoryEntry::moves(MutationKind::Move, deltas));
        }
        Ok(target.position())
    }

    pub fn set_locked(&mut self, id: &TokenId, locked: bool) -> Result<()> {
        self.model.set_locked(id, locked)?;
        log::debug!("{} {}", id, if locked { "locked" } else { "unlocked" });
        Ok(())
    }

    /// Add a token to the board. Clears history.
    pub fn add_token(&mut self, spec: TokenSpec) -> Result<Position> {
        if self.drag.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        if self.model.contains(&spec.id) {
            return Err(BoardError::DuplicateToken(spec.id.clone()));
        }

        let (position, anchor) = if self.config.mode.uses_slots() {
            self.free_slot_for(&spec)?
        } else {
            let requested = spec.position.unwrap_or(Position::CENTER);
            (requested, None)
        };
        self.model.insert_token(&spec, position, anchor)?;

        let mut placed = position;
        if !self.config.mode.uses_slots() {
            let params = self.config.resolve_params();
            match self.model.auto_resolve_overlap(&spec.id, position, &params) {
                Ok(resolved) if resolved != position => {
                    self.model.set_position(&spec.id, resolved)?;
                    placed = resolved;
                }
                Ok(_) => {}
                Err(err) => {
                    self.model.remove_token(&spec.id)?;
                    return Err(err);
                }
            }
        }

        self.roster_changed();
        log::info!("token {} added at ({:.3}, {:.3})", spec.id, placed.x, placed.y);
        Ok(placed)
    }

    /// Remove a token from the board. Clears history.
    pub fn remove_token(&mut self, id: &TokenId) -> Result<Token> {
        if self.drag.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        let token = self.model.remove_token(id)?;
        self.roster_changed();
        log::info!("token {} removed", id);
        Ok(token)
    }

    /// Replace the formation atomically and re-place every token.
    ///
    /// Recorded as one history entry; a capacity mismatch does not fail the
    /// load, it shows up as a validation error. In freeform and hybrid mode
    /// leftover tokens are pushed off the new targets; if one cannot be, the
    /// load fails with `CollisionUnresolved` and nothing changes.
    pub fn load_formation(&mut self, formation: Formation) -> Result<&ValidationReport> {
        if let Some(session) = self.drag.reset() {
            log::warn!("formation load aborted drag of {}", session.token_id);
        }
        self.coalescer.clear();

        let previous: Vec<Token> = self.model.tokens().to_vec();
        let assignees: Vec<Assignee> = previous.iter().map(Assignee::from).collect();
        let assignment = assign_tokens(&assignees, &formation);
        let uses_slots = self.config.mode.uses_slots();
        let placements: Vec<Placement> = previous
            .iter()
            .map(|token| {
                match assignment.slot_for(&token.id).and_then(|id| formation.slot(id)) {
                    Some(slot) => Placement::new(
                        token.id.clone(),
                        slot.position,
                        uses_slots.then(|| slot.id.clone()),
                    ),
                    None => Placement::new(token.id.clone(), token.position, None),
                }
            })
            .collect();

        let after = formation.clone();
        let before = self.model.replace_formation(formation);
        let mut deltas = match self
            .model
            .restore(&placements)
            .and_then(|deltas| self.settle_unassigned(&assignment, deltas))
            .and_then(|deltas| self.model.check_invariants().map(|_| deltas))
        {
            Ok(deltas) => deltas,
            Err(err) => {
                self.model.replace_formation(before);
                let rollback: Vec<Placement> = previous
                    .iter()
                    .map(|t| Placement::new(t.id.clone(), t.position, t.slot.clone()))
                    .collect();
                self.model.restore(&rollback)?;
                return Err(err);
            }
        };
        // Anchors were cleared by the swap; record the true prior state
        for (delta, prior) in deltas.iter_mut().zip(&previous) {
            delta.from = prior.position;
            delta.from_slot = prior.slot.clone();
        }

        log::info!(
            "formation '{}' -> '{}' ({} unassigned, {} empty slot(s))",
            before.name(),
            after.name(),
            assignment.unassigned.len(),
            assignment.empty_slots.len()
        );
        let name = after.name().to_string();
        let entry = HistoryEntry::formation_change(before, after, deltas.clone());
        let sequence = self.history.record(entry);
        self.refresh_validation();
        self.emit(
            MutationEvent::from_deltas(sequence, MutationKind::FormationChange, &deltas)
                .with_formation(name),
        );
        Ok(&self.report)
    }

    // ========================
    // History
    // ========================

    pub fn undo(&mut self) -> Result<HistoryEntry> {
        if self.drag.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        let entry = self.history.undo(&mut self.model)?;
        let applied: Vec<TokenDelta> =
            entry.deltas.iter().rev().map(TokenDelta::reversed).collect();
        let mut event = MutationEvent::from_deltas(entry.sequence, MutationKind::Undo, &applied);
        if let Some(change) = entry.formation.as_ref() {
            event = event.with_formation(change.before.name());
        }
        self.refresh_validation();
        self.emit(event);
        Ok(entry)
    }

    pub fn redo(&mut self) -> Result<HistoryEntry> {
        if self.drag.is_dragging() {
            return Err(BoardError::DragInProgress);
        }
        let entry = self.history.redo(&mut self.model)?;
        let mut event =
            MutationEvent::from_deltas(entry.sequence, MutationKind::Redo, &entry.deltas);
        if let Some(change) = entry.formation.as_ref() {
            event = event.with_formation(change.after.name());
        }
        self.refresh_validation();
        self.emit(event);
        Ok(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================
    // Snapshots
    // ========================

    /// Ordered (token, position) snapshot in registration order.
    pub fn get_all_positions(&self) -> Vec<(TokenId, Position)> {
        self.model.positions()
    }

    pub fn get_position(&self, id: &TokenId) -> Result<Position> {
        self.model.get_position(id)
    }

    /// Copy of the gesture in progress; never a live reference.
    pub fn get_drag_session(&self) -> Option<DragSession> {
        self.drag.session().cloned()
    }

    pub fn get_validation_findings(&self) -> &[Finding] {
        &self.report.findings
    }

    pub fn validation_report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    pub fn formation(&self) -> &Formation {
        self.model.formation()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn model(&self) -> &SpatialModel {
        &self.model
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Fresh validation; errors block finalization.
    ///
    /// A roster that only fails on size reports `CapacityMismatch`; any
    /// other error set reports `FinalizeBlocked`.
    pub fn finalize(&self) -> Result<ValidationReport> {
        let report = self.validator.validate(&self.model);
        if !report.has_errors() {
            return Ok(report);
        }
        let errors = report.error_count();
        if errors == 1 && report.contains_key(KEY_CAPACITY_MISMATCH) {
            return Err(BoardError::CapacityMismatch {
                capacity: self.model.formation().capacity(),
                tokens: self.model.len(),
            });
        }
        Err(BoardError::FinalizeBlocked { errors })
    }

    // ========================
    // Outbound events
    // ========================

    /// Drain the mutation outbox.
    pub fn take_mutation_events(&mut self) -> Vec<MutationEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn subscribe(&mut self, sink: Box<dyn MutationSink>) {
        self.sinks.push(sink);
    }

    // ========================
    // Internals
    // ========================

    fn on_commit(&mut self, entry: HistoryEntry) {
        let kind = entry.kind;
        let event_deltas = entry.deltas.clone();
        let sequence = self.history.record(entry);
        if let Err(err) = self.model.check_invariants() {
            log::error!("invariant broken after commit #{}: {}", sequence, err);
        }
        self.refresh_validation();
        self.emit(MutationEvent::from_deltas(sequence, kind, &event_deltas));
    }

    fn roster_changed(&mut self) {
        if let Some(session) = self.drag.reset() {
            log::debug!("roster change dropped drag of {}", session.token_id);
        }
        self.history.clear();
        self.refresh_validation();
    }

    fn refresh_validation(&mut self) {
        self.report = self.validator.validate(&self.model);
    }

    fn emit(&mut self, event: MutationEvent) {
        for sink in &mut self.sinks {
            sink.on_mutation(&event);
        }
        self.outbox.push(event);
    }

    /// Freeform/hybrid: tokens the new formation left without a slot keep
    /// their old spot, which may now sit on a slot target. Push them clear
    /// and patch their deltas; fail if spacing still does not hold.
    fn settle_unassigned(
        &mut self,
        assignment: &SlotAssignment,
        mut deltas: Vec<TokenDelta>,
    ) -> Result<Vec<TokenDelta>> {
        if self.config.mode == PositioningMode::Formation {
            return Ok(deltas);
        }
        let params = self.config.resolve_params();
        for delta in deltas.iter_mut() {
            if assignment.slot_for(&delta.token_id).is_some() {
                continue;
            }
            if self.model.token(&delta.token_id).map(|t| t.locked).unwrap_or(false) {
                continue;
            }
            let resolved = self.model.auto_resolve_overlap(&delta.token_id, delta.to, &params)?;
            if resolved != delta.to {
                let placement = Placement::new(delta.token_id.clone(), resolved, None);
                self.model.restore(&[placement])?;
                delta.to = resolved;
                delta.to_slot = None;
            }
        }

        if let Some(violation) = self.model.spacing_violations(self.config.min_distance).first() {
            let at = self.model.get_position(&violation.b)?;
            return Err(BoardError::CollisionUnresolved {
                token_id: violation.b.clone(),
                x: at.x,
                y: at.y,
                iterations: params.max_iterations,
            });
        }
        Ok(deltas)
    }

    /// Best empty slot for a newcomer, or a parking spot when full.
    fn free_slot_for(&self, spec: &TokenSpec) -> Result<(Position, Option<SlotId>)> {
        let empty: Vec<_> = self
            .model
            .formation()
            .slots()
            .iter()
            .filter(|s| self.model.occupant(&s.id).is_none())
            .cloned()
            .collect();
        if empty.is_empty() {
            let unanchored = self.model.tokens().iter().filter(|t| t.slot.is_none()).count();
            return Ok((parking_spot(unanchored), None));
        }
        let open = Formation::new("open slots", empty)?;
        let assignment = assign_tokens(&[Assignee::from(spec)], &open);
        Ok(match assignment.slot_for(&spec.id).and_then(|id| open.slot(id)) {
            Some(slot) => (slot.position, Some(slot.id.clone())),
            None => (parking_spot(0), None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::{Role, SlotId};
    use crate::validator::{KEY_CAPACITY_MISMATCH, KEY_REQUIRED_SLOT_EMPTY};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn roster_442() -> Vec<TokenSpec> {
        FormationPreset::T442
            .formation()
            .slots()
            .iter()
            .map(|s| TokenSpec::new(format!("p-{}", s.id), s.role))
            .collect()
    }

    fn board() -> Board {
        Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster_442()).unwrap()
    }

    fn id(s: &str) -> TokenId {
        TokenId::new(s)
    }

    // ========================
    // Construction
    // ========================

    #[test]
    fn test_roster_lands_on_matching_slots() {
        let board = board();
        assert_eq!(board.get_position(&id("p-GK")).unwrap(), Position::new(0.5, 0.95));
        assert_eq!(board.model().slot_of(&id("p-RB")), Some(&SlotId::new("RB")));
        assert!(board.get_validation_findings().is_empty());
        assert!(board.model().check_invariants().is_ok());
    }

    #[test]
    fn test_duplicate_roster_ids_rejected() {
        let mut roster = roster_442();
        roster.push(TokenSpec::new("p-GK", Role::Goalkeeper));
        let err = Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster)
            .unwrap_err();
        assert_eq!(err, BoardError::DuplicateToken(id("p-GK")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BoardConfig { history_depth: 0, ..BoardConfig::default() };
        let err = Board::with_preset(config, FormationPreset::T442, roster_442()).unwrap_err();
        assert!(matches!(err, BoardError::InvalidConfig(_)));
    }

    #[test]
    fn test_surplus_token_is_parked_and_flagged() {
        let mut roster = roster_442();
        roster.push(TokenSpec::new("sub", Role::Striker));
        let board =
            Board::with_preset(BoardConfig::default(), FormationPreset::T442, roster).unwrap();
        assert_eq!(board.model().slot_of(&id("sub")), None);
        assert_eq!(board.get_position(&id("sub")).unwrap(), parking_spot(0));
        assert!(board.validation_report().contains_key(KEY_CAPACITY_MISMATCH));
        assert_eq!(
            board.finalize().unwrap_err(),
            BoardError::CapacityMismatch { capacity: 11, tokens: 12 }
        );
    }

    // ========================
    // Drag through the facade
    // ========================

    #[test]
    fn test_coalesced_moves_flush_before_up() {
        let mut board = board();
        board.handle_input(&InputEvent::down(Some(id("p-LB")), 0.2, 0.8)).unwrap();
        assert_eq!(board.pointer_move(Position::new(0.3, 0.8)), DragOutcome::Coalesced);
        assert_eq!(board.pointer_move(Position::new(0.39, 0.8)), DragOutcome::Coalesced);
        // Session only sees moves after the frame ends
        assert_eq!(board.get_drag_session().unwrap().live, Position::new(0.2, 0.8));
        let DragOutcome::Updated(session) = board.end_frame().unwrap() else {
            panic!("expected Updated");
        };
        assert_eq!(session.live, Position::new(0.39, 0.8));
        assert!(board.end_frame().is_none());

        board.pointer_move(Position::new(0.6, 0.79));
        let outcome = board.pointer_up(Position::new(0.6, 0.79));
        assert!(outcome.is_commit());
        assert_eq!(board.model().slot_of(&id("p-LB")), Some(&SlotId::new("RCB")));
        assert_eq!(board.model().slot_of(&id("p-RCB")), Some(&SlotId::new("LB")));
        assert!(board.can_undo());
    }

    #[test]
    fn test_release_without_position_leaves_drag_open() {
        let mut board = board();
        board.handle_input(&InputEvent::down(Some(id("p-LB")), 0.2, 0.8)).unwrap();
        let release = InputEvent { position: None, ..InputEvent::up(0.0, 0.0) };
        assert!(matches!(board.handle_input(&release), Err(BoardError::Parse(_))));
        assert_eq!(board.drag_state(), DragState::Dragging);
        assert_eq!(board.get_position(&id("p-LB")).unwrap(), Position::new(0.2, 0.8));

        assert!(matches!(board.handle_input(&InputEvent::cancel()), Ok(DragOutcome::Cancelled(_))));
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_commit_emits_event_and_sink_sees_it() {
        let mut board = board();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = Rc::clone(&seen);
        board.subscribe(Box::new(move |e: &MutationEvent| sink_seen.borrow_mut().push(e.kind)));

        board.pointer_down(Some(&id("p-LW")), Position::new(0.35, 0.2)).unwrap();
        board.pointer_up(Position::new(0.64, 0.21));
        board.undo().unwrap();

        let events = board.take_mutation_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, MutationKind::Swap);
        assert_eq!(events[1].kind, MutationKind::Undo);
        assert_eq!(events[1].sequence, events[0].sequence);
        assert_eq!(*seen.borrow(), vec![MutationKind::Swap, MutationKind::Undo]);
        assert!(board.take_mutation_events().is_empty());
    }

    #[test]
    fn test_history_ops_refused_mid_drag() {
        let mut board = board();
        board.pointer_down(Some(&id("p-GK")), Position::new(0.5, 0.95)).unwrap();
        assert_eq!(board.undo().unwrap_err(), BoardError::DragInProgress);
        assert_eq!(
            board.move_token(&id("p-LB"), Position::new(0.4, 0.8)).unwrap_err(),
            BoardError::DragInProgress
        );
        assert_eq!(board.reset_drag(), DragOutcome::Cancelled(CancelReason::Reset));
        assert_eq!(board.drag_state(), DragState::Idle);
    }

    // ========================
    // Programmatic moves and roster
    // ========================

    #[test]
    fn test_move_token_in_formation_mode() {
        let mut board = board();
        let err = board.move_token(&id("p-LB"), Position::new(0.4, 0.8)).unwrap_err();
        assert!(matches!(err, BoardError::SlotOccupied { .. }));
        assert!(!err.is_fatal());
        assert!(!board.can_undo());

        board.remove_token(&id("p-LCB")).unwrap();
        let landed = board.move_token(&id("p-LB"), Position::new(0.42, 0.79)).unwrap();
        assert_eq!(landed, Position::new(0.4, 0.8));
        assert!(board.can_undo());
    }

    #[test]
    fn test_locked_token_cannot_move() {
        let mut board = board();
        board.set_locked(&id("p-GK"), true).unwrap();
        let err = board.move_token(&id("p-GK"), Position::new(0.5, 0.94)).unwrap_err();
        assert_eq!(err, BoardError::TokenLocked(id("p-GK")));
    }

    #[test]
    fn test_roster_change_clears_history() {
        let mut board = board();
        board.remove_token(&id("p-LCB")).unwrap();
        board.move_token(&id("p-LB"), Position::new(0.4, 0.8)).unwrap();
        assert!(board.can_undo());

        let placed = board.add_token(TokenSpec::new("new-cb", Role::DefenderCenter)).unwrap();
        assert!(!board.can_undo());
        // Only the LB slot is free now
        assert_eq!(placed, Position::new(0.2, 0.8));
        assert!(!board.validation_report().contains_key(KEY_CAPACITY_MISMATCH));
    }

    // ========================
    // Formation reload
    // ========================

    #[test]
    fn test_load_formation_is_one_undoable_entry() {
        let mut board = board();
        let before = board.get_all_positions();
        board.load_formation(FormationPreset::T433.formation()).unwrap();
        assert_eq!(board.formation().name(), "4-3-3");
        assert!(board.model().check_invariants().is_ok());
        assert!(!board.validation_report().contains_key(KEY_CAPACITY_MISMATCH));

        board.undo().unwrap();
        assert_eq!(board.formation().name(), "4-4-2");
        assert_eq!(board.get_all_positions(), before);
        assert_eq!(board.model().slot_of(&id("p-LM")), Some(&SlotId::new("LM")));

        board.redo().unwrap();
        assert_eq!(board.formation().name(), "4-3-3");
        assert!(board.model().check_invariants().is_ok());
    }

    #[test]
    fn test_load_smaller_formation_reports_capacity_error() {
        let mut board = board();
        let mini = Formation::new(
            "mini",
            vec![crate::formation::Slot::new("GK", Role::Goalkeeper, 0.5, 0.95, 0)],
        )
        .unwrap();
        let report = board.load_formation(mini).unwrap();
        assert!(report.contains_key(KEY_CAPACITY_MISMATCH));
        assert!(!report.contains_key(KEY_REQUIRED_SLOT_EMPTY));
        assert_eq!(board.model().slot_of(&id("p-GK")), Some(&SlotId::new("GK")));
        assert_eq!(board.model().slot_of(&id("p-LB")), None);
    }
}
