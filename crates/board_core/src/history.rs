//! History Manager
//!
//! Linear undo/redo over committed mutations, stored as an append-only log
//! of immutable delta records plus a cursor. No board snapshots are copied;
//! each entry only carries the tokens it touched.
//!
//! ```text
//! record(e5)
//!   entries: [e1, e2, e3, e4, e5]   cursor = 5
//!
//! undo() x2
//!   entries: [e1, e2, e3, e4, e5]   cursor = 3   (e4, e5 redoable)
//!
//! record(e6)                        <-- new branch, redo invalidated
//!   entries: [e1, e2, e3, e6]       cursor = 4
//! ```
//!
//! # Invariants
//!
//! 1. `cursor <= entries.len() <= max_depth`
//! 2. Sequence numbers are strictly increasing along `entries`
//! 3. Redo is only possible after an undo and dies with the next `record`

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::{BoardError, Result, StackSide};
use crate::events::MutationKind;
use crate::formation::Formation;
use crate::spatial::{Placement, SpatialModel, TokenDelta};

/// Formation replacement carried by a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationChange {
    pub before: Formation,
    pub after: Formation,
}

/// One committed mutation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Assigned by [`HistoryManager::record`]
    pub sequence: u64,
    pub kind: MutationKind,
    pub deltas: Vec<TokenDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation: Option<FormationChange>,
}

impl HistoryEntry {
    pub fn moves(kind: MutationKind, deltas: Vec<TokenDelta>) -> Self {
        Self { sequence: 0, kind, deltas, formation: None }
    }

    pub fn formation_change(before: Formation, after: Formation, deltas: Vec<TokenDelta>) -> Self {
        Self {
            sequence: 0,
            kind: MutationKind::FormationChange,
            deltas,
            formation: Some(FormationChange { before, after }),
        }
    }

    pub fn forward(&self) -> Vec<Placement> {
        self.deltas.iter().map(TokenDelta::forward).collect()
    }

    /// Inverse placements, last delta first.
    pub fn inverse(&self) -> Vec<Placement> {
        self.deltas.iter().rev().map(TokenDelta::inverse).collect()
    }
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<HistoryEntry>,
    /// Number of entries currently applied
    cursor: usize,
    max_depth: usize,
    next_sequence: u64,
}

impl HistoryManager {
    pub fn new(max_depth: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: 0, max_depth: max_depth.max(1), next_sequence: 1 }
    }

    // ========================
    // Core operations
    // ========================

    /// Append a committed mutation. Clears redo, evicts the oldest entry past
    /// `max_depth`. Returns the assigned sequence number.
    pub fn record(&mut self, mut entry: HistoryEntry) -> u64 {
        self.entries.truncate(self.cursor);

        entry.sequence = self.next_sequence;
        self.next_sequence += 1;
        let sequence = entry.sequence;
        self.entries.push_back(entry);
        self.cursor = self.entries.len();

        while self.entries.len() > self.max_depth {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("history evicted entry #{}", evicted.sequence);
            }
            self.cursor -= 1;
        }
        sequence
    }

    /// Restore the state before the most recent applied entry.
    pub fn undo(&mut self, model: &mut SpatialModel) -> Result<HistoryEntry> {
        if self.cursor == 0 {
            return Err(BoardError::EmptyStack(StackSide::Undo));
        }
        let entry = self.entries[self.cursor - 1].clone();
        model.restore(&entry.inverse())?;
        if let Some(change) = entry.formation.as_ref() {
            model.replace_formation(change.before.clone());
        }
        self.cursor -= 1;
        log::info!("undo #{} ({})", entry.sequence, entry.kind.as_str());
        Ok(entry)
    }

    /// Re-apply the most recently undone entry.
    pub fn redo(&mut self, model: &mut SpatialModel) -> Result<HistoryEntry> {
        if self.cursor == self.entries.len() {
            return Err(BoardError::EmptyStack(StackSide::Redo));
        }
        let entry = self.entries[self.cursor].clone();
        model.restore(&entry.forward())?;
        if let Some(change) = entry.formation.as_ref() {
            model.replace_formation(change.after.clone());
        }
        self.cursor += 1;
        log::info!("redo #{} ({})", entry.sequence, entry.kind.as_str());
        Ok(entry)
    }

    // ========================
    // Queries
    // ========================

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Look up a retained entry by sequence number.
    pub fn entry(&self, sequence: u64) -> Option<&HistoryEntry> {
        self.entries
            .binary_search_by_key(&sequence, |e| e.sequence)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Drop everything (roster changes invalidate recorded deltas).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
