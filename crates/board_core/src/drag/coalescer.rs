//! Pointer-move coalescing
//!
//! Moves arriving faster than the host renders are held here with a
//! "latest wins" policy. Only the newest position survives until the frame
//! ends; pointer-up and cancel flush it first so resolution never works
//! from a stale pointer.

use crate::spatial::Position;

#[derive(Debug, Clone, Default)]
pub struct MoveCoalescer {
    pending: Option<Position>,
    /// Moves dropped since the last flush
    superseded: u32,
}

impl MoveCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `position`, replacing any pending move.
    pub fn push(&mut self, position: Position) {
        if self.pending.replace(position).is_some() {
            self.superseded += 1;
        }
    }

    /// Take the pending move, if any.
    pub fn flush(&mut self) -> Option<Position> {
        if self.superseded > 0 {
            log::trace!("coalesced {} pointer move(s)", self.superseded);
        }
        self.superseded = 0;
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn superseded(&self) -> u32 {
        self.superseded
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.superseded = 0;
    }
}
