//! Input and output events
//!
//! `InputEvent` is what the host feeds in: pointer events already mapped
//! into normalized pitch space. `MutationEvent` is what goes out after every
//! commit, undo and redo, for an external layer to persist. Delivery is
//! fire-and-forget; the board never waits for or retries a sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::spatial::{Position, TokenDelta, TokenId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Down,
    Move,
    Up,
    Cancel,
}

/// Normalized pointer event `{ type, tokenId?, position? }`.
///
/// Only `cancel` may omit the position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(rename = "type")]
    pub kind: InputKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl InputEvent {
    pub fn down(token_id: Option<TokenId>, x: f32, y: f32) -> Self {
        Self { kind: InputKind::Down, token_id, position: Some(Position::new(x, y)) }
    }

    pub fn moved(x: f32, y: f32) -> Self {
        Self { kind: InputKind::Move, token_id: None, position: Some(Position::new(x, y)) }
    }

    pub fn up(x: f32, y: f32) -> Self {
        Self { kind: InputKind::Up, token_id: None, position: Some(Position::new(x, y)) }
    }

    pub fn cancel() -> Self {
        Self { kind: InputKind::Cancel, token_id: None, position: None }
    }

    /// Pointer position, required for everything but `cancel`.
    pub fn pointer(&self) -> Result<Position> {
        self.position.ok_or_else(|| {
            BoardError::Parse(format!("{:?} event without a position", self.kind))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// One token moved
    Move,
    /// Two tokens exchanged positions atomically
    Swap,
    /// Formation replaced and tokens re-placed
    FormationChange,
    Undo,
    Redo,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Swap => "swap",
            Self::FormationChange => "formation_change",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }
}

/// Serializable record of an applied mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Sequence number of the history entry this event belongs to
    pub sequence: u64,
    pub kind: MutationKind,
    pub token_ids: Vec<TokenId>,
    pub from: Vec<Position>,
    pub to: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formation: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MutationEvent {
    /// Build from the deltas as they were applied (for an undo, pass the
    /// inverse direction so `from`/`to` describe what actually happened).
    pub fn from_deltas(sequence: u64, kind: MutationKind, deltas: &[TokenDelta]) -> Self {
        Self {
            sequence,
            kind,
            token_ids: deltas.iter().map(|d| d.token_id.clone()).collect(),
            from: deltas.iter().map(|d| d.from).collect(),
            to: deltas.iter().map(|d| d.to).collect(),
            formation: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_formation(mut self, name: impl Into<String>) -> Self {
        self.formation = Some(name.into());
        self
    }
}

/// Receives mutation events as they happen.
pub trait MutationSink {
    fn on_mutation(&mut self, event: &MutationEvent);
}

impl<F> MutationSink for F
where
    F: FnMut(&MutationEvent),
{
    fn on_mutation(&mut self, event: &MutationEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_event_wire_shape() {
        let json = r#"{"type":"down","token_id":"p7","position":{"x":0.4,"y":0.6}}"#;
        let event: InputEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind, InputKind::Down);
        assert_eq!(event.token_id, Some(TokenId::new("p7")));

        assert_eq!(event.pointer().unwrap(), Position::new(0.4, 0.6));

        let cancel: InputEvent = serde_json::from_str(r#"{"type":"cancel"}"#).unwrap();
        assert_eq!(cancel, InputEvent::cancel());
        assert!(serde_json::to_value(&cancel).unwrap().get("position").is_none());
    }

    #[test]
    fn test_pointer_event_without_position_is_refused() {
        let up: InputEvent = serde_json::from_str(r#"{"type":"up"}"#).unwrap();
        assert_eq!(up.position, None);
        assert!(matches!(up.pointer(), Err(BoardError::Parse(_))));
    }

    #[test]
    fn test_mutation_event_from_deltas() {
        let deltas = vec![TokenDelta {
            token_id: TokenId::new("a"),
            from: Position::new(0.1, 0.1),
            to: Position::new(0.2, 0.2),
            from_slot: None,
            to_slot: None,
        }];
        let event = MutationEvent::from_deltas(3, MutationKind::Move, &deltas);
        assert_eq!(event.token_ids, vec![TokenId::new("a")]);
        assert_eq!(event.to, vec![Position::new(0.2, 0.2)]);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "move");
        assert!(json.get("formation").is_none());
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |e: &MutationEvent| seen.push(e.sequence);
            let event = MutationEvent::from_deltas(9, MutationKind::Undo, &[]);
            sink.on_mutation(&event);
        }
        assert_eq!(seen, vec![9]);
    }
}
