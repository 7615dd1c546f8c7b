//! Slots and formations
//!
//! A `Formation` is an ordered, fixed-capacity list of `Slot`s whose ids are
//! unique. Loaded formations go through the same check as constructed ones,
//! so a deserialized value always holds the invariant.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;
use crate::error::{BoardError, Result};
use crate::spatial::Position;

/// Stable slot identifier (e.g. "GK", "LCB").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Named anchor point within a formation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub position: Position,
    pub role: Role,
    /// Tie-break order when slots are equidistant (lower wins)
    #[serde(default)]
    pub priority: u32,
    /// Must be occupied for the arrangement to be finalized
    #[serde(default)]
    pub required: bool,
}

impl Slot {
    pub fn new(id: impl Into<SlotId>, role: Role, x: f32, y: f32, priority: u32) -> Self {
        Self {
            id: id.into(),
            position: Position::new(x, y),
            role,
            priority,
            required: role == Role::Goalkeeper,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

impl From<String> for SlotId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unchecked wire shape of a formation.
#[derive(Debug, Clone, Deserialize)]
struct FormationDef {
    name: String,
    slots: Vec<Slot>,
}

/// Ordered set of slots. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FormationDef")]
pub struct Formation {
    name: String,
    slots: Vec<Slot>,
}

impl TryFrom<FormationDef> for Formation {
    type Error = BoardError;

    fn try_from(def: FormationDef) -> Result<Self> {
        Formation::new(def.name, def.slots)
    }
}

impl Formation {
    /// Build a formation, rejecting duplicate slot ids and off-pitch targets.
    pub fn new(name: impl Into<String>, slots: Vec<Slot>) -> Result<Self> {
        for (i, slot) in slots.iter().enumerate() {
            if slots[..i].iter().any(|other| other.id == slot.id) {
                return Err(BoardError::DuplicateSlot(slot.id.clone()));
            }
            if !slot.position.in_bounds() {
                return Err(BoardError::Parse(format!(
                    "slot {} target ({}, {}) is off the pitch",
                    slot.id, slot.position.x, slot.position.y
                )));
            }
        }
        Ok(Self { name: name.into(), slots })
    }

    /// Built-in tables only; their uniqueness is covered by the preset tests.
    pub(crate) fn from_static_table(name: &str, slots: Vec<Slot>) -> Self {
        Self { name: name.to_string(), slots }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, id: &SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| &s.id == id)
    }

    /// Slot whose target is exactly `position` (within epsilon).
    pub fn slot_at(&self, position: Position) -> Option<&Slot> {
        self.slots.iter().find(|s| s.position.approx_eq(&position))
    }

    /// Left/right mirror image of this formation.
    pub fn mirrored(&self) -> Formation {
        Formation {
            name: format!("{} (mirrored)", self.name),
            slots: self
                .slots
                .iter()
                .map(|s| Slot { position: s.position.mirrored(), ..s.clone() })
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
