//! Formations: roles, slots, the preset library and slot assignment.

mod assignment;
mod presets;
mod role;
mod slot;

pub use assignment::{assign_tokens, Assignee, SlotAssignment};
pub use presets::FormationPreset;
pub use role::{Role, RoleCategory};
pub use slot::{Formation, Slot, SlotId};
