//! Formation preset library
//!
//! 14 standard 11-slot shapes. Slot ids are the role short names, priority
//! follows slot order (goalkeeper first), and the goalkeeper slot is required.
//!
//! Tables use board coordinates: y = 0 at the opponent goal line, y = 1 at
//! the own goal line.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::role::Role;
use super::slot::{Formation, Slot};
use crate::error::BoardError;

type SlotTable = &'static [(Role, f32, f32)];

/// Built-in formation shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationPreset {
    T442,
    T433,
    T451,
    T4231,
    T352,
    T442Diamond,
    T442DiamondWide,
    T442Narrow,
    T4141,
    T4411,
    T343,
    T1333,
    T4312,
    T4222,
}

static PRESET_LIBRARY: Lazy<Vec<(FormationPreset, Formation)>> = Lazy::new(|| {
    FormationPreset::all().iter().map(|&preset| (preset, preset.build())).collect()
});

impl FormationPreset {
    pub fn all() -> &'static [FormationPreset] {
        &[
            Self::T442,
            Self::T433,
            Self::T451,
            Self::T4231,
            Self::T352,
            Self::T442Diamond,
            Self::T442DiamondWide,
            Self::T442Narrow,
            Self::T4141,
            Self::T4411,
            Self::T343,
            Self::T1333,
            Self::T4312,
            Self::T4222,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::T442 => "T442",
            Self::T433 => "T433",
            Self::T451 => "T451",
            Self::T4231 => "T4231",
            Self::T352 => "T352",
            Self::T442Diamond => "T442Diamond",
            Self::T442DiamondWide => "T442DiamondWide",
            Self::T442Narrow => "T442Narrow",
            Self::T4141 => "T4141",
            Self::T4411 => "T4411",
            Self::T343 => "T343",
            Self::T1333 => "T1333",
            Self::T4312 => "T4312",
            Self::T4222 => "T4222",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::T442 => "4-4-2",
            Self::T433 => "4-3-3",
            Self::T451 => "4-5-1",
            Self::T4231 => "4-2-3-1",
            Self::T352 => "3-5-2",
            Self::T442Diamond => "4-4-2 Diamond",
            Self::T442DiamondWide => "4-4-2 Diamond Wide",
            Self::T442Narrow => "4-4-2 Narrow",
            Self::T4141 => "4-1-4-1",
            Self::T4411 => "4-4-1-1",
            Self::T343 => "3-4-3",
            Self::T1333 => "1-3-3-3",
            Self::T4312 => "4-3-1-2",
            Self::T4222 => "4-2-2-2",
        }
    }

    fn table(&self) -> SlotTable {
        match self {
            Self::T442 => T442_SLOTS,
            Self::T433 => T433_SLOTS,
            Self::T451 => T451_SLOTS,
            Self::T4231 => T4231_SLOTS,
            Self::T352 => T352_SLOTS,
            Self::T442Diamond => T442_DIAMOND_SLOTS,
            Self::T442DiamondWide => T442_DIAMOND_WIDE_SLOTS,
            Self::T442Narrow => T442_NARROW_SLOTS,
            Self::T4141 => T4141_SLOTS,
            Self::T4411 => T4411_SLOTS,
            Self::T343 => T343_SLOTS,
            Self::T1333 => T1333_SLOTS,
            Self::T4312 => T4312_SLOTS,
            Self::T4222 => T4222_SLOTS,
        }
    }

    fn build(&self) -> Formation {
        let slots = self
            .table()
            .iter()
            .enumerate()
            .map(|(i, &(role, x, y))| Slot::new(role.short_name(), role, x, y, i as u32))
            .collect();
        Formation::from_static_table(self.display_name(), slots)
    }

    /// The formation for this preset (built once, cloned out).
    pub fn formation(&self) -> Formation {
        PRESET_LIBRARY
            .iter()
            .find(|(preset, _)| preset == self)
            .map(|(_, formation)| formation.clone())
            .unwrap_or_else(|| self.build())
    }

    /// Count of slots per category as (defenders, midfielders, forwards).
    pub fn shape(&self) -> (usize, usize, usize) {
        use super::role::RoleCategory;
        let count = |cat: RoleCategory| {
            self.table().iter().filter(|(role, _, _)| role.category() == cat).count()
        };
        (
            count(RoleCategory::Defender),
            count(RoleCategory::Midfielder),
            count(RoleCategory::Forward),
        )
    }
}

impl FromStr for FormationPreset {
    type Err = BoardError;

    /// Accepts the preset id (`T442`) or display name (`4-4-2`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FormationPreset::all()
            .iter()
            .copied()
            .find(|p| {
                p.id().eq_ignore_ascii_case(needle) || p.display_name().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| BoardError::Parse(format!("unknown formation preset: {}", s)))
    }
}

// ============================================================================
// Slot tables
// ============================================================================

const T442_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderLeft, 0.15, 0.5),
    (Role::MidfielderCenterLeft, 0.4, 0.5),
    (Role::MidfielderCenterRight, 0.6, 0.5),
    (Role::MidfielderRight, 0.85, 0.5),
    (Role::ForwardLeft, 0.35, 0.2),
    (Role::ForwardRight, 0.65, 0.2),
];

const T433_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderCenterLeft, 0.35, 0.55),
    (Role::MidfielderCenter, 0.5, 0.55),
    (Role::MidfielderCenterRight, 0.65, 0.55),
    (Role::ForwardLeft, 0.15, 0.2),
    (Role::ForwardCenter, 0.5, 0.15),
    (Role::ForwardRight, 0.85, 0.2),
];

const T451_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderLeft, 0.15, 0.5),
    (Role::MidfielderCenterLeft, 0.35, 0.5),
    (Role::MidfielderCenter, 0.5, 0.5),
    (Role::MidfielderCenterRight, 0.65, 0.5),
    (Role::MidfielderRight, 0.85, 0.5),
    (Role::Striker, 0.5, 0.2),
];

const T4231_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::DefensiveMidfielder, 0.4, 0.65),
    (Role::MidfielderCenter, 0.6, 0.65),
    (Role::AttackingMidfielderLeft, 0.2, 0.4),
    (Role::AttackingMidfielderCenter, 0.5, 0.4),
    (Role::AttackingMidfielderRight, 0.8, 0.4),
    (Role::Striker, 0.5, 0.15),
];

const T352_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderCenterLeft, 0.35, 0.8),
    (Role::DefenderCenter, 0.5, 0.8),
    (Role::DefenderCenterRight, 0.65, 0.8),
    (Role::WingbackLeft, 0.1, 0.55),
    (Role::MidfielderCenterLeft, 0.35, 0.5),
    (Role::MidfielderCenter, 0.5, 0.5),
    (Role::MidfielderCenterRight, 0.65, 0.5),
    (Role::WingbackRight, 0.9, 0.55),
    (Role::ForwardLeft, 0.4, 0.2),
    (Role::ForwardRight, 0.6, 0.2),
];

const T442_DIAMOND_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::DefensiveMidfielder, 0.5, 0.65),
    (Role::MidfielderLeft, 0.3, 0.5),
    (Role::MidfielderRight, 0.7, 0.5),
    (Role::AttackingMidfielderCenter, 0.5, 0.35),
    (Role::ForwardLeft, 0.4, 0.15),
    (Role::ForwardRight, 0.6, 0.15),
];

const T442_DIAMOND_WIDE_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::DefensiveMidfielder, 0.5, 0.65),
    (Role::MidfielderLeft, 0.15, 0.5),
    (Role::MidfielderRight, 0.85, 0.5),
    (Role::AttackingMidfielderCenter, 0.5, 0.35),
    (Role::ForwardLeft, 0.4, 0.15),
    (Role::ForwardRight, 0.6, 0.15),
];

const T442_NARROW_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderCenterLeft, 0.35, 0.5),
    (Role::MidfielderCenter, 0.5, 0.55),
    (Role::MidfielderCenterRight, 0.65, 0.5),
    (Role::AttackingMidfielderCenter, 0.5, 0.4),
    (Role::ForwardLeft, 0.4, 0.2),
    (Role::ForwardRight, 0.6, 0.2),
];

const T4141_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::DefensiveMidfielder, 0.5, 0.65),
    (Role::MidfielderLeft, 0.15, 0.45),
    (Role::MidfielderCenterLeft, 0.4, 0.45),
    (Role::MidfielderCenterRight, 0.6, 0.45),
    (Role::MidfielderRight, 0.85, 0.45),
    (Role::Striker, 0.5, 0.15),
];

const T4411_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderLeft, 0.15, 0.5),
    (Role::MidfielderCenterLeft, 0.4, 0.5),
    (Role::MidfielderCenterRight, 0.6, 0.5),
    (Role::MidfielderRight, 0.85, 0.5),
    (Role::AttackingMidfielderCenter, 0.5, 0.3),
    (Role::Striker, 0.5, 0.15),
];

const T343_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderCenterLeft, 0.35, 0.8),
    (Role::DefenderCenter, 0.5, 0.8),
    (Role::DefenderCenterRight, 0.65, 0.8),
    (Role::WingbackLeft, 0.15, 0.5),
    (Role::MidfielderCenterLeft, 0.4, 0.5),
    (Role::MidfielderCenterRight, 0.6, 0.5),
    (Role::WingbackRight, 0.85, 0.5),
    (Role::ForwardLeft, 0.2, 0.2),
    (Role::ForwardCenter, 0.5, 0.15),
    (Role::ForwardRight, 0.8, 0.2),
];

const T1333_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderCenterLeft, 0.35, 0.75),
    (Role::DefenderCenter, 0.5, 0.75),
    (Role::DefenderCenterRight, 0.65, 0.75),
    (Role::MidfielderLeft, 0.25, 0.5),
    (Role::MidfielderCenter, 0.5, 0.5),
    (Role::MidfielderRight, 0.75, 0.5),
    (Role::ForwardLeft, 0.25, 0.25),
    (Role::ForwardCenter, 0.5, 0.25),
    (Role::ForwardRight, 0.75, 0.25),
    (Role::Striker, 0.5, 0.1),
];

const T4312_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::MidfielderCenterLeft, 0.35, 0.6),
    (Role::MidfielderCenter, 0.5, 0.6),
    (Role::MidfielderCenterRight, 0.65, 0.6),
    (Role::AttackingMidfielderCenter, 0.5, 0.35),
    (Role::ForwardLeft, 0.4, 0.15),
    (Role::ForwardRight, 0.6, 0.15),
];

const T4222_SLOTS: SlotTable = &[
    (Role::Goalkeeper, 0.5, 0.95),
    (Role::DefenderLeft, 0.2, 0.8),
    (Role::DefenderCenterLeft, 0.4, 0.8),
    (Role::DefenderCenterRight, 0.6, 0.8),
    (Role::DefenderRight, 0.8, 0.8),
    (Role::DefensiveMidfielder, 0.4, 0.65),
    (Role::MidfielderCenter, 0.6, 0.65),
    (Role::AttackingMidfielderLeft, 0.25, 0.4),
    (Role::AttackingMidfielderRight, 0.75, 0.4),
    (Role::ForwardLeft, 0.35, 0.15),
    (Role::ForwardRight, 0.65, 0.15),
];
