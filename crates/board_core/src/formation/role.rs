//! Pitch roles shared by tokens and slots
//!
//! Roles feed the formation validator and slot assignment only. Nothing
//! about rendering or display names lives here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// Concrete pitch role (22 positions), serialized by short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "GK")]
    Goalkeeper,
    #[serde(rename = "SW")]
    Sweeper,
    #[serde(rename = "LB")]
    DefenderLeft,
    #[serde(rename = "LCB")]
    DefenderCenterLeft,
    #[serde(rename = "CB")]
    DefenderCenter,
    #[serde(rename = "RCB")]
    DefenderCenterRight,
    #[serde(rename = "RB")]
    DefenderRight,
    #[serde(rename = "CDM")]
    DefensiveMidfielder,
    #[serde(rename = "LM")]
    MidfielderLeft,
    #[serde(rename = "LCM")]
    MidfielderCenterLeft,
    #[serde(rename = "CM")]
    MidfielderCenter,
    #[serde(rename = "RCM")]
    MidfielderCenterRight,
    #[serde(rename = "RM")]
    MidfielderRight,
    #[serde(rename = "LAM")]
    AttackingMidfielderLeft,
    #[serde(rename = "CAM")]
    AttackingMidfielderCenter,
    #[serde(rename = "RAM")]
    AttackingMidfielderRight,
    #[serde(rename = "LWB")]
    WingbackLeft,
    #[serde(rename = "RWB")]
    WingbackRight,
    #[serde(rename = "ST")]
    Striker,
    #[serde(rename = "LW")]
    ForwardLeft,
    #[serde(rename = "CF")]
    ForwardCenter,
    #[serde(rename = "RW")]
    ForwardRight,
}

/// Coarse role grouping used for validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCategory {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Self::Goalkeeper,
            Self::Sweeper,
            Self::DefenderLeft,
            Self::DefenderCenterLeft,
            Self::DefenderCenter,
            Self::DefenderCenterRight,
            Self::DefenderRight,
            Self::DefensiveMidfielder,
            Self::MidfielderLeft,
            Self::MidfielderCenterLeft,
            Self::MidfielderCenter,
            Self::MidfielderCenterRight,
            Self::MidfielderRight,
            Self::AttackingMidfielderLeft,
            Self::AttackingMidfielderCenter,
            Self::AttackingMidfielderRight,
            Self::WingbackLeft,
            Self::WingbackRight,
            Self::Striker,
            Self::ForwardLeft,
            Self::ForwardCenter,
            Self::ForwardRight,
        ]
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Goalkeeper => "GK",
            Self::Sweeper => "SW",
            Self::DefenderLeft => "LB",
            Self::DefenderCenterLeft => "LCB",
            Self::DefenderCenter => "CB",
            Self::DefenderCenterRight => "RCB",
            Self::DefenderRight => "RB",
            Self::DefensiveMidfielder => "CDM",
            Self::MidfielderLeft => "LM",
            Self::MidfielderCenterLeft => "LCM",
            Self::MidfielderCenter => "CM",
            Self::MidfielderCenterRight => "RCM",
            Self::MidfielderRight => "RM",
            Self::AttackingMidfielderLeft => "LAM",
            Self::AttackingMidfielderCenter => "CAM",
            Self::AttackingMidfielderRight => "RAM",
            Self::WingbackLeft => "LWB",
            Self::WingbackRight => "RWB",
            Self::Striker => "ST",
            Self::ForwardLeft => "LW",
            Self::ForwardCenter => "CF",
            Self::ForwardRight => "RW",
        }
    }

    pub fn category(&self) -> RoleCategory {
        match self {
            Self::Goalkeeper => RoleCategory::Goalkeeper,
            Self::Sweeper
            | Self::DefenderLeft
            | Self::DefenderCenterLeft
            | Self::DefenderCenter
            | Self::DefenderCenterRight
            | Self::DefenderRight
            | Self::WingbackLeft
            | Self::WingbackRight => RoleCategory::Defender,
            Self::DefensiveMidfielder
            | Self::MidfielderLeft
            | Self::MidfielderCenterLeft
            | Self::MidfielderCenter
            | Self::MidfielderCenterRight
            | Self::MidfielderRight
            | Self::AttackingMidfielderLeft
            | Self::AttackingMidfielderCenter
            | Self::AttackingMidfielderRight => RoleCategory::Midfielder,
            Self::Striker | Self::ForwardLeft | Self::ForwardCenter | Self::ForwardRight => {
                RoleCategory::Forward
            }
        }
    }

    /// Roles are compatible when they share a category.
    pub fn is_compatible_with(&self, other: Role) -> bool {
        self.category() == other.category()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Role {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::all()
            .iter()
            .copied()
            .find(|role| role.short_name() == upper)
            .ok_or_else(|| BoardError::Parse(format!("unknown role: {}", s)))
    }
}
