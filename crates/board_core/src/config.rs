//! # Board Configuration
//!
//! All tuning values for one board instance live here and are handed to the
//! board (and its drag controller) at construction. Nothing is global, so
//! several boards with different settings can coexist.
//!
//! ## Usage
//! ```rust
//! use board_core::config::{BoardConfig, PositioningMode};
//!
//! let config = BoardConfig::default();
//! assert_eq!(config.mode, PositioningMode::Formation);
//!
//! let freeform = BoardConfig::freeform();
//! assert!(freeform.validate().is_ok());
//! ```
//!
//! Distances are in normalized pitch units (1.0 = full pitch width/length).

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::spatial::ResolveParams;
use crate::validator::ValidationRules;

/// How tokens relate to formation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositioningMode {
    /// Tokens sit exactly on slots, one token per slot
    #[default]
    Formation,
    /// Anywhere on the pitch, subject to minimum spacing
    Freeform,
    /// Snap to slots, then nudge within a bounded radius
    Hybrid,
}

impl PositioningMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formation => "formation",
            Self::Freeform => "freeform",
            Self::Hybrid => "hybrid",
        }
    }

    /// Modes where tokens carry a slot anchor.
    pub fn uses_slots(self) -> bool {
        !matches!(self, Self::Freeform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub mode: PositioningMode,
    /// Radius around a slot target that captures a drop
    pub snap_distance: f32,
    /// Minimum spacing between unlocked tokens (freeform/hybrid)
    pub min_distance: f32,
    /// Cursor within this distance of exactly one token counts as a swap gesture
    pub swap_tolerance: f32,
    /// Hybrid: drags further than this from the anchor slot re-snap
    pub detach_distance: f32,
    pub auto_resolve: bool,
    pub max_resolve_iterations: u32,
    pub max_resolve_displacement: f32,
    /// Maximum undo depth (oldest entries are evicted)
    pub history_depth: usize,
    /// Hit radius for pointer-down without an explicit token id
    pub pick_radius: f32,
    /// Pointer moves beyond the pitch grown by this margin cancel the drag
    pub cancel_margin: f32,
    /// Hold pointer moves until the frame ends (latest wins)
    pub coalesce_moves: bool,
    pub validation: ValidationRules,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            mode: PositioningMode::Formation,
            snap_distance: 0.08,
            min_distance: 0.05,
            swap_tolerance: 0.02,
            detach_distance: 0.06,
            auto_resolve: true,
            max_resolve_iterations: 8,
            max_resolve_displacement: 0.05,
            history_depth: 50,
            pick_radius: 0.04,
            cancel_margin: 0.05,
            coalesce_moves: true,
            validation: ValidationRules::default(),
        }
    }
}

impl BoardConfig {
    /// Strict slot placement (default)
    pub fn formation() -> Self {
        Self::default()
    }

    /// Free placement with spacing
    pub fn freeform() -> Self {
        Self { mode: PositioningMode::Freeform, ..Self::default() }
    }

    /// Slot snapping with nudges
    pub fn hybrid() -> Self {
        Self { mode: PositioningMode::Hybrid, ..Self::default() }
    }

    pub fn with_mode(mut self, mode: PositioningMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn resolve_params(&self) -> ResolveParams {
        ResolveParams {
            min_distance: self.min_distance,
            max_iterations: if self.auto_resolve { self.max_resolve_iterations } else { 0 },
            max_displacement: self.max_resolve_displacement,
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration bounds
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f32, allow_zero: bool| -> Result<()> {
            let ok = value.is_finite()
                && value <= 1.0
                && if allow_zero { value >= 0.0 } else { value > 0.0 };
            if ok {
                Ok(())
            } else {
                Err(BoardError::InvalidConfig(format!("{} out of range: {}", name, value)))
            }
        };

        unit("snap_distance", self.snap_distance, false)?;
        unit("min_distance", self.min_distance, true)?;
        unit("swap_tolerance", self.swap_tolerance, true)?;
        unit("detach_distance", self.detach_distance, false)?;
        unit("max_resolve_displacement", self.max_resolve_displacement, true)?;
        unit("pick_radius", self.pick_radius, false)?;
        unit("cancel_margin", self.cancel_margin, true)?;

        if self.swap_tolerance > self.min_distance && self.min_distance > 0.0 {
            return Err(BoardError::InvalidConfig(format!(
                "swap_tolerance ({}) must not exceed min_distance ({})",
                self.swap_tolerance, self.min_distance
            )));
        }
        if self.auto_resolve && self.max_resolve_iterations == 0 {
            return Err(BoardError::InvalidConfig(
                "max_resolve_iterations must be at least 1 when auto_resolve is on".to_string(),
            ));
        }
        if self.history_depth == 0 {
            return Err(BoardError::InvalidConfig("history_depth must be at least 1".to_string()));
        }
        self.validation.validate()?;
        Ok(())
    }
}
