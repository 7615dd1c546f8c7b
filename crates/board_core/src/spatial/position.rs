//! Normalized pitch coordinates and distance math
//!
//! ## Coordinate System
//! - X: 0 = left touchline, 1 = right touchline
//! - Y: 0 = opponent goal line, 1 = own goal line (screen-down)
//!
//! Positions never carry pixels. Converting to device space is the host's job.
//!
//! Comparisons inside the engine use squared distances; anything reported to a
//! caller is a true Euclidean distance.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Two positions closer than this are considered the same point.
pub const POSITION_EPSILON: f32 = 1e-5;

/// A point on the pitch in normalized units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const CENTER: Position = Position { x: 0.5, y: 0.5 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Inside `[0,1]×[0,1]` (edges included) and finite.
    #[inline]
    pub fn in_bounds(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && (0.0..=1.0).contains(&self.x)
            && (0.0..=1.0).contains(&self.y)
    }

    /// Inside the pitch grown by `margin` on every side.
    #[inline]
    pub fn within_margin(&self, margin: f32) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.x >= -margin
            && self.x <= 1.0 + margin
            && self.y >= -margin
            && self.y <= 1.0 + margin
    }

    /// Clamp onto the pitch.
    pub fn clamped(&self) -> Self {
        Self { x: self.x.clamp(0.0, 1.0), y: self.y.clamp(0.0, 1.0) }
    }

    /// Mirror across the vertical centre line (left ↔ right).
    pub fn mirrored(&self) -> Self {
        Self { x: 1.0 - self.x, y: self.y }
    }

    #[inline]
    pub fn to_vector(self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn from_vector(v: Vector2<f32>) -> Self {
        Self { x: v.x, y: v.y }
    }

    /// Same point within [`POSITION_EPSILON`].
    #[inline]
    pub fn approx_eq(&self, other: &Position) -> bool {
        distance_sq(*self, *other) <= POSITION_EPSILON * POSITION_EPSILON
    }
}

impl From<(f32, f32)> for Position {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Squared Euclidean distance (internal comparisons).
#[inline]
pub fn distance_sq(a: Position, b: Position) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    dx * dx + dy * dy
}

/// Euclidean distance in normalized units.
#[inline]
pub fn distance(a: Position, b: Position) -> f32 {
    distance_sq(a, b).sqrt()
}
