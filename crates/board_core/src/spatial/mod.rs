//! Spatial model: positions, tokens and the canonical token → position map.

mod model;
mod position;
mod token;

pub use model::{ResolveParams, SpacingViolation, SpatialModel};
pub use position::{distance, distance_sq, Position, POSITION_EPSILON};
pub use token::{Placement, Token, TokenDelta, TokenId, TokenSpec};
