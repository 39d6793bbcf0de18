//! Hazmat Arena - combat simulation core for a wave-based arena shooter
//!
//! Core modules:
//! - `sim`: Single-threaded frame simulation (agents, projectiles, collisions, game flow)
//! - `tuning`: Data-driven game balance, immutable once loaded
//! - `host`: Capabilities the simulation consumes from the embedding (input, assets, effects)
//! - `error`: Fatal misuse and tuning errors
//!
//! Planar positions are `Vec2` values holding the world `(x, z)` ground-plane
//! coordinates. The vertical axis is fixed per entity and only matters to
//! presentation.

pub mod error;
pub mod host;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use error::{SimError, TuningError};
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Structural constants that are not balance knobs
pub mod consts {
    /// Height of enemy centers above the ground plane
    pub const ENEMY_HEIGHT: f32 = 0.9;
    /// Height projectiles travel at
    pub const PROJECTILE_HEIGHT: f32 = 1.1;
    /// Guard against normalizing near-zero vectors
    pub const EPSILON: f32 = 1e-5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Signed shortest rotation from `from` to `to`, in [-π, π)
#[inline]
pub fn shortest_angle_delta(from: f32, to: f32) -> f32 {
    normalize_angle(normalize_angle(to) - normalize_angle(from))
}

/// Unit planar direction for a heading angle
#[inline]
pub fn heading_to_dir(heading: f32) -> Vec2 {
    Vec2::new(heading.cos(), heading.sin())
}

/// Heading angle of a planar direction
#[inline]
pub fn dir_to_heading(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

/// Lift a planar position into world space at the given height
#[inline]
pub fn to_world(planar: Vec2, height: f32) -> Vec3 {
    Vec3::new(planar.x, height, planar.y)
}
