//! Arena bounds, static cover and level layouts
//!
//! The arena is a square ground plane centered on the origin. Every dynamic
//! entity is kept inside `[-H + r, H - r]` on both axes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pickup::PickupKind;

/// Square arena bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub half_extent: f32,
}

impl Arena {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }

    /// Largest coordinate magnitude a body of `radius` may occupy
    #[inline]
    pub fn limit(&self, radius: f32) -> f32 {
        (self.half_extent - radius).max(0.0)
    }

    /// Clamp a body center so the whole body stays inside the arena
    #[inline]
    pub fn clamp(&self, pos: Vec2, radius: f32) -> Vec2 {
        let limit = self.limit(radius);
        pos.clamp(Vec2::splat(-limit), Vec2::splat(limit))
    }

    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        let limit = self.limit(radius);
        pos.x.abs() <= limit && pos.y.abs() <= limit
    }

    /// True once a point is further out than the arena plus `margin`
    pub fn is_outside(&self, pos: Vec2, margin: f32) -> bool {
        let limit = self.half_extent + margin;
        pos.x.abs() > limit || pos.y.abs() > limit
    }
}

/// What a collider belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColliderOwner {
    /// Level geometry, lives for the whole level
    Cover,
    /// Barrel with the given entity id; ignored once the barrel is destroyed
    Barrel(u32),
}

/// A static circular push-out obstacle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub pos: Vec2,
    pub radius: f32,
    pub owner: ColliderOwner,
}

/// A cover obstacle in a layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverSpec {
    pub pos: Vec2,
    pub radius: f32,
}

/// A pickup placed when the level is built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupSpec {
    pub pos: Vec2,
    pub kind: PickupKind,
}

/// Static description of one level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaLayout {
    pub name: String,
    pub half_extent: f32,
    pub player_start: Vec2,
    pub covers: Vec<CoverSpec>,
    pub barrels: Vec<Vec2>,
    pub pickups: Vec<PickupSpec>,
    /// Where between-wave pickup drops appear, used in rotation
    #[serde(default)]
    pub pickup_slots: Vec<Vec2>,
}

impl ArenaLayout {
    pub fn arena(&self) -> Arena {
        Arena::new(self.half_extent)
    }

    /// Pickup drop position for the n-th drop of the level
    pub fn pickup_slot(&self, n: usize) -> Option<Vec2> {
        if self.pickup_slots.is_empty() {
            None
        } else {
            Some(self.pickup_slots[n % self.pickup_slots.len()])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_respects_radius() {
        let arena = Arena::new(10.0);
        let clamped = arena.clamp(Vec2::new(50.0, -50.0), 1.0);
        assert_eq!(clamped, Vec2::new(9.0, -9.0));
        assert!(arena.contains(clamped, 1.0));
    }

    #[test]
    fn test_inside_points_are_untouched() {
        let arena = Arena::new(10.0);
        let pos = Vec2::new(3.0, -4.0);
        assert_eq!(arena.clamp(pos, 0.5), pos);
    }

    #[test]
    fn test_outside_with_margin() {
        let arena = Arena::new(10.0);
        assert!(!arena.is_outside(Vec2::new(11.0, 0.0), 2.0));
        assert!(arena.is_outside(Vec2::new(12.5, 0.0), 2.0));
    }

    #[test]
    fn test_pickup_slots_rotate() {
        let layout = ArenaLayout {
            name: "test".into(),
            half_extent: 10.0,
            player_start: Vec2::ZERO,
            covers: Vec::new(),
            barrels: Vec::new(),
            pickups: Vec::new(),
            pickup_slots: vec![Vec2::X, Vec2::Y],
        };
        assert_eq!(layout.pickup_slot(0), Some(Vec2::X));
        assert_eq!(layout.pickup_slot(3), Some(Vec2::Y));
    }
}
