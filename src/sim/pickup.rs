//! Collectible pickups

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::WeaponKind;
use crate::host::VisualHandle;

/// What a pickup gives the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    /// Restores the tuned health amount
    Health,
    /// Switches the active weapon
    Weapon(WeaponKind),
}

/// A pickup entity
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub visual: Option<VisualHandle>,
}

impl Pickup {
    pub fn new(id: u32, kind: PickupKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            visual: None,
        }
    }
}
