//! Exploding barrels
//!
//! A barrel is a static collider while alive. Detonation is one-shot: the
//! first trigger produces an `Explosion`, every later trigger is ignored.

use glam::Vec2;

use crate::host::VisualHandle;
use crate::tuning::Tuning;

/// An area-damage event waiting to be resolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub center: Vec2,
    pub radius: f32,
    pub damage: f32,
    /// Barrel that produced it, if any
    pub source: Option<u32>,
}

/// A destructible prop
#[derive(Debug, Clone)]
pub struct Barrel {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub alive: bool,
    pub visual: Option<VisualHandle>,
}

impl Barrel {
    pub fn new(id: u32, pos: Vec2, radius: f32) -> Self {
        Self {
            id,
            pos,
            radius,
            alive: true,
            visual: None,
        }
    }

    /// Detonate. Returns `None` if the barrel already went off.
    pub fn explode(&mut self, tuning: &Tuning) -> Option<Explosion> {
        if !self.alive {
            return None;
        }
        self.alive = false;
        Some(Explosion {
            center: self.pos,
            radius: tuning.combat.barrel_blast_radius,
            damage: tuning.combat.barrel_damage,
            source: Some(self.id),
        })
    }
}
