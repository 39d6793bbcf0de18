//! Projectiles and weapon fire
//!
//! Projectiles travel in a straight line at constant speed until they hit
//! something, outrun their weapon's range, or leave the arena.

use std::collections::BTreeSet;

use glam::{Mat2, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use crate::consts::EPSILON;
use crate::tuning::WeaponStats;

/// Weapon identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Pistol,
    Shotgun,
    /// Piercing rounds
    Railgun,
    /// Explosive rounds
    Launcher,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Pistol,
        WeaponKind::Shotgun,
        WeaponKind::Railgun,
        WeaponKind::Launcher,
    ];

    /// Next weapon in the drop rotation
    pub fn next(self) -> Self {
        match self {
            WeaponKind::Pistol => WeaponKind::Shotgun,
            WeaponKind::Shotgun => WeaponKind::Railgun,
            WeaponKind::Railgun => WeaponKind::Launcher,
            WeaponKind::Launcher => WeaponKind::Pistol,
        }
    }
}

/// A projectile entity
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub weapon: WeaponKind,
    pub pos: Vec2,
    /// Unit travel direction
    pub dir: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    /// Survives hits, but damages each enemy at most once
    pub piercing: bool,
    /// Detonates on hit
    pub explosive: bool,
    pub blast_radius: f32,
    pub max_range: f32,
    pub traveled: f32,
    /// Enemies this projectile already damaged
    pub hits: BTreeSet<u32>,
    pub alive: bool,
}

impl Projectile {
    pub fn new(id: u32, weapon: WeaponKind, stats: &WeaponStats, origin: Vec2, dir: Vec2) -> Self {
        Self {
            id,
            weapon,
            pos: origin,
            dir: unit_or_x(dir),
            speed: stats.projectile_speed,
            damage: stats.damage,
            radius: stats.projectile_radius,
            piercing: stats.piercing,
            explosive: stats.explosive,
            blast_radius: stats.blast_radius,
            max_range: stats.max_range,
            traveled: 0.0,
            hits: BTreeSet::new(),
            alive: true,
        }
    }

    /// Advance along the travel direction and expire when out of range or bounds
    pub fn update(&mut self, dt: f32, arena: &Arena, bounds_margin: f32) {
        if !self.alive {
            return;
        }
        let step = self.speed * dt;
        self.pos += self.dir * step;
        self.traveled += step;

        if self.traveled > self.max_range {
            self.alive = false;
            log::trace!("projectile {} spent after {:.1} units", self.id, self.traveled);
        } else if arena.is_outside(self.pos, bounds_margin) {
            self.alive = false;
            log::trace!("projectile {} left the arena", self.id);
        }
    }

    pub fn has_hit(&self, enemy_id: u32) -> bool {
        self.hits.contains(&enemy_id)
    }

    /// Remember a damaged enemy. Returns false if it was already recorded.
    pub fn record_hit(&mut self, enemy_id: u32) -> bool {
        self.hits.insert(enemy_id)
    }
}

fn unit_or_x(dir: Vec2) -> Vec2 {
    if dir.length_squared() > EPSILON {
        dir.normalize()
    } else {
        Vec2::X
    }
}

/// Travel directions for one trigger pull
///
/// Each pellet gets an independent deviation inside the spread cone.
pub fn pellet_directions<R: Rng + ?Sized>(stats: &WeaponStats, aim: Vec2, rng: &mut R) -> Vec<Vec2> {
    let aim = unit_or_x(aim);
    let half_spread = stats.spread.abs() * 0.5;
    (0..stats.pellets.max(1))
        .map(|_| {
            if half_spread > 0.0 {
                let deviation = rng.random_range(-half_spread..=half_spread);
                Mat2::from_angle(deviation) * aim
            } else {
                aim
            }
        })
        .collect()
}

/// Spawn every projectile for one trigger pull, taking ids from `next_id`
pub fn fire_weapon<R: Rng + ?Sized>(
    weapon: WeaponKind,
    stats: &WeaponStats,
    origin: Vec2,
    aim: Vec2,
    rng: &mut R,
    mut next_id: impl FnMut() -> u32,
) -> Vec<Projectile> {
    pellet_directions(stats, aim, rng)
        .into_iter()
        .map(|dir| Projectile::new(next_id(), weapon, stats, origin, dir))
        .collect()
}
