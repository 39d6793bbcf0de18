//! The player agent: movement, aim smoothing, fire gating and health

use glam::Vec2;

use super::arena::Arena;
use super::projectile::WeaponKind;
use crate::consts::EPSILON;
use crate::host::{Animation, CharacterVisual};
use crate::tuning::{PlayerTuning, WeaponStats};
use crate::{dir_to_heading, heading_to_dir, normalize_angle, shortest_angle_delta};

/// Per-frame player intent
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Movement direction; anything longer than 1 is scaled down
    pub move_dir: Vec2,
    /// Ground point to aim at
    pub aim_point: Option<Vec2>,
}

/// The player
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    /// Current heading (radians), smoothed toward `target_facing`
    pub facing: f32,
    pub target_facing: f32,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub weapon: WeaponKind,
    /// Seconds until the next shot is allowed
    pub fire_cooldown: f32,
    /// Seconds until contact damage can land again
    pub contact_cooldown: f32,
    pub alive: bool,
    pub moving: bool,
    pub visual: Option<CharacterVisual>,
}

impl Player {
    pub fn new(pos: Vec2, cfg: &PlayerTuning) -> Self {
        Self {
            pos,
            facing: -std::f32::consts::FRAC_PI_2,
            target_facing: -std::f32::consts::FRAC_PI_2,
            radius: cfg.radius,
            health: cfg.max_health,
            max_health: cfg.max_health,
            weapon: cfg.start_weapon,
            fire_cooldown: 0.0,
            contact_cooldown: 0.0,
            alive: true,
            moving: false,
            visual: None,
        }
    }

    /// Unit vector along the current heading
    pub fn aim_dir(&self) -> Vec2 {
        heading_to_dir(self.facing)
    }

    /// Where projectiles leave the player
    pub fn muzzle(&self) -> Vec2 {
        self.pos + self.aim_dir() * (self.radius + 0.1)
    }

    pub fn update(&mut self, input: &PlayerInput, arena: &Arena, cfg: &PlayerTuning, dt: f32) {
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);

        if !self.alive {
            self.moving = false;
            return;
        }

        let dir = input.move_dir.clamp_length_max(1.0);
        self.moving = dir.length_squared() > EPSILON;
        if self.moving {
            self.pos += dir * cfg.speed * dt;
        }
        self.pos = arena.clamp(self.pos, self.radius);

        if let Some(point) = input.aim_point {
            let to_point = point - self.pos;
            if to_point.length_squared() > EPSILON {
                self.target_facing = dir_to_heading(to_point);
            }
        }
        self.turn_toward(self.target_facing, dt, cfg.aim_rate);
    }

    /// Rotate toward `target` along the shorter arc, closing `rate * dt` of the gap
    pub fn turn_toward(&mut self, target: f32, dt: f32, rate: f32) {
        let delta = shortest_angle_delta(self.facing, target);
        let step = (rate * dt).clamp(0.0, 1.0);
        self.facing = normalize_angle(self.facing + delta * step);
    }

    /// Consume the cooldown for one shot. False while cooling down or dead.
    pub fn try_fire(&mut self, stats: &WeaponStats) -> bool {
        if !self.alive || self.fire_cooldown > 0.0 {
            return false;
        }
        self.fire_cooldown = stats.fire_rate;
        true
    }

    /// Apply damage. Returns true on the call that kills.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }

    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.health = (self.health + amount).min(self.max_health);
        }
    }

    pub fn switch_weapon(&mut self, weapon: WeaponKind) {
        self.weapon = weapon;
    }

    pub fn animation(&self) -> Animation {
        if !self.alive {
            Animation::Death
        } else if self.moving {
            Animation::Run
        } else {
            Animation::Idle
        }
    }
}
