//! Data-driven game balance
//!
//! A single immutable `Tuning` value is built at startup (defaults or JSON
//! overrides), validated, and shared behind an `Arc`. Components read it
//! through `&Tuning`; nothing writes to it afterwards.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::arena::{ArenaLayout, CoverSpec, PickupSpec};
use crate::sim::enemy::{EnemyKind, Role};
use crate::sim::pickup::PickupKind;
use crate::sim::projectile::WeaponKind;

/// Player movement, aim and survivability
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub radius: f32,
    /// Units per second
    pub speed: f32,
    pub max_health: f32,
    /// Fraction of the remaining aim error closed per second
    pub aim_rate: f32,
    pub start_weapon: WeaponKind,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            radius: 0.5,
            speed: 8.0,
            max_health: 100.0,
            aim_rate: 14.0,
            start_weapon: WeaponKind::Pistol,
        }
    }
}

/// Per-type enemy stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    pub radius: f32,
    /// Multiplier applied to `EnemyTable::base_speed`
    pub speed_multiplier: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    pub score: u32,
}

/// Enemy type table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    pub base_speed: f32,
    /// Per-instance speed variance, as a ± fraction
    pub speed_variance: f32,
    pub basic: EnemyStats,
    pub hazmat: EnemyStats,
}

impl Default for EnemyTable {
    fn default() -> Self {
        Self {
            base_speed: 3.5,
            speed_variance: 0.15,
            basic: EnemyStats {
                radius: 0.6,
                speed_multiplier: 1.0,
                max_health: 30.0,
                contact_damage: 10.0,
                score: 100,
            },
            hazmat: EnemyStats {
                radius: 0.8,
                speed_multiplier: 0.7,
                max_health: 80.0,
                contact_damage: 20.0,
                score: 250,
            },
        }
    }
}

/// Relative weights for the role draw of non-hazmat enemies
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoleWeights {
    pub rusher: f32,
    pub flanker: f32,
    pub circler: f32,
}

impl RoleWeights {
    /// Sum of the usable (non-negative) weights
    pub fn total(&self) -> f32 {
        Role::ALL.into_iter().map(|role| self.weight(role).max(0.0)).sum()
    }

    pub fn weight(&self, role: Role) -> f32 {
        match role {
            Role::Rusher => self.rusher,
            Role::Flanker => self.flanker,
            Role::Circler => self.circler,
        }
    }
}

/// Enemy steering and lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringTuning {
    pub role_weights: RoleWeights,
    /// Below this distance flankers go straight in
    pub flank_distance: f32,
    pub flank_direct_weight: f32,
    pub flank_lateral_weight: f32,
    /// Below this distance circlers go straight in
    pub circle_min_distance: f32,
    pub orbit_distance: f32,
    /// Orbit angle accumulation, radians per second
    pub orbit_rate: f32,
    /// Lower clamp on the radial correction factor
    pub orbit_radial_min: f32,
    pub orbit_radial_weight: f32,
    pub orbit_tangent_weight: f32,
    pub separation_radius: f32,
    pub separation_force: f32,
    /// Seconds an enemy spends dying before removal
    pub death_duration: f32,
    /// Seconds the hit flash stays on
    pub flash_duration: f32,
}

impl Default for SteeringTuning {
    fn default() -> Self {
        Self {
            role_weights: RoleWeights {
                rusher: 0.5,
                flanker: 0.3,
                circler: 0.2,
            },
            flank_distance: 6.0,
            flank_direct_weight: 0.6,
            flank_lateral_weight: 0.4,
            circle_min_distance: 4.0,
            orbit_distance: 8.0,
            orbit_rate: 1.2,
            orbit_radial_min: 0.15,
            orbit_radial_weight: 0.4,
            orbit_tangent_weight: 0.6,
            separation_radius: 1.4,
            separation_force: 4.0,
            death_duration: 1.0,
            flash_duration: 0.1,
        }
    }
}

/// Per-weapon stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponStats {
    /// Seconds between shots
    pub fire_rate: f32,
    pub damage: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub max_range: f32,
    pub pellets: u32,
    /// Full cone angle in radians; each pellet deviates within ±spread/2
    pub spread: f32,
    pub piercing: bool,
    pub explosive: bool,
    /// Blast radius for explosive rounds
    pub blast_radius: f32,
}

/// Weapon table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTable {
    pub pistol: WeaponStats,
    pub shotgun: WeaponStats,
    pub railgun: WeaponStats,
    pub launcher: WeaponStats,
}

impl Default for WeaponTable {
    fn default() -> Self {
        Self {
            pistol: WeaponStats {
                fire_rate: 0.3,
                damage: 20.0,
                projectile_speed: 30.0,
                projectile_radius: 0.15,
                max_range: 25.0,
                pellets: 1,
                spread: 0.0,
                piercing: false,
                explosive: false,
                blast_radius: 0.0,
            },
            shotgun: WeaponStats {
                fire_rate: 0.8,
                damage: 12.0,
                projectile_speed: 26.0,
                projectile_radius: 0.12,
                max_range: 12.0,
                pellets: 6,
                spread: 0.35,
                piercing: false,
                explosive: false,
                blast_radius: 0.0,
            },
            railgun: WeaponStats {
                fire_rate: 0.9,
                damage: 40.0,
                projectile_speed: 45.0,
                projectile_radius: 0.12,
                max_range: 40.0,
                pellets: 1,
                spread: 0.0,
                piercing: true,
                explosive: false,
                blast_radius: 0.0,
            },
            launcher: WeaponStats {
                fire_rate: 1.2,
                damage: 30.0,
                projectile_speed: 18.0,
                projectile_radius: 0.25,
                max_range: 25.0,
                pellets: 1,
                spread: 0.0,
                piercing: false,
                explosive: true,
                blast_radius: 4.0,
            },
        }
    }
}

/// Wave scheduling and difficulty scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub base_quota: u32,
    pub quota_increment: u32,
    /// Every wave that is a multiple of this is a boss wave
    pub boss_interval: u32,
    pub boss_bonus: u32,
    /// Seconds between waves
    pub break_duration: f32,
    /// Seconds before the first wave of a level
    pub first_break_duration: f32,
    /// Seconds between spawns within a wave
    pub spawn_interval: f32,
    /// Speed multiplier growth per wave
    pub speed_scale: f32,
    pub hazmat_start_wave: u32,
    pub hazmat_base_chance: f32,
    pub hazmat_chance_per_wave: f32,
    pub hazmat_max_chance: f32,
    pub hazmat_boss_chance: f32,
    /// Inset of spawn points from the arena boundary
    pub spawn_margin: f32,
    /// Depth of each lane band for the lane formation
    pub lane_band_depth: f32,
    pub waves_per_level: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base_quota: 15,
            quota_increment: 5,
            boss_interval: 5,
            boss_bonus: 5,
            break_duration: 5.0,
            first_break_duration: 2.0,
            spawn_interval: 0.8,
            speed_scale: 0.05,
            hazmat_start_wave: 3,
            hazmat_base_chance: 0.1,
            hazmat_chance_per_wave: 0.05,
            hazmat_max_chance: 0.45,
            hazmat_boss_chance: 0.6,
            spawn_margin: 2.0,
            lane_band_depth: 4.0,
            waves_per_level: 3,
        }
    }
}

/// Collision response, explosions and pickups
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Cooldown set on both sides after a contact hit
    pub contact_cooldown: f32,
    /// Displacement applied to the player on a contact hit
    pub contact_knockback: f32,
    /// Units per second an overlapping enemy is eased off the player
    pub contact_push: f32,
    pub barrel_radius: f32,
    pub barrel_blast_radius: f32,
    pub barrel_damage: f32,
    /// Fraction of blast damage the player takes
    pub player_blast_fraction: f32,
    pub pickup_radius: f32,
    pub health_pickup_amount: f32,
    /// Projectiles despawn this far past the arena edge
    pub projectile_bounds_margin: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            contact_cooldown: 0.5,
            contact_knockback: 1.5,
            contact_push: 3.0,
            barrel_radius: 0.7,
            barrel_blast_radius: 5.0,
            barrel_damage: 50.0,
            player_blast_fraction: 0.5,
            pickup_radius: 1.2,
            health_pickup_amount: 25.0,
            projectile_bounds_margin: 2.0,
        }
    }
}

/// Score multiplier streaks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    /// Raw seconds without a kill before the streak resets
    pub streak_window: f32,
    pub multiplier_step: f32,
    /// Streak length at which the multiplier stops growing
    pub multiplier_cap_streak: u32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            streak_window: 3.0,
            multiplier_step: 0.25,
            multiplier_cap_streak: 12,
        }
    }
}

/// Frame timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeTuning {
    /// Cap on a single frame delta while the host is visible
    pub max_frame_dt: f32,
    /// Cap on a single frame delta while the host is hidden
    pub max_hidden_frame_dt: f32,
    pub slow_motion_scale: f32,
    /// Raw seconds a slow-motion burst lasts
    pub slow_motion_duration: f32,
    /// Scaled seconds of the fade between levels
    pub level_transition_duration: f32,
}

impl Default for TimeTuning {
    fn default() -> Self {
        Self {
            max_frame_dt: 0.05,
            max_hidden_frame_dt: 0.25,
            slow_motion_scale: 0.35,
            slow_motion_duration: 0.6,
            level_transition_duration: 1.5,
        }
    }
}

/// Complete game balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemies: EnemyTable,
    pub steering: SteeringTuning,
    pub weapons: WeaponTable,
    pub waves: WaveTuning,
    pub combat: CombatTuning,
    pub scoring: ScoreTuning,
    pub time: TimeTuning,
    pub levels: Vec<ArenaLayout>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            enemies: EnemyTable::default(),
            steering: SteeringTuning::default(),
            weapons: WeaponTable::default(),
            waves: WaveTuning::default(),
            combat: CombatTuning::default(),
            scoring: ScoreTuning::default(),
            time: TimeTuning::default(),
            levels: default_levels(),
        }
    }
}

impl Tuning {
    /// Parse overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Stats for an enemy type
    pub fn enemy(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Basic => &self.enemies.basic,
            EnemyKind::Hazmat => &self.enemies.hazmat,
        }
    }

    /// Stats for a weapon
    pub fn weapon(&self, kind: WeaponKind) -> &WeaponStats {
        match kind {
            WeaponKind::Pistol => &self.weapons.pistol,
            WeaponKind::Shotgun => &self.weapons.shotgun,
            WeaponKind::Railgun => &self.weapons.railgun,
            WeaponKind::Launcher => &self.weapons.launcher,
        }
    }

    /// Layout for a 1-based level number
    pub fn level(&self, level: u32) -> Option<&ArenaLayout> {
        let index = usize::try_from(level.checked_sub(1)?).ok()?;
        self.levels.get(index)
    }

    pub fn level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.levels.is_empty() {
            return Err(TuningError::invalid("levels", "at least one level is required"));
        }
        let largest_radius = self
            .player
            .radius
            .max(self.enemies.basic.radius)
            .max(self.enemies.hazmat.radius);
        for layout in &self.levels {
            if layout.half_extent <= largest_radius + self.waves.spawn_margin {
                return Err(TuningError::invalid(
                    "levels.half_extent",
                    format!("level `{}` is too small ({})", layout.name, layout.half_extent),
                ));
            }
        }
        if self.waves.waves_per_level == 0 {
            return Err(TuningError::invalid("waves.waves_per_level", "must be at least 1"));
        }
        if self.waves.boss_interval == 0 {
            return Err(TuningError::invalid("waves.boss_interval", "must be at least 1"));
        }
        if self.waves.spawn_interval <= 0.0 {
            return Err(TuningError::invalid("waves.spawn_interval", "must be positive"));
        }
        if Role::ALL.into_iter().any(|role| self.steering.role_weights.weight(role) < 0.0) {
            return Err(TuningError::invalid("steering.role_weights", "weights must not be negative"));
        }
        if self.steering.role_weights.total() <= 0.0 {
            return Err(TuningError::invalid(
                "steering.role_weights",
                "weights must sum to a positive value",
            ));
        }
        if self.steering.separation_radius <= 0.0 {
            return Err(TuningError::invalid("steering.separation_radius", "must be positive"));
        }
        for kind in WeaponKind::ALL {
            let weapon = self.weapon(kind);
            if weapon.pellets == 0 {
                return Err(TuningError::invalid("weapons.pellets", format!("{kind:?} fires no pellets")));
            }
            if weapon.fire_rate <= 0.0 || weapon.max_range <= 0.0 {
                return Err(TuningError::invalid(
                    "weapons",
                    format!("{kind:?} needs a positive fire rate and range"),
                ));
            }
            if weapon.explosive && weapon.blast_radius <= 0.0 {
                return Err(TuningError::invalid(
                    "weapons.blast_radius",
                    format!("{kind:?} is explosive but has no blast radius"),
                ));
            }
        }
        if self.combat.barrel_blast_radius <= 0.0 {
            return Err(TuningError::invalid("combat.barrel_blast_radius", "must be positive"));
        }
        if self.time.max_frame_dt <= 0.0 || self.time.max_hidden_frame_dt < self.time.max_frame_dt {
            return Err(TuningError::invalid(
                "time.max_frame_dt",
                "caps must be positive and the hidden cap at least the visible cap",
            ));
        }
        Ok(())
    }
}

/// Built-in level layouts
fn default_levels() -> Vec<ArenaLayout> {
    let cover = |x: f32, z: f32, radius: f32| CoverSpec {
        pos: Vec2::new(x, z),
        radius,
    };
    let health = |x: f32, z: f32| PickupSpec {
        pos: Vec2::new(x, z),
        kind: PickupKind::Health,
    };

    vec![
        ArenaLayout {
            name: "Loading Dock".to_string(),
            half_extent: 30.0,
            player_start: Vec2::ZERO,
            covers: vec![
                cover(-10.0, -10.0, 1.5),
                cover(10.0, -10.0, 1.5),
                cover(-10.0, 10.0, 1.5),
                cover(10.0, 10.0, 1.5),
            ],
            barrels: vec![Vec2::new(0.0, 8.0), Vec2::new(-8.0, -3.0)],
            pickups: vec![PickupSpec {
                pos: Vec2::new(6.0, 0.0),
                kind: PickupKind::Weapon(WeaponKind::Shotgun),
            }],
            pickup_slots: vec![
                Vec2::new(12.0, 0.0),
                Vec2::new(-12.0, 0.0),
                Vec2::new(0.0, -12.0),
            ],
        },
        ArenaLayout {
            name: "Reactor Yard".to_string(),
            half_extent: 34.0,
            player_start: Vec2::new(0.0, 4.0),
            covers: vec![
                cover(0.0, -6.0, 2.5),
                cover(-14.0, 0.0, 1.2),
                cover(14.0, 0.0, 1.2),
                cover(-6.0, 14.0, 1.8),
                cover(6.0, 14.0, 1.8),
            ],
            barrels: vec![
                Vec2::new(-4.0, -6.0),
                Vec2::new(4.0, -6.0),
                Vec2::new(-18.0, -18.0),
                Vec2::new(18.0, 18.0),
            ],
            pickups: vec![
                health(-10.0, 8.0),
                PickupSpec {
                    pos: Vec2::new(10.0, 8.0),
                    kind: PickupKind::Weapon(WeaponKind::Railgun),
                },
            ],
            pickup_slots: vec![Vec2::new(0.0, 12.0), Vec2::new(-16.0, -10.0), Vec2::new(16.0, -10.0)],
        },
        ArenaLayout {
            name: "Containment".to_string(),
            half_extent: 38.0,
            player_start: Vec2::ZERO,
            covers: vec![
                cover(-8.0, -8.0, 2.0),
                cover(8.0, -8.0, 2.0),
                cover(-8.0, 8.0, 2.0),
                cover(8.0, 8.0, 2.0),
                cover(0.0, -20.0, 3.0),
                cover(0.0, 20.0, 3.0),
            ],
            barrels: vec![
                Vec2::new(-12.0, 0.0),
                Vec2::new(12.0, 0.0),
                Vec2::new(0.0, -14.0),
                Vec2::new(0.0, 14.0),
                Vec2::new(-24.0, 24.0),
                Vec2::new(24.0, -24.0),
            ],
            pickups: vec![PickupSpec {
                pos: Vec2::new(0.0, 5.0),
                kind: PickupKind::Weapon(WeaponKind::Launcher),
            }],
            pickup_slots: vec![
                Vec2::new(-18.0, 0.0),
                Vec2::new(18.0, 0.0),
                Vec2::new(0.0, -8.0),
                Vec2::new(0.0, 8.0),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
        assert_eq!(Tuning::default().level_count(), 3);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "waves": { "base_quota": 4 } }"#).unwrap();
        assert_eq!(tuning.waves.base_quota, 4);
        assert_eq!(tuning.waves.quota_increment, 5);
        assert_eq!(tuning.enemies.basic.max_health, 30.0);
        assert_eq!(tuning.levels.len(), 3);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ not json"), Err(TuningError::Json(_))));
    }

    #[test]
    fn test_rejects_empty_levels() {
        let err = Tuning::from_json(r#"{ "levels": [] }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "levels", .. }));
    }

    #[test]
    fn test_rejects_negative_role_weight() {
        let err = Tuning::from_json(
            r#"{ "steering": { "role_weights": { "rusher": -1.0, "flanker": 1.0, "circler": 1.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "steering.role_weights",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_pelletless_weapon() {
        let mut tuning = Tuning::default();
        tuning.weapons.shotgun.pellets = 0;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_level_lookup_is_one_based() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level(1).map(|l| l.name.as_str()), Some("Loading Dock"));
        assert!(tuning.level(0).is_none());
        assert!(tuning.level(4).is_none());
    }

    #[test]
    fn test_typed_lookups() {
        let tuning = Tuning::default();
        assert!(tuning.weapon(WeaponKind::Railgun).piercing);
        assert!(tuning.weapon(WeaponKind::Launcher).explosive);
        assert!(tuning.enemy(EnemyKind::Hazmat).max_health > tuning.enemy(EnemyKind::Basic).max_health);
    }
}
