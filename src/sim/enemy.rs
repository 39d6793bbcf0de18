//! Enemy agents: role-based steering and the alive → dying → removed lifecycle

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use crate::consts::EPSILON;
use crate::host::{Animation, CharacterVisual};
use crate::tuning::{RoleWeights, SteeringTuning, Tuning};
use crate::{dir_to_heading, normalize_angle};

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    /// Tougher and slower, always circles
    Hazmat,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 2] = [EnemyKind::Basic, EnemyKind::Hazmat];
}

/// Behavioral strategy, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Straight at the player
    Rusher,
    /// Angled approach from one side until close
    Flanker,
    /// Orbits at range and closes in over time
    Circler,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Rusher, Role::Flanker, Role::Circler];

    /// Weighted draw from the role table
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, weights: &RoleWeights) -> Role {
        let total = weights.total();
        let mut roll = rng.random::<f32>() * total;
        for role in Role::ALL {
            let weight = weights.weight(role).max(0.0);
            if roll < weight {
                return role;
            }
            roll -= weight;
        }
        // Rounding slack lands on the last non-zero weight
        Role::ALL
            .into_iter()
            .rev()
            .find(|r| weights.weight(*r) > 0.0)
            .unwrap_or(Role::Rusher)
    }

    /// Role for a freshly spawned enemy of `kind`
    pub fn for_kind<R: Rng + ?Sized>(kind: EnemyKind, rng: &mut R, weights: &RoleWeights) -> Role {
        match kind {
            EnemyKind::Hazmat => Role::Circler,
            EnemyKind::Basic => Role::draw(rng, weights),
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyState {
    Alive,
    /// Playing the death animation; removed when the timer runs out
    Dying { timer: f32 },
}

/// An enemy agent
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub role: Role,
    pub pos: Vec2,
    /// Heading in radians
    pub facing: f32,
    pub radius: f32,
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    pub state: EnemyState,
    /// Seconds until this enemy may deal contact damage again
    pub contact_cooldown: f32,
    /// Seconds of hit flash remaining
    pub flash_timer: f32,
    /// +1 or -1, which side a flanker approaches from
    pub flank_side: f32,
    /// Accumulated orbit angle for circlers
    pub orbit_angle: f32,
    pub visual: Option<CharacterVisual>,
}

impl Enemy {
    /// Spawn with randomized role, speed variance and role parameters
    pub fn spawn<R: Rng + ?Sized>(
        id: u32,
        kind: EnemyKind,
        pos: Vec2,
        speed_multiplier: f32,
        tuning: &Tuning,
        rng: &mut R,
    ) -> Self {
        let stats = tuning.enemy(kind);
        let role = Role::for_kind(kind, rng, &tuning.steering.role_weights);
        let variance = tuning.enemies.speed_variance.abs();
        let jitter = if variance > 0.0 {
            rng.random_range(1.0 - variance..=1.0 + variance)
        } else {
            1.0
        };
        let flank_side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let orbit_angle = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);

        Self {
            id,
            kind,
            role,
            pos,
            facing: dir_to_heading(-pos),
            radius: stats.radius,
            speed: tuning.enemies.base_speed * stats.speed_multiplier * speed_multiplier * jitter,
            health: stats.max_health,
            max_health: stats.max_health,
            contact_damage: stats.contact_damage,
            state: EnemyState::Alive,
            contact_cooldown: 0.0,
            flash_timer: 0.0,
            flank_side,
            orbit_angle,
            visual: None,
        }
    }

    #[inline]
    pub fn is_dying(&self) -> bool {
        matches!(self.state, EnemyState::Dying { .. })
    }

    /// Finished dying and ready to be dropped
    pub fn is_removable(&self) -> bool {
        matches!(self.state, EnemyState::Dying { timer } if timer <= 0.0)
    }

    pub fn is_damaged(&self) -> bool {
        self.health < self.max_health
    }

    /// Apply damage. Returns true only on the call that kills.
    pub fn take_damage(&mut self, amount: f32, tuning: &Tuning) -> bool {
        if self.is_dying() {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        self.flash_timer = tuning.steering.flash_duration;
        if self.health <= 0.0 {
            self.state = EnemyState::Dying {
                timer: tuning.steering.death_duration,
            };
            true
        } else {
            false
        }
    }

    /// Current animation for presentation
    pub fn animation(&self) -> Animation {
        if self.is_dying() {
            Animation::Death
        } else if self.flash_timer > 0.0 {
            Animation::Hit
        } else {
            Animation::Run
        }
    }

    /// Desired unit heading toward the player for this frame
    pub fn steer(&mut self, player_pos: Vec2, dt: f32, cfg: &SteeringTuning) -> Vec2 {
        let to_player = player_pos - self.pos;
        let distance = to_player.length();
        if distance < EPSILON {
            return Vec2::ZERO;
        }
        let direct = to_player / distance;

        match self.role {
            Role::Rusher => direct,
            Role::Flanker => {
                if distance < cfg.flank_distance {
                    return direct;
                }
                let lateral = direct.perp() * self.flank_side;
                renormalize(
                    direct * cfg.flank_direct_weight + lateral * cfg.flank_lateral_weight,
                    direct,
                )
            }
            Role::Circler => {
                if distance < cfg.circle_min_distance || self.is_damaged() {
                    return direct;
                }
                self.orbit_angle = normalize_angle(self.orbit_angle + cfg.orbit_rate * dt);
                let radial_factor = ((distance - cfg.orbit_distance) / cfg.orbit_distance)
                    .max(cfg.orbit_radial_min);
                let radial = direct * radial_factor;
                let tangent = direct.perp();
                renormalize(
                    radial * cfg.orbit_radial_weight + tangent * cfg.orbit_tangent_weight,
                    direct,
                )
            }
        }
    }

    /// Per-frame update: timers always, pursuit only while alive
    pub fn update(&mut self, player_pos: Vec2, dt: f32, cfg: &SteeringTuning) {
        self.contact_cooldown = (self.contact_cooldown - dt).max(0.0);
        self.flash_timer = (self.flash_timer - dt).max(0.0);

        if let EnemyState::Dying { ref mut timer } = self.state {
            *timer -= dt;
            return;
        }

        let heading = self.steer(player_pos, dt, cfg);
        if heading != Vec2::ZERO {
            self.pos += heading * self.speed * dt;
            self.facing = dir_to_heading(heading);
        }
    }
}

fn renormalize(v: Vec2, fallback: Vec2) -> Vec2 {
    if v.length_squared() > EPSILON {
        v.normalize()
    } else {
        fallback
    }
}

/// Push apart every pair of live enemies closer than the separation radius
pub fn apply_separation(enemies: &mut [Enemy], cfg: &SteeringTuning, dt: f32) {
    let radius = cfg.separation_radius;
    for i in 0..enemies.len() {
        if enemies[i].is_dying() {
            continue;
        }
        let (head, tail) = enemies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut().filter(|b| !b.is_dying()) {
            let delta = a.pos - b.pos;
            let distance = delta.length();
            if distance >= radius {
                continue;
            }
            // Coincident centers: split along x, lower id to the left
            let (axis, denom) = if distance > EPSILON {
                (delta, distance)
            } else if a.id < b.id {
                (-Vec2::X, 1.0)
            } else {
                (Vec2::X, 1.0)
            };
            let push = axis * ((radius - distance) * cfg.separation_force * dt / denom);
            a.pos += push;
            b.pos -= push;
        }
    }
}

/// Advance every enemy, separate them and keep them in bounds
pub fn update_enemies(enemies: &mut [Enemy], player_pos: Vec2, arena: &Arena, tuning: &Tuning, dt: f32) {
    for enemy in enemies.iter_mut() {
        enemy.update(player_pos, dt, &tuning.steering);
    }
    apply_separation(enemies, &tuning.steering, dt);
    for enemy in enemies.iter_mut() {
        enemy.pos = arena.clamp(enemy.pos, enemy.radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy_at(id: u32, role: Role, pos: Vec2) -> Enemy {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(id as u64);
        let mut enemy = Enemy::spawn(id, EnemyKind::Basic, pos, 1.0, &tuning, &mut rng);
        enemy.role = role;
        enemy.speed = 3.0;
        enemy
    }

    #[test]
    fn test_basic_kill_scenario() {
        let tuning = Tuning::default();
        let mut enemy = enemy_at(1, Role::Rusher, Vec2::ZERO);
        assert_eq!(enemy.health, 30.0);

        assert!(!enemy.take_damage(20.0, &tuning));
        assert_eq!(enemy.health, 10.0);
        assert!(!enemy.is_dying());

        let killed = enemy.take_damage(15.0, &tuning);
        assert!(killed);
        assert!(enemy.health <= 0.0);
        assert!(enemy.health >= 0.0);
        assert!(enemy.is_dying());

        // Death fires once
        assert!(!enemy.take_damage(15.0, &tuning));
    }

    #[test]
    fn test_dying_enemy_is_removed_after_countdown() {
        let tuning = Tuning::default();
        let mut enemy = enemy_at(1, Role::Rusher, Vec2::new(5.0, 0.0));
        enemy.take_damage(100.0, &tuning);
        let start = enemy.pos;

        let dt = 0.25;
        let steps = (tuning.steering.death_duration / dt).ceil() as usize;
        for _ in 0..steps - 1 {
            enemy.update(Vec2::ZERO, dt, &tuning.steering);
            assert!(!enemy.is_removable());
        }
        enemy.update(Vec2::ZERO, dt, &tuning.steering);
        assert!(enemy.is_removable());
        // No movement while dying
        assert_eq!(enemy.pos, start);
    }

    #[test]
    fn test_hit_flash_is_tick_synchronous() {
        let tuning = Tuning::default();
        let mut enemy = enemy_at(1, Role::Rusher, Vec2::new(5.0, 0.0));
        enemy.take_damage(1.0, &tuning);
        assert_eq!(enemy.animation(), Animation::Hit);
        enemy.update(Vec2::ZERO, tuning.steering.flash_duration + 0.01, &tuning.steering);
        assert_eq!(enemy.animation(), Animation::Run);
    }

    #[test]
    fn test_contact_cooldown_ticks_while_dying() {
        let tuning = Tuning::default();
        let mut enemy = enemy_at(1, Role::Rusher, Vec2::ZERO);
        enemy.contact_cooldown = 0.5;
        enemy.take_damage(100.0, &tuning);
        enemy.update(Vec2::X, 0.2, &tuning.steering);
        assert!((enemy.contact_cooldown - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_rusher_moves_straight_at_player() {
        let cfg = SteeringTuning::default();
        let mut enemy = enemy_at(1, Role::Rusher, Vec2::new(10.0, 0.0));
        let dir = enemy.steer(Vec2::ZERO, 0.016, &cfg);
        assert!((dir - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_flanker_angles_in_when_far() {
        let cfg = SteeringTuning::default();
        let mut enemy = enemy_at(1, Role::Flanker, Vec2::new(20.0, 0.0));
        enemy.flank_side = 1.0;
        let dir = enemy.steer(Vec2::ZERO, 0.016, &cfg);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        // Still closing, but with a lateral component
        assert!(dir.x < 0.0);
        assert!(dir.y.abs() > 0.3);

        // Opposite side mirrors the approach
        enemy.flank_side = -1.0;
        let mirrored = enemy.steer(Vec2::ZERO, 0.016, &cfg);
        assert!((mirrored.y + dir.y).abs() < 1e-5);
    }

    #[test]
    fn test_flanker_goes_direct_when_close() {
        let cfg = SteeringTuning::default();
        let mut enemy = enemy_at(1, Role::Flanker, Vec2::new(cfg.flank_distance - 1.0, 0.0));
        let dir = enemy.steer(Vec2::ZERO, 0.016, &cfg);
        assert!((dir - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_circler_orbits_then_closes() {
        let tuning = Tuning::default();
        let cfg = &tuning.steering;
        let mut enemy = enemy_at(1, Role::Circler, Vec2::new(cfg.orbit_distance, 0.0));
        let angle_before = enemy.orbit_angle;
        let dir = enemy.steer(Vec2::ZERO, 0.1, cfg);
        // At orbit distance the clamped radial factor still pulls inward a little
        assert!(dir.x < 0.0);
        assert!(dir.y.abs() > dir.x.abs());
        assert!(enemy.orbit_angle != angle_before);

        // Once hurt it rushes
        enemy.take_damage(1.0, &tuning);
        let dir = enemy.steer(Vec2::ZERO, 0.1, cfg);
        assert!((dir - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_hazmat_is_always_circler() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(3);
        for id in 0..50 {
            let enemy = Enemy::spawn(id, EnemyKind::Hazmat, Vec2::ZERO, 1.0, &tuning, &mut rng);
            assert_eq!(enemy.role, Role::Circler);
        }
    }

    #[test]
    fn test_role_draw_is_reproducible_with_seeded_source() {
        let weights = SteeringTuning::default().role_weights;
        let draw = |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            (0..32).map(|_| Role::draw(&mut rng, &weights)).collect::<Vec<_>>()
        };
        assert_eq!(draw(11), draw(11));
    }

    #[test]
    fn test_role_draw_honours_zero_weights() {
        let weights = RoleWeights {
            rusher: 0.0,
            flanker: 1.0,
            circler: 0.0,
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            assert_eq!(Role::draw(&mut rng, &weights), Role::Flanker);
        }
    }

    #[test]
    fn test_role_draw_treats_negative_weight_as_zero() {
        let weights = RoleWeights {
            rusher: -1.0,
            flanker: 1.0,
            circler: 1.0,
        };
        let mut rng = Pcg32::seed_from_u64(11);
        let n = 2_000;
        let roles: Vec<_> = (0..n).map(|_| Role::draw(&mut rng, &weights)).collect();
        assert!(!roles.contains(&Role::Rusher));
        let circlers = roles.iter().filter(|r| **r == Role::Circler).count();
        let share = circlers as f32 / n as f32;
        assert!((share - 0.5).abs() < 0.05, "circler share {share}");
    }

    #[test]
    fn test_role_distribution_roughly_follows_weights() {
        let weights = SteeringTuning::default().role_weights;
        let mut rng = Pcg32::seed_from_u64(2024);
        let n = 10_000;
        let rushers = (0..n)
            .filter(|_| Role::draw(&mut rng, &weights) == Role::Rusher)
            .count();
        let share = rushers as f32 / n as f32;
        assert!((share - 0.5).abs() < 0.03, "rusher share {share}");
    }

    #[test]
    fn test_separation_ignores_dying() {
        let tuning = Tuning::default();
        let mut enemies = vec![
            enemy_at(1, Role::Rusher, Vec2::new(0.0, 0.0)),
            enemy_at(2, Role::Rusher, Vec2::new(0.5, 0.0)),
        ];
        enemies[1].take_damage(1000.0, &tuning);
        apply_separation(&mut enemies, &tuning.steering, 0.016);
        assert_eq!(enemies[0].pos, Vec2::ZERO);
        assert_eq!(enemies[1].pos, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn test_coincident_enemies_split() {
        let cfg = SteeringTuning::default();
        let mut enemies = vec![
            enemy_at(1, Role::Rusher, Vec2::new(2.0, 2.0)),
            enemy_at(2, Role::Rusher, Vec2::new(2.0, 2.0)),
        ];
        apply_separation(&mut enemies, &cfg, 0.016);
        assert!(enemies[0].pos.x < enemies[1].pos.x);
    }

    proptest! {
        #[test]
        fn prop_separation_moves_pairs_apart(
            ax in -20.0f32..20.0, az in -20.0f32..20.0,
            dx in -1.3f32..1.3, dz in -1.3f32..1.3,
            dt in 0.001f32..0.05,
        ) {
            let cfg = SteeringTuning::default();
            let a = Vec2::new(ax, az);
            let b = a + Vec2::new(dx, dz);
            let before = a.distance(b);
            prop_assume!(before < cfg.separation_radius - 0.05);

            let mut enemies = vec![enemy_at(1, Role::Rusher, a), enemy_at(2, Role::Rusher, b)];
            apply_separation(&mut enemies, &cfg, dt);
            let after = enemies[0].pos.distance(enemies[1].pos);
            prop_assert!(after > before, "before {} after {}", before, after);
        }

        #[test]
        fn prop_enemies_stay_in_bounds(
            xs in proptest::collection::vec((-40.0f32..40.0, -40.0f32..40.0), 1..12),
            px in -10.0f32..10.0, pz in -10.0f32..10.0,
        ) {
            let tuning = Tuning::default();
            let arena = Arena::new(10.0);
            let mut enemies: Vec<Enemy> = xs
                .iter()
                .enumerate()
                .map(|(i, (x, z))| enemy_at(i as u32, Role::ALL[i % 3], Vec2::new(*x, *z)))
                .collect();
            for _ in 0..5 {
                update_enemies(&mut enemies, Vec2::new(px, pz), &arena, &tuning, 0.05);
                for enemy in &enemies {
                    prop_assert!(arena.contains(enemy.pos, enemy.radius));
                }
            }
        }
    }
}
