//! Wave director: what to spawn, when, and where
//!
//! The director knows nothing about live entities beyond the alive count the
//! caller passes in. Each `update` returns exactly one `WaveEvent`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Arena;
use super::enemy::EnemyKind;
use crate::tuning::WaveTuning;

/// Spawn patterns, selected by wave number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formation {
    /// Any of the four edges
    Surround,
    /// Left or right edge
    Pincer,
    /// One edge per wave, rotating
    Swarm,
    /// Alternating front/back lane bands
    Lane,
}

impl Formation {
    pub const ORDER: [Formation; 4] = [
        Formation::Surround,
        Formation::Pincer,
        Formation::Swarm,
        Formation::Lane,
    ];

    /// Formation for a wave; the same wave always maps to the same formation
    pub fn for_wave(wave: u32) -> Formation {
        Self::ORDER[wave as usize % Self::ORDER.len()]
    }
}

/// Director phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    Break,
    Active,
}

/// One director outcome per update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaveEvent {
    Spawn { kind: EnemyKind, pos: Vec2 },
    WaveStart { wave: u32 },
    WaveClear { wave: u32 },
    Break { time_left: f32 },
    None,
}

/// Per-level wave scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct WaveDirector {
    pub wave: u32,
    pub phase: WavePhase,
    pub break_timer: f32,
    pub remaining_to_spawn: u32,
    pub spawn_timer: f32,
}

impl WaveDirector {
    /// Fresh director waiting out the opening break
    pub fn new(cfg: &WaveTuning) -> Self {
        Self {
            wave: 0,
            phase: WavePhase::Break,
            break_timer: cfg.first_break_duration,
            remaining_to_spawn: 0,
            spawn_timer: 0.0,
        }
    }

    /// Enemy quota for a wave
    pub fn quota(cfg: &WaveTuning, wave: u32) -> u32 {
        let base = cfg.base_quota + wave.saturating_sub(1) * cfg.quota_increment;
        if Self::is_boss_wave(cfg, wave) {
            base + cfg.boss_bonus
        } else {
            base
        }
    }

    pub fn is_boss_wave(cfg: &WaveTuning, wave: u32) -> bool {
        wave > 0 && cfg.boss_interval > 0 && wave % cfg.boss_interval == 0
    }

    /// Begin wave `wave`
    pub fn start_wave(&mut self, cfg: &WaveTuning, wave: u32) {
        self.wave = wave;
        self.phase = WavePhase::Active;
        self.remaining_to_spawn = Self::quota(cfg, wave);
        self.spawn_timer = 0.0;
        self.break_timer = 0.0;
        log::debug!(
            "Director armed wave {}: {} enemies, {:?} formation",
            wave,
            self.remaining_to_spawn,
            Formation::for_wave(wave)
        );
    }

    pub fn start_break(&mut self, cfg: &WaveTuning) {
        self.phase = WavePhase::Break;
        self.break_timer = cfg.break_duration;
    }

    /// Speed multiplier for enemies spawned this wave
    pub fn speed_multiplier(&self, cfg: &WaveTuning) -> f32 {
        1.0 + self.wave.saturating_sub(1) as f32 * cfg.speed_scale
    }

    /// Probability that a spawn in `wave` is a hazmat
    pub fn hazmat_chance(cfg: &WaveTuning, wave: u32) -> f32 {
        if wave < cfg.hazmat_start_wave {
            return 0.0;
        }
        if Self::is_boss_wave(cfg, wave) {
            return cfg.hazmat_boss_chance;
        }
        let past = (wave - cfg.hazmat_start_wave) as f32;
        (cfg.hazmat_base_chance + past * cfg.hazmat_chance_per_wave).min(cfg.hazmat_max_chance)
    }

    /// Advance timers and report the single thing that happened
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        cfg: &WaveTuning,
        arena: &Arena,
        dt: f32,
        alive_enemies: usize,
        rng: &mut R,
    ) -> WaveEvent {
        match self.phase {
            WavePhase::Break => {
                self.break_timer -= dt;
                if self.break_timer <= 0.0 {
                    self.start_wave(cfg, self.wave + 1);
                    WaveEvent::WaveStart { wave: self.wave }
                } else {
                    WaveEvent::Break {
                        time_left: self.break_timer,
                    }
                }
            }
            WavePhase::Active => {
                if self.remaining_to_spawn == 0 {
                    if alive_enemies == 0 {
                        let wave = self.wave;
                        self.start_break(cfg);
                        log::info!("Wave {} cleared", wave);
                        return WaveEvent::WaveClear { wave };
                    }
                    return WaveEvent::None;
                }

                self.spawn_timer -= dt;
                if self.spawn_timer > 0.0 {
                    return WaveEvent::None;
                }
                self.spawn_timer = cfg.spawn_interval;
                self.remaining_to_spawn -= 1;

                let kind = if rng.random::<f32>() < Self::hazmat_chance(cfg, self.wave) {
                    EnemyKind::Hazmat
                } else {
                    EnemyKind::Basic
                };
                let pos = spawn_position(Formation::for_wave(self.wave), self.wave, arena, cfg, rng);
                WaveEvent::Spawn { kind, pos }
            }
        }
    }
}

/// Spawn point for a formation, inset from the boundary
pub fn spawn_position<R: Rng + ?Sized>(
    formation: Formation,
    wave: u32,
    arena: &Arena,
    cfg: &WaveTuning,
    rng: &mut R,
) -> Vec2 {
    let edge = (arena.half_extent - cfg.spawn_margin).max(0.0);

    match formation {
        Formation::Surround => {
            let side = rng.random_range(0..4u32);
            edge_point(side, edge, offset_along(edge, rng))
        }
        Formation::Pincer => {
            let x = if rng.random_bool(0.5) { -edge } else { edge };
            Vec2::new(x, offset_along(edge, rng))
        }
        Formation::Swarm => edge_point(wave % 4, edge, offset_along(edge, rng)),
        Formation::Lane => {
            let depth = cfg.lane_band_depth.clamp(0.0, edge * 2.0);
            let into_band = if depth > 0.0 {
                rng.random_range(0.0..=depth)
            } else {
                0.0
            };
            let x = offset_along(edge, rng);
            let z = if wave % 2 == 0 {
                -edge + into_band
            } else {
                edge - into_band
            };
            Vec2::new(x, z)
        }
    }
}

/// Uniform offset along an edge of half-length `edge`
fn offset_along<R: Rng + ?Sized>(edge: f32, rng: &mut R) -> f32 {
    if edge > 0.0 {
        rng.random_range(-edge..=edge)
    } else {
        0.0
    }
}

/// Point on edge `side` (0 = -z, 1 = +z, 2 = -x, 3 = +x) at offset `along`
fn edge_point(side: u32, edge: f32, along: f32) -> Vec2 {
    match side % 4 {
        0 => Vec2::new(along, -edge),
        1 => Vec2::new(along, edge),
        2 => Vec2::new(-edge, along),
        _ => Vec2::new(edge, along),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn cfg() -> WaveTuning {
        WaveTuning::default()
    }

    #[test]
    fn test_quota_scaling() {
        let cfg = cfg();
        assert_eq!(WaveDirector::quota(&cfg, 1), 15);
        assert_eq!(WaveDirector::quota(&cfg, 3), 25);
        // Boss wave bonus
        assert_eq!(WaveDirector::quota(&cfg, 5), 35 + cfg.boss_bonus);
    }

    #[test]
    fn test_start_wave_sets_quota() {
        let cfg = cfg();
        let mut director = WaveDirector::new(&cfg);
        director.start_wave(&cfg, 3);
        assert_eq!(director.remaining_to_spawn, 25);
        assert_eq!(director.phase, WavePhase::Active);
        assert_eq!(director.spawn_timer, 0.0);
    }

    #[test]
    fn test_speed_multiplier_grows() {
        let cfg = cfg();
        let mut director = WaveDirector::new(&cfg);
        director.start_wave(&cfg, 1);
        assert_eq!(director.speed_multiplier(&cfg), 1.0);
        director.start_wave(&cfg, 5);
        assert!((director.speed_multiplier(&cfg) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_hazmat_chance_curve() {
        let cfg = cfg();
        assert_eq!(WaveDirector::hazmat_chance(&cfg, 1), 0.0);
        assert_eq!(WaveDirector::hazmat_chance(&cfg, 2), 0.0);
        let w3 = WaveDirector::hazmat_chance(&cfg, 3);
        let w4 = WaveDirector::hazmat_chance(&cfg, 4);
        assert!(w3 > 0.0 && w4 > w3);
        assert_eq!(WaveDirector::hazmat_chance(&cfg, 5), cfg.hazmat_boss_chance);
        assert!(WaveDirector::hazmat_chance(&cfg, 99) <= cfg.hazmat_max_chance);
    }

    #[test]
    fn test_formation_is_deterministic() {
        for wave in 0..64 {
            assert_eq!(Formation::for_wave(wave), Formation::for_wave(wave));
        }
        assert_eq!(Formation::for_wave(1), Formation::Pincer);
        assert_eq!(Formation::for_wave(4), Formation::Surround);
    }

    #[test]
    fn test_break_then_wave_start() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut director = WaveDirector::new(&cfg);

        let event = director.update(&cfg, &arena, 0.5, 0, &mut rng);
        assert!(matches!(event, WaveEvent::Break { time_left } if time_left > 0.0));

        let event = director.update(&cfg, &arena, cfg.first_break_duration, 0, &mut rng);
        assert_eq!(event, WaveEvent::WaveStart { wave: 1 });
        assert_eq!(director.phase, WavePhase::Active);
    }

    #[test]
    fn test_one_spawn_per_interval() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(2);
        let mut director = WaveDirector::new(&cfg);
        director.start_wave(&cfg, 1);

        // A huge dt still yields a single spawn
        let event = director.update(&cfg, &arena, 100.0, 0, &mut rng);
        assert!(matches!(event, WaveEvent::Spawn { .. }));
        assert_eq!(director.remaining_to_spawn, 14);

        let event = director.update(&cfg, &arena, cfg.spawn_interval * 0.5, 1, &mut rng);
        assert_eq!(event, WaveEvent::None);
        let event = director.update(&cfg, &arena, cfg.spawn_interval * 0.5, 1, &mut rng);
        assert!(matches!(event, WaveEvent::Spawn { .. }));
    }

    #[test]
    fn test_clear_waits_for_alive_enemies() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(3);
        let mut director = WaveDirector::new(&cfg);
        director.start_wave(&cfg, 2);
        director.remaining_to_spawn = 0;

        assert_eq!(director.update(&cfg, &arena, 0.1, 3, &mut rng), WaveEvent::None);
        assert_eq!(director.update(&cfg, &arena, 0.1, 0, &mut rng), WaveEvent::WaveClear { wave: 2 });
        assert_eq!(director.phase, WavePhase::Break);
        assert_eq!(director.break_timer, cfg.break_duration);
    }

    #[test]
    fn test_no_hazmat_before_start_wave() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(4);
        let mut director = WaveDirector::new(&cfg);
        director.start_wave(&cfg, 1);
        while director.remaining_to_spawn > 0 {
            if let WaveEvent::Spawn { kind, .. } = director.update(&cfg, &arena, 1.0, 0, &mut rng) {
                assert_eq!(kind, EnemyKind::Basic);
            }
        }
    }

    #[test]
    fn test_pincer_uses_left_and_right_edges() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(5);
        let edge = 30.0 - cfg.spawn_margin;
        for _ in 0..50 {
            let pos = spawn_position(Formation::Pincer, 1, &arena, &cfg, &mut rng);
            assert_eq!(pos.x.abs(), edge);
        }
    }

    #[test]
    fn test_swarm_edge_follows_wave() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(6);
        let edge = 30.0 - cfg.spawn_margin;
        for _ in 0..20 {
            assert_eq!(spawn_position(Formation::Swarm, 4, &arena, &cfg, &mut rng).y, -edge);
            assert_eq!(spawn_position(Formation::Swarm, 6, &arena, &cfg, &mut rng).x, -edge);
            assert_eq!(spawn_position(Formation::Swarm, 7, &arena, &cfg, &mut rng).x, edge);
        }
    }

    #[test]
    fn test_lane_band_alternates_with_parity() {
        let cfg = cfg();
        let arena = Arena::new(30.0);
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..20 {
            assert!(spawn_position(Formation::Lane, 4, &arena, &cfg, &mut rng).y < 0.0);
            assert!(spawn_position(Formation::Lane, 3, &arena, &cfg, &mut rng).y > 0.0);
        }
    }

    proptest! {
        #[test]
        fn prop_spawns_stay_inset(seed in any::<u64>(), wave in 1u32..40) {
            let cfg = cfg();
            let arena = Arena::new(25.0);
            let mut rng = Pcg32::seed_from_u64(seed);
            let limit = arena.half_extent - cfg.spawn_margin;
            for formation in Formation::ORDER {
                let pos = spawn_position(formation, wave, &arena, &cfg, &mut rng);
                prop_assert!(pos.x.abs() <= limit + 1e-4 && pos.y.abs() <= limit + 1e-4);
            }
        }

        #[test]
        fn prop_wave_clear_iff_queue_empty_and_no_enemies(
            seed in any::<u64>(),
            steps in proptest::collection::vec((0.0f32..1.5, 0usize..4), 1..200),
        ) {
            let cfg = cfg();
            let arena = Arena::new(30.0);
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut director = WaveDirector::new(&cfg);
            for (dt, alive) in steps {
                let phase = director.phase;
                let remaining = director.remaining_to_spawn;
                let event = director.update(&cfg, &arena, dt, alive, &mut rng);
                let should_clear = phase == WavePhase::Active && remaining == 0 && alive == 0;
                prop_assert_eq!(matches!(event, WaveEvent::WaveClear { .. }), should_clear);
            }
        }
    }
}
