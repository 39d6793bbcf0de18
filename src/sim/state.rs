//! Game state and core simulation types
//!
//! `GameState` owns every entity collection for the running level. The
//! collision engine and wave director borrow from it per call and never keep
//! references across frames.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::arena::{Arena, ArenaLayout, Collider, ColliderOwner};
use super::barrel::Barrel;
use super::collision::{FrameReport, Kill};
use super::enemy::{Enemy, EnemyKind};
use super::pickup::{Pickup, PickupKind};
use super::player::Player;
use super::projectile::{Projectile, WeaponKind, fire_weapon};
use super::tick::TickInput;
use super::wave::{Formation, WaveDirector, WavePhase};
use crate::consts::{ENEMY_HEIGHT, PROJECTILE_HEIGHT};
use crate::host::{AssetProvider, CharacterKey, CharacterVisual, NoAssets, StaticKey, VisualHandle};
use crate::to_world;
use crate::tuning::{ScoreTuning, Tuning};

/// Top-level game flow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the host to finish loading assets
    #[default]
    Loading,
    /// Opening cinematic, presented by the host
    IntroCinematic,
    /// Active gameplay
    Playing,
    /// Frozen; nothing advances
    Paused,
    /// Fade between levels
    LevelTransition,
    /// Closing cinematic after the last level
    VictoryCinematic,
    /// End-of-session stats screen
    Stats,
    /// Player died; the arena keeps running behind the overlay
    GameOver,
}

impl GamePhase {
    pub const ALL: [GamePhase; 8] = [
        GamePhase::Loading,
        GamePhase::IntroCinematic,
        GamePhase::Playing,
        GamePhase::Paused,
        GamePhase::LevelTransition,
        GamePhase::VictoryCinematic,
        GamePhase::Stats,
        GamePhase::GameOver,
    ];
}

/// Frame delta in both time domains
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    /// Wall-clock seconds (capped), unaffected by slow motion
    pub raw: f32,
    /// `raw * time_scale`; drives movement, AI and cooldowns
    pub scaled: f32,
}

impl FrameTime {
    pub fn new(raw: f32, time_scale: f32) -> Self {
        Self {
            raw,
            scaled: raw * time_scale,
        }
    }
}

/// Sound cues for the host's audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    Shot(WeaponKind),
    Hit,
    Explosion,
    EnemyDeath,
    PlayerHurt,
    Pickup,
    WaveStart,
    WaveClear,
    GameOver,
    Victory,
}

/// Fire-and-forget requests for presentation collaborators
///
/// Particle and text effects carry world-space positions; everything else is
/// on the ground plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    MuzzleFlash { pos: Vec3, dir: Vec2, weapon: WeaponKind },
    Impact { pos: Vec3 },
    Explosion { pos: Vec2, radius: f32 },
    Sound(SoundCue),
    CameraShake { intensity: f32 },
    FloatingText { pos: Vec3, text: String },
    ScreenFlash { intensity: f32 },
    /// Start the enemy's hit-flash; it clears on its own timer
    EnemyHitFlash { id: u32 },
    EnemyDied { id: u32, kind: EnemyKind, pos: Vec2 },
    PickupCollected { kind: PickupKind, pos: Vec2 },
    WaveStarted { wave: u32, formation: Formation, boss: bool },
    WaveCleared { wave: u32 },
    LevelCleared { level: u32 },
    PhaseChanged { from: GamePhase, to: GamePhase },
    PlayerDied,
}

/// Positions for the minimap overlay
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MinimapFeed {
    pub half_extent: f32,
    pub player: Vec2,
    pub enemies: Vec<Vec2>,
    pub pickups: Vec<Vec2>,
    pub barrels: Vec<Vec2>,
}

/// Read-model for the HUD, refreshed once per simulated frame
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub multiplier: f32,
    pub streak: u32,
    pub wave: u32,
    pub level: u32,
    /// Seconds until the next wave while on break
    pub break_time_left: Option<f32>,
    pub health: f32,
    pub max_health: f32,
    pub weapon: WeaponKind,
    pub minimap: MinimapFeed,
}

/// Kill counts per enemy type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillsByKind {
    pub basic: u32,
    pub hazmat: u32,
}

impl KillsByKind {
    pub fn add(&mut self, kind: EnemyKind) {
        match kind {
            EnemyKind::Basic => self.basic += 1,
            EnemyKind::Hazmat => self.hazmat += 1,
        }
    }
}

/// Summary of one finished level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    pub level: u32,
    pub name: String,
    pub kills: u32,
    pub score: u64,
    pub elapsed_secs: f32,
}

/// Session aggregates for the stats screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub kills: u32,
    pub kills_by_kind: KillsByKind,
    /// Trigger pulls, not pellets
    pub shots_fired: u32,
    pub damage_taken: f32,
    pub waves_cleared: u32,
    pub levels_cleared: u32,
    pub score: u64,
    /// Raw seconds spent in play
    pub elapsed_secs: f32,
    pub levels: Vec<LevelRecord>,
}

/// Counters captured when a level starts
#[derive(Debug, Clone, Copy, Default)]
struct LevelMark {
    kills: u32,
    score: u64,
    elapsed_secs: f32,
}

/// Multiplier for a streak of consecutive kills
pub fn streak_multiplier(cfg: &ScoreTuning, streak: u32) -> f32 {
    1.0 + streak.min(cfg.multiplier_cap_streak) as f32 * cfg.multiplier_step
}

/// Complete simulation state
pub struct GameState {
    /// Session seed; restarting reseeds from it
    pub seed: u64,
    pub tuning: Arc<Tuning>,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Current level (1-based, 0 before the first build)
    pub level: u32,
    pub arena: Arena,
    pub colliders: Vec<Collider>,
    /// Cover visuals handed out by the asset provider
    pub scenery: Vec<VisualHandle>,
    pub player: Player,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub barrels: Vec<Barrel>,
    pub pickups: Vec<Pickup>,
    pub director: WaveDirector,
    pub score: u64,
    pub streak: u32,
    /// Raw seconds until the streak lapses
    pub streak_timer: f32,
    pub multiplier: f32,
    /// Host-controlled time scale
    pub time_scale: f32,
    /// Raw seconds of automatic slow motion left
    pub slow_motion_timer: f32,
    /// Scaled seconds left in the level fade
    pub transition_timer: f32,
    pub level_waves_started: u32,
    pub level_waves_cleared: u32,
    pub pickup_drops: u32,
    /// Input for the frame being simulated
    pub input: TickInput,
    pub stats: SessionStats,
    pub hud: HudSnapshot,
    events: Vec<GameEvent>,
    assets: Box<dyn AssetProvider>,
    level_mark: LevelMark,
    next_id: u32,
}

impl GameState {
    /// Create a headless state with the given seed
    pub fn new(seed: u64, tuning: Arc<Tuning>) -> Self {
        Self::with_assets(seed, tuning, Box::new(NoAssets))
    }

    pub fn with_assets(seed: u64, tuning: Arc<Tuning>, assets: Box<dyn AssetProvider>) -> Self {
        let half_extent = tuning.level(1).map_or(30.0, |l| l.half_extent);
        let player = Player::new(Vec2::ZERO, &tuning.player);
        let director = WaveDirector::new(&tuning.waves);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Loading,
            level: 0,
            arena: Arena::new(half_extent),
            colliders: Vec::new(),
            scenery: Vec::new(),
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            barrels: Vec::new(),
            pickups: Vec::new(),
            director,
            score: 0,
            streak: 0,
            streak_timer: 0.0,
            multiplier: 1.0,
            time_scale: 1.0,
            slow_motion_timer: 0.0,
            transition_timer: 0.0,
            level_waves_started: 0,
            level_waves_cleared: 0,
            pickup_drops: 0,
            input: TickInput::default(),
            stats: SessionStats::default(),
            hud: HudSnapshot::default(),
            events: Vec::new(),
            assets,
            level_mark: LevelMark::default(),
            next_id: 1,
            tuning,
        }
    }

    /// Swap the asset provider. Existing entities keep their visuals.
    pub fn set_assets(&mut self, assets: Box<dyn AssetProvider>) {
        self.assets = assets;
    }

    /// Back to a fresh session from the same seed, keeping tuning, assets,
    /// the current phase and the host time scale
    pub fn reset(&mut self) {
        let assets = std::mem::replace(&mut self.assets, Box::new(NoAssets));
        let (phase, time_scale) = (self.phase, self.time_scale);
        *self = Self::with_assets(self.seed, Arc::clone(&self.tuning), assets);
        self.phase = phase;
        self.time_scale = time_scale;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.barrels.sort_by_key(|b| b.id);
        self.pickups.sort_by_key(|p| p.id);
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Pending events, oldest first
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Enemies that are not dying
    pub fn alive_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| !e.is_dying()).count()
    }

    /// Frame time after host scaling and any slow-motion burst
    pub fn frame_time(&self, raw: f32) -> FrameTime {
        let mut scale = self.time_scale;
        if self.slow_motion_timer > 0.0 {
            scale *= self.tuning.time.slow_motion_scale;
        }
        FrameTime::new(raw, scale)
    }

    /// Advance timers that run on raw time
    pub fn advance_clocks(&mut self, raw: f32) {
        if self.player.alive {
            self.stats.elapsed_secs += raw;
        }
        self.slow_motion_timer = (self.slow_motion_timer - raw).max(0.0);
        if self.streak > 0 {
            self.streak_timer -= raw;
            if self.streak_timer <= 0.0 {
                log::debug!("Streak of {} lapsed", self.streak);
                self.streak = 0;
                self.streak_timer = 0.0;
                self.multiplier = 1.0;
            }
        }
    }

    // --- Level lifecycle ---

    /// Build a level by number. Returns false if the tuning has no such level.
    pub fn load_level(&mut self, level: u32) -> bool {
        let tuning = Arc::clone(&self.tuning);
        let Some(layout) = tuning.level(level) else {
            log::warn!("No layout for level {}", level);
            return false;
        };
        self.level = level;
        self.build_arena(layout);
        true
    }

    /// Populate the arena from a layout, replacing whatever was there
    pub fn build_arena(&mut self, layout: &ArenaLayout) {
        self.clear_arena();
        let tuning = Arc::clone(&self.tuning);
        self.arena = layout.arena();

        let mut player = Player::new(self.arena.clamp(layout.player_start, tuning.player.radius), &tuning.player);
        if self.player.alive && self.level > 1 {
            // Survivors keep their health and weapon into the next level
            player.health = self.player.health;
            player.weapon = self.player.weapon;
        }
        player.visual = self.player.visual.take().or_else(|| self.clone_character(CharacterKey::Player));
        self.player = player;

        for cover in &layout.covers {
            self.colliders.push(Collider {
                pos: cover.pos,
                radius: cover.radius,
                owner: ColliderOwner::Cover,
            });
            if let Some(handle) = self.clone_static(StaticKey::Cover) {
                self.scenery.push(handle);
            }
        }

        for &pos in &layout.barrels {
            let id = self.next_entity_id();
            let mut barrel = Barrel::new(id, pos, tuning.combat.barrel_radius);
            barrel.visual = self.clone_static(StaticKey::Barrel);
            self.colliders.push(Collider {
                pos,
                radius: barrel.radius,
                owner: ColliderOwner::Barrel(id),
            });
            self.barrels.push(barrel);
        }

        for spec in &layout.pickups {
            self.spawn_pickup(spec.kind, spec.pos);
        }

        self.director.phase = WavePhase::Break;
        self.director.break_timer = tuning.waves.first_break_duration;
        self.director.remaining_to_spawn = 0;
        self.level_waves_started = 0;
        self.level_waves_cleared = 0;
        self.pickup_drops = 0;
        self.level_mark = LevelMark {
            kills: self.stats.kills,
            score: self.score,
            elapsed_secs: self.stats.elapsed_secs,
        };

        log::info!(
            "Built level {} \"{}\": {} cover, {} barrels, {} pickups",
            self.level,
            layout.name,
            layout.covers.len(),
            self.barrels.len(),
            self.pickups.len()
        );
        self.refresh_hud();
    }

    /// Drop every level-scoped entity
    pub fn clear_arena(&mut self) {
        self.enemies.clear();
        self.projectiles.clear();
        self.barrels.clear();
        self.pickups.clear();
        self.colliders.clear();
        self.scenery.clear();
    }

    /// Close out the current level in the session history
    pub fn record_level(&mut self) {
        let name = self
            .tuning
            .level(self.level)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        self.stats.levels.push(LevelRecord {
            level: self.level,
            name,
            kills: self.stats.kills - self.level_mark.kills,
            score: self.score - self.level_mark.score,
            elapsed_secs: self.stats.elapsed_secs - self.level_mark.elapsed_secs,
        });
    }

    /// Whether the running level has cleared all of its waves
    pub fn level_complete(&self) -> bool {
        self.level_waves_cleared >= self.tuning.waves.waves_per_level
    }

    pub fn has_next_level(&self) -> bool {
        self.level < self.tuning.level_count()
    }

    // --- Spawning ---

    fn clone_character(&mut self, key: CharacterKey) -> Option<CharacterVisual> {
        let visual = self.assets.clone_character(key);
        match &visual {
            None => log::debug!("No model for {:?}, spawning without a visual", key),
            Some(v) => {
                for missing in v.animations.missing() {
                    log::debug!("{:?} has no {:?} clip", key, missing);
                }
            }
        }
        visual
    }

    fn clone_static(&mut self, key: StaticKey) -> Option<VisualHandle> {
        let handle = self.assets.clone_static(key);
        if handle.is_none() {
            log::debug!("No model for {:?}, spawning without a visual", key);
        }
        handle
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> u32 {
        let tuning = Arc::clone(&self.tuning);
        let id = self.next_entity_id();
        let speed = self.director.speed_multiplier(&tuning.waves);
        let pos = self.arena.clamp(pos, tuning.enemy(kind).radius);
        let mut enemy = Enemy::spawn(id, kind, pos, speed, &tuning, &mut self.rng);
        enemy.visual = self.clone_character(CharacterKey::Enemy(kind));
        log::debug!("Spawned {:?} {:?} #{} at ({:.1}, {:.1})", kind, enemy.role, id, pos.x, pos.y);
        self.enemies.push(enemy);
        id
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let mut pickup = Pickup::new(id, kind, pos);
        pickup.visual = self.clone_static(StaticKey::Pickup(kind));
        self.pickups.push(pickup);
        id
    }

    /// Wave-start drop: alternates health and the weapon after the current one
    pub fn drop_wave_pickup(&mut self) -> Option<u32> {
        let slot = self.tuning.level(self.level)?.pickup_slot(self.pickup_drops as usize)?;
        let kind = if self.pickup_drops % 2 == 0 {
            PickupKind::Health
        } else {
            PickupKind::Weapon(self.player.weapon.next())
        };
        self.pickup_drops += 1;
        Some(self.spawn_pickup(kind, slot))
    }

    /// Pull the trigger if the active weapon is ready
    pub fn fire_weapon(&mut self) -> bool {
        let tuning = Arc::clone(&self.tuning);
        let weapon = self.player.weapon;
        let stats = tuning.weapon(weapon);
        if !self.player.try_fire(stats) {
            return false;
        }

        let origin = self.player.muzzle();
        let aim = self.player.aim_dir();
        let next_id = &mut self.next_id;
        let shots = fire_weapon(weapon, stats, origin, aim, &mut self.rng, || {
            let id = *next_id;
            *next_id += 1;
            id
        });
        self.projectiles.extend(shots);
        self.stats.shots_fired += 1;

        self.push_event(GameEvent::MuzzleFlash {
            pos: to_world(origin, PROJECTILE_HEIGHT),
            dir: aim,
            weapon,
        });
        self.push_event(GameEvent::Sound(SoundCue::Shot(weapon)));
        true
    }

    // --- Scoring & effects ---

    /// Score a kill at the current multiplier, then extend the streak
    pub fn register_kill(&mut self, kill: &Kill) -> u64 {
        let cfg = &self.tuning.scoring;
        let points = (self.tuning.enemy(kill.kind).score as f32 * self.multiplier).round() as u64;
        self.score += points;
        self.streak += 1;
        self.streak_timer = cfg.streak_window;
        self.multiplier = streak_multiplier(cfg, self.streak);

        self.stats.kills += 1;
        self.stats.kills_by_kind.add(kill.kind);
        self.stats.score = self.score;

        self.push_event(GameEvent::EnemyDied {
            id: kill.enemy_id,
            kind: kill.kind,
            pos: kill.pos,
        });
        self.push_event(GameEvent::Sound(SoundCue::EnemyDeath));
        self.push_event(GameEvent::FloatingText {
            pos: to_world(kill.pos, ENEMY_HEIGHT),
            text: format!("+{points}"),
        });
        points
    }

    /// Turn a collision report into score, stats and effect events.
    /// Returns true if the player died this frame.
    pub fn apply_report(&mut self, report: FrameReport) -> bool {
        for pos in report.impacts {
            self.push_event(GameEvent::Impact {
                pos: to_world(pos, PROJECTILE_HEIGHT),
            });
            self.push_event(GameEvent::Sound(SoundCue::Hit));
        }
        for id in report.damaged {
            self.push_event(GameEvent::EnemyHitFlash { id });
        }
        for explosion in &report.explosions {
            self.push_event(GameEvent::Explosion {
                pos: explosion.center,
                radius: explosion.radius,
            });
            self.push_event(GameEvent::Sound(SoundCue::Explosion));
            self.push_event(GameEvent::CameraShake { intensity: 0.6 });
            if explosion.source.is_some() {
                self.slow_motion_timer = self.tuning.time.slow_motion_duration;
                self.push_event(GameEvent::ScreenFlash { intensity: 0.4 });
            }
        }
        for kill in &report.kills {
            self.register_kill(kill);
        }
        for collected in report.collected {
            self.push_event(GameEvent::PickupCollected {
                kind: collected.kind,
                pos: collected.pos,
            });
            self.push_event(GameEvent::Sound(SoundCue::Pickup));
        }
        if report.player_damage > 0.0 {
            self.stats.damage_taken += report.player_damage;
            self.push_event(GameEvent::Sound(SoundCue::PlayerHurt));
            self.push_event(GameEvent::ScreenFlash { intensity: 0.25 });
            self.push_event(GameEvent::CameraShake { intensity: 0.3 });
        }
        if report.player_killed {
            log::info!("Player died on wave {} with {} points", self.director.wave, self.score);
            self.push_event(GameEvent::PlayerDied);
            self.push_event(GameEvent::Sound(SoundCue::GameOver));
        }
        report.player_killed
    }

    /// Rebuild the HUD read-model from the current state
    pub fn refresh_hud(&mut self) {
        let break_time_left = match self.director.phase {
            WavePhase::Break => Some(self.director.break_timer.max(0.0)),
            WavePhase::Active => None,
        };
        self.hud = HudSnapshot {
            phase: self.phase,
            score: self.score,
            multiplier: self.multiplier,
            streak: self.streak,
            wave: self.director.wave,
            level: self.level,
            break_time_left,
            health: self.player.health,
            max_health: self.player.max_health,
            weapon: self.player.weapon,
            minimap: MinimapFeed {
                half_extent: self.arena.half_extent,
                player: self.player.pos,
                enemies: self.enemies.iter().filter(|e| !e.is_dying()).map(|e| e.pos).collect(),
                pickups: self.pickups.iter().map(|p| p.pos).collect(),
                barrels: self.barrels.iter().filter(|b| b.alive).map(|b| b.pos).collect(),
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Animation, AnimationTable, ClipHandle};
    use crate::sim::barrel::Explosion;
    use crate::sim::collision::Collected;

    fn state() -> GameState {
        GameState::new(42, Arc::new(Tuning::default()))
    }

    #[test]
    fn test_build_arena_populates_layout() {
        let mut s = state();
        assert!(s.load_level(1));
        let layout = s.tuning.level(1).unwrap().clone();

        assert_eq!(s.level, 1);
        assert_eq!(s.arena.half_extent, layout.half_extent);
        assert_eq!(s.barrels.len(), layout.barrels.len());
        assert_eq!(s.pickups.len(), layout.pickups.len());
        assert_eq!(s.colliders.len(), layout.covers.len() + layout.barrels.len());
        assert_eq!(s.player.pos, layout.player_start);

        // Each barrel collider points at its own barrel
        for barrel in &s.barrels {
            let owned = s
                .colliders
                .iter()
                .filter(|c| c.owner == ColliderOwner::Barrel(barrel.id))
                .count();
            assert_eq!(owned, 1);
        }
    }

    #[test]
    fn test_clear_arena_empties_collections() {
        let mut s = state();
        s.load_level(1);
        s.spawn_enemy(EnemyKind::Basic, Vec2::ZERO);
        s.clear_arena();
        assert!(s.enemies.is_empty());
        assert!(s.barrels.is_empty());
        assert!(s.pickups.is_empty());
        assert!(s.colliders.is_empty());
    }

    #[test]
    fn test_missing_level_is_rejected() {
        let mut s = state();
        assert!(!s.load_level(99));
        assert_eq!(s.level, 0);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut s = state();
        s.load_level(1);
        let a = s.spawn_enemy(EnemyKind::Basic, Vec2::ZERO);
        let b = s.spawn_enemy(EnemyKind::Hazmat, Vec2::ONE);
        assert!(b > a);
        assert!(s.barrels.iter().all(|barrel| barrel.id < a));
    }

    #[test]
    fn test_streak_multiplier_caps() {
        let cfg = ScoreTuning::default();
        assert_eq!(streak_multiplier(&cfg, 0), 1.0);
        assert_eq!(streak_multiplier(&cfg, 4), 1.0 + 4.0 * cfg.multiplier_step);
        assert_eq!(streak_multiplier(&cfg, 1000), streak_multiplier(&cfg, cfg.multiplier_cap_streak));
    }

    #[test]
    fn test_kill_scores_with_multiplier_and_streak_lapses() {
        let mut s = state();
        let kill = Kill {
            enemy_id: 5,
            kind: EnemyKind::Basic,
            pos: Vec2::ZERO,
        };
        let base = s.tuning.enemies.basic.score as u64;
        assert_eq!(s.register_kill(&kill), base);
        let expected = (base as f32 * streak_multiplier(&s.tuning.scoring, 1)).round() as u64;
        assert_eq!(s.register_kill(&kill), expected);
        assert_eq!(s.streak, 2);
        assert_eq!(s.stats.kills, 2);
        assert_eq!(s.stats.kills_by_kind.basic, 2);

        // Slow motion does not stretch the streak window: it runs on raw time
        s.time_scale = 0.1;
        s.advance_clocks(s.tuning.scoring.streak_window + 0.01);
        assert_eq!(s.streak, 0);
        assert_eq!(s.multiplier, 1.0);
    }

    #[test]
    fn test_frame_time_applies_slow_motion() {
        let mut s = state();
        assert_eq!(s.frame_time(0.02).scaled, 0.02);
        s.slow_motion_timer = 0.5;
        let frame = s.frame_time(0.02);
        assert_eq!(frame.raw, 0.02);
        assert!((frame.scaled - 0.02 * s.tuning.time.slow_motion_scale).abs() < 1e-7);
    }

    #[test]
    fn test_barrel_explosion_report_triggers_slow_motion() {
        let mut s = state();
        let report = FrameReport {
            explosions: vec![Explosion {
                center: Vec2::ZERO,
                radius: 5.0,
                damage: 50.0,
                source: Some(3),
            }],
            ..Default::default()
        };
        assert!(!s.apply_report(report));
        assert_eq!(s.slow_motion_timer, s.tuning.time.slow_motion_duration);
        assert!(s.events().iter().any(|e| matches!(e, GameEvent::Explosion { .. })));
    }

    #[test]
    fn test_report_tracks_damage_and_pickups() {
        let mut s = state();
        let report = FrameReport {
            collected: vec![Collected {
                kind: PickupKind::Health,
                pos: Vec2::ONE,
            }],
            player_damage: 12.0,
            ..Default::default()
        };
        s.apply_report(report);
        assert_eq!(s.stats.damage_taken, 12.0);
        let events = s.drain_events();
        assert!(events.contains(&GameEvent::PickupCollected {
            kind: PickupKind::Health,
            pos: Vec2::ONE,
        }));
        assert!(s.events().is_empty());
    }

    #[test]
    fn test_wave_pickups_alternate() {
        let mut s = state();
        s.load_level(1);
        let before = s.pickups.len();
        s.drop_wave_pickup();
        s.drop_wave_pickup();
        assert_eq!(s.pickups.len(), before + 2);
        let dropped: Vec<PickupKind> = s.pickups[before..].iter().map(|p| p.kind).collect();
        assert_eq!(
            dropped,
            vec![PickupKind::Health, PickupKind::Weapon(s.player.weapon.next())]
        );
    }

    #[test]
    fn test_fire_weapon_respects_cooldown() {
        let mut s = state();
        s.load_level(1);
        assert!(s.fire_weapon());
        assert!(!s.fire_weapon());
        assert_eq!(s.projectiles.len(), 1);
        assert_eq!(s.stats.shots_fired, 1);
    }

    struct Catalog;

    impl AssetProvider for Catalog {
        fn clone_character(&mut self, key: CharacterKey) -> Option<CharacterVisual> {
            match key {
                CharacterKey::Player => Some(CharacterVisual {
                    handle: VisualHandle(1),
                    animations: AnimationTable::from_clips([(Animation::Run, ClipHandle(2))]),
                }),
                CharacterKey::Enemy(_) => None,
            }
        }

        fn clone_static(&mut self, key: StaticKey) -> Option<VisualHandle> {
            matches!(key, StaticKey::Barrel).then_some(VisualHandle(9))
        }
    }

    #[test]
    fn test_missing_visuals_do_not_block_spawns() {
        let mut s = GameState::with_assets(1, Arc::new(Tuning::default()), Box::new(Catalog));
        s.load_level(1);
        assert_eq!(s.player.visual.as_ref().map(|v| v.handle), Some(VisualHandle(1)));
        assert!(s.barrels.iter().all(|b| b.visual == Some(VisualHandle(9))));
        assert!(s.pickups.iter().all(|p| p.visual.is_none()));

        s.spawn_enemy(EnemyKind::Hazmat, Vec2::ZERO);
        assert_eq!(s.enemies.len(), 1);
        assert!(s.enemies[0].visual.is_none());
    }

    #[test]
    fn test_reset_reseeds() {
        let mut s = state();
        s.load_level(1);
        s.score = 999;
        s.reset();
        assert_eq!(s.score, 0);
        assert_eq!(s.level, 0);
        assert_eq!(s.next_entity_id(), 1);
    }
}
