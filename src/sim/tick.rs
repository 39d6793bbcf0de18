//! Frame tick and game orchestration
//!
//! `step` advances the arena by one frame in a fixed order:
//! player, enemies, projectiles, collision resolution, wave director.
//! `Game` wraps it in the top-level state machine and owns frame timing.

use std::sync::Arc;

use glam::Vec2;

use super::autopilot;
use super::collision::{CombatScene, resolve_frame};
use super::enemy::update_enemies;
use super::fsm::{StateHooks, StateMachine};
use super::player::PlayerInput;
use super::state::{FrameTime, GameEvent, GamePhase, GameState, HudSnapshot, SessionStats, SoundCue};
use super::wave::{Formation, WaveDirector, WaveEvent};
use crate::error::SimError;
use crate::host::{AssetProvider, EffectSink, InputProvider};
use crate::tuning::Tuning;

/// Input commands for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Movement intent on the ground plane
    pub move_dir: Vec2,
    /// Ground point to aim at
    pub aim_point: Option<Vec2>,
    /// Trigger held
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Skip/continue through cinematics
    pub advance: bool,
    /// Start over after game over or on the stats screen
    pub restart: bool,
    /// Demo mode - the autopilot plays the game
    pub autopilot: bool,
}

impl TickInput {
    /// Poll movement and aim from a host input provider
    pub fn from_provider<P: InputProvider + ?Sized>(provider: &P) -> Self {
        Self {
            move_dir: provider.move_direction().dir(),
            aim_point: provider.aim_world_point(),
            ..Default::default()
        }
    }
}

/// Advance the arena by one frame.
/// Returns the phase this frame asks the game to move to, if any.
pub fn step(state: &mut GameState, frame: FrameTime) -> Option<GamePhase> {
    let tuning = Arc::clone(&state.tuning);
    let dt = frame.scaled;
    state.advance_clocks(frame.raw);

    // Player
    let player_input = PlayerInput {
        move_dir: state.input.move_dir,
        aim_point: state.input.aim_point,
    };
    state.player.update(&player_input, &state.arena, &tuning.player, dt);
    if state.input.fire {
        state.fire_weapon();
    }

    // Enemies
    update_enemies(&mut state.enemies, state.player.pos, &state.arena, &tuning, dt);
    state.enemies.retain(|e| !e.is_removable());

    // Projectiles
    for projectile in &mut state.projectiles {
        projectile.update(dt, &state.arena, tuning.combat.projectile_bounds_margin);
    }
    state.projectiles.retain(|p| p.alive);

    // Collisions
    let report = {
        let mut scene = CombatScene {
            arena: state.arena,
            player: &mut state.player,
            enemies: &mut state.enemies,
            projectiles: &mut state.projectiles,
            barrels: &mut state.barrels,
            pickups: &mut state.pickups,
            colliders: &state.colliders,
        };
        resolve_frame(&mut scene, &tuning, dt)
    };
    let player_died = state.apply_report(report);
    state.projectiles.retain(|p| p.alive);

    // Waves
    let alive = state.alive_enemy_count();
    let event = state.director.update(&tuning.waves, &state.arena, dt, alive, &mut state.rng);
    let mut next = None;
    match event {
        WaveEvent::Spawn { kind, pos } => {
            state.spawn_enemy(kind, pos);
        }
        WaveEvent::WaveStart { wave } => {
            state.level_waves_started += 1;
            if state.level_waves_started > 1 {
                state.drop_wave_pickup();
            }
            let boss = WaveDirector::is_boss_wave(&tuning.waves, wave);
            let formation = Formation::for_wave(wave);
            log::info!(
                "Wave {} started: {} enemies, {:?}{}",
                wave,
                state.director.remaining_to_spawn,
                formation,
                if boss { " (boss)" } else { "" }
            );
            state.push_event(GameEvent::WaveStarted { wave, formation, boss });
            state.push_event(GameEvent::Sound(SoundCue::WaveStart));
        }
        WaveEvent::WaveClear { wave } => {
            state.stats.waves_cleared += 1;
            state.level_waves_cleared += 1;
            state.push_event(GameEvent::WaveCleared { wave });
            state.push_event(GameEvent::Sound(SoundCue::WaveClear));
            if state.level_complete() {
                next = Some(if state.has_next_level() {
                    GamePhase::LevelTransition
                } else {
                    GamePhase::VictoryCinematic
                });
            }
        }
        WaveEvent::Break { .. } | WaveEvent::None => {}
    }

    state.normalize_order();
    state.refresh_hud();

    if player_died { Some(GamePhase::GameOver) } else { next }
}

// --- Phase hooks ---

fn enter_intro(state: &mut GameState) {
    if state.level == 0 {
        state.load_level(1);
    }
}

fn update_playing(state: &mut GameState, frame: FrameTime) -> Option<GamePhase> {
    step(state, frame)
}

fn update_game_over(state: &mut GameState, frame: FrameTime) -> Option<GamePhase> {
    // The arena keeps running behind the overlay; nothing leaves this phase but a restart
    step(state, frame);
    None
}

fn finish_level(state: &mut GameState) {
    state.record_level();
    state.stats.levels_cleared += 1;
    log::info!("Level {} cleared", state.level);
    state.push_event(GameEvent::LevelCleared { level: state.level });
}

fn enter_transition(state: &mut GameState) {
    finish_level(state);
    state.transition_timer = state.tuning.time.level_transition_duration;
}

fn update_transition(state: &mut GameState, frame: FrameTime) -> Option<GamePhase> {
    state.transition_timer -= frame.scaled;
    (state.transition_timer <= 0.0).then_some(GamePhase::Playing)
}

fn exit_transition(state: &mut GameState) {
    let next = state.level + 1;
    state.load_level(next);
}

fn enter_victory(state: &mut GameState) {
    finish_level(state);
    state.push_event(GameEvent::Sound(SoundCue::Victory));
    state.push_event(GameEvent::ScreenFlash { intensity: 0.8 });
}

fn enter_stats(state: &mut GameState) {
    state.stats.score = state.score;
    log::info!(
        "Session over: {} points, {} kills, {:.1}s",
        state.stats.score,
        state.stats.kills,
        state.stats.elapsed_secs
    );
}

fn enter_game_over(state: &mut GameState) {
    state.stats.score = state.score;
    state.slow_motion_timer = 0.0;
}

fn phase_machine() -> StateMachine<GamePhase, GameState> {
    let mut machine = StateMachine::new();
    machine.register(GamePhase::Loading, StateHooks::default());
    machine.register(GamePhase::IntroCinematic, StateHooks::default().with_enter(enter_intro));
    machine.register(GamePhase::Playing, StateHooks::default().with_update(update_playing));
    machine.register(GamePhase::Paused, StateHooks::default());
    machine.register(
        GamePhase::LevelTransition,
        StateHooks::default()
            .with_enter(enter_transition)
            .with_update(update_transition)
            .with_exit(exit_transition),
    );
    machine.register(GamePhase::VictoryCinematic, StateHooks::default().with_enter(enter_victory));
    machine.register(GamePhase::Stats, StateHooks::default().with_enter(enter_stats));
    machine.register(
        GamePhase::GameOver,
        StateHooks::default()
            .with_enter(enter_game_over)
            .with_update(update_game_over),
    );
    machine
}

/// The orchestrator a host drives once per rendered frame
pub struct Game {
    state: GameState,
    machine: StateMachine<GamePhase, GameState>,
    visible: bool,
}

impl Game {
    pub fn new(seed: u64, tuning: Arc<Tuning>) -> Result<Self, SimError> {
        Self::from_state(GameState::new(seed, tuning))
    }

    pub fn with_assets(seed: u64, tuning: Arc<Tuning>, assets: Box<dyn AssetProvider>) -> Result<Self, SimError> {
        Self::from_state(GameState::with_assets(seed, tuning, assets))
    }

    fn from_state(mut state: GameState) -> Result<Self, SimError> {
        let mut machine = phase_machine();
        machine.transition(&mut state, GamePhase::Loading)?;
        Ok(Self {
            state,
            machine,
            visible: true,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn hud(&self) -> &HudSnapshot {
        &self.state.hud
    }

    pub fn stats(&self) -> &SessionStats {
        &self.state.stats
    }

    pub fn set_assets(&mut self, assets: Box<dyn AssetProvider>) {
        self.state.set_assets(assets);
    }

    /// Host tab/window visibility; hidden frames get a larger delta cap
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Host slow motion. Only scaled time is affected.
    pub fn set_time_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale < 0.0 {
            log::warn!("Ignoring time scale {}", scale);
            return;
        }
        self.state.time_scale = scale;
    }

    /// Host finished loading assets
    pub fn finish_loading(&mut self) -> Result<(), SimError> {
        if self.phase() != GamePhase::Loading {
            log::warn!("finish_loading called in {:?}", self.phase());
            return Ok(());
        }
        self.go(GamePhase::IntroCinematic)
    }

    /// Fresh session straight into play, skipping the intro
    pub fn start_game(&mut self) -> Result<(), SimError> {
        self.state.reset();
        self.state.load_level(1);
        self.go(GamePhase::Playing)
    }

    /// Reset the session from its seed
    pub fn restart_game(&mut self) -> Result<(), SimError> {
        log::info!("Restarting from seed {}", self.state.seed);
        self.start_game()
    }

    /// Advance by one rendered frame
    pub fn tick(&mut self, raw_dt: f32, input: &TickInput) -> Result<(), SimError> {
        let time = &self.state.tuning.time;
        let cap = if self.visible {
            time.max_frame_dt
        } else {
            time.max_hidden_frame_dt
        };
        let raw = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, cap)
        } else {
            0.0
        };

        let input = if input.autopilot {
            autopilot::drive(&self.state, input)
        } else {
            input.clone()
        };

        match self.phase() {
            GamePhase::Playing if input.pause => self.go(GamePhase::Paused)?,
            GamePhase::Paused if input.pause => self.go(GamePhase::Playing)?,
            GamePhase::IntroCinematic if input.advance => self.go(GamePhase::Playing)?,
            GamePhase::VictoryCinematic if input.advance => self.go(GamePhase::Stats)?,
            GamePhase::GameOver | GamePhase::Stats if input.restart => self.restart_game()?,
            _ => {}
        }
        if self.phase() == GamePhase::Paused {
            return Ok(());
        }

        self.state.input = input;
        let frame = self.state.frame_time(raw);
        let from = self.state.phase;
        if let Some(to) = self.machine.tick(&mut self.state, frame)? {
            self.phase_changed(from, to);
        }
        Ok(())
    }

    /// Take every pending effect event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Hand every pending event to a sink, oldest first
    pub fn flush_to<S: EffectSink + ?Sized>(&mut self, sink: &mut S) {
        for event in self.state.drain_events() {
            sink.emit(&event);
        }
    }

    fn go(&mut self, to: GamePhase) -> Result<(), SimError> {
        let from = self.state.phase;
        self.machine.transition(&mut self.state, to)?;
        self.phase_changed(from, to);
        Ok(())
    }

    fn phase_changed(&mut self, from: GamePhase, to: GamePhase) {
        log::info!("Phase {:?} -> {:?}", from, to);
        self.state.phase = to;
        self.state.hud.phase = to;
        self.state.push_event(GameEvent::PhaseChanged { from, to });
    }
}
