//! Combat simulation
//!
//! All gameplay logic lives here. The simulation is single-threaded and
//! deterministic for a given seed and input sequence:
//! - One seeded RNG, passed explicitly to every random draw
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod arena;
pub mod autopilot;
pub mod barrel;
pub mod collision;
pub mod enemy;
pub mod fsm;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;
pub mod wave;

pub use arena::{Arena, ArenaLayout, Collider, ColliderOwner};
pub use barrel::{Barrel, Explosion};
pub use collision::{CollisionResult, FrameReport, area_damage, circle_overlap, resolve_frame};
pub use enemy::{Enemy, EnemyKind, Role};
pub use fsm::{StateHooks, StateMachine};
pub use pickup::{Pickup, PickupKind};
pub use player::{Player, PlayerInput};
pub use projectile::{Projectile, WeaponKind};
pub use state::{FrameTime, GameEvent, GamePhase, GameState, HudSnapshot, SessionStats, SoundCue};
pub use tick::{Game, TickInput, step};
pub use wave::{Formation, WaveDirector, WaveEvent, WavePhase};
