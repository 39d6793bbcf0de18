//! Capabilities the simulation consumes from its host
//!
//! Rendering, audio and input capture live outside the core. The core only
//! sees opaque handles, a few small traits, and emits `GameEvent`s.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::enemy::EnemyKind;
use crate::sim::pickup::PickupKind;
use crate::sim::state::GameEvent;

/// Opaque reference to a renderable owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u32);

/// Opaque reference to an animation clip owned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipHandle(pub u32);

/// Animation states an animated character can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Animation {
    Idle,
    Run,
    Hit,
    Death,
}

impl Animation {
    pub const ALL: [Animation; 4] = [Animation::Idle, Animation::Run, Animation::Hit, Animation::Death];

    #[inline]
    fn index(self) -> usize {
        match self {
            Animation::Idle => 0,
            Animation::Run => 1,
            Animation::Hit => 2,
            Animation::Death => 3,
        }
    }
}

/// Clip lookup resolved once when a character is cloned
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationTable {
    clips: [Option<ClipHandle>; 4],
}

impl AnimationTable {
    /// Build from whatever clips the host could resolve
    pub fn from_clips(clips: impl IntoIterator<Item = (Animation, ClipHandle)>) -> Self {
        let mut table = Self::default();
        for (animation, clip) in clips {
            table.clips[animation.index()] = Some(clip);
        }
        table
    }

    pub fn clip(&self, animation: Animation) -> Option<ClipHandle> {
        self.clips[animation.index()]
    }

    pub fn missing(&self) -> impl Iterator<Item = Animation> + '_ {
        Animation::ALL.into_iter().filter(|a| self.clip(*a).is_none())
    }
}

/// A cloned animated character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterVisual {
    pub handle: VisualHandle,
    pub animations: AnimationTable,
}

/// Animated model keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterKey {
    Player,
    Enemy(EnemyKind),
}

/// Static model keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticKey {
    Barrel,
    Cover,
    Pickup(PickupKind),
}

/// Model cloning. `None` means "spawn without a visual".
pub trait AssetProvider {
    fn clone_character(&mut self, key: CharacterKey) -> Option<CharacterVisual>;
    fn clone_static(&mut self, key: StaticKey) -> Option<VisualHandle>;
}

/// Headless provider, every clone comes back empty
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetProvider for NoAssets {
    fn clone_character(&mut self, _key: CharacterKey) -> Option<CharacterVisual> {
        None
    }

    fn clone_static(&mut self, _key: StaticKey) -> Option<VisualHandle> {
        None
    }
}

/// Movement intent, already normalized by the input layer
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub x: f32,
    pub z: f32,
    pub moving: bool,
}

impl MoveInput {
    pub fn dir(&self) -> Vec2 {
        if self.moving {
            Vec2::new(self.x, self.z)
        } else {
            Vec2::ZERO
        }
    }
}

/// Polled input capture
pub trait InputProvider {
    fn move_direction(&self) -> MoveInput;
    /// Ground-plane point under the cursor/stick, if any
    fn aim_world_point(&self) -> Option<Vec2>;
}

/// Fire-and-forget receiver for effect requests
pub trait EffectSink {
    fn emit(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> EffectSink for F {
    fn emit(&mut self, event: &GameEvent) {
        self(event)
    }
}
