//! Minimal named-state machine
//!
//! States register optional `enter`/`update`/`exit` hooks. A transition always
//! runs the old state's `exit` before the new state's `enter`, whether or not
//! either state has an `update`. An `update` can request the next state by
//! returning it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::state::FrameTime;
use crate::error::SimError;

/// Hooks for one state. Every hook is optional.
pub struct StateHooks<S, C> {
    pub enter: Option<fn(&mut C)>,
    pub update: Option<fn(&mut C, FrameTime) -> Option<S>>,
    pub exit: Option<fn(&mut C)>,
}

impl<S, C> Default for StateHooks<S, C> {
    fn default() -> Self {
        Self {
            enter: None,
            update: None,
            exit: None,
        }
    }
}

impl<S, C> StateHooks<S, C> {
    pub fn with_enter(mut self, hook: fn(&mut C)) -> Self {
        self.enter = Some(hook);
        self
    }

    pub fn with_update(mut self, hook: fn(&mut C, FrameTime) -> Option<S>) -> Self {
        self.update = Some(hook);
        self
    }

    pub fn with_exit(mut self, hook: fn(&mut C)) -> Self {
        self.exit = Some(hook);
        self
    }
}

/// State machine over states `S` driving a context `C`
pub struct StateMachine<S, C> {
    hooks: HashMap<S, StateHooks<S, C>>,
    current: Option<S>,
}

impl<S, C> Default for StateMachine<S, C> {
    fn default() -> Self {
        Self {
            hooks: HashMap::new(),
            current: None,
        }
    }
}

impl<S: Copy + Eq + Hash + Debug, C> StateMachine<S, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the hooks for a state
    pub fn register(&mut self, state: S, hooks: StateHooks<S, C>) {
        self.hooks.insert(state, hooks);
    }

    pub fn is_registered(&self, state: S) -> bool {
        self.hooks.contains_key(&state)
    }

    /// Active state, `None` until the first transition
    pub fn current(&self) -> Option<S> {
        self.current
    }

    /// Exit the current state and enter `to`
    pub fn transition(&mut self, ctx: &mut C, to: S) -> Result<(), SimError> {
        let enter = match self.hooks.get(&to) {
            Some(hooks) => hooks.enter,
            None => return Err(SimError::UnregisteredState(format!("{to:?}"))),
        };

        if let Some(exit) = self.current.and_then(|from| self.hooks.get(&from)).and_then(|h| h.exit) {
            exit(ctx);
        }
        self.current = Some(to);
        if let Some(enter) = enter {
            enter(ctx);
        }
        Ok(())
    }

    /// Run the current state's update and follow any transition it requests.
    /// Returns the state transitioned to, if any.
    pub fn tick(&mut self, ctx: &mut C, frame: FrameTime) -> Result<Option<S>, SimError> {
        let current = self.current.ok_or(SimError::NotStarted)?;
        let update = self.hooks.get(&current).and_then(|h| h.update);
        let Some(next) = update.and_then(|update| update(ctx, frame)) else {
            return Ok(None);
        };
        self.transition(ctx, next)?;
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Light {
        Red,
        Green,
        Off,
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<&'static str>,
        elapsed: f32,
    }

    fn machine() -> StateMachine<Light, Log> {
        let mut fsm = StateMachine::new();
        fsm.register(
            Light::Red,
            StateHooks::default()
                .with_enter(|log: &mut Log| log.calls.push("enter red"))
                .with_exit(|log: &mut Log| log.calls.push("exit red"))
                .with_update(|log: &mut Log, frame| {
                    log.elapsed += frame.scaled;
                    (log.elapsed >= 1.0).then_some(Light::Green)
                }),
        );
        // No update hook at all
        fsm.register(
            Light::Green,
            StateHooks::default()
                .with_enter(|log: &mut Log| log.calls.push("enter green"))
                .with_exit(|log: &mut Log| log.calls.push("exit green")),
        );
        fsm
    }

    fn frame(dt: f32) -> FrameTime {
        FrameTime { raw: dt, scaled: dt }
    }

    #[test]
    fn test_exit_runs_before_enter() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.transition(&mut log, Light::Red).unwrap();
        fsm.transition(&mut log, Light::Green).unwrap();
        fsm.transition(&mut log, Light::Red).unwrap();
        assert_eq!(
            log.calls,
            vec!["enter red", "exit red", "enter green", "exit green", "enter red"]
        );
        assert_eq!(fsm.current(), Some(Light::Red));
    }

    #[test]
    fn test_tick_runs_only_current_update() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.transition(&mut log, Light::Red).unwrap();

        assert_eq!(fsm.tick(&mut log, frame(0.6)).unwrap(), None);
        assert_eq!(fsm.tick(&mut log, frame(0.6)).unwrap(), Some(Light::Green));
        assert_eq!(fsm.current(), Some(Light::Green));

        // Green has no update; ticking is a no-op
        let before = log.elapsed;
        assert_eq!(fsm.tick(&mut log, frame(5.0)).unwrap(), None);
        assert_eq!(log.elapsed, before);
        assert_eq!(log.calls.last(), Some(&"enter green"));
    }

    #[test]
    fn test_unregistered_state_is_an_error() {
        let mut fsm = machine();
        let mut log = Log::default();
        fsm.transition(&mut log, Light::Red).unwrap();
        let err = fsm.transition(&mut log, Light::Off).unwrap_err();
        assert_eq!(err, SimError::UnregisteredState("Off".into()));
        // Nothing ran and the current state is untouched
        assert_eq!(log.calls, vec!["enter red"]);
        assert_eq!(fsm.current(), Some(Light::Red));
    }

    #[test]
    fn test_tick_before_start_is_an_error() {
        let mut fsm = machine();
        let mut log = Log::default();
        assert_eq!(fsm.tick(&mut log, frame(0.1)), Err(SimError::NotStarted));
    }
}
