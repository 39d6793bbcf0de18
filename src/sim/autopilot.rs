//! Demo-mode AI
//!
//! Produces the input a reasonable player would give, from the current state
//! only. Used for attract mode, the headless runner and soak tests. It is a
//! pure function of the state, so autopilot sessions replay exactly.

use super::state::{GamePhase, GameState};
use super::tick::TickInput;
use crate::heading_to_dir;

/// Distance at which the autopilot starts backing away from an enemy
const DANGER_DISTANCE: f32 = 6.0;
/// Distance the autopilot tries to keep from the closest threat
const KITE_DISTANCE: f32 = 9.0;
/// How far ahead of a moving enemy to aim
const LEAD: f32 = 0.6;

/// Fill in movement, aim and fire for this frame
pub fn drive(state: &GameState, input: &TickInput) -> TickInput {
    let mut out = input.clone();

    match state.phase {
        GamePhase::IntroCinematic | GamePhase::VictoryCinematic => {
            out.advance = true;
            return out;
        }
        GamePhase::Playing => {}
        _ => return out,
    }

    let player = &state.player;
    if !player.alive {
        return out;
    }

    // Closest live enemy is the most dangerous one
    let threat = state
        .enemies
        .iter()
        .filter(|e| !e.is_dying())
        .min_by(|a, b| {
            a.pos
                .distance_squared(player.pos)
                .partial_cmp(&b.pos.distance_squared(player.pos))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let safe = threat.is_none_or(|e| e.pos.distance(player.pos) > DANGER_DISTANCE);

    // If safe, go grab the nearest pickup
    let target_pickup = if safe {
        state
            .pickups
            .iter()
            .min_by(|a, b| {
                a.pos
                    .distance_squared(player.pos)
                    .partial_cmp(&b.pos.distance_squared(player.pos))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.pos)
    } else {
        None
    };

    // Oscillating strafe so the path is not a straight line
    let t = state.stats.elapsed_secs;
    let wobble = (t * 1.3).sin() * 0.6 + (t * 0.7).sin() * 0.3;

    out.move_dir = if let Some(pickup) = target_pickup {
        (pickup - player.pos).normalize_or_zero()
    } else if let Some(enemy) = threat {
        let away = (player.pos - enemy.pos).normalize_or_zero();
        let strafe = away.perp() * wobble.signum();
        if enemy.pos.distance(player.pos) < KITE_DISTANCE {
            (away + strafe * 0.5).normalize_or_zero()
        } else {
            strafe
        }
    } else {
        // Drift back toward the middle between waves
        (-player.pos * 0.1).clamp_length_max(1.0)
    };

    // Steer off the walls instead of grinding along them
    let limit = state.arena.limit(player.radius) - 2.0;
    if player.pos.x.abs() > limit {
        out.move_dir.x = -player.pos.x.signum();
    }
    if player.pos.y.abs() > limit {
        out.move_dir.y = -player.pos.y.signum();
    }

    if let Some(enemy) = threat {
        out.aim_point = Some(enemy.pos + heading_to_dir(enemy.facing) * enemy.speed * LEAD);
        out.fire = true;
    } else {
        out.aim_point = None;
        out.fire = false;
    }

    out
}
