//! Collision detection and resolution
//!
//! Everything in the arena is a circle on the ground plane. Once per frame
//! `resolve_frame` runs the interaction passes in a fixed order:
//!
//! 1. projectiles vs enemies
//! 2. projectiles vs barrels
//! 3. enemy contact damage on the player
//! 4. pickup collection
//! 5. push-out from static cover and live barrels
//!
//! Explosions are resolved through a queue so barrel chains never recurse.

use std::collections::VecDeque;

use glam::Vec2;

use super::arena::{Arena, Collider, ColliderOwner};
use super::barrel::{Barrel, Explosion};
use super::enemy::{Enemy, EnemyKind};
use super::pickup::{Pickup, PickupKind};
use super::player::Player;
use super::projectile::Projectile;
use crate::consts::EPSILON;
use crate::tuning::Tuning;

/// Result of an overlap check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether the bodies overlap
    pub hit: bool,
    /// Contact point on the other body's surface
    pub point: Vec2,
    /// Unit normal from the other body toward this one
    pub normal: Vec2,
    /// Overlap depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check overlap between a body at `pos` and another at `other_pos`
pub fn circle_overlap(pos: Vec2, radius: f32, other_pos: Vec2, other_radius: f32) -> CollisionResult {
    let delta = pos - other_pos;
    let distance = delta.length();
    let reach = radius + other_radius;
    if distance >= reach {
        return CollisionResult::miss();
    }
    // Coincident centers have no direction; pick +x
    let normal = if distance > EPSILON {
        delta / distance
    } else {
        Vec2::X
    };
    CollisionResult {
        hit: true,
        point: other_pos + normal * other_radius,
        normal,
        penetration: reach - distance,
    }
}

/// Linear falloff: full damage at the center, nothing at `radius`
#[inline]
pub fn blast_falloff(distance: f32, radius: f32, damage: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        damage * (1.0 - distance / radius)
    }
}

/// An enemy killed this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kill {
    pub enemy_id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
}

/// A collected pickup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collected {
    pub kind: PickupKind,
    pub pos: Vec2,
}

/// Everything that happened during one resolution pass
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Enemies that took damage, in hit order
    pub damaged: Vec<u32>,
    pub kills: Vec<Kill>,
    /// Points where projectiles struck enemies or barrels
    pub impacts: Vec<Vec2>,
    /// Resolved blasts, in detonation order
    pub explosions: Vec<Explosion>,
    pub collected: Vec<Collected>,
    /// Contact hits on the player as (enemy id, damage)
    pub contact_hits: Vec<(u32, f32)>,
    pub player_damage: f32,
    pub player_killed: bool,
}

/// Mutable view of the entity collections for one frame
pub struct CombatScene<'a> {
    pub arena: Arena,
    pub player: &'a mut Player,
    pub enemies: &'a mut [Enemy],
    pub projectiles: &'a mut [Projectile],
    pub barrels: &'a mut [Barrel],
    pub pickups: &'a mut Vec<Pickup>,
    pub colliders: &'a [Collider],
}

/// Run every collision pass for one frame
pub fn resolve_frame(scene: &mut CombatScene<'_>, tuning: &Tuning, dt: f32) -> FrameReport {
    let mut report = FrameReport::default();

    projectiles_vs_enemies(scene, tuning, &mut report);
    projectiles_vs_barrels(scene, tuning, &mut report);
    contact_damage(scene, tuning, dt, &mut report);
    collect_pickups(scene, tuning, &mut report);
    push_out_of_cover(scene);

    scene.player.pos = scene.arena.clamp(scene.player.pos, scene.player.radius);
    for enemy in scene.enemies.iter_mut() {
        enemy.pos = scene.arena.clamp(enemy.pos, enemy.radius);
    }

    report
}

fn projectiles_vs_enemies(scene: &mut CombatScene<'_>, tuning: &Tuning, report: &mut FrameReport) {
    for p_idx in 0..scene.projectiles.len() {
        let projectile = &scene.projectiles[p_idx];
        if !projectile.alive {
            continue;
        }
        let target = scene.enemies.iter().position(|enemy| {
            !enemy.is_dying()
                && !projectile.has_hit(enemy.id)
                && circle_overlap(projectile.pos, projectile.radius, enemy.pos, enemy.radius).hit
        });
        let Some(e_idx) = target else {
            continue;
        };

        let projectile = &mut scene.projectiles[p_idx];
        let enemy = &mut scene.enemies[e_idx];
        projectile.record_hit(enemy.id);
        report.impacts.push(projectile.pos);
        report.damaged.push(enemy.id);
        if enemy.take_damage(projectile.damage, tuning) {
            report.kills.push(Kill {
                enemy_id: enemy.id,
                kind: enemy.kind,
                pos: enemy.pos,
            });
        }

        if projectile.explosive {
            projectile.alive = false;
            let blast = Explosion {
                center: projectile.pos,
                radius: projectile.blast_radius,
                damage: projectile.damage,
                source: None,
            };
            detonate(blast, scene.player, scene.enemies, scene.barrels, tuning, report);
        } else if !projectile.piercing {
            projectile.alive = false;
        }
    }
}

fn projectiles_vs_barrels(scene: &mut CombatScene<'_>, tuning: &Tuning, report: &mut FrameReport) {
    for p_idx in 0..scene.projectiles.len() {
        let projectile = &scene.projectiles[p_idx];
        if !projectile.alive {
            continue;
        }
        let target = scene.barrels.iter().position(|barrel| {
            barrel.alive && circle_overlap(projectile.pos, projectile.radius, barrel.pos, barrel.radius).hit
        });
        let Some(b_idx) = target else {
            continue;
        };

        scene.projectiles[p_idx].alive = false;
        report.impacts.push(scene.projectiles[p_idx].pos);
        if let Some(blast) = scene.barrels[b_idx].explode(tuning) {
            detonate(blast, scene.player, scene.enemies, scene.barrels, tuning, report);
        }
    }
}

fn contact_damage(scene: &mut CombatScene<'_>, tuning: &Tuning, dt: f32, report: &mut FrameReport) {
    let cfg = &tuning.combat;
    let player = &mut *scene.player;
    for enemy in scene.enemies.iter_mut().filter(|e| !e.is_dying()) {
        let contact = circle_overlap(player.pos, player.radius, enemy.pos, enemy.radius);
        if !contact.hit {
            continue;
        }

        if player.alive && enemy.contact_cooldown <= 0.0 && player.contact_cooldown <= 0.0 {
            let damage = enemy.contact_damage;
            report.contact_hits.push((enemy.id, damage));
            report.player_damage += damage;
            if player.take_damage(damage) {
                report.player_killed = true;
            }
            enemy.contact_cooldown = cfg.contact_cooldown;
            player.contact_cooldown = cfg.contact_cooldown;
            player.pos += contact.normal * cfg.contact_knockback;
        }

        // Keep bodies from interpenetrating even while damage is cooling down
        enemy.pos -= contact.normal * cfg.contact_push * dt;
    }
}

fn collect_pickups(scene: &mut CombatScene<'_>, tuning: &Tuning, report: &mut FrameReport) {
    let player = &mut *scene.player;
    if !player.alive {
        return;
    }
    let radius = tuning.combat.pickup_radius;
    scene.pickups.retain(|pickup| {
        if pickup.pos.distance(player.pos) > radius {
            return true;
        }
        match pickup.kind {
            PickupKind::Health => player.heal(tuning.combat.health_pickup_amount),
            PickupKind::Weapon(weapon) => player.switch_weapon(weapon),
        }
        report.collected.push(Collected {
            kind: pickup.kind,
            pos: pickup.pos,
        });
        false
    });
}

fn push_out_of_cover(scene: &mut CombatScene<'_>) {
    for collider in scene.colliders {
        if let ColliderOwner::Barrel(id) = collider.owner {
            let standing = scene.barrels.iter().any(|b| b.id == id && b.alive);
            if !standing {
                continue;
            }
        }

        let player = &mut *scene.player;
        let overlap = circle_overlap(player.pos, player.radius, collider.pos, collider.radius);
        if overlap.hit {
            player.pos += overlap.normal * overlap.penetration;
        }

        for enemy in scene.enemies.iter_mut().filter(|e| !e.is_dying()) {
            let overlap = circle_overlap(enemy.pos, enemy.radius, collider.pos, collider.radius);
            if overlap.hit {
                enemy.pos += overlap.normal * overlap.penetration;
            }
        }
    }
}

/// Damage dealt by one blast
#[derive(Debug, Clone, Default)]
pub struct AreaDamage {
    /// (enemy id, damage) for every enemy inside the radius
    pub enemy_hits: Vec<(u32, f32)>,
    pub kills: Vec<Kill>,
    pub player_damage: f32,
    pub player_killed: bool,
}

/// Apply a blast's falloff damage to every live enemy and the player
pub fn area_damage(blast: &Explosion, player: &mut Player, enemies: &mut [Enemy], tuning: &Tuning) -> AreaDamage {
    let mut result = AreaDamage::default();

    for enemy in enemies.iter_mut().filter(|e| !e.is_dying()) {
        let damage = blast_falloff(enemy.pos.distance(blast.center), blast.radius, blast.damage);
        if damage <= 0.0 {
            continue;
        }
        result.enemy_hits.push((enemy.id, damage));
        if enemy.take_damage(damage, tuning) {
            result.kills.push(Kill {
                enemy_id: enemy.id,
                kind: enemy.kind,
                pos: enemy.pos,
            });
        }
    }

    if player.alive {
        let damage = blast_falloff(player.pos.distance(blast.center), blast.radius, blast.damage)
            * tuning.combat.player_blast_fraction;
        if damage > 0.0 {
            result.player_damage = damage;
            result.player_killed = player.take_damage(damage);
        }
    }

    result
}

/// Resolve a blast and every barrel it sets off
fn detonate(
    first: Explosion,
    player: &mut Player,
    enemies: &mut [Enemy],
    barrels: &mut [Barrel],
    tuning: &Tuning,
    report: &mut FrameReport,
) {
    let mut queue = VecDeque::from([first]);
    while let Some(blast) = queue.pop_front() {
        report.explosions.push(blast);

        let damage = area_damage(&blast, player, enemies, tuning);
        report.damaged.extend(damage.enemy_hits.iter().map(|(id, _)| *id));
        report.kills.extend(damage.kills);
        report.player_damage += damage.player_damage;
        report.player_killed |= damage.player_killed;

        for barrel in barrels.iter_mut().filter(|b| b.alive) {
            if barrel.pos.distance(blast.center) < blast.radius {
                if let Some(chained) = barrel.explode(tuning) {
                    log::debug!("barrel {} caught in blast", barrel.id);
                    queue.push_back(chained);
                }
            }
        }
    }
}
