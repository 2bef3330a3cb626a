//! Damage intake, melee contact and enemy projectile handling.

use animation::AnimationState;
use bevy::prelude::*;
use tracing::{debug, span, Level};
use utils::frame::FrameCount;

use crate::character::enemy::archetype::{ArchetypeStats, FirePattern, RangedAttack};
use crate::character::enemy::create::EnemyProjectiles;
use crate::character::enemy::{Enemy, Position};
use crate::character::health::{Health, PlayerDamage};
use crate::character::player::PlayerView;
use crate::collider::{is_colliding, Collider};
use crate::config::GameConfig;
use crate::events::{Diagnostic, SimEvents};
use crate::weapons::projectile::{Projectile, ProjectileOwner};

use super::state::{EnemyAction, EnemyTimers, Lifecycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Dead, invulnerable, or a non-positive amount.
    Ignored,
    Hurt,
    Killed,
}

/// Apply `amount` to an enemy.
///
/// Health reaching zero or below moves the enemy to `Dead` within this call. A
/// surviving enemy enters `TakingHit` with its hit clip restarted.
pub fn take_damage(
    amount: f32,
    health: &mut Health,
    lifecycle: &mut Lifecycle,
    timers: &EnemyTimers,
    animation: &mut AnimationState,
) -> DamageOutcome {
    if lifecycle.is_dead() || timers.is_invulnerable() || !(amount > 0.0) {
        return DamageOutcome::Ignored;
    }

    health.current -= amount;

    if health.current <= 0.0 {
        *lifecycle = Lifecycle::Dead {
            animation_completed: false,
        };
        animation.set_action(EnemyAction::Death.animation_key());
        animation.restart();
        DamageOutcome::Killed
    } else {
        *lifecycle = Lifecycle::TakingHit;
        animation.set_action(EnemyAction::TakeHit.animation_key());
        animation.restart();
        DamageOutcome::Hurt
    }
}

/// Contact damage for one tick: a per-second rate spread over the fixed tick.
pub fn contact_damage_per_tick(damage_per_second: f32, tick_rate: u32) -> f32 {
    if tick_rate == 0 {
        return 0.0;
    }
    damage_per_second / tick_rate as f32
}

/// Projectiles for one ranged attack, aimed from `origin` at the player.
/// Returns the projectiles and whether the aim was degenerate.
pub fn fire_ranged(
    ranged: &RangedAttack,
    origin: Vec2,
    player_position: Vec2,
    player_velocity: Vec2,
) -> (Vec<Projectile>, bool) {
    let spec = &ranged.projectile;
    match ranged.pattern {
        FirePattern::Direct => {
            let (projectile, degenerate) = Projectile::aimed(origin, player_position, spec, ProjectileOwner::Enemy);
            (vec![projectile], degenerate)
        }
        FirePattern::Predictive => {
            let flight_ticks = if spec.speed > 0.0 {
                origin.distance(player_position) / spec.speed
            } else {
                0.0
            };
            let predicted = player_position + player_velocity * flight_ticks;
            let (projectile, degenerate) = Projectile::aimed(origin, predicted, spec, ProjectileOwner::Enemy);
            (vec![projectile], degenerate)
        }
        FirePattern::Spread { count, spacing } => {
            let Some(direction) = (player_position - origin).try_normalize() else {
                // Nothing to fan around: a single shot straight at the target point.
                let (projectile, _) = Projectile::aimed(origin, player_position, spec, ProjectileOwner::Enemy);
                return (vec![projectile], true);
            };
            let count = count.max(1);
            let middle = (count - 1) as f32 / 2.0;
            let projectiles = (0..count)
                .map(|i| {
                    let angle = (i as f32 - middle) * spacing;
                    let rotated = Vec2::from_angle(angle).rotate(direction);
                    Projectile::with_direction(origin, rotated, spec, ProjectileOwner::Enemy)
                })
                .collect();
            (projectiles, false)
        }
    }
}

/// Melee contact: every living, non-reacting enemy overlapping the player's box
/// requests `damage / tick_rate` for this tick.
pub fn enemy_contact_damage_system(
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    player: Res<PlayerView>,
    mut damage: ResMut<PlayerDamage>,
    query: Query<(&Enemy, &Position, &Collider, &ArchetypeStats, &Lifecycle)>,
) {
    let player_collider = player.collider();
    let mut enemies: Vec<_> = query.iter().collect();
    enemies.sort_by_key(|(enemy, ..)| enemy.id);

    for (enemy, position, collider, stats, lifecycle) in enemies {
        if !matches!(lifecycle, Lifecycle::Alive(_)) || stats.damage <= 0.0 {
            continue;
        }
        if is_colliding(position.0, collider, player.position, &player_collider) {
            let amount = contact_damage_per_tick(stats.damage, config.tick_rate);
            damage.request(amount);
            debug!(
                "sim{{f={} contact enemy={} amount={:.3}}}",
                frame.frame, enemy.id, amount
            );
        }
    }
}

/// Advance every enemy-owned projectile; remove it on a player hit or once it
/// outlives its range or tick limit.
pub fn enemy_projectile_system(
    frame: Res<FrameCount>,
    player: Res<PlayerView>,
    mut damage: ResMut<PlayerDamage>,
    mut query: Query<(&Enemy, &mut EnemyProjectiles)>,
) {
    let system_span = span!(Level::INFO, "sim", f = frame.frame, s = "enemy_projectiles");
    let _enter = system_span.enter();

    let player_collider = player.collider();
    let mut owners: Vec<_> = query.iter_mut().collect();
    owners.sort_by_key(|(enemy, _)| enemy.id);

    for (enemy, mut projectiles) in owners {
        if projectiles.0.is_empty() {
            continue;
        }
        projectiles.0.retain_mut(|projectile| {
            projectile.advance(Some(player.position));
            if projectile.hits(player.position, &player_collider) {
                damage.request(projectile.damage);
                debug!(
                    "sim{{f={} projectile_hit enemy={} damage={}}}",
                    frame.frame, enemy.id, projectile.damage
                );
                return false;
            }
            !projectile.expired()
        });
    }
}

/// Emit a diagnostic for an aim that could not be normalized.
pub fn report_degenerate(events: &mut SimEvents, frame: u32, enemy: Option<u32>, context: &'static str) {
    events.diagnose(frame, Diagnostic::DegenerateGeometry { enemy, context });
}
