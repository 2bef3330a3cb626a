use animation::{AnimationState, FacingDirection};
use bevy::prelude::*;

use crate::collider::Collider;
use crate::waves::tracking::WaveEnemy;
use crate::weapons::projectile::Projectile;

use super::ai::pathing::{EnemyPath, GridPos};
use super::ai::state::{EnemyAction, EnemyTimers, Lifecycle};
use super::archetype::{Archetype, ArchetypeStats, TeleportTrigger};
use super::{Enemy, Position};
use crate::character::health::Health;

/// Projectiles fired by an enemy. They live and die with their owner.
#[derive(Component, Clone, Debug, Default)]
pub struct EnemyProjectiles(pub Vec<Projectile>);

#[derive(Bundle)]
pub struct EnemyBundle {
    enemy: Enemy,
    position: Position,
    health: Health,
    collider: Collider,
    stats: ArchetypeStats,
    lifecycle: Lifecycle,
    timers: EnemyTimers,
    animation: AnimationState,
    facing: FacingDirection,
    path: EnemyPath,
    projectiles: EnemyProjectiles,
    wave: WaveEnemy,
}

impl EnemyBundle {
    pub fn new(
        id: u32,
        archetype: Archetype,
        stats: ArchetypeStats,
        position: Vec2,
        patrol: Vec<GridPos>,
        spawned_wave: usize,
    ) -> Self {
        let mut timers = EnemyTimers::default();
        // Interval teleporters wait a full period before the first jump.
        if let Some(teleport) = &stats.teleport {
            if teleport.trigger == TeleportTrigger::Interval {
                timers.teleport_cooldown = teleport.cooldown_ticks;
            }
        }
        if let Some(dash) = &stats.dash {
            timers.dash_cooldown = dash.cooldown_ticks / 2;
        }

        Self {
            enemy: Enemy { id, archetype },
            position: Position(position),
            health: Health::new(stats.max_health),
            collider: Collider::from_size(stats.size),
            lifecycle: Lifecycle::default(),
            timers,
            animation: AnimationState::new(EnemyAction::Idle.animation_key()),
            facing: FacingDirection::default(),
            path: EnemyPath::with_patrol(patrol),
            projectiles: EnemyProjectiles::default(),
            wave: WaveEnemy { spawned_wave },
            stats,
        }
    }
}

pub fn spawn_enemy(commands: &mut Commands, bundle: EnemyBundle) -> Entity {
    commands.spawn(bundle).id()
}
