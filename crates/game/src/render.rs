//! Draw surface sink: what to blit this tick, rebuilt every step.
//!
//! The core never composes pixels. It hands the renderer a sheet key, a sprite
//! index and a position per drawable.

use animation::{AnimationState, FacingDirection};
use bevy::prelude::*;
use tracing::trace;
use utils::frame::FrameCount;

use crate::character::enemy::archetype::Archetype;
use crate::character::enemy::create::EnemyProjectiles;
use crate::character::enemy::{Enemy, Position};
use crate::config::GameConfig;
use crate::events::{Diagnostic, SimEvents};
use crate::weapons::PlayerBullets;

pub const ENEMY_PROJECTILE_SHEET: &str = "enemy_projectile";
pub const PLAYER_BULLET_SHEET: &str = "player_bullet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    Enemy(Archetype),
    EnemyProjectile,
    PlayerBullet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub kind: DrawKind,
    pub sheet: &'static str,
    pub sprite_index: usize,
    pub position: Vec2,
    pub flip_x: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn enemies(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c.kind, DrawKind::Enemy(_)))
    }
}

/// Rebuild the draw list. An enemy whose action has no clip in its frame table
/// is left out for this tick.
pub fn render_system(
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    bullets: Res<PlayerBullets>,
    mut draw_list: ResMut<DrawList>,
    mut events: ResMut<SimEvents>,
    query: Query<(&Enemy, &Position, &AnimationState, &FacingDirection, &EnemyProjectiles)>,
) {
    draw_list.commands.clear();

    let mut enemies: Vec<_> = query.iter().collect();
    enemies.sort_by_key(|(enemy, ..)| enemy.id);

    for (enemy, position, animation, facing, projectiles) in enemies {
        let clip = config
            .animations
            .get(&enemy.archetype)
            .and_then(|table| table.clip(&animation.action));
        match clip {
            Some(clip) => draw_list.commands.push(DrawCommand {
                kind: DrawKind::Enemy(enemy.archetype),
                sheet: enemy.archetype.sheet(),
                sprite_index: clip.sprite_index(animation.frame),
                position: position.0,
                flip_x: facing.should_flip_x(),
            }),
            None => events.diagnose(
                frame.frame,
                Diagnostic::MissingAnimation {
                    enemy: enemy.id,
                    archetype: enemy.archetype,
                    action: animation.action.clone(),
                },
            ),
        }

        draw_list
            .commands
            .extend(projectiles.0.iter().map(|projectile| DrawCommand {
                kind: DrawKind::EnemyProjectile,
                sheet: ENEMY_PROJECTILE_SHEET,
                sprite_index: 0,
                position: projectile.position,
                flip_x: projectile.velocity.x < 0.0,
            }));
    }

    draw_list.commands.extend(bullets.0.iter().map(|bullet| DrawCommand {
        kind: DrawKind::PlayerBullet,
        sheet: PLAYER_BULLET_SHEET,
        sprite_index: 0,
        position: bullet.position,
        flip_x: bullet.velocity.x < 0.0,
    }));

    trace!("sim{{f={} draw commands={}}}", frame.frame, draw_list.commands.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use crate::character::enemy::create::EnemyBundle;

    fn world_with(config: GameConfig) -> World {
        let mut world = World::new();
        world.insert_resource(FrameCount::default());
        world.insert_resource(config);
        world.insert_resource(PlayerBullets::default());
        world.insert_resource(DrawList::default());
        world.insert_resource(SimEvents::default());
        world
    }

    fn spawn(world: &mut World, archetype: Archetype) {
        let bundle = EnemyBundle::new(
            0,
            archetype,
            archetype.default_stats(),
            Vec2::new(40.0, 40.0),
            Vec::new(),
            0,
        );
        world.spawn(bundle);
    }

    #[test]
    fn enemy_sprite_comes_from_its_clip() {
        let mut world = world_with(GameConfig::default());
        spawn(&mut world, Archetype::Goblin);
        world.run_system_once(render_system).unwrap();
        let draw_list = world.resource::<DrawList>();
        let commands: Vec<_> = draw_list.enemies().collect();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].sheet, "goblin");
        assert_eq!(commands[0].sprite_index, 0);
        assert!(world.resource::<SimEvents>().is_empty());
    }

    #[test]
    fn missing_clip_skips_the_enemy_and_reports_it() {
        let mut config = GameConfig::default();
        if let Some(table) = config.animations.get_mut(&Archetype::Goblin) {
            table.animations.remove("idle");
        }
        let mut world = world_with(config);
        spawn(&mut world, Archetype::Goblin);
        world.run_system_once(render_system).unwrap();
        assert_eq!(world.resource::<DrawList>().enemies().count(), 0);
        let events = world.resource_mut::<SimEvents>().drain();
        assert!(matches!(
            events.as_slice(),
            [crate::events::SimEvent::Diagnostic(Diagnostic::MissingAnimation { action, .. })] if action == "idle"
        ));
    }
}
