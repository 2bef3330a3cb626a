//! Squad coordination.
//!
//! Squads are an advisory layer: they only ever write `EnemyPath::squad_waypoint`.
//! Lifecycle and archetype decisions stay with the behavior system.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, span, Level};
use utils::{frame::FrameCount, rng::SimRng};

use crate::character::enemy::archetype::ArchetypeStats;
use crate::character::enemy::{Enemy, Position};
use crate::character::player::PlayerView;
use crate::config::{GameConfig, SquadConfig};

use super::obstacle::ObstacleMap;
use super::pathing::{EnemyPath, GridPos};
use super::state::{EnemyTimers, Lifecycle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tactic {
    /// Members split left and right around the player before engaging.
    Flank,
    /// Plain convergence, no override.
    Swarm,
    /// Ranged members reload out of sight.
    Cover,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Squad {
    pub id: u32,
    pub tactic: Tactic,
    pub members: Vec<Entity>,
}

#[derive(Resource, Clone, Debug, Default)]
pub struct Squads {
    squads: Vec<Squad>,
    next_id: u32,
    tactic_offset: usize,
}

impl Squads {
    /// Forget every squad and pick where the tactic rotation starts for the next wave.
    pub fn reset(&mut self, rng: &mut SimRng, config: &SquadConfig) {
        self.squads.clear();
        self.tactic_offset = rng.next_u32_range(0, config.tactics.len() as u32) as usize;
    }

    /// Put `entity` in the newest squad, opening a new one when it is full.
    pub fn assign(&mut self, entity: Entity, config: &SquadConfig) -> (u32, Tactic) {
        let size = config.squad_size.max(1);
        let full = self.squads.last().is_none_or(|s| s.members.len() >= size);
        if full {
            let tactic = if config.tactics.is_empty() {
                Tactic::Swarm
            } else {
                config.tactics[(self.tactic_offset + self.next_id as usize) % config.tactics.len()]
            };
            self.squads.push(Squad {
                id: self.next_id,
                tactic,
                members: Vec::with_capacity(size),
            });
            self.next_id += 1;
        }
        match self.squads.last_mut() {
            Some(squad) => {
                squad.members.push(entity);
                (squad.id, squad.tactic)
            }
            None => (0, Tactic::Swarm),
        }
    }

    /// Drop members for which `keep` is false, then empty squads.
    pub fn prune(&mut self, keep: impl Fn(Entity) -> bool) {
        for squad in self.squads.iter_mut() {
            squad.members.retain(|member| keep(*member));
        }
        self.squads.retain(|squad| !squad.members.is_empty());
    }

    pub fn remove(&mut self, entity: Entity) {
        self.prune(|member| member != entity);
    }

    pub fn clear(&mut self) {
        self.squads.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Squad> {
        self.squads.iter()
    }

    pub fn len(&self) -> usize {
        self.squads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squads.is_empty()
    }
}

/// Flank target of the `index`-th member: on a circle of `radius` around the
/// player, `angle` radians off the player-to-squad axis, alternating sides.
pub fn flank_point(player: Vec2, axis: Vec2, index: usize, angle: f32, radius: f32) -> Vec2 {
    let side = if index % 2 == 0 { 1.0 } else { -1.0 };
    player + Vec2::from_angle(side * angle).rotate(axis) * radius
}

/// Nearest free cell within `radius` of `from` that has no line of sight to the player.
pub fn find_cover_cell(map: &ObstacleMap, from: GridPos, player_cell: GridPos, radius: i32) -> Option<GridPos> {
    let mut best: Option<(u32, GridPos)> = None;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let cell = GridPos::new(from.x + dx, from.y + dy);
            if !map.is_free(cell) || map.line_of_sight(cell, player_cell) {
                continue;
            }
            let distance = cell.manhattan_distance(&from);
            if best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, cell));
            }
        }
    }
    best.map(|(_, cell)| cell)
}

pub fn squad_coordinator_system(
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    map: Res<ObstacleMap>,
    player: Res<PlayerView>,
    mut squads: ResMut<Squads>,
    mut query: Query<(&Enemy, &Position, &ArchetypeStats, &Lifecycle, &EnemyTimers, &mut EnemyPath)>,
) {
    let system_span = span!(Level::INFO, "sim", f = frame.frame, s = "squads");
    let _enter = system_span.enter();

    squads.prune(|member| query.get(member).is_ok_and(|(_, _, _, lifecycle, ..)| lifecycle.is_living()));

    let squad_config = &config.squads;
    let player_cell = map.cell_of(player.position);
    let engage_slack = map.tile_size() * 0.5;

    for squad in squads.iter() {
        match squad.tactic {
            Tactic::Swarm => {
                for member in &squad.members {
                    if let Ok((.., mut path)) = query.get_mut(*member) {
                        path.squad_waypoint = None;
                    }
                }
            }
            Tactic::Flank => {
                let positions: Vec<Vec2> = squad
                    .members
                    .iter()
                    .filter_map(|member| query.get(*member).ok().map(|(_, position, ..)| position.0))
                    .collect();
                if positions.is_empty() {
                    continue;
                }
                let centroid = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
                let axis = (centroid - player.position).try_normalize().unwrap_or(Vec2::X);

                for (index, member) in squad.members.iter().enumerate() {
                    let Ok((enemy, position, stats, .., mut path)) = query.get_mut(*member) else {
                        continue;
                    };
                    let distance = position.0.distance(player.position);
                    let engaged = distance <= stats.acceptance_radius
                        || distance <= squad_config.flank_radius + engage_slack;
                    path.squad_waypoint = if engaged {
                        None
                    } else {
                        let point = flank_point(
                            player.position,
                            axis,
                            index,
                            squad_config.flank_angle,
                            squad_config.flank_radius,
                        );
                        Some(map.clamp_position(point))
                    };
                    debug!(
                        "sim{{f={} squad={} flank enemy={} engaged={}}}",
                        frame.frame, squad.id, enemy.id, engaged
                    );
                }
            }
            Tactic::Cover => {
                for member in &squad.members {
                    let Ok((enemy, position, stats, _, timers, mut path)) = query.get_mut(*member) else {
                        continue;
                    };
                    let reloading = stats.ranged.is_some() && timers.ranged_cooldown > 0;
                    path.squad_waypoint = if reloading {
                        find_cover_cell(
                            &map,
                            map.cell_of(position.0),
                            player_cell,
                            squad_config.cover_search_radius,
                        )
                        .map(|cell| map.cell_center(cell))
                    } else {
                        None
                    };
                    debug!(
                        "sim{{f={} squad={} cover enemy={} waypoint={:?}}}",
                        frame.frame, squad.id, enemy.id, path.squad_waypoint
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    use crate::character::enemy::archetype::Archetype;
    use crate::character::enemy::ai::state::MonsterState;
    use crate::character::player::PlayerSnapshot;

    const PLAYER: Vec2 = Vec2::new(656.0, 496.0);

    fn config(size: usize) -> SquadConfig {
        SquadConfig {
            squad_size: size,
            tactics: vec![Tactic::Flank, Tactic::Swarm, Tactic::Cover],
            ..Default::default()
        }
    }

    #[test]
    fn members_fill_squads_in_spawn_order() {
        let mut world = World::new();
        let mut squads = Squads::default();
        let config = config(2);
        let assigned: Vec<(u32, Tactic)> = (0..5)
            .map(|_| {
                let entity = world.spawn_empty().id();
                squads.assign(entity, &config)
            })
            .collect();
        assert_eq!(
            assigned,
            vec![
                (0, Tactic::Flank),
                (0, Tactic::Flank),
                (1, Tactic::Swarm),
                (1, Tactic::Swarm),
                (2, Tactic::Cover),
            ]
        );
    }

    #[test]
    fn prune_drops_empty_squads() {
        let mut world = World::new();
        let mut squads = Squads::default();
        let config = config(1);
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        squads.assign(a, &config);
        squads.assign(b, &config);
        squads.remove(a);
        assert_eq!(squads.len(), 1);
        assert_eq!(squads.iter().next().map(|s| s.members.clone()), Some(vec![b]));
    }

    #[test]
    fn flank_points_alternate_sides() {
        let player = Vec2::ZERO;
        let left = flank_point(player, Vec2::X, 0, std::f32::consts::FRAC_PI_2, 100.0);
        let right = flank_point(player, Vec2::X, 1, std::f32::consts::FRAC_PI_2, 100.0);
        assert!((left - Vec2::new(0.0, 100.0)).length() < 1e-3);
        assert!((right - Vec2::new(0.0, -100.0)).length() < 1e-3);
    }

    #[test]
    fn cover_cell_is_hidden_from_the_player() {
        let mut map = ObstacleMap::open(10, 10, 10.0);
        map.set_blocked(GridPos::new(5, 5), true);
        let player_cell = GridPos::new(5, 8);
        let cover = find_cover_cell(&map, GridPos::new(5, 3), player_cell, 2);
        assert_eq!(cover, Some(GridPos::new(5, 3)));
        assert!(cover.is_some_and(|c| !map.line_of_sight(c, player_cell)));

        let open = ObstacleMap::open(10, 10, 10.0);
        assert_eq!(find_cover_cell(&open, GridPos::new(5, 3), player_cell, 2), None);
    }

    fn squad_world(tactic: Tactic, map: ObstacleMap) -> World {
        let mut config = GameConfig::default();
        config.squads.tactics = vec![tactic];
        let mut view = PlayerView::default();
        view.update(&PlayerSnapshot::new(PLAYER, Vec2::splat(32.0), 100.0));

        let mut world = World::new();
        world.insert_resource(FrameCount::default());
        world.insert_resource(map);
        world.insert_resource(view);
        world.insert_resource(config);
        world.init_resource::<Squads>();
        world
    }

    fn join_squad(world: &mut World, archetype: Archetype, position: Vec2, timers: EnemyTimers) -> Entity {
        let entity = world
            .spawn((
                Enemy { id: 0, archetype },
                Position(position),
                archetype.default_stats(),
                Lifecycle::Alive(MonsterState::Chase),
                timers,
                EnemyPath::default(),
            ))
            .id();
        let squad_config = world.resource::<GameConfig>().squads.clone();
        world.resource_mut::<Squads>().assign(entity, &squad_config);
        entity
    }

    fn waypoint(world: &World, entity: Entity) -> Option<Vec2> {
        world.get::<EnemyPath>(entity).and_then(|path| path.squad_waypoint)
    }

    #[test]
    fn cover_member_hides_while_reloading() {
        let mut map = ObstacleMap::open(40, 30, 32.0);
        for y in 10..=20 {
            map.set_blocked(GridPos::new(12, y), true);
        }
        assert!(map.line_of_sight(GridPos::new(14, 15), GridPos::new(20, 15)));
        let hidden = map.cell_center(GridPos::new(11, 15));

        let mut world = squad_world(Tactic::Cover, map);
        let start = world.resource::<ObstacleMap>().cell_center(GridPos::new(14, 15));
        let reloading = EnemyTimers {
            ranged_cooldown: 30,
            ..Default::default()
        };
        let member = join_squad(&mut world, Archetype::FlyingEye, start, reloading);

        world.run_system_once(squad_coordinator_system).unwrap();
        assert_eq!(waypoint(&world, member), Some(hidden));

        world.get_mut::<EnemyTimers>(member).unwrap().ranged_cooldown = 0;
        world.run_system_once(squad_coordinator_system).unwrap();
        assert_eq!(waypoint(&world, member), None);
    }

    #[test]
    fn flank_waypoint_clears_once_engaged() {
        let mut world = squad_world(Tactic::Flank, ObstacleMap::open(40, 30, 32.0));
        let member = join_squad(&mut world, Archetype::Goblin, Vec2::new(100.0, PLAYER.y), EnemyTimers::default());

        world.run_system_once(squad_coordinator_system).unwrap();
        let point = waypoint(&world, member).unwrap();
        let radius = world.resource::<GameConfig>().squads.flank_radius;
        assert!((point.distance(PLAYER) - radius).abs() < 1e-3);
        assert!(point.x < PLAYER.x);

        world.get_mut::<Position>(member).unwrap().0 = PLAYER - Vec2::new(100.0, 0.0);
        world.run_system_once(squad_coordinator_system).unwrap();
        assert_eq!(waypoint(&world, member), None);
    }
}
