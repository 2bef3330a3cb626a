//! Grid pathfinding and per-enemy navigation state.
//!
//! Paths are computed with A* over the obstacle grid (4-directional, unit cost,
//! Manhattan heuristic) and refreshed opportunistically, never every tick.

use bevy::prelude::*;
use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};
use tracing::{span, trace, Level};
use utils::{frame::FrameCount, rng::SimRng};

use crate::character::enemy::archetype::{ArchetypeStats, MovementType};
use crate::character::enemy::{Enemy, Position};
use crate::character::player::PlayerView;
use crate::config::GameConfig;
use crate::error::PathError;
use crate::events::{Diagnostic, SimEvents};

use super::obstacle::ObstacleMap;
use super::state::Lifecycle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbors_4(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x, self.y - 1),
        ]
    }

    /// Manhattan distance to another grid position
    pub fn manhattan_distance(&self, other: &GridPos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev_distance(&self, other: &GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A found route: the cells from start to goal plus a cursor on the next one to reach.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPath {
    cells: Vec<GridPos>,
    cursor: usize,
    tile_size: f32,
}

impl GridPath {
    /// Number of steps from start to goal.
    pub fn cost(&self) -> u32 {
        self.cells.len().saturating_sub(1) as u32
    }

    pub fn cells(&self) -> &[GridPos] {
        &self.cells
    }

    pub fn goal(&self) -> Option<GridPos> {
        self.cells.last().copied()
    }

    /// Next cell to reach, `None` once the goal was reached.
    pub fn current(&self) -> Option<GridPos> {
        self.cells.get(self.cursor).copied()
    }

    pub fn advance(&mut self) {
        if self.cursor < self.cells.len() {
            self.cursor += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.cells.len()
    }

    /// Remaining waypoint centers. Lazy and finite; every call starts over from the
    /// cursor, so the sequence can be walked any number of times.
    pub fn waypoints(&self) -> impl Iterator<Item = Vec2> + '_ {
        let tile_size = self.tile_size;
        self.cells[self.cursor.min(self.cells.len())..]
            .iter()
            .map(move |cell| (Vec2::new(cell.x as f32, cell.y as f32) + Vec2::splat(0.5)) * tile_size)
    }
}

/// A* from `from` to `to`. The start cell itself is already reached, so the cursor
/// begins on the second cell.
pub fn find_path(map: &ObstacleMap, from: GridPos, to: GridPos) -> Result<GridPath, PathError> {
    for cell in [from, to] {
        if !map.in_bounds(cell) {
            return Err(PathError::OutOfBounds { cell });
        }
    }

    let (cells, _cost) = astar(
        &from,
        |cell| map.open_neighbours(*cell).map(|n| (n, 1u32)).collect::<Vec<_>>(),
        |cell| cell.manhattan_distance(&to),
        |cell| *cell == to,
    )
    .ok_or(PathError::NoPath { from, to })?;

    Ok(GridPath {
        cursor: cells.len().min(1),
        cells,
        tile_size: map.tile_size(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStatus {
    #[default]
    Idle,
    /// Player in sight, heading straight for it.
    DirectPath,
    FollowingPath,
    /// Heading to where the player was last seen.
    Searching,
    Patrolling,
    /// Squad override in effect.
    SquadWaypoint,
}

#[derive(Component, Debug, Clone, Default)]
pub struct EnemyPath {
    pub route: Option<GridPath>,
    pub has_line_of_sight: bool,
    pub last_known_player: Option<Vec2>,
    /// Set by the squad coordinator, takes precedence over everything else.
    pub squad_waypoint: Option<Vec2>,
    /// Cosmetic loop around the spawn cell, used when there is nothing better to do.
    pub patrol: Vec<GridPos>,
    pub patrol_index: usize,
    pub path_status: PathStatus,
}

impl EnemyPath {
    pub fn with_patrol(patrol: Vec<GridPos>) -> Self {
        Self {
            patrol,
            ..Default::default()
        }
    }

    /// Point to move toward this tick, in priority order: squad waypoint, the
    /// player when visible, the A* route, the last known player position, the patrol
    /// loop, and finally the player itself.
    pub fn steer_target(&mut self, map: &ObstacleMap, player: Vec2) -> Vec2 {
        if let Some(waypoint) = self.squad_waypoint {
            self.path_status = PathStatus::SquadWaypoint;
            return waypoint;
        }
        if self.has_line_of_sight {
            self.path_status = PathStatus::DirectPath;
            return player;
        }
        if let Some(next) = self.route.as_ref().and_then(|r| r.waypoints().next()) {
            self.path_status = PathStatus::FollowingPath;
            return next;
        }
        if let Some(last_known) = self.last_known_player {
            self.path_status = PathStatus::Searching;
            return last_known;
        }
        if let Some(cell) = self.patrol.get(self.patrol_index) {
            self.path_status = PathStatus::Patrolling;
            return map.cell_center(*cell);
        }
        self.path_status = PathStatus::Idle;
        player
    }
}

/// Square loop of free cells `reach` tiles around `spawn`.
pub fn patrol_loop(map: &ObstacleMap, spawn: GridPos, reach: i32) -> Vec<GridPos> {
    [(reach, 0), (0, reach), (-reach, 0), (0, -reach)]
        .into_iter()
        .map(|(dx, dy)| GridPos::new(spawn.x + dx, spawn.y + dy))
        .filter(|cell| map.is_free(*cell))
        .collect()
}

/// Refresh line of sight, last known player position and, with a small
/// probability per tick, the A* route of every living enemy.
pub fn enemy_navigation_system(
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    map: Res<ObstacleMap>,
    player: Res<PlayerView>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<SimEvents>,
    mut query: Query<(&Enemy, &Position, &ArchetypeStats, &Lifecycle, &mut EnemyPath)>,
) {
    let system_span = span!(Level::INFO, "sim", f = frame.frame, s = "navigation");
    let _enter = system_span.enter();

    let raw_player_cell = map.raw_cell_of(player.position);
    if !map.in_bounds(raw_player_cell) && !query.is_empty() {
        events.diagnose(frame.frame, Diagnostic::OutOfBoundsGrid { cell: raw_player_cell });
    }
    let player_cell = map.clamp_cell(raw_player_cell);
    let reach = map.tile_size() * 0.5;

    let mut enemies: Vec<_> = query.iter_mut().collect();
    enemies.sort_by_key(|(enemy, ..)| enemy.id);

    for (enemy, position, stats, lifecycle, mut path) in enemies {
        if !lifecycle.is_living() {
            continue;
        }

        let cell = map.cell_of(position.0);
        path.has_line_of_sight = map.line_of_sight(cell, player_cell);
        if path.has_line_of_sight {
            path.last_known_player = Some(player.position);
        } else if path
            .last_known_player
            .is_some_and(|p| p.distance(position.0) <= reach)
        {
            // Reached the last sighting without finding the player.
            path.last_known_player = None;
        }

        if stats.movement == MovementType::Ground && rng.chance(config.path_refresh_chance) {
            match find_path(&map, cell, player_cell) {
                Ok(route) => {
                    trace!(
                        "sim{{f={} path_refresh enemy={} cost={}}}",
                        frame.frame,
                        enemy.id,
                        route.cost()
                    );
                    path.route = Some(route);
                }
                Err(PathError::NoPath { from, to }) => {
                    path.route = None;
                    events.diagnose(
                        frame.frame,
                        Diagnostic::PathNotFound {
                            enemy: enemy.id,
                            from,
                            to,
                        },
                    );
                }
                Err(PathError::OutOfBounds { cell }) => {
                    path.route = None;
                    events.diagnose(frame.frame, Diagnostic::OutOfBoundsGrid { cell });
                }
            }
        }

        if let Some(route) = path.route.as_mut() {
            while let Some(next) = route.current() {
                if map.cell_center(next).distance(position.0) > reach {
                    break;
                }
                route.advance();
            }
            if route.is_finished() {
                path.route = None;
            }
        }

        if let Some(cell) = path.patrol.get(path.patrol_index).copied() {
            if map.cell_center(cell).distance(position.0) <= reach {
                path.patrol_index = (path.patrol_index + 1) % path.patrol.len();
            }
        }
    }
}
