//! Coarse obstacle grid
//!
//! A boolean grid of blocked tiles used for pathfinding, ground movement and
//! line of sight. It is rebuilt when a wave starts and read-only during the wave.

use bevy::prelude::*;
use utils::rng::SimRng;

use super::pathing::GridPos;

#[derive(Resource, Clone, Debug, PartialEq)]
pub struct ObstacleMap {
    width: i32,
    height: i32,
    tile_size: f32,
    blocked: Vec<bool>,
}

impl Default for ObstacleMap {
    fn default() -> Self {
        Self::open(1, 1, 32.0)
    }
}

impl ObstacleMap {
    /// Obstacle-free map of `width` x `height` tiles.
    pub fn open(width: i32, height: i32, tile_size: f32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            tile_size: tile_size.max(1.0),
            blocked: vec![false; (width * height) as usize],
        }
    }

    /// Random layout: each inner tile is blocked with probability `density`.
    /// The border ring and every tile within `clearance` of `keep_free` stay open.
    pub fn generate(
        width: i32,
        height: i32,
        tile_size: f32,
        density: f32,
        keep_free: GridPos,
        clearance: i32,
        rng: &mut SimRng,
    ) -> Self {
        let mut map = Self::open(width, height, tile_size);
        for y in 1..map.height - 1 {
            for x in 1..map.width - 1 {
                let cell = GridPos::new(x, y);
                if cell.chebyshev_distance(&keep_free) <= clearance {
                    continue;
                }
                if rng.chance(density) {
                    map.set_blocked(cell, true);
                }
            }
        }
        map
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Size of the map in pixels.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.tile_size
    }

    pub fn clamp_position(&self, position: Vec2) -> Vec2 {
        position.clamp(Vec2::ZERO, self.world_size() - Vec2::splat(0.001))
    }

    pub fn contains_position(&self, position: Vec2) -> bool {
        let size = self.world_size();
        position.x >= 0.0 && position.y >= 0.0 && position.x < size.x && position.y < size.y
    }

    pub fn in_bounds(&self, cell: GridPos) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    /// Grid cell of a pixel position without clamping. May be out of bounds.
    pub fn raw_cell_of(&self, position: Vec2) -> GridPos {
        GridPos::new(
            (position.x / self.tile_size).floor() as i32,
            (position.y / self.tile_size).floor() as i32,
        )
    }

    /// Grid cell of a pixel position, clamped into the map.
    pub fn cell_of(&self, position: Vec2) -> GridPos {
        let raw = self.raw_cell_of(position);
        GridPos::new(raw.x.clamp(0, self.width - 1), raw.y.clamp(0, self.height - 1))
    }

    pub fn cell_center(&self, cell: GridPos) -> Vec2 {
        (Vec2::new(cell.x as f32, cell.y as f32) + Vec2::splat(0.5)) * self.tile_size
    }

    fn index(&self, cell: GridPos) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| (cell.y * self.width + cell.x) as usize)
    }

    /// Out-of-bounds cells count as blocked.
    pub fn is_blocked(&self, cell: GridPos) -> bool {
        self.index(cell).map_or(true, |i| self.blocked[i])
    }

    pub fn is_free(&self, cell: GridPos) -> bool {
        !self.is_blocked(cell)
    }

    /// Ignored for out-of-bounds cells.
    pub fn set_blocked(&mut self, cell: GridPos, blocked: bool) {
        if let Some(i) = self.index(cell) {
            self.blocked[i] = blocked;
        }
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked.iter().filter(|b| **b).count()
    }

    /// In-bounds, unblocked 4-neighbours.
    pub fn open_neighbours(&self, cell: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        cell.neighbors_4().into_iter().filter(move |n| self.is_free(*n))
    }

    pub fn free_cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| GridPos::new(x, y)))
            .filter(move |cell| self.is_free(*cell))
    }

    /// Uniform free cell. Cells within `avoid_radius` of `avoid` are skipped unless
    /// nothing else is free.
    pub fn random_free_cell(&self, rng: &mut SimRng, avoid: GridPos, avoid_radius: i32) -> Option<GridPos> {
        let preferred: Vec<GridPos> = self
            .free_cells()
            .filter(|c| c.chebyshev_distance(&avoid) > avoid_radius)
            .collect();
        let pool = if preferred.is_empty() {
            self.free_cells().collect()
        } else {
            preferred
        };
        if pool.is_empty() {
            return None;
        }
        let index = rng.next_u32_range(0, pool.len() as u32) as usize;
        pool.get(index).copied()
    }

    /// Coarse visibility test: sight is blocked when any cell of the inclusive
    /// bounding rectangle between `a` and `b` is blocked. This over-approximates
    /// occlusion compared to a real ray cast. Corners are clamped into the map.
    pub fn line_of_sight(&self, a: GridPos, b: GridPos) -> bool {
        let a = self.clamp_cell(a);
        let b = self.clamp_cell(b);
        let (min_x, max_x) = (a.x.min(b.x), a.x.max(b.x));
        let (min_y, max_y) = (a.y.min(b.y), a.y.max(b.y));
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if self.is_blocked(GridPos::new(x, y)) {
                    return false;
                }
            }
        }
        true
    }

    pub fn clamp_cell(&self, cell: GridPos) -> GridPos {
        GridPos::new(cell.x.clamp(0, self.width - 1), cell.y.clamp(0, self.height - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_is_blocked_and_clamped() {
        let map = ObstacleMap::open(4, 3, 10.0);
        assert!(map.is_blocked(GridPos::new(-1, 0)));
        assert!(map.is_blocked(GridPos::new(4, 0)));
        assert_eq!(map.cell_of(Vec2::new(-50.0, 500.0)), GridPos::new(0, 2));
        assert_eq!(map.raw_cell_of(Vec2::new(-5.0, 35.0)), GridPos::new(-1, 3));
    }

    #[test]
    fn rectangle_scan_blocks_off_diagonal_cells() {
        let mut map = ObstacleMap::open(5, 5, 10.0);
        // Blocks the rectangle between (0,0) and (4,4) even though a diagonal
        // ray would pass beside it.
        map.set_blocked(GridPos::new(4, 0), true);
        assert!(!map.line_of_sight(GridPos::new(0, 0), GridPos::new(4, 4)));
        assert!(map.line_of_sight(GridPos::new(0, 1), GridPos::new(3, 4)));
    }

    #[test]
    fn line_of_sight_clamps_out_of_bounds_corners() {
        let map = ObstacleMap::open(3, 3, 10.0);
        assert!(map.line_of_sight(GridPos::new(-10, -10), GridPos::new(40, 40)));
    }

    #[test]
    fn generation_keeps_border_and_clearance_open() {
        let mut rng = SimRng::from_seed(3);
        let center = GridPos::new(10, 10);
        let map = ObstacleMap::generate(20, 20, 32.0, 1.0, center, 2, &mut rng);
        for x in 0..20 {
            assert!(map.is_free(GridPos::new(x, 0)));
            assert!(map.is_free(GridPos::new(x, 19)));
        }
        assert!(map.is_free(GridPos::new(12, 8)));
        assert!(map.is_blocked(GridPos::new(13, 10)));
    }

    #[test]
    fn random_free_cell_avoids_the_player_area() {
        let mut rng = SimRng::from_seed(9);
        let map = ObstacleMap::open(10, 10, 32.0);
        let avoid = GridPos::new(5, 5);
        for _ in 0..50 {
            let cell = map.random_free_cell(&mut rng, avoid, 3).unwrap();
            assert!(cell.chebyshev_distance(&avoid) > 3);
        }
    }
}
