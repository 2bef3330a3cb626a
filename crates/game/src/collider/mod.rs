use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box centered on the owner's position.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

impl Collider {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_size(size: (f32, f32)) -> Self {
        Self::new(size.0, size.1)
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width, self.height) * 0.5
    }
}

/// Standard AABB overlap. Touching edges do not count as a collision.
pub fn is_colliding(pos_a: Vec2, collider_a: &Collider, pos_b: Vec2, collider_b: &Collider) -> bool {
    let half_a = collider_a.half_extents();
    let half_b = collider_b.half_extents();

    let min_a = pos_a - half_a;
    let max_a = pos_a + half_a;
    let min_b = pos_b - half_b;
    let max_b = pos_b + half_b;

    min_a.x < max_b.x && max_a.x > min_b.x && min_a.y < max_b.y && max_a.y > min_b.y
}
