//! Kinematic projectiles shared by enemy shooters and the player's weapon.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collider::{is_colliding, Collider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileOwner {
    Enemy,
    Player,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ProjectileMotion {
    #[default]
    Straight,
    /// Steers toward the player each tick, turning at most `turn_rate` radians.
    Homing { turn_rate: f32 },
}

/// Static parameters of a projectile kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub damage: f32,
    pub max_range: f32,
    pub max_ticks: u32,
    pub size: (f32, f32),
    #[serde(default)]
    pub motion: ProjectileMotion,
}

impl Default for ProjectileSpec {
    fn default() -> Self {
        Self {
            speed: 5.0,
            damage: 10.0,
            max_range: 400.0,
            max_ticks: 600,
            size: (8.0, 8.0),
            motion: ProjectileMotion::Straight,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    pub owner: ProjectileOwner,
    pub traveled: f32,
    pub max_range: f32,
    pub ticks_alive: u32,
    pub max_ticks: u32,
    pub motion: ProjectileMotion,
    pub collider: Collider,
}

impl Projectile {
    /// Projectile from `origin` toward `target`. The velocity is computed once here.
    ///
    /// A target on top of the origin cannot be normalized: the projectile then keeps
    /// `target - origin` (zero) as velocity and the second value is `true` so the
    /// caller can report the degenerate geometry.
    pub fn aimed(origin: Vec2, target: Vec2, spec: &ProjectileSpec, owner: ProjectileOwner) -> (Self, bool) {
        let offset = target - origin;
        match offset.try_normalize() {
            Some(direction) => (Self::with_direction(origin, direction, spec, owner), false),
            None => {
                let mut projectile = Self::with_direction(origin, Vec2::ZERO, spec, owner);
                projectile.velocity = offset;
                (projectile, true)
            }
        }
    }

    /// Projectile along a unit `direction`.
    pub fn with_direction(origin: Vec2, direction: Vec2, spec: &ProjectileSpec, owner: ProjectileOwner) -> Self {
        Self {
            position: origin,
            velocity: direction * spec.speed,
            damage: spec.damage,
            owner,
            traveled: 0.0,
            max_range: spec.max_range,
            ticks_alive: 0,
            max_ticks: spec.max_ticks,
            motion: spec.motion,
            collider: Collider::from_size(spec.size),
        }
    }

    /// Move one tick. Homing projectiles turn toward `homing_target` first.
    pub fn advance(&mut self, homing_target: Option<Vec2>) {
        if let (ProjectileMotion::Homing { turn_rate }, Some(target)) = (self.motion, homing_target) {
            self.velocity = steer(self.velocity, target - self.position, turn_rate);
        }
        self.position += self.velocity;
        self.traveled += self.velocity.length();
        self.ticks_alive += 1;
    }

    pub fn expired(&self) -> bool {
        self.traveled > self.max_range || self.ticks_alive > self.max_ticks
    }

    pub fn hits(&self, position: Vec2, collider: &Collider) -> bool {
        is_colliding(self.position, &self.collider, position, collider)
    }
}

/// Rotate `velocity` toward `desired` by at most `max_turn` radians, keeping its speed.
fn steer(velocity: Vec2, desired: Vec2, max_turn: f32) -> Vec2 {
    if velocity.length_squared() <= f32::EPSILON || desired.length_squared() <= f32::EPSILON {
        return velocity;
    }
    velocity.rotate_towards(desired, max_turn.abs())
}
