pub mod input;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collider::Collider;

/// Read-only view of the player handed to the core every step.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub position: (f32, f32),
    pub size: (f32, f32),
    pub health: f32,
}

impl PlayerSnapshot {
    pub fn new(position: Vec2, size: Vec2, health: f32) -> Self {
        Self {
            position: (position.x, position.y),
            size: (size.x, size.y),
            health,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.position.0, self.position.1)
    }
}

/// The core's mirror of the player for the current tick. Velocity is the
/// displacement since the previous snapshot, in px per tick.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerView {
    pub position: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub velocity: Vec2,
    initialized: bool,
}

impl PlayerView {
    pub fn update(&mut self, snapshot: &PlayerSnapshot) {
        let position = snapshot.position();
        self.velocity = if self.initialized {
            position - self.position
        } else {
            Vec2::ZERO
        };
        self.position = position;
        self.size = Vec2::new(snapshot.size.0, snapshot.size.1);
        self.health = snapshot.health;
        self.initialized = true;
    }

    pub fn collider(&self) -> Collider {
        Collider::new(self.size.x, self.size.y)
    }

    pub fn is_dead(&self) -> bool {
        self.initialized && self.health <= 0.0
    }
}
