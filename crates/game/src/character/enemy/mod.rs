pub mod ai;
pub mod archetype;
pub mod create;

use bevy::prelude::*;

use self::archetype::Archetype;

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enemy {
    /// Stable id, assigned in spawn order. Used for deterministic iteration.
    pub id: u32,
    pub archetype: Archetype,
}

/// World position in pixels.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position(pub Vec2);
