use bevy::prelude::*;

/// Wave an enemy was spawned in. The wave is cleared once none of these remain.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveEnemy {
    pub spawned_wave: usize,
}
