use bevy::prelude::SystemSet;

/// Stages of one simulation tick, chained in declaration order.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum SimSystemSet {
    Input,
    EnemySpawning,
    Squad,
    Navigation,
    EnemyAI,
    Projectiles,
    Weapon,
    DeathManagement,
    Render,
    FrameCounter,
}

impl SimSystemSet {
    pub const ORDER: [SimSystemSet; 10] = [
        SimSystemSet::Input,
        SimSystemSet::EnemySpawning,
        SimSystemSet::Squad,
        SimSystemSet::Navigation,
        SimSystemSet::EnemyAI,
        SimSystemSet::Projectiles,
        SimSystemSet::Weapon,
        SimSystemSet::DeathManagement,
        SimSystemSet::Render,
        SimSystemSet::FrameCounter,
    ];

    /// Gameplay stages stop running once the run has ended.
    pub fn is_gameplay(&self) -> bool {
        matches!(
            self,
            SimSystemSet::Squad
                | SimSystemSet::Navigation
                | SimSystemSet::EnemyAI
                | SimSystemSet::Projectiles
                | SimSystemSet::Weapon
                | SimSystemSet::DeathManagement
        )
    }
}
