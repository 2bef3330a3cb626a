//! Enemy archetypes and their base stats.
//!
//! Every archetype shares the same stat record; special moves are optional
//! abilities so that a config file can tune or strip them per archetype.

use animation::AnimationMapConfig;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::weapons::projectile::{ProjectileMotion, ProjectileSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    Goblin,
    Mushroom,
    Skeleton,
    FlyingEye,
    EvilWizard,
    BigFlyingEye,
    DashingGoblin,
    TeleportingMushroom,
}

impl Archetype {
    pub const ALL: [Archetype; 8] = [
        Archetype::Goblin,
        Archetype::Mushroom,
        Archetype::Skeleton,
        Archetype::FlyingEye,
        Archetype::EvilWizard,
        Archetype::BigFlyingEye,
        Archetype::DashingGoblin,
        Archetype::TeleportingMushroom,
    ];

    /// Sprite sheet key handed to the renderer.
    pub fn sheet(&self) -> &'static str {
        match self {
            Archetype::Goblin => "goblin",
            Archetype::Mushroom => "mushroom",
            Archetype::Skeleton => "skeleton",
            Archetype::FlyingEye => "flying_eye",
            Archetype::EvilWizard => "evil_wizard",
            Archetype::BigFlyingEye => "big_flying_eye",
            Archetype::DashingGoblin => "dashing_goblin",
            Archetype::TeleportingMushroom => "teleporting_mushroom",
        }
    }

    pub fn default_stats(&self) -> ArchetypeStats {
        match self {
            Archetype::Goblin => ArchetypeStats::goblin(),
            Archetype::Mushroom => ArchetypeStats::mushroom(),
            Archetype::Skeleton => ArchetypeStats::skeleton(),
            Archetype::FlyingEye => ArchetypeStats::flying_eye(),
            Archetype::EvilWizard => ArchetypeStats::evil_wizard(),
            Archetype::BigFlyingEye => ArchetypeStats::big_flying_eye(),
            Archetype::DashingGoblin => ArchetypeStats::dashing_goblin(),
            Archetype::TeleportingMushroom => ArchetypeStats::teleporting_mushroom(),
        }
    }

    /// Default frame table: the common clips plus whatever special clip the archetype uses.
    pub fn default_animations(&self) -> AnimationMapConfig {
        let mut clips = vec![("idle", 4), ("run", 8), ("attack", 8), ("takehit", 4), ("death", 4)];
        match self {
            Archetype::Skeleton => clips.push(("shield", 4)),
            Archetype::EvilWizard => clips.push(("cast", 8)),
            Archetype::BigFlyingEye => {
                clips.push(("dash", 4));
                clips.push(("teleport", 6));
            }
            Archetype::DashingGoblin => clips.push(("dash", 4)),
            Archetype::TeleportingMushroom => clips.push(("teleport", 6)),
            Archetype::Goblin | Archetype::Mushroom | Archetype::FlyingEye => {}
        }
        AnimationMapConfig::sequential(6, &clips)
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet())
    }
}

/// Movement type for enemies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementType {
    /// Blocked by obstacle cells
    #[default]
    Ground,
    /// Ignores the obstacle grid
    Flying,
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub enum FirePattern {
    /// Straight at the player's current position.
    #[default]
    Direct,
    /// At the player's position extrapolated over the flight time.
    Predictive,
    /// `count` projectiles fanned out `spacing` radians apart.
    Spread { count: u32, spacing: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangedAttack {
    pub range: f32,
    pub cooldown_ticks: u32,
    pub pattern: FirePattern,
    pub projectile: ProjectileSpec,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShieldAbility {
    /// Shield can only go up while health is below this value.
    pub health_below: f32,
    pub chance_per_tick: f32,
    pub duration_ticks: u32,
    pub cooldown_ticks: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DashAbility {
    pub duration_ticks: u32,
    pub speed: f32,
    pub cooldown_ticks: u32,
    /// No dash when already closer than this to the player.
    pub min_distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TeleportTrigger {
    /// Whenever the cooldown is ready.
    Interval,
    /// Only while health is below `fraction` of max.
    LowHealth { fraction: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TeleportDestination {
    /// Straight away from the player, `distance` from it.
    AwayFromPlayer { distance: f32 },
    /// Random free point within `radius` of the player.
    NearPlayer { radius: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeleportAbility {
    pub trigger: TeleportTrigger,
    pub destination: TeleportDestination,
    pub cooldown_ticks: u32,
    pub grace_ticks: u32,
}

/// Base stats of one archetype. `speed` is in px per tick, `damage` per second of contact.
#[derive(Component, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeStats {
    pub movement: MovementType,
    pub max_health: f32,
    pub speed: f32,
    pub damage: f32,
    /// Closest approach. Melee archetypes keep it inside collider contact with the player.
    pub acceptance_radius: f32,
    pub run_threshold: f32,
    #[serde(default)]
    pub retreat_distance: Option<f32>,
    pub size: (f32, f32),
    #[serde(default)]
    pub ranged: Option<RangedAttack>,
    #[serde(default)]
    pub shield: Option<ShieldAbility>,
    #[serde(default)]
    pub dash: Option<DashAbility>,
    #[serde(default)]
    pub teleport: Option<TeleportAbility>,
}

impl Default for ArchetypeStats {
    fn default() -> Self {
        Self::goblin()
    }
}

impl ArchetypeStats {
    fn melee(max_health: f32, speed: f32, damage: f32, acceptance_radius: f32, run_threshold: f32) -> Self {
        Self {
            movement: MovementType::Ground,
            max_health,
            speed,
            damage,
            acceptance_radius,
            run_threshold,
            retreat_distance: None,
            size: (32.0, 36.0),
            ranged: None,
            shield: None,
            dash: None,
            teleport: None,
        }
    }

    pub fn goblin() -> Self {
        Self::melee(100.0, 2.0, 10.0, 24.0, 150.0)
    }

    pub fn mushroom() -> Self {
        Self::melee(120.0, 1.5, 15.0, 22.0, 120.0)
    }

    pub fn skeleton() -> Self {
        Self {
            shield: Some(ShieldAbility {
                health_below: 50.0,
                chance_per_tick: 0.02,
                duration_ticks: 90,
                cooldown_ticks: 180,
            }),
            ..Self::melee(150.0, 1.2, 20.0, 24.0, 140.0)
        }
    }

    pub fn flying_eye() -> Self {
        Self {
            movement: MovementType::Flying,
            size: (28.0, 28.0),
            ranged: Some(RangedAttack {
                range: 300.0,
                cooldown_ticks: 90,
                pattern: FirePattern::Predictive,
                projectile: ProjectileSpec {
                    speed: 5.0,
                    damage: 10.0,
                    max_range: 400.0,
                    ..Default::default()
                },
            }),
            ..Self::melee(80.0, 2.5, 8.0, 200.0, 300.0)
        }
    }

    pub fn evil_wizard() -> Self {
        Self {
            retreat_distance: Some(100.0),
            ranged: Some(RangedAttack {
                range: 320.0,
                cooldown_ticks: 120,
                pattern: FirePattern::Spread { count: 3, spacing: 0.26 },
                projectile: ProjectileSpec {
                    speed: 4.0,
                    damage: 8.0,
                    max_range: 420.0,
                    ..Default::default()
                },
            }),
            ..Self::melee(110.0, 1.4, 5.0, 220.0, 320.0)
        }
    }

    pub fn big_flying_eye() -> Self {
        Self {
            movement: MovementType::Flying,
            size: (48.0, 48.0),
            ranged: Some(RangedAttack {
                range: 350.0,
                cooldown_ticks: 100,
                pattern: FirePattern::Direct,
                projectile: ProjectileSpec {
                    speed: 3.5,
                    damage: 15.0,
                    max_range: 500.0,
                    max_ticks: 300,
                    size: (12.0, 12.0),
                    motion: ProjectileMotion::Homing { turn_rate: 0.05 },
                },
            }),
            dash: Some(DashAbility {
                duration_ticks: 20,
                speed: 8.0,
                cooldown_ticks: 240,
                min_distance: 90.0,
            }),
            teleport: Some(TeleportAbility {
                trigger: TeleportTrigger::LowHealth { fraction: 0.3 },
                destination: TeleportDestination::AwayFromPlayer { distance: 250.0 },
                cooldown_ticks: 600,
                grace_ticks: 30,
            }),
            ..Self::melee(300.0, 1.8, 25.0, 180.0, 350.0)
        }
    }

    pub fn dashing_goblin() -> Self {
        Self {
            dash: Some(DashAbility {
                duration_ticks: 15,
                speed: 9.0,
                cooldown_ticks: 180,
                min_distance: 50.0,
            }),
            ..Self::melee(90.0, 2.2, 12.0, 24.0, 150.0)
        }
    }

    pub fn teleporting_mushroom() -> Self {
        Self {
            teleport: Some(TeleportAbility {
                trigger: TeleportTrigger::Interval,
                destination: TeleportDestination::NearPlayer { radius: 80.0 },
                cooldown_ticks: 240,
                grace_ticks: 20,
            }),
            ..Self::melee(100.0, 1.0, 15.0, 22.0, 120.0)
        }
    }
}
