//! Run configuration, loaded from RON.
//!
//! Every field has a default so a config file only needs to name what it changes:
//!
//! ```ron
//! (
//!     tick_rate: 60,
//!     map: (width: 30, height: 20),
//!     waves: (waves: [(message: "Wave 1", groups: [(archetype: Goblin, count: 3, spawn_rate: 1.0)])]),
//! )
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use animation::AnimationMapConfig;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::character::enemy::ai::squad::Tactic;
use crate::character::enemy::archetype::{Archetype, ArchetypeStats};
use crate::error::ConfigError;
use crate::waves::config::WaveConfig;
use crate::weapons::WeaponConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Width in tiles
    pub width: i32,
    /// Height in tiles
    pub height: i32,
    pub tile_size: f32,
    /// Probability for an inner tile to be blocked when a wave builds its map.
    pub obstacle_density: f32,
    /// Tiles around the player kept free of obstacles.
    pub player_clearance: i32,
    /// Enemies do not spawn closer than this many tiles to the player.
    pub spawn_clearance: i32,
    /// Half-size in tiles of the cosmetic patrol loop.
    pub patrol_reach: i32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 30,
            tile_size: 32.0,
            obstacle_density: 0.08,
            player_clearance: 3,
            spawn_clearance: 6,
            patrol_reach: 2,
        }
    }
}

impl MapConfig {
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * self.tile_size
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    pub squad_size: usize,
    /// Tactics handed out to new squads in turn.
    pub tactics: Vec<Tactic>,
    pub flank_radius: f32,
    /// Offset angle in radians from the player-to-squad axis.
    pub flank_angle: f32,
    /// Search radius in tiles for a cover cell.
    pub cover_search_radius: i32,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            squad_size: 4,
            tactics: vec![Tactic::Flank, Tactic::Swarm, Tactic::Cover],
            flank_radius: 120.0,
            flank_angle: std::f32::consts::FRAC_PI_3,
            cover_search_radius: 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pixels per tick
    pub speed: f32,
    pub size: (f32, f32),
    pub max_health: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            speed: 4.0,
            size: (32.0, 32.0),
            max_health: 100.0,
        }
    }
}

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub tick_rate: u32,
    pub map: MapConfig,
    /// Per-tick probability that a ground enemy recomputes its A* route.
    pub path_refresh_chance: f32,
    pub squads: SquadConfig,
    pub waves: WaveConfig,
    pub weapon: WeaponConfig,
    pub player: PlayerConfig,
    pub archetypes: BTreeMap<Archetype, ArchetypeStats>,
    pub animations: BTreeMap<Archetype, AnimationMapConfig>,
    /// Clip length assumed when an action has no entry in a frame table.
    pub fallback_clip_frames: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            map: MapConfig::default(),
            path_refresh_chance: 0.05,
            squads: SquadConfig::default(),
            waves: WaveConfig::default(),
            weapon: WeaponConfig::default(),
            player: PlayerConfig::default(),
            archetypes: Archetype::ALL
                .into_iter()
                .map(|a| (a, a.default_stats()))
                .collect(),
            animations: Archetype::ALL
                .into_iter()
                .map(|a| (a, a.default_animations()))
                .collect(),
            fallback_clip_frames: 4,
        }
    }
}

impl GameConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(value: f32, field: &'static str) -> Result<(), ConfigError> {
            if value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { field })
            }
        }
        fn unit(value: f32, field: &'static str) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::OutOfUnitRange { field })
            }
        }

        positive(self.tick_rate as f32, "tick_rate")?;
        positive(self.map.width as f32, "map.width")?;
        positive(self.map.height as f32, "map.height")?;
        positive(self.map.tile_size, "map.tile_size")?;
        unit(self.map.obstacle_density, "map.obstacle_density")?;
        unit(self.path_refresh_chance, "path_refresh_chance")?;
        positive(self.squads.squad_size as f32, "squads.squad_size")?;
        if self.squads.tactics.is_empty() {
            return Err(ConfigError::NoTactics);
        }
        positive(self.weapon.fire_rate, "weapon.fire_rate")?;
        positive(self.player.speed, "player.speed")?;
        positive(self.player.max_health, "player.max_health")?;
        positive(self.fallback_clip_frames as f32, "fallback_clip_frames")?;

        for stats in self.archetypes.values() {
            positive(stats.max_health, "archetypes.max_health")?;
            if let Some(shield) = &stats.shield {
                unit(shield.chance_per_tick, "archetypes.shield.chance_per_tick")?;
            }
        }

        for (wave, spec) in self.waves.waves.iter().enumerate() {
            for group in &spec.groups {
                if !self.archetypes.contains_key(&group.archetype) {
                    return Err(ConfigError::MissingArchetype {
                        wave,
                        archetype: group.archetype,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn stats_for(&self, archetype: Archetype) -> ArchetypeStats {
        self.archetypes
            .get(&archetype)
            .cloned()
            .unwrap_or_else(|| archetype.default_stats())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.waves.time_between_waves, 5.0);
        assert_eq!(config.waves.message_duration, 2.0);
    }

    #[test]
    fn partial_ron_keeps_defaults() {
        let config = GameConfig::from_ron_str(
            r#"(
                map: (width: 20, height: 10),
                waves: (waves: [(message: "Only wave", groups: [(archetype: Skeleton, count: 2, spawn_rate: 0.0)])]),
            )"#,
        )
        .unwrap();
        assert_eq!(config.map.width, 20);
        assert_eq!(config.map.tile_size, 32.0);
        assert_eq!(config.waves.waves.len(), 1);
        assert_eq!(config.stats_for(Archetype::Skeleton), ArchetypeStats::skeleton());
    }

    #[test]
    fn rejects_non_positive_fire_rate() {
        let mut config = GameConfig::default();
        config.weapon.fire_rate = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "weapon.fire_rate" })
        ));
    }

    #[test]
    fn rejects_wave_with_unknown_archetype() {
        let mut config = GameConfig::default();
        config.archetypes.remove(&Archetype::Goblin);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingArchetype { archetype: Archetype::Goblin, .. })
        ));
    }

    #[test]
    fn parse_errors_are_reported() {
        assert!(matches!(
            GameConfig::from_ron_str("(tick_rate: \"fast\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            GameConfig::load("does/not/exist.ron"),
            Err(ConfigError::Io { .. })
        ));
    }
}
