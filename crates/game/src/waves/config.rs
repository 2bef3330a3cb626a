//! Wave table and director timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utils::frame::seconds_to_ticks;

use crate::character::enemy::archetype::Archetype;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub archetype: Archetype,
    pub count: u32,
    /// Enemies per second. Zero or less spawns the whole group at once.
    #[serde(default)]
    pub spawn_rate: f32,
}

impl SpawnGroup {
    pub fn interval_ticks(&self, tick_rate: u32) -> u32 {
        if !(self.spawn_rate > 0.0) {
            return 0;
        }
        seconds_to_ticks(1.0 / self.spawn_rate, tick_rate).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub message: String,
    pub groups: Vec<SpawnGroup>,
}

impl WaveSpec {
    pub fn enemy_count(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Seconds between a wave being cleared and the next one spawning
    pub time_between_waves: f32,
    /// Seconds the wave message stays up after spawning starts
    pub message_duration: f32,
    pub waves: Vec<WaveSpec>,
}

fn seconds(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}

impl WaveConfig {
    pub fn cooldown(&self) -> Duration {
        seconds(self.time_between_waves)
    }

    pub fn message_window(&self) -> Duration {
        seconds(self.message_duration)
    }
}

fn group(archetype: Archetype, count: u32, spawn_rate: f32) -> SpawnGroup {
    SpawnGroup {
        archetype,
        count,
        spawn_rate,
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            time_between_waves: 5.0,
            message_duration: 2.0,
            waves: vec![
                WaveSpec {
                    message: "Wave 1: goblins in the grass".into(),
                    groups: vec![group(Archetype::Goblin, 4, 1.0), group(Archetype::Mushroom, 2, 0.5)],
                },
                WaveSpec {
                    message: "Wave 2: the dead walk".into(),
                    groups: vec![
                        group(Archetype::Skeleton, 3, 0.5),
                        group(Archetype::FlyingEye, 2, 0.5),
                        group(Archetype::Goblin, 4, 1.0),
                    ],
                },
                WaveSpec {
                    message: "Wave 3: tricksters".into(),
                    groups: vec![
                        group(Archetype::EvilWizard, 2, 0.5),
                        group(Archetype::DashingGoblin, 4, 1.0),
                        group(Archetype::TeleportingMushroom, 2, 0.5),
                    ],
                },
                WaveSpec {
                    message: "Final wave: the big eye".into(),
                    groups: vec![
                        group(Archetype::BigFlyingEye, 1, 0.0),
                        group(Archetype::Skeleton, 4, 1.0),
                        group(Archetype::FlyingEye, 3, 0.5),
                    ],
                },
            ],
        }
    }
}
