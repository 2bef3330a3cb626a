//! Wave director state.

use std::time::Duration;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::character::enemy::archetype::Archetype;

use super::config::{SpawnGroup, WaveSpec};

/// Current phase of the wave director
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WavePhase {
    /// Before the first step
    #[default]
    Idle,
    /// Releasing the wave's spawn groups
    Spawning,
    /// Everything spawned, waiting for the wave to be removed
    Active,
    /// All wave enemies removed on this tick
    Cleared,
    /// Wall-clock delay before the next wave
    Cooldown,
    /// Past the last wave, terminal
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    Running,
    Victory,
    Defeat,
}

/// One spawn group of the current wave, released a few enemies at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingGroup {
    pub archetype: Archetype,
    pub remaining: u32,
    /// Ticks between two releases, 0 releases the whole group at once.
    pub interval_ticks: u32,
    pub next_in: u32,
}

impl PendingGroup {
    pub fn new(group: &SpawnGroup, tick_rate: u32) -> Self {
        Self {
            archetype: group.archetype,
            remaining: group.count,
            interval_ticks: group.interval_ticks(tick_rate),
            next_in: 0,
        }
    }

    /// Number of enemies to spawn on this tick.
    pub fn release(&mut self) -> u32 {
        if self.remaining == 0 {
            return 0;
        }
        if self.next_in > 0 {
            self.next_in -= 1;
            return 0;
        }
        let batch = if self.interval_ticks == 0 { self.remaining } else { 1 };
        self.remaining -= batch;
        self.next_in = self.interval_ticks.saturating_sub(1);
        batch
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct WaveState {
    pub phase: WavePhase,
    pub status: RunStatus,
    /// Index into the wave table (0-based)
    pub wave_index: usize,

    // === Wall-clock timestamps (SimClock) ===
    pub spawn_started_at: Option<Duration>,
    pub cleared_at: Option<Duration>,

    pub wave_message: String,
    pub pending: Vec<PendingGroup>,
    pub spawned_this_wave: u32,
    /// Next enemy id, unique for the whole run
    pub next_enemy_id: u32,

    // === Statistics ===
    pub total_killed: u32,
    pub wave_killed: u32,

    /// Frame when the current phase started
    pub phase_start_frame: u32,
}

impl WaveState {
    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn set_phase(&mut self, phase: WavePhase, frame: u32) {
        self.phase = phase;
        self.phase_start_frame = frame;
    }

    /// Enter `Spawning` for wave `index`, queueing each of its groups.
    pub fn begin_wave(&mut self, index: usize, spec: &WaveSpec, tick_rate: u32, now: Duration, frame: u32) {
        self.wave_index = index;
        self.wave_message = spec.message.clone();
        self.pending = spec.groups.iter().map(|g| PendingGroup::new(g, tick_rate)).collect();
        self.spawned_this_wave = 0;
        self.wave_killed = 0;
        self.spawn_started_at = Some(now);
        self.cleared_at = None;
        self.set_phase(WavePhase::Spawning, frame);
    }

    pub fn spawning_done(&self) -> bool {
        self.pending.iter().all(|g| g.remaining == 0)
    }

    /// The wave message while it is still on screen: `duration` from the moment
    /// spawning started, regardless of wave progress.
    pub fn message(&self, now: Duration, duration: Duration) -> Option<&str> {
        let started = self.spawn_started_at?;
        if now.saturating_sub(started) < duration {
            Some(&self.wave_message)
        } else {
            None
        }
    }

    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_enemy_id;
        self.next_enemy_id += 1;
        id
    }

    pub fn record_kill(&mut self) {
        self.total_killed += 1;
        self.wave_killed += 1;
    }

    pub fn end(&mut self, status: RunStatus, frame: u32) {
        self.status = status;
        self.pending.clear();
        if status == RunStatus::Victory {
            self.set_phase(WavePhase::Complete, frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> WaveSpec {
        WaveSpec {
            message: "Here they come".into(),
            groups: vec![
                SpawnGroup {
                    archetype: Archetype::Goblin,
                    count: 3,
                    spawn_rate: 0.0,
                },
                SpawnGroup {
                    archetype: Archetype::Mushroom,
                    count: 2,
                    spawn_rate: 30.0,
                },
            ],
        }
    }

    #[test]
    fn zero_rate_group_releases_everything_at_once() {
        let mut state = WaveState::default();
        state.begin_wave(0, &spec(), 60, Duration::ZERO, 1);
        assert_eq!(state.pending[0].release(), 3);
        assert_eq!(state.pending[0].release(), 0);
    }

    #[test]
    fn paced_group_waits_its_interval() {
        let mut state = WaveState::default();
        state.begin_wave(0, &spec(), 60, Duration::ZERO, 1);
        let group = &mut state.pending[1];
        assert_eq!(group.interval_ticks, 2);
        let released: Vec<u32> = (0..4).map(|_| group.release()).collect();
        assert_eq!(released, vec![1, 0, 1, 0]);
        assert!(state.pending[1].remaining == 0);
    }

    #[test]
    fn message_shows_for_its_duration_only() {
        let mut state = WaveState::default();
        assert_eq!(state.message(Duration::ZERO, Duration::from_secs(2)), None);
        state.begin_wave(0, &spec(), 60, Duration::from_secs(10), 1);
        let window = Duration::from_secs(2);
        assert_eq!(state.message(Duration::from_millis(11_999), window), Some("Here they come"));
        assert_eq!(state.message(Duration::from_secs(12), window), None);
    }

    #[test]
    fn kills_count_per_wave_and_in_total() {
        let mut state = WaveState::default();
        state.begin_wave(0, &spec(), 60, Duration::ZERO, 1);
        state.record_kill();
        state.record_kill();
        state.begin_wave(1, &spec(), 60, Duration::ZERO, 50);
        state.record_kill();
        assert_eq!((state.total_killed, state.wave_killed), (3, 1));
        assert_eq!(state.cleared_at, None);
    }
}
