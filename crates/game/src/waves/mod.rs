//! Wave director.
//!
//! ```text
//! Idle → Spawning → Active → Cleared → Cooldown ─┬→ Spawning (next wave)
//!                                                └→ Complete
//! ```
//!
//! Spawn pacing counts ticks. The cooldown between waves and the wave message
//! window are measured on the step clock.

pub mod config;
pub mod state;
pub mod systems;
pub mod tracking;

pub use config::{SpawnGroup, WaveConfig, WaveSpec};
pub use state::{RunStatus, WavePhase, WaveState};
pub use tracking::WaveEnemy;
