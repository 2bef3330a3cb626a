pub mod args;
pub mod character;
pub mod collider;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod frame;
pub mod render;
pub mod system_set;
pub mod waves;
pub mod weapons;

pub use crate::config::GameConfig;
pub use crate::core::{Simulation, StepReport, TickInput};
