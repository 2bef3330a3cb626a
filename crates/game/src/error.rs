use std::path::PathBuf;

use thiserror::Error;

use crate::character::enemy::archetype::Archetype;
use crate::character::enemy::ai::pathing::GridPos;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid config: {field} must be positive")]
    NonPositive { field: &'static str },
    #[error("invalid config: {field} must be within [0, 1]")]
    OutOfUnitRange { field: &'static str },
    #[error("invalid config: wave {wave} spawns {archetype:?} which has no stats entry")]
    MissingArchetype { wave: usize, archetype: Archetype },
    #[error("invalid config: squad tactic rotation is empty")]
    NoTactics,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("no path from {from} to {to}")]
    NoPath { from: GridPos, to: GridPos },
    #[error("cell {cell} is outside the obstacle grid")]
    OutOfBounds { cell: GridPos },
}
