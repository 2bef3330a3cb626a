//! Events reported by a simulation step.
//!
//! Systems push into the [`SimEvents`] resource; `Simulation::step` drains it into
//! the step report. Recovered errors are pushed as [`Diagnostic`]s and logged at
//! `warn` so they stay observable without a log sink.

use std::time::Duration;

use bevy::prelude::*;
use tracing::warn;

use crate::character::enemy::ai::pathing::GridPos;
use crate::character::enemy::archetype::Archetype;
use crate::waves::state::RunStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    WaveStarted { wave_index: usize, message: String },
    EnemySpawned { id: u32, archetype: Archetype, position: Vec2 },
    EnemyKilled { id: u32, archetype: Archetype },
    EnemyRemoved { id: u32, archetype: Archetype },
    WaveCleared { wave_index: usize },
    RunEnded { status: RunStatus },
    Diagnostic(Diagnostic),
}

/// A local, recovered error. None of these stop the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Action key absent from the archetype's frame table; the enemy was not drawn.
    MissingAnimation { enemy: u32, archetype: Archetype, action: String },
    /// A direction could not be normalized because both points coincide.
    DegenerateGeometry { enemy: Option<u32>, context: &'static str },
    PathNotFound { enemy: u32, from: GridPos, to: GridPos },
    /// A grid lookup outside the map was clamped or rejected.
    OutOfBoundsGrid { cell: GridPos },
    /// The clock handed to a step was earlier than the previous one.
    ClockWentBackwards { previous: Duration, received: Duration },
}

#[derive(Resource, Debug, Default)]
pub struct SimEvents {
    events: Vec<SimEvent>,
}

impl SimEvents {
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn diagnose(&mut self, frame: u32, diagnostic: Diagnostic) {
        warn!("sim{{f={} diagnostic={:?}}}", frame, diagnostic);
        self.events.push(SimEvent::Diagnostic(diagnostic));
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
