//! The simulation core: one `World`, one schedule, one step per rendered frame.

use std::time::Duration;

use animation::AnimationState;
use bevy::ecs::schedule::{ExecutorKind, ScheduleLabel};
use bevy::prelude::*;
use tracing::info;
use utils::{clock::SimClock, frame::FrameCount, rng::SimRng};

use crate::character::enemy::ai::behavior::enemy_behavior_system;
use crate::character::enemy::ai::combat::{
    enemy_contact_damage_system, enemy_projectile_system, take_damage, DamageOutcome,
};
use crate::character::enemy::ai::obstacle::ObstacleMap;
use crate::character::enemy::ai::pathing::enemy_navigation_system;
use crate::character::enemy::ai::squad::{squad_coordinator_system, Squads};
use crate::character::enemy::ai::state::{EnemyTimers, Lifecycle};
use crate::character::enemy::archetype::Archetype;
use crate::character::enemy::{Enemy, Position};
use crate::character::health::{Health, PlayerDamage};
use crate::character::player::input::player_input_system;
use crate::character::player::{PlayerSnapshot, PlayerView};
use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::events::{SimEvent, SimEvents};
use crate::frame::increase_frame_system;
use crate::render::{render_system, DrawList};
use crate::system_set::SimSystemSet;
use crate::waves::state::{RunStatus, WavePhase, WaveState};
use crate::waves::systems::{
    enemy_death_tracking_system, enemy_removal_system, wave_spawning_system, wave_state_machine_system,
};
use crate::weapons::{player_weapon_system, PlayerBullets, Weapon};

#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimSchedule;

/// Everything the outside world hands to one step.
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct TickInput {
    pub player: PlayerSnapshot,
    /// Monotonic time of this step.
    pub now: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Ticks simulated so far.
    pub frame: u32,
    pub phase: WavePhase,
    pub wave_index: usize,
    pub status: RunStatus,
    /// Wave message while it is on screen.
    pub message: Option<String>,
    pub player_damage: PlayerDamage,
    pub events: Vec<SimEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySummary {
    pub entity: Entity,
    pub id: u32,
    pub archetype: Archetype,
    pub position: Vec2,
    pub health: f32,
    pub lifecycle: Lifecycle,
}

pub fn run_is_active(wave_state: Res<WaveState>) -> bool {
    wave_state.is_running()
}

pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::new(SimSchedule);
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);

    for pair in SimSystemSet::ORDER.windows(2) {
        schedule.configure_sets(pair[0].before(pair[1]));
    }
    for set in SimSystemSet::ORDER.into_iter().filter(SimSystemSet::is_gameplay) {
        schedule.configure_sets(set.run_if(run_is_active));
    }

    schedule.add_systems((
        player_input_system.in_set(SimSystemSet::Input),
        (wave_state_machine_system, wave_spawning_system)
            .chain()
            .in_set(SimSystemSet::EnemySpawning),
        squad_coordinator_system.in_set(SimSystemSet::Squad),
        enemy_navigation_system.in_set(SimSystemSet::Navigation),
        enemy_behavior_system.in_set(SimSystemSet::EnemyAI),
        (enemy_contact_damage_system, enemy_projectile_system)
            .chain()
            .in_set(SimSystemSet::Projectiles),
        player_weapon_system.in_set(SimSystemSet::Weapon),
        (enemy_death_tracking_system, enemy_removal_system)
            .chain()
            .in_set(SimSystemSet::DeathManagement),
        render_system.in_set(SimSystemSet::Render),
        increase_frame_system.in_set(SimSystemSet::FrameCounter),
    ));
    schedule
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    /// A fresh run, reproducible from `(config, seed)`.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new();
        world.insert_resource(FrameCount::default());
        world.insert_resource(SimClock::default());
        world.insert_resource(SimRng::from_seed(seed));
        world.insert_resource(ObstacleMap::open(
            config.map.width,
            config.map.height,
            config.map.tile_size,
        ));
        world.insert_resource(Weapon::new(&config.weapon));
        world.init_resource::<PlayerBullets>();
        world.init_resource::<PlayerView>();
        world.init_resource::<PlayerDamage>();
        world.init_resource::<WaveState>();
        world.init_resource::<Squads>();
        world.init_resource::<SimEvents>();
        world.init_resource::<DrawList>();

        info!(
            "sim{{f=0 setup seed={} waves={} map={}x{}}}",
            seed,
            config.waves.waves.len(),
            config.map.width,
            config.map.height
        );
        world.insert_resource(config);

        Ok(Self {
            world,
            schedule: build_schedule(),
        })
    }

    /// Advance one tick. Once the run has ended this is a no-op that reports the
    /// final status.
    pub fn step(&mut self, input: &TickInput) -> StepReport {
        if self.status() != RunStatus::Running {
            return self.report(Vec::new(), PlayerDamage::default());
        }

        self.world.insert_resource(*input);
        self.schedule.run(&mut self.world);

        let events = self.world.resource_mut::<SimEvents>().drain();
        let damage = self.world.resource_mut::<PlayerDamage>().take();
        self.report(events, damage)
    }

    fn report(&self, events: Vec<SimEvent>, player_damage: PlayerDamage) -> StepReport {
        let wave_state = self.wave_state();
        StepReport {
            frame: self.world.resource::<FrameCount>().frame,
            phase: wave_state.phase,
            wave_index: wave_state.wave_index,
            status: wave_state.status,
            message: self.message(),
            player_damage,
            events,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.wave_state().status
    }

    pub fn wave_state(&self) -> &WaveState {
        self.world.resource::<WaveState>()
    }

    pub fn config(&self) -> &GameConfig {
        self.world.resource::<GameConfig>()
    }

    pub fn obstacle_map(&self) -> &ObstacleMap {
        self.world.resource::<ObstacleMap>()
    }

    pub fn draw_list(&self) -> &DrawList {
        self.world.resource::<DrawList>()
    }

    pub fn weapon(&self) -> &Weapon {
        self.world.resource::<Weapon>()
    }

    pub fn message(&self) -> Option<String> {
        let now = self.world.resource::<SimClock>().now;
        self.wave_state()
            .message(now, self.config().waves.message_window())
            .map(str::to_string)
    }

    /// Every enemy still in the world, by id.
    pub fn enemies(&mut self) -> Vec<EnemySummary> {
        let mut query = self.world.query::<(Entity, &Enemy, &Position, &Health, &Lifecycle)>();
        let mut enemies: Vec<EnemySummary> = query
            .iter(&self.world)
            .map(|(entity, enemy, position, health, lifecycle)| EnemySummary {
                entity,
                id: enemy.id,
                archetype: enemy.archetype,
                position: position.0,
                health: health.current,
                lifecycle: *lifecycle,
            })
            .collect();
        enemies.sort_by_key(|e| e.id);
        enemies
    }

    /// Apply damage to one enemy from outside the schedule.
    pub fn damage_enemy(&mut self, entity: Entity, amount: f32) -> Option<DamageOutcome> {
        let mut query = self
            .world
            .query::<(&mut Health, &mut Lifecycle, &EnemyTimers, &mut AnimationState)>();
        let (mut health, mut lifecycle, timers, mut animation) = query.get_mut(&mut self.world, entity).ok()?;
        Some(take_damage(amount, &mut health, &mut lifecycle, timers, &mut animation))
    }
}
