mod pilot;

use std::time::{Duration, Instant};

use game::args::{get_args, RunArgs};
use game::character::player::input::PlayerController;
use game::events::SimEvent;
use game::waves::RunStatus;
use game::{GameConfig, Simulation, TickInput};
use serde::Serialize;
use tracing::{info, warn};
use utils::clock::{ClockSource, FixedStepClock, InstantClock};
use utils::logs::setup_logging;

use pilot::Pilot;

#[derive(Debug, Serialize)]
struct RunSummary {
    seed: u64,
    status: RunStatus,
    ticks: u32,
    waves_reached: usize,
    total_killed: u32,
    shots_fired: u32,
    player_health: f32,
    damage_taken: f32,
    diagnostics: usize,
    elapsed_ms: u128,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = get_args();

    let _logging_guard = match setup_logging(Some(args.log_suffix.clone())) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("logging disabled: {}", e);
            None
        }
    };

    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let summary = run(config, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{:?} after {} ticks: wave {}, {} killed, {} shots, player at {:.1} hp",
            summary.status,
            summary.ticks,
            summary.waves_reached,
            summary.total_killed,
            summary.shots_fired,
            summary.player_health
        );
    }
    Ok(())
}

fn run(config: GameConfig, args: &RunArgs) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let started = Instant::now();
    let world_size = config.map.world_size();
    let frame_time = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);
    let wave_count = config.waves.waves.len();

    let mut player = PlayerController::new(&config.player, world_size, world_size * 0.5);
    let mut clock: Box<dyn ClockSource> = if args.realtime {
        Box::new(InstantClock::start())
    } else {
        Box::new(FixedStepClock::new(config.tick_rate))
    };
    let pilot = Pilot::new(world_size);

    let mut sim = Simulation::new(config, args.seed)?;
    info!("run start seed={} max_ticks={} realtime={}", args.seed, args.max_ticks, args.realtime);

    let mut damage_taken = 0.0;
    let mut diagnostics = 0;
    let mut ticks = 0;

    while ticks < args.max_ticks && sim.status() == RunStatus::Running {
        let tick_started = Instant::now();

        let input = pilot.steer(player.position, &sim.enemies());
        player.apply_input(&input);

        let report = sim.step(&TickInput {
            player: player.snapshot(),
            now: clock.now(),
        });
        ticks = report.frame;

        player.apply_damage(report.player_damage.total);
        damage_taken += report.player_damage.total;

        for event in &report.events {
            match event {
                SimEvent::WaveStarted { wave_index, message } => {
                    info!("wave {} started: {}", wave_index + 1, message)
                }
                SimEvent::WaveCleared { wave_index } => info!("wave {} cleared", wave_index + 1),
                SimEvent::RunEnded { status } => info!("run ended: {:?}", status),
                SimEvent::Diagnostic(_) => diagnostics += 1,
                _ => {}
            }
        }

        if args.realtime {
            if let Some(rest) = frame_time.checked_sub(tick_started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
    }

    if sim.status() == RunStatus::Running {
        warn!("run stopped at the tick limit ({})", args.max_ticks);
    }

    let wave_state = sim.wave_state();
    Ok(RunSummary {
        seed: args.seed,
        status: wave_state.status,
        ticks,
        waves_reached: (wave_state.wave_index + 1).min(wave_count),
        total_killed: wave_state.total_killed,
        shots_fired: sim.weapon().shots_fired,
        player_health: player.health,
        damage_taken,
        diagnostics,
        elapsed_ms: started.elapsed().as_millis(),
    })
}
