//! Wave director systems.

use bevy::prelude::*;
use tracing::{debug, info, warn};
use utils::{clock::SimClock, frame::FrameCount, rng::SimRng};

use crate::character::enemy::ai::obstacle::ObstacleMap;
use crate::character::enemy::ai::pathing::patrol_loop;
use crate::character::enemy::ai::squad::Squads;
use crate::character::enemy::ai::state::Lifecycle;
use crate::character::enemy::create::{spawn_enemy, EnemyBundle};
use crate::character::enemy::Enemy;
use crate::character::health::Death;
use crate::character::player::PlayerView;
use crate::config::GameConfig;
use crate::events::{SimEvent, SimEvents};
use crate::weapons::PlayerBullets;

use super::state::{RunStatus, WavePhase, WaveState};
use super::tracking::WaveEnemy;

/// Build the wave's obstacle map around the player and queue its groups.
/// Past the end of the table the run is won instead.
fn start_wave(
    index: usize,
    frame: u32,
    config: &GameConfig,
    now: std::time::Duration,
    player: &PlayerView,
    wave_state: &mut WaveState,
    map: &mut ObstacleMap,
    rng: &mut SimRng,
    squads: &mut Squads,
    events: &mut SimEvents,
) -> bool {
    let Some(spec) = config.waves.waves.get(index) else {
        return false;
    };

    let layout = &config.map;
    let player_cell = ObstacleMap::open(layout.width, layout.height, layout.tile_size).cell_of(player.position);
    *map = ObstacleMap::generate(
        layout.width,
        layout.height,
        layout.tile_size,
        layout.obstacle_density,
        player_cell,
        layout.player_clearance,
        rng,
    );
    squads.reset(rng, &config.squads);
    wave_state.begin_wave(index, spec, config.tick_rate, now, frame);

    info!(
        "sim{{f={} wave_system phase=Spawning wave={} enemies={} blocked={}}}",
        frame,
        index,
        spec.enemy_count(),
        map.blocked_count()
    );
    events.push(SimEvent::WaveStarted {
        wave_index: index,
        message: spec.message.clone(),
    });
    true
}

/// Despawn every enemy (and with them their projectiles) and drop player bullets.
fn teardown(
    commands: &mut Commands,
    enemies: &Query<(Entity, &Enemy)>,
    bullets: &mut PlayerBullets,
    squads: &mut Squads,
) -> usize {
    let mut count = 0;
    for (entity, _) in enemies.iter() {
        commands.entity(entity).despawn();
        count += 1;
    }
    bullets.0.clear();
    squads.clear();
    count
}

/// Wave phase transitions, at most one per tick, plus run end detection.
pub fn wave_state_machine_system(
    mut commands: Commands,
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    clock: Res<SimClock>,
    player: Res<PlayerView>,
    mut wave_state: ResMut<WaveState>,
    mut map: ResMut<ObstacleMap>,
    mut rng: ResMut<SimRng>,
    mut squads: ResMut<Squads>,
    mut bullets: ResMut<PlayerBullets>,
    mut events: ResMut<SimEvents>,
    wave_enemies: Query<&WaveEnemy>,
    enemies: Query<(Entity, &Enemy)>,
) {
    if !wave_state.is_running() {
        return;
    }
    let current_frame = frame.frame;
    let now = clock.now;

    if player.is_dead() {
        let removed = teardown(&mut commands, &enemies, &mut bullets, &mut squads);
        wave_state.end(RunStatus::Defeat, current_frame);
        info!(
            "sim{{f={} run_ended status=Defeat wave={} removed={} killed={}}}",
            current_frame, wave_state.wave_index, removed, wave_state.total_killed
        );
        events.push(SimEvent::RunEnded {
            status: RunStatus::Defeat,
        });
        return;
    }

    match wave_state.phase {
        WavePhase::Idle => {
            let started = start_wave(
                0,
                current_frame,
                &config,
                now,
                &player,
                &mut wave_state,
                &mut map,
                &mut rng,
                &mut squads,
                &mut events,
            );
            if !started {
                wave_state.end(RunStatus::Victory, current_frame);
                info!("sim{{f={} run_ended status=Victory waves=0}}", current_frame);
                events.push(SimEvent::RunEnded {
                    status: RunStatus::Victory,
                });
            }
        }

        WavePhase::Spawning => {
            if wave_state.spawning_done() {
                wave_state.set_phase(WavePhase::Active, current_frame);
                info!(
                    "sim{{f={} wave_system phase=Active wave={} spawned={}}}",
                    current_frame, wave_state.wave_index, wave_state.spawned_this_wave
                );
            }
        }

        WavePhase::Active => {
            let wave_index = wave_state.wave_index;
            let remaining = wave_enemies
                .iter()
                .filter(|w| w.spawned_wave == wave_index)
                .count();
            if remaining == 0 && wave_state.cleared_at.is_none() {
                wave_state.cleared_at = Some(now);
                wave_state.set_phase(WavePhase::Cleared, current_frame);
                info!(
                    "sim{{f={} wave_system phase=Cleared wave={} killed={}}}",
                    current_frame, wave_index, wave_state.wave_killed
                );
                events.push(SimEvent::WaveCleared { wave_index });
            }
        }

        WavePhase::Cleared => {
            wave_state.set_phase(WavePhase::Cooldown, current_frame);
            debug!("sim{{f={} wave_system phase=Cooldown}}", current_frame);
        }

        WavePhase::Cooldown => {
            let cleared_at = wave_state.cleared_at.unwrap_or(now);
            if clock.since(cleared_at) < config.waves.cooldown() {
                return;
            }
            let next = wave_state.wave_index + 1;
            let started = start_wave(
                next,
                current_frame,
                &config,
                now,
                &player,
                &mut wave_state,
                &mut map,
                &mut rng,
                &mut squads,
                &mut events,
            );
            if !started {
                wave_state.wave_index = next;
                wave_state.end(RunStatus::Victory, current_frame);
                teardown(&mut commands, &enemies, &mut bullets, &mut squads);
                info!(
                    "sim{{f={} run_ended status=Victory waves={} killed={}}}",
                    current_frame, next, wave_state.total_killed
                );
                events.push(SimEvent::RunEnded {
                    status: RunStatus::Victory,
                });
            }
        }

        WavePhase::Complete => {}
    }
}

/// Release the pending spawn groups onto random free cells away from the player.
pub fn wave_spawning_system(
    mut commands: Commands,
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    map: Res<ObstacleMap>,
    player: Res<PlayerView>,
    mut wave_state: ResMut<WaveState>,
    mut rng: ResMut<SimRng>,
    mut squads: ResMut<Squads>,
    mut events: ResMut<SimEvents>,
) {
    if wave_state.phase != WavePhase::Spawning || !wave_state.is_running() {
        return;
    }

    let current_frame = frame.frame;
    let wave_index = wave_state.wave_index;
    let player_cell = map.cell_of(player.position);

    let mut batch = Vec::new();
    for group in wave_state.pending.iter_mut() {
        for _ in 0..group.release() {
            batch.push(group.archetype);
        }
    }

    for archetype in batch {
        let Some(cell) = map.random_free_cell(&mut rng, player_cell, config.map.spawn_clearance) else {
            warn!("sim{{f={} wave_spawning no_free_cell archetype={}}}", current_frame, archetype);
            continue;
        };
        let id = wave_state.allocate_id();
        let position = map.cell_center(cell);
        let patrol = patrol_loop(&map, cell, config.map.patrol_reach);
        let bundle = EnemyBundle::new(id, archetype, config.stats_for(archetype), position, patrol, wave_index);
        let entity = spawn_enemy(&mut commands, bundle);
        let (squad, tactic) = squads.assign(entity, &config.squads);
        wave_state.spawned_this_wave += 1;

        info!(
            "sim{{f={} enemy_spawned id={} archetype={} cell={} squad={} tactic={:?}}}",
            current_frame, id, archetype, cell, squad, tactic
        );
        events.push(SimEvent::EnemySpawned { id, archetype, position });
    }
}

/// Record each new death once and count it toward its wave.
pub fn enemy_death_tracking_system(
    mut commands: Commands,
    frame: Res<FrameCount>,
    mut wave_state: ResMut<WaveState>,
    mut events: ResMut<SimEvents>,
    query: Query<(Entity, &Enemy, &Lifecycle, &WaveEnemy), Without<Death>>,
) {
    let mut dying: Vec<_> = query.iter().filter(|(_, _, lifecycle, _)| lifecycle.is_dead()).collect();
    dying.sort_by_key(|(_, enemy, ..)| enemy.id);

    for (entity, enemy, _, wave_enemy) in dying {
        commands.entity(entity).insert(Death { frame: frame.frame });
        if wave_enemy.spawned_wave == wave_state.wave_index {
            wave_state.record_kill();
        }
        info!(
            "sim{{f={} wave_kill id={} archetype={} total={} wave={}}}",
            frame.frame, enemy.id, enemy.archetype, wave_state.total_killed, wave_state.wave_killed
        );
        events.push(SimEvent::EnemyKilled {
            id: enemy.id,
            archetype: enemy.archetype,
        });
    }
}

/// Despawn enemies whose death animation has finished.
pub fn enemy_removal_system(
    mut commands: Commands,
    frame: Res<FrameCount>,
    mut squads: ResMut<Squads>,
    mut events: ResMut<SimEvents>,
    query: Query<(Entity, &Enemy, &Lifecycle)>,
) {
    let mut removable: Vec<_> = query.iter().filter(|(_, _, lifecycle)| lifecycle.is_removable()).collect();
    removable.sort_by_key(|(_, enemy, _)| enemy.id);

    for (entity, enemy, _) in removable {
        commands.entity(entity).despawn();
        squads.remove(entity);
        debug!("sim{{f={} enemy_removed id={}}}", frame.frame, enemy.id);
        events.push(SimEvent::EnemyRemoved {
            id: enemy.id,
            archetype: enemy.archetype,
        });
    }
}
