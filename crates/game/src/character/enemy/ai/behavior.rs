//! Enemy behavior loop.
//!
//! Each tick a living enemy perceives the player, the archetype dispatch in
//! [`decide`] picks a posture, an action and a movement, and the system applies
//! them. Hit reactions and deaths only play their one-shot clips.

use animation::{AnimationMapConfig, AnimationState, AnimationTick, FacingDirection, PlayMode};
use bevy::prelude::*;
use tracing::{debug, info, span, Level};
use utils::{frame::FrameCount, rng::SimRng};

use crate::character::enemy::archetype::{
    Archetype, ArchetypeStats, MovementType, TeleportAbility, TeleportDestination, TeleportTrigger,
};
use crate::character::enemy::create::EnemyProjectiles;
use crate::character::enemy::{Enemy, Position};
use crate::character::health::Health;
use crate::character::player::PlayerView;
use crate::config::GameConfig;
use crate::events::SimEvents;

use super::combat::{fire_ranged, report_degenerate};
use super::obstacle::ObstacleMap;
use super::pathing::EnemyPath;
use super::state::{ActiveDash, EnemyAction, EnemyTimers, Lifecycle, MonsterState};

/// Attempts at finding a free landing cell before a teleport is skipped.
const TELEPORT_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Movement {
    Hold,
    /// Toward the navigation target.
    Toward,
    /// Straight away from the player.
    Away,
    /// Locked-direction charge at the dash speed.
    Dash { direction: Vec2, speed: f32 },
    /// Instant relocation.
    Teleport(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub state: MonsterState,
    pub action: EnemyAction,
    pub movement: Movement,
    pub fire: bool,
}

impl Decision {
    fn new(state: MonsterState, action: EnemyAction, movement: Movement) -> Self {
        Self {
            state,
            action,
            movement,
            fire: false,
        }
    }
}

/// What an enemy knows about the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    pub position: Vec2,
    pub player: Vec2,
    pub distance: f32,
    /// Unit vector toward the player, zero when standing on it.
    pub to_player: Vec2,
    pub line_of_sight: bool,
}

impl Perception {
    pub fn new(position: Vec2, player: Vec2, line_of_sight: bool) -> Self {
        Self {
            position,
            player,
            distance: position.distance(player),
            to_player: (player - position).try_normalize().unwrap_or(Vec2::ZERO),
            line_of_sight,
        }
    }
}

/// Run, idle or attack depending on the distance thresholds. The enemy keeps
/// closing in until it is inside its acceptance radius.
fn melee(stats: &ArchetypeStats, sight: &Perception) -> Decision {
    if sight.distance > stats.run_threshold {
        Decision::new(MonsterState::Chase, EnemyAction::Run, Movement::Toward)
    } else if sight.distance > stats.acceptance_radius {
        Decision::new(MonsterState::Chase, EnemyAction::Idle, Movement::Toward)
    } else {
        Decision::new(MonsterState::Attack, EnemyAction::Attack, Movement::Hold)
    }
}

/// Melee posture plus a shot when in range, in sight and reloaded.
fn ranged(stats: &ArchetypeStats, timers: &EnemyTimers, sight: &Perception, shot_action: EnemyAction) -> Decision {
    let mut decision = melee(stats, sight);
    let Some(attack) = &stats.ranged else {
        return decision;
    };
    if sight.line_of_sight && sight.distance <= attack.range && timers.ranged_cooldown == 0 {
        decision.state = MonsterState::Attack;
        decision.action = shot_action;
        decision.fire = true;
    } else if decision.action == EnemyAction::Attack {
        decision.action = EnemyAction::Idle;
        if !sight.line_of_sight {
            // Hidden inside the acceptance radius: keep closing until the player is visible.
            decision.state = MonsterState::Chase;
            decision.movement = Movement::Toward;
        }
    }
    decision
}

fn try_raise_shield(stats: &ArchetypeStats, timers: &mut EnemyTimers, health: &Health, rng: &mut SimRng) -> bool {
    let Some(shield) = &stats.shield else {
        return false;
    };
    if health.current >= shield.health_below || timers.shield_cooldown > 0 {
        return false;
    }
    if rng.chance(shield.chance_per_tick) {
        timers.shield_remaining = shield.duration_ticks;
        return true;
    }
    false
}

fn try_dash(stats: &ArchetypeStats, timers: &mut EnemyTimers, sight: &Perception) -> Option<Movement> {
    let dash = stats.dash.as_ref()?;
    if timers.dash_cooldown > 0 || sight.distance <= dash.min_distance || sight.to_player == Vec2::ZERO {
        return None;
    }
    timers.dash = Some(ActiveDash {
        direction: sight.to_player,
        remaining: dash.duration_ticks,
    });
    timers.dash_cooldown = dash.cooldown_ticks;
    Some(Movement::Dash {
        direction: sight.to_player,
        speed: dash.speed,
    })
}

fn teleport_ready(teleport: &TeleportAbility, timers: &EnemyTimers, health: &Health) -> bool {
    timers.teleport_cooldown == 0
        && match teleport.trigger {
            TeleportTrigger::Interval => true,
            TeleportTrigger::LowHealth { fraction } => health.fraction() < fraction,
        }
}

/// Landing point for a teleport, `None` when no free cell was found.
pub fn teleport_destination(
    destination: TeleportDestination,
    movement: MovementType,
    sight: &Perception,
    map: &ObstacleMap,
    rng: &mut SimRng,
) -> Option<Vec2> {
    let lands = |point: Vec2| movement == MovementType::Flying || map.is_free(map.cell_of(point));
    match destination {
        TeleportDestination::AwayFromPlayer { distance } => {
            let away = if sight.to_player == Vec2::ZERO {
                Vec2::X
            } else {
                -sight.to_player
            };
            let point = map.clamp_position(sight.player + away * distance);
            lands(point).then_some(point)
        }
        TeleportDestination::NearPlayer { radius } => (0..TELEPORT_ATTEMPTS).find_map(|_| {
            let offset = Vec2::from_angle(rng.next_angle()) * rng.next_f32() * radius;
            let point = map.clamp_position(sight.player + offset);
            lands(point).then_some(point)
        }),
    }
}

fn try_teleport(
    stats: &ArchetypeStats,
    timers: &mut EnemyTimers,
    health: &Health,
    sight: &Perception,
    map: &ObstacleMap,
    rng: &mut SimRng,
) -> Option<Movement> {
    let teleport = stats.teleport.as_ref()?;
    if !teleport_ready(teleport, timers, health) {
        return None;
    }
    let point = teleport_destination(teleport.destination, stats.movement, sight, map, rng)?;
    timers.teleport_cooldown = teleport.cooldown_ticks;
    timers.grace = teleport.grace_ticks;
    Some(Movement::Teleport(point))
}

/// Archetype dispatch. Starting a shield, dash or teleport arms the matching timers.
pub fn decide(
    archetype: Archetype,
    stats: &ArchetypeStats,
    timers: &mut EnemyTimers,
    health: &Health,
    sight: &Perception,
    map: &ObstacleMap,
    rng: &mut SimRng,
) -> Decision {
    if let Some(dash) = timers.dash {
        let speed = stats.dash.as_ref().map_or(stats.speed, |d| d.speed);
        return Decision::new(
            MonsterState::Chase,
            EnemyAction::Dash,
            Movement::Dash {
                direction: dash.direction,
                speed,
            },
        );
    }

    match archetype {
        Archetype::Goblin | Archetype::Mushroom => melee(stats, sight),
        Archetype::Skeleton => {
            if timers.is_shielded() || try_raise_shield(stats, timers, health, rng) {
                Decision::new(MonsterState::Idle, EnemyAction::Shield, Movement::Hold)
            } else {
                melee(stats, sight)
            }
        }
        Archetype::FlyingEye => ranged(stats, timers, sight, EnemyAction::Attack),
        Archetype::EvilWizard => {
            let too_close = stats.retreat_distance.is_some_and(|r| sight.distance < r);
            let mut decision = ranged(stats, timers, sight, EnemyAction::Cast);
            if too_close {
                decision.state = MonsterState::Retreat;
                decision.movement = Movement::Away;
                if !decision.fire {
                    decision.action = EnemyAction::Run;
                }
            }
            decision
        }
        Archetype::BigFlyingEye => {
            if let Some(movement) = try_teleport(stats, timers, health, sight, map, rng) {
                return Decision::new(MonsterState::Retreat, EnemyAction::Teleport, movement);
            }
            if let Some(movement) = try_dash(stats, timers, sight) {
                return Decision::new(MonsterState::Chase, EnemyAction::Dash, movement);
            }
            ranged(stats, timers, sight, EnemyAction::Attack)
        }
        Archetype::DashingGoblin => match try_dash(stats, timers, sight) {
            Some(movement) => Decision::new(MonsterState::Chase, EnemyAction::Dash, movement),
            None => melee(stats, sight),
        },
        Archetype::TeleportingMushroom => match try_teleport(stats, timers, health, sight, map, rng) {
            Some(movement) => Decision::new(MonsterState::Chase, EnemyAction::Teleport, movement),
            None => melee(stats, sight),
        },
    }
}

/// One step of at most `speed` from `from` toward `to`.
pub fn step_toward(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let offset = to - from;
    if offset.length() <= speed {
        offset
    } else {
        offset.normalize_or_zero() * speed
    }
}

/// Ground movement: a blocked step slides along whichever single axis is free.
pub fn move_ground(map: &ObstacleMap, position: Vec2, delta: Vec2) -> Vec2 {
    let free = |p: Vec2| map.is_free(map.raw_cell_of(p));
    [delta, Vec2::new(delta.x, 0.0), Vec2::new(0.0, delta.y)]
        .into_iter()
        .map(|d| position + d)
        .find(|p| free(*p))
        .unwrap_or(position)
}

fn clip_len(animations: Option<&AnimationMapConfig>, action: &str, fallback: usize) -> usize {
    animations.map_or(fallback.max(1), |a| a.clip_len_or(action, fallback))
}

fn frame_duration(animations: Option<&AnimationMapConfig>) -> u32 {
    animations.map_or(AnimationMapConfig::default().frame_duration, |a| a.frame_duration)
}

pub fn enemy_behavior_system(
    frame: Res<FrameCount>,
    config: Res<GameConfig>,
    map: Res<ObstacleMap>,
    player: Res<PlayerView>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<SimEvents>,
    mut query: Query<(
        &Enemy,
        &mut Position,
        &Health,
        &ArchetypeStats,
        &mut Lifecycle,
        &mut EnemyTimers,
        &mut AnimationState,
        &mut FacingDirection,
        &mut EnemyPath,
        &mut EnemyProjectiles,
    )>,
) {
    let system_span = span!(Level::INFO, "sim", f = frame.frame, s = "enemy_behavior");
    let _enter = system_span.enter();

    let mut enemies: Vec<_> = query.iter_mut().collect();
    enemies.sort_by_key(|(enemy, ..)| enemy.id);

    for (
        enemy,
        mut position,
        health,
        stats,
        mut lifecycle,
        mut timers,
        mut animation,
        mut facing,
        mut path,
        mut projectiles,
    ) in enemies
    {
        let animations = config.animations.get(&enemy.archetype);
        let duration = frame_duration(animations);

        match *lifecycle {
            Lifecycle::Dead {
                animation_completed: true,
            } => continue,
            Lifecycle::Dead {
                animation_completed: false,
            } => {
                let key = EnemyAction::Death.animation_key();
                animation.set_action(key);
                let len = clip_len(animations, key, config.fallback_clip_frames);
                if animation.advance(len, duration, PlayMode::Once) == AnimationTick::Finished {
                    *lifecycle = Lifecycle::Dead {
                        animation_completed: true,
                    };
                    debug!("sim{{f={} death_animation_done enemy={}}}", frame.frame, enemy.id);
                }
                continue;
            }
            Lifecycle::TakingHit => {
                let key = EnemyAction::TakeHit.animation_key();
                animation.set_action(key);
                let len = clip_len(animations, key, config.fallback_clip_frames);
                if animation.advance(len, duration, PlayMode::Once) == AnimationTick::Finished {
                    *lifecycle = Lifecycle::Alive(MonsterState::Idle);
                }
                continue;
            }
            Lifecycle::Alive(_) => {}
        }

        let shield_cooldown = stats.shield.as_ref().map_or(0, |s| s.cooldown_ticks);
        timers.tick(shield_cooldown);

        let sight = Perception::new(position.0, player.position, path.has_line_of_sight);
        let decision = decide(enemy.archetype, stats, &mut timers, health, &sight, &map, &mut rng);

        let before = position.0;
        let next = match decision.movement {
            Movement::Hold => before,
            Movement::Toward => {
                let goal = match stats.movement {
                    MovementType::Ground => path.steer_target(&map, player.position),
                    MovementType::Flying => path.squad_waypoint.unwrap_or(player.position),
                };
                let delta = step_toward(before, goal, stats.speed);
                match stats.movement {
                    MovementType::Ground => move_ground(&map, before, delta),
                    MovementType::Flying => map.clamp_position(before + delta),
                }
            }
            Movement::Away => {
                if sight.to_player == Vec2::ZERO {
                    report_degenerate(&mut events, frame.frame, Some(enemy.id), "retreat");
                    before
                } else {
                    let delta = -sight.to_player * stats.speed;
                    match stats.movement {
                        MovementType::Ground => move_ground(&map, before, delta),
                        MovementType::Flying => map.clamp_position(before + delta),
                    }
                }
            }
            Movement::Dash { direction, speed } => {
                let delta = direction * speed;
                match stats.movement {
                    MovementType::Ground => move_ground(&map, before, delta),
                    MovementType::Flying => map.clamp_position(before + delta),
                }
            }
            Movement::Teleport(point) => {
                info!(
                    "sim{{f={} teleport enemy={} from=({:.0},{:.0}) to=({:.0},{:.0})}}",
                    frame.frame, enemy.id, before.x, before.y, point.x, point.y
                );
                point
            }
        };
        if next != before {
            position.0 = next;
        }

        let dx = if next.x != before.x { next.x - before.x } else { sight.to_player.x };
        let turned = FacingDirection::from_horizontal(dx, *facing);
        if turned != *facing {
            *facing = turned;
        }

        *lifecycle = Lifecycle::Alive(decision.state);
        let key = decision.action.animation_key();
        animation.set_action(key);
        animation.advance(clip_len(animations, key, config.fallback_clip_frames), duration, PlayMode::Loop);

        if decision.fire {
            if let Some(attack) = &stats.ranged {
                let (shots, degenerate) = fire_ranged(attack, position.0, player.position, player.velocity);
                if degenerate {
                    report_degenerate(&mut events, frame.frame, Some(enemy.id), "enemy_shot");
                }
                debug!(
                    "sim{{f={} enemy_fire enemy={} shots={} pattern={:?}}}",
                    frame.frame,
                    enemy.id,
                    shots.len(),
                    attack.pattern
                );
                projectiles.0.extend(shots);
                timers.ranged_cooldown = attack.cooldown_ticks;
            }
        }
    }
}
