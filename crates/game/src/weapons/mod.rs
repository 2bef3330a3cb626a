pub mod projectile;

use std::time::Duration;

use animation::AnimationState;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, span, Level};
use utils::{clock::SimClock, frame::FrameCount};

use crate::character::enemy::ai::combat::{report_degenerate, take_damage, DamageOutcome};
use crate::character::enemy::ai::obstacle::ObstacleMap;
use crate::character::enemy::ai::state::{EnemyTimers, Lifecycle};
use crate::character::enemy::{Enemy, Position};
use crate::character::health::Health;
use crate::character::player::PlayerView;
use crate::collider::Collider;
use crate::events::SimEvents;

use self::projectile::{Projectile, ProjectileOwner, ProjectileSpec};

// WEAPON CONFIG
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Shots per second, gated on the wall clock.
    pub fire_rate: f32,
    pub bullet: ProjectileSpec,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            fire_rate: 5.0,
            bullet: ProjectileSpec {
                speed: 10.0,
                damage: 25.0,
                max_range: 2000.0,
                max_ticks: 240,
                size: (6.0, 6.0),
                ..Default::default()
            },
        }
    }
}

// WEAPON STATE
/// The player's auto-aim weapon.
#[derive(Resource, Debug, Clone)]
pub struct Weapon {
    pub fire_rate: f32,
    interval: Duration,
    pub last_shot: Option<Duration>,
    /// Unit direction the weapon faces.
    pub aim: Vec2,
    pub target: Option<Entity>,
    pub bullet: ProjectileSpec,
    pub shots_fired: u32,
}

impl Default for Weapon {
    fn default() -> Self {
        Self::new(&WeaponConfig::default())
    }
}

impl Weapon {
    pub fn new(config: &WeaponConfig) -> Self {
        let interval = if config.fire_rate > 0.0 {
            Duration::try_from_secs_f64(1.0 / config.fire_rate as f64).unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };
        Self {
            fire_rate: config.fire_rate,
            interval,
            last_shot: None,
            aim: Vec2::X,
            target: None,
            bullet: config.bullet,
            shots_fired: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// At least `1 / fire_rate` seconds since the last accepted shot.
    pub fn can_shoot(&self, now: Duration) -> bool {
        match self.last_shot {
            None => self.interval != Duration::MAX,
            Some(last) => now.saturating_sub(last) >= self.interval,
        }
    }

    pub fn record_shot(&mut self, now: Duration) {
        self.last_shot = Some(now);
        self.shots_fired += 1;
    }
}

/// Bullets in flight, fired by the player.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerBullets(pub Vec<Projectile>);

/// Closest candidate to `origin`. Equal distances go to the lowest id.
pub fn nearest_target(origin: Vec2, candidates: impl Iterator<Item = (Entity, u32, Vec2)>) -> Option<(Entity, Vec2)> {
    candidates
        .map(|(entity, id, position)| (origin.distance_squared(position), id, entity, position))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, _, entity, position)| (entity, position))
}

// WEAPON SYSTEM
/// Move bullets and resolve their hits, then aim at the nearest living enemy and
/// fire when the rate allows.
pub fn player_weapon_system(
    frame: Res<FrameCount>,
    clock: Res<SimClock>,
    map: Res<ObstacleMap>,
    player: Res<PlayerView>,
    mut weapon: ResMut<Weapon>,
    mut bullets: ResMut<PlayerBullets>,
    mut events: ResMut<SimEvents>,
    mut query: Query<(
        Entity,
        &Enemy,
        &Position,
        &Collider,
        &mut Health,
        &mut Lifecycle,
        &EnemyTimers,
        &mut AnimationState,
    )>,
) {
    let system_span = span!(Level::INFO, "sim", f = frame.frame, s = "player_weapon");
    let _enter = system_span.enter();

    let mut enemies: Vec<_> = query.iter_mut().collect();
    enemies.sort_by_key(|(_, enemy, ..)| enemy.id);

    bullets.0.retain_mut(|bullet| {
        bullet.advance(None);
        let hit = enemies.iter_mut().find(|(_, _, position, collider, _, lifecycle, ..)| {
            lifecycle.is_living() && bullet.hits(position.0, collider)
        });
        if let Some((_, enemy, _, _, health, lifecycle, timers, animation)) = hit {
            let outcome = take_damage(bullet.damage, health, lifecycle, timers, animation);
            match outcome {
                DamageOutcome::Killed => info!("sim{{f={} enemy_killed id={} by=bullet}}", frame.frame, enemy.id),
                _ => debug!(
                    "sim{{f={} bullet_hit enemy={} outcome={:?} health={:.1}}}",
                    frame.frame, enemy.id, outcome, health.current
                ),
            }
            return false;
        }
        map.contains_position(bullet.position) && bullet.ticks_alive <= bullet.max_ticks
    });

    let nearest = nearest_target(
        player.position,
        enemies
            .iter()
            .filter(|(.., lifecycle, _, _)| lifecycle.is_living())
            .map(|(entity, enemy, position, ..)| (*entity, enemy.id, position.0)),
    );

    let Some((target, target_position)) = nearest else {
        weapon.target = None;
        return;
    };
    weapon.target = Some(target);
    if let Some(aim) = (target_position - player.position).try_normalize() {
        weapon.aim = aim;
    }

    if weapon.can_shoot(clock.now) {
        let (bullet, degenerate) =
            Projectile::aimed(player.position, target_position, &weapon.bullet, ProjectileOwner::Player);
        if degenerate {
            let id = enemies
                .iter()
                .find(|(entity, ..)| *entity == target)
                .map(|(_, enemy, ..)| enemy.id);
            report_degenerate(&mut events, frame.frame, id, "player_weapon");
        }
        bullets.0.push(bullet);
        weapon.record_shot(clock.now);
        debug!(
            "sim{{f={} player_shot n={} aim=({:.2},{:.2})}}",
            frame.frame, weapon.shots_fired, weapon.aim.x, weapon.aim.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick_time(tick: u64) -> Duration {
        Duration::from_nanos(tick * 1_000_000_000 / 60)
    }

    #[test]
    fn five_per_second_polled_at_sixty_hertz() {
        let mut weapon = Weapon::new(&WeaponConfig::default());
        let mut shots = Vec::new();
        for tick in 0..600u64 {
            let now = tick_time(tick);
            if weapon.can_shoot(now) {
                weapon.record_shot(now);
                shots.push(tick);
            }
        }
        for gap in shots.windows(2).map(|w| w[1] - w[0]) {
            assert!((11..=13).contains(&gap), "gap {gap}");
        }
        for start in 0..540u64 {
            let in_window = shots.iter().filter(|t| (start..start + 60).contains(*t)).count();
            assert!(in_window <= 5, "{in_window} shots from tick {start}");
        }
        assert!(shots.len() >= 49);
    }

    #[test]
    fn first_shot_is_immediate() {
        let weapon = Weapon::new(&WeaponConfig::default());
        assert!(weapon.can_shoot(Duration::ZERO));
        assert_eq!(weapon.interval(), Duration::from_millis(200));
    }

    #[test]
    fn nearest_target_breaks_ties_by_id() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let c = world.spawn_empty().id();
        let candidates = vec![
            (a, 7, Vec2::new(10.0, 0.0)),
            (b, 3, Vec2::new(0.0, 10.0)),
            (c, 1, Vec2::new(50.0, 0.0)),
        ];
        assert_eq!(
            nearest_target(Vec2::ZERO, candidates.into_iter()),
            Some((b, Vec2::new(0.0, 10.0)))
        );
        assert_eq!(nearest_target(Vec2::ZERO, std::iter::empty()), None);
    }
}
