//! Scripted player for headless runs: kites away from the horde and drifts back
//! to the middle of the map when nothing is close.

use bevy::prelude::*;
use game::character::enemy::ai::state::Lifecycle;
use game::character::player::input::{InputSnapshot, INPUT_DOWN, INPUT_LEFT, INPUT_RIGHT, INPUT_UP};
use game::core::EnemySummary;

const DANGER_RADIUS: f32 = 220.0;
const HOME_SLACK: f32 = 64.0;
const AXIS_DEADZONE: f32 = 0.35;

pub struct Pilot {
    home: Vec2,
}

impl Pilot {
    pub fn new(world_size: Vec2) -> Self {
        Self {
            home: world_size * 0.5,
        }
    }

    pub fn steer(&self, player: Vec2, enemies: &[EnemySummary]) -> InputSnapshot {
        let mut push = Vec2::ZERO;
        for enemy in enemies.iter().filter(|e| matches!(e.lifecycle, Lifecycle::Alive(_))) {
            let away = player - enemy.position;
            let distance = away.length();
            if distance < DANGER_RADIUS && distance > f32::EPSILON {
                push += away / (distance * distance) * DANGER_RADIUS;
            }
        }

        let to_home = self.home - player;
        if to_home.length() > HOME_SLACK {
            push += to_home.normalize_or_zero() * 0.5;
        }

        keys_for(push.normalize_or_zero())
    }
}

/// Keys for a desired direction, y pointing down.
fn keys_for(direction: Vec2) -> InputSnapshot {
    let mut input = InputSnapshot::default();
    if direction.x > AXIS_DEADZONE {
        input = input.with(INPUT_RIGHT);
    } else if direction.x < -AXIS_DEADZONE {
        input = input.with(INPUT_LEFT);
    }
    if direction.y > AXIS_DEADZONE {
        input = input.with(INPUT_DOWN);
    } else if direction.y < -AXIS_DEADZONE {
        input = input.with(INPUT_UP);
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::entity::Entity;
    use game::character::enemy::ai::state::MonsterState;
    use game::character::enemy::archetype::Archetype;

    fn goblin(position: Vec2) -> EnemySummary {
        EnemySummary {
            entity: Entity::PLACEHOLDER,
            id: 0,
            archetype: Archetype::Goblin,
            position,
            health: 10.0,
            lifecycle: Lifecycle::Alive(MonsterState::Chase),
        }
    }

    #[test]
    fn runs_away_from_a_close_enemy() {
        let pilot = Pilot::new(Vec2::new(1280.0, 960.0));
        let input = pilot.steer(Vec2::new(640.0, 480.0), &[goblin(Vec2::new(700.0, 480.0))]);
        assert!(input.is_held(INPUT_LEFT));
        assert!(!input.is_held(INPUT_RIGHT));
    }

    #[test]
    fn idles_at_home_when_alone() {
        let pilot = Pilot::new(Vec2::new(1280.0, 960.0));
        assert_eq!(pilot.steer(Vec2::new(650.0, 470.0), &[]), InputSnapshot::default());
        assert!(pilot.steer(Vec2::new(100.0, 480.0), &[]).is_held(INPUT_RIGHT));
    }
}
