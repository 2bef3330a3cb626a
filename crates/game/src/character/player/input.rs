//! Player input and the reference player controller.
//!
//! Polling a keyboard is outside the core. The controller here stands in for the
//! external player component: it turns held keys into movement, owns the
//! authoritative health and applies the damage the core requests.

use bevy::prelude::*;
use tracing::{debug, info};
use utils::{clock::SimClock, frame::FrameCount};

use crate::config::PlayerConfig;
use crate::core::TickInput;
use crate::events::{Diagnostic, SimEvents};

use super::{PlayerSnapshot, PlayerView};

pub const INPUT_UP: u16 = 1 << 0;
pub const INPUT_DOWN: u16 = 1 << 1;
pub const INPUT_LEFT: u16 = 1 << 2;
pub const INPUT_RIGHT: u16 = 1 << 3;

/// Keys held during one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct InputSnapshot {
    pub buttons: u16,
}

impl InputSnapshot {
    pub fn with(mut self, button: u16) -> Self {
        self.buttons |= button;
        self
    }

    pub fn is_held(&self, button: u16) -> bool {
        self.buttons & button != 0
    }

    /// Per-axis direction, y pointing down like screen coordinates.
    /// Opposite keys cancel. Diagonals are not normalized.
    pub fn direction(&self) -> Vec2 {
        let mut direction = Vec2::ZERO;
        if self.is_held(INPUT_RIGHT) {
            direction.x += 1.0;
        }
        if self.is_held(INPUT_LEFT) {
            direction.x -= 1.0;
        }
        if self.is_held(INPUT_UP) {
            direction.y -= 1.0;
        }
        if self.is_held(INPUT_DOWN) {
            direction.y += 1.0;
        }
        direction
    }
}

#[derive(Debug, Clone)]
pub struct PlayerController {
    pub position: Vec2,
    pub size: Vec2,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    bounds: Vec2,
}

impl PlayerController {
    pub fn new(config: &PlayerConfig, bounds: Vec2, start: Vec2) -> Self {
        let size = Vec2::new(config.size.0, config.size.1);
        let mut controller = Self {
            position: start,
            size,
            health: config.max_health,
            max_health: config.max_health,
            speed: config.speed,
            bounds,
        };
        controller.position = controller.clamp(start);
        controller
    }

    fn clamp(&self, position: Vec2) -> Vec2 {
        let half = self.size * 0.5;
        let max = (self.bounds - half).max(half);
        position.clamp(half, max)
    }

    pub fn apply_input(&mut self, input: &InputSnapshot) {
        if self.is_dead() {
            return;
        }
        self.position = self.clamp(self.position + input.direction() * self.speed);
    }

    pub fn apply_damage(&mut self, amount: f32) {
        if amount > 0.0 {
            self.health = (self.health - amount).max(0.0);
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot::new(self.position, self.size, self.health)
    }
}

/// Mirror the step's input into the core: player view and monotonic clock.
pub fn player_input_system(
    frame: Res<FrameCount>,
    input: Res<TickInput>,
    mut player: ResMut<PlayerView>,
    mut clock: ResMut<SimClock>,
    mut events: ResMut<SimEvents>,
) {
    player.update(&input.player);

    let previous = clock.now;
    if !clock.advance_to(input.now) {
        events.diagnose(
            frame.frame,
            Diagnostic::ClockWentBackwards {
                previous,
                received: input.now,
            },
        );
    }

    if player.is_dead() {
        info!("sim{{f={} player_down health={}}}", frame.frame, player.health);
    } else {
        debug!(
            "sim{{f={} player pos=({:.1},{:.1}) health={:.1}}}",
            frame.frame, player.position.x, player.position.y, player.health
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> PlayerController {
        let config = PlayerConfig::default();
        PlayerController::new(&config, Vec2::new(640.0, 480.0), Vec2::new(320.0, 240.0))
    }

    #[test]
    fn keys_move_four_pixels_per_tick() {
        let mut player = controller();
        player.apply_input(&InputSnapshot::default().with(INPUT_RIGHT));
        assert_eq!(player.position, Vec2::new(324.0, 240.0));
        player.apply_input(&InputSnapshot::default().with(INPUT_UP).with(INPUT_LEFT));
        assert_eq!(player.position, Vec2::new(320.0, 236.0));
        player.apply_input(&InputSnapshot::default().with(INPUT_UP).with(INPUT_DOWN));
        assert_eq!(player.position, Vec2::new(320.0, 236.0));
    }

    #[test]
    fn player_stays_inside_bounds() {
        let mut player = controller();
        for _ in 0..500 {
            player.apply_input(&InputSnapshot::default().with(INPUT_LEFT).with(INPUT_DOWN));
        }
        assert_eq!(player.position, Vec2::new(player.size.x / 2.0, 480.0 - player.size.y / 2.0));
    }

    #[test]
    fn damage_is_applied_and_floors_at_zero() {
        let mut player = controller();
        player.apply_damage(30.0);
        assert_eq!(player.health, player.max_health - 30.0);
        player.apply_damage(1000.0);
        assert_eq!(player.health, 0.0);
        assert!(player.is_dead());
        let before = player.position;
        player.apply_input(&InputSnapshot::default().with(INPUT_RIGHT));
        assert_eq!(player.position, before);
    }
}
