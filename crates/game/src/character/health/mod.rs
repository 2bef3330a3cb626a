use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }
}

/// Marks an enemy whose kill has been recorded. Inserted once, on the tick it died.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Death {
    pub frame: u32,
}

/// Damage the core requests against the player during one step.
/// The player's health is owned outside the core, which only accumulates requests.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerDamage {
    pub total: f32,
    pub hit_count: u32,
}

impl PlayerDamage {
    pub fn request(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.total += amount;
        self.hit_count += 1;
    }

    /// Hand over the accumulated requests and start a fresh step.
    pub fn take(&mut self) -> PlayerDamage {
        std::mem::take(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_requests_accumulate_until_taken() {
        let mut damage = PlayerDamage::default();
        damage.request(2.5);
        damage.request(0.0);
        damage.request(1.5);
        let taken = damage.take();
        assert_eq!(taken.total, 4.0);
        assert_eq!(taken.hit_count, 2);
        assert_eq!(damage, PlayerDamage::default());
    }
}
