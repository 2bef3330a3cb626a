//! Enemy state machine
//!
//! One authoritative lifecycle per enemy:
//!
//! ```text
//! Alive(MonsterState) ⇄ TakingHit
//!        │                 │
//!        └──────► Dead { animation_completed } ──► removed
//! ```
//!
//! `MonsterState` is the tactical sub-state chosen by the archetype behavior while
//! alive. Dead is terminal; the entity is despawned once its death clip completes.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Tactical posture while alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MonsterState {
    #[default]
    Idle,
    Chase,
    Attack,
    Retreat,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Alive(MonsterState),
    /// Playing the one-shot hit reaction; all other behavior is suspended.
    TakingHit,
    Dead { animation_completed: bool },
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::Alive(MonsterState::Idle)
    }
}

impl Lifecycle {
    pub fn is_dead(&self) -> bool {
        matches!(self, Lifecycle::Dead { .. })
    }

    /// Alive or reacting to a hit: can still be targeted and damaged.
    pub fn is_living(&self) -> bool {
        !self.is_dead()
    }

    pub fn is_removable(&self) -> bool {
        matches!(self, Lifecycle::Dead { animation_completed: true })
    }

    pub fn monster_state(&self) -> Option<MonsterState> {
        match self {
            Lifecycle::Alive(state) => Some(*state),
            _ => None,
        }
    }
}

/// Action currently shown, one per animation key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnemyAction {
    #[default]
    Idle,
    Run,
    Attack,
    TakeHit,
    Death,
    Shield,
    Dash,
    Teleport,
    Cast,
}

impl EnemyAction {
    pub fn animation_key(&self) -> &'static str {
        match self {
            EnemyAction::Idle => "idle",
            EnemyAction::Run => "run",
            EnemyAction::Attack => "attack",
            EnemyAction::TakeHit => "takehit",
            EnemyAction::Death => "death",
            EnemyAction::Shield => "shield",
            EnemyAction::Dash => "dash",
            EnemyAction::Teleport => "teleport",
            EnemyAction::Cast => "cast",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveDash {
    /// Unit direction locked when the dash started.
    pub direction: Vec2,
    pub remaining: u32,
}

/// Frame-count timers of one enemy. Every field counts down once per alive tick.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct EnemyTimers {
    pub ranged_cooldown: u32,
    pub shield_remaining: u32,
    pub shield_cooldown: u32,
    pub dash: Option<ActiveDash>,
    pub dash_cooldown: u32,
    pub teleport_cooldown: u32,
    pub grace: u32,
}

impl EnemyTimers {
    /// Dashing, shielded or inside a post-teleport grace window.
    pub fn is_invulnerable(&self) -> bool {
        self.shield_remaining > 0 || self.dash.is_some() || self.grace > 0
    }

    pub fn is_shielded(&self) -> bool {
        self.shield_remaining > 0
    }

    /// Count every timer down by one tick. An expiring shield starts its cooldown.
    pub fn tick(&mut self, shield_cooldown_ticks: u32) {
        self.ranged_cooldown = self.ranged_cooldown.saturating_sub(1);
        self.dash_cooldown = self.dash_cooldown.saturating_sub(1);
        self.teleport_cooldown = self.teleport_cooldown.saturating_sub(1);
        self.grace = self.grace.saturating_sub(1);
        self.shield_cooldown = self.shield_cooldown.saturating_sub(1);

        if self.shield_remaining > 0 {
            self.shield_remaining -= 1;
            if self.shield_remaining == 0 {
                self.shield_cooldown = shield_cooldown_ticks;
            }
        }

        if let Some(dash) = self.dash.as_mut() {
            dash.remaining = dash.remaining.saturating_sub(1);
            if dash.remaining == 0 {
                self.dash = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_expiry_starts_cooldown() {
        let mut timers = EnemyTimers {
            shield_remaining: 2,
            ..Default::default()
        };
        timers.tick(180);
        assert!(timers.is_invulnerable());
        timers.tick(180);
        assert!(!timers.is_invulnerable());
        assert_eq!(timers.shield_cooldown, 180);
    }

    #[test]
    fn dash_ends_after_its_ticks() {
        let mut timers = EnemyTimers {
            dash: Some(ActiveDash {
                direction: Vec2::X,
                remaining: 1,
            }),
            ..Default::default()
        };
        assert!(timers.is_invulnerable());
        timers.tick(0);
        assert!(timers.dash.is_none());
        assert!(!timers.is_invulnerable());
    }

    #[test]
    fn lifecycle_queries() {
        assert!(Lifecycle::TakingHit.is_living());
        assert!(!Lifecycle::Dead { animation_completed: false }.is_removable());
        assert!(Lifecycle::Dead { animation_completed: true }.is_removable());
        assert_eq!(Lifecycle::default().monster_state(), Some(MonsterState::Idle));
    }
}
