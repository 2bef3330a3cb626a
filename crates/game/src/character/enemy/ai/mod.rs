pub mod behavior;
pub mod combat;
pub mod obstacle;
pub mod pathing;
pub mod squad;
pub mod state;

pub use behavior::enemy_behavior_system;
pub use combat::{enemy_contact_damage_system, enemy_projectile_system, take_damage, DamageOutcome};
pub use obstacle::ObstacleMap;
pub use pathing::{enemy_navigation_system, find_path, GridPath, GridPos};
pub use squad::{squad_coordinator_system, Squads, Tactic};
pub use state::{EnemyAction, Lifecycle, MonsterState};
