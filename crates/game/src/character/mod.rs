pub mod enemy;
pub mod health;
pub mod player;
