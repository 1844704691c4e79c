pub mod board;
pub mod health;
pub mod inventory;
pub mod player;
pub mod pool;
pub mod round;
pub mod settings;
pub mod sse;
pub mod validation;
