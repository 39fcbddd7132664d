//! ECS systems that operate on the registry each tick.
//!
//! Systems are free functions over `&mut Registry` (or `&Registry` for
//! read-only). They do not own state; all state lives in components.

pub mod drone_ai;
pub mod movement;
pub mod projectiles;
pub mod snapshot;
pub mod spawner;
pub mod weapons;
