//! Sprite model of a 2D platform engine.
//!
//! This crate exposes the sprite entity with its geometry, collision queue
//! and massivity, the per-step systems that drive it, and the level and
//! savegame serialization, for use by the demo binary and integration tests.

pub mod components;
pub mod events;
pub mod resources;
pub mod savegame;
pub mod systems;
