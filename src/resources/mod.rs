//! Long-lived state shared by the sprites of a running level.
//!
//! Overview
//! - `camera` – top-left corner of the visible part of the level
//! - `context` – per-step simulation context handed to every sprite operation
//! - `gameconfig` – INI-backed engine configuration
//! - `imagestore` – loaded images keyed by path, with a placeholder fallback
//! - `spriteregistry` – processing order of the level's sprites and world-level sprite operations
pub mod camera;
pub mod context;
pub mod gameconfig;
pub mod imagestore;
pub mod spriteregistry;
