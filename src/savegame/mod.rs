//! Level and savegame serialization.
//!
//! - [`node`] – ordered node tree with JSON file I/O
//! - [`level`] – sprite to level node conversion and back
//! - [`save_level`] – the per-level savegame block

pub mod level;
pub mod node;
pub mod save_level;
