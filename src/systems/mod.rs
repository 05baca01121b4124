//! Per-step systems over the sprites of a level.
//!
//! Submodules overview
//! - [`animation`] – advance frame animations of sprites within camera range
//! - [`cleanup`] – despawn destroyed sprites
//! - [`collision`] – naive overlap detection and the drain-and-dispatch pass
//! - [`gameconfig`] – copy configuration and camera changes into the context
//! - [`render`] – build depth-sorted draw requests for the external renderer

pub mod animation;
pub mod cleanup;
pub mod collision;
pub mod gameconfig;
pub mod render;
