//! Data types that make up a sprite.
//!
//! Submodules overview:
//! - [`animation`] – frame animation state over an image set
//! - [`collision`] – collision records, the per-sprite queue and handler dispatch
//! - [`geometry`] – positions, scale, rotation and the derived rectangles
//! - [`image`] – loaded image metadata shared between sprites
//! - [`massivity`] – massive types, partitions and base depths
//! - [`sprite`] – the sprite entity and its type-specific behaviour hooks
//! - [`tint`] – color, color combination and shadow settings

pub mod animation;
pub mod collision;
pub mod geometry;
pub mod image;
pub mod massivity;
pub mod sprite;
pub mod tint;
