//! Color modulation, color combination and drop shadow of a sprite.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const LIGHTGREY: Color = Color::new(200, 200, 200, 255);
    pub const RED: Color = Color::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply with another color (component-wise).
    pub fn multiply(&self, other: Color) -> Color {
        Color::new(
            ((self.r as u16 * other.r as u16) / 255) as u8,
            ((self.g as u16 * other.g as u16) / 255) as u8,
            ((self.b as u16 * other.b as u16) / 255) as u8,
            ((self.a as u16 * other.a as u16) / 255) as u8,
        )
    }
}

/// How the combine color is applied to the texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombineType {
    #[default]
    None,
    /// Adds white: 1.0 turns the channel white.
    Add,
    /// Adds black: 0.0 turns the channel black.
    Modulate,
    /// Replaces the channel value.
    Replace,
}

/// Visual modulation of a sprite.
#[derive(Component, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub color: Color,
    pub combine_type: CombineType,
    pub combine_color: [f32; 3],
    /// Shadow offset; zero disables the shadow.
    pub shadow_pos: f32,
    pub shadow_color: Color,
}

impl Default for Tint {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            combine_type: CombineType::None,
            combine_color: [0.0; 3],
            shadow_pos: 0.0,
            shadow_color: Color::BLACK,
        }
    }
}

impl Tint {
    /// Set a color combination. Channels are clamped to `[0.000001, 1.0]`.
    pub fn set_color_combine(&mut self, red: f32, green: f32, blue: f32, combine_type: CombineType) {
        self.combine_type = combine_type;
        self.combine_color = [red, green, blue].map(|c| c.clamp(0.000001, 1.0));
    }

    pub fn set_shadow(&mut self, pos: f32, color: Color) {
        self.shadow_pos = pos;
        self.shadow_color = color;
    }
}
