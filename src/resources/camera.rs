//! Camera position used for visibility culling.

use bevy_ecs::prelude::*;

use crate::components::geometry::Rect;

/// Top-left corner of the visible part of the level.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
}

impl Camera {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// World rect seen through the camera at the given resolution.
    pub fn viewport(&self, width: f32, height: f32) -> Rect {
        Rect::new(self.x, self.y, width, height)
    }
}
