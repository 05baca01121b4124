//! Per-step simulation context.
//!
//! Everything a sprite needs to know about the world around it (frame-rate
//! correction, editor state, the level being played, camera and resolution)
//! is carried by [`SimContext`] and passed explicitly to the calls that need
//! it. The systems read it as a resource and hand `&mut SimContext` down to
//! sprite behaviour hooks.

use std::path::PathBuf;

use bevy_ecs::prelude::*;

use crate::components::geometry::Rect;
use crate::events::editor::EditorMode;
use crate::events::touch::TouchEvent;
use crate::resources::camera::Camera;
use crate::resources::gameconfig::GameConfig;

/// The level currently being played.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelContext {
    pub name: String,
}

impl LevelContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Simulation context threaded through sprite operations.
#[derive(Resource, Clone, Debug)]
pub struct SimContext {
    /// Frame-rate correction applied to non-real movement.
    pub speed_factor: f32,
    /// Milliseconds elapsed during the current step.
    pub elapsed_ticks: u32,
    pub editor: EditorMode,
    pub level: Option<LevelContext>,
    /// Copy of the [`Camera`] resource for the current step.
    pub camera: Camera,
    pub game_res_w: f32,
    pub game_res_h: f32,
    /// Emit debug rect requests while rendering.
    pub debug: bool,
    /// Base directory image paths in level files are relative to.
    pub pixmaps_dir: PathBuf,
    /// Camera range given to new sprites.
    pub default_camera_range: i32,
    touches: Vec<TouchEvent>,
}

impl Default for SimContext {
    fn default() -> Self {
        Self::from_config(&GameConfig::default())
    }
}

impl SimContext {
    pub fn from_config(config: &GameConfig) -> Self {
        let mut ctx = Self {
            speed_factor: 1.0,
            elapsed_ticks: 0,
            editor: EditorMode::Disabled,
            level: None,
            camera: Camera::default(),
            game_res_w: 0.0,
            game_res_h: 0.0,
            debug: false,
            pixmaps_dir: PathBuf::new(),
            default_camera_range: 0,
            touches: Vec::new(),
        };
        ctx.apply_config(config);
        ctx
    }

    /// Copy the configurable values, leaving per-step state untouched.
    pub fn apply_config(&mut self, config: &GameConfig) {
        self.speed_factor = config.speed_factor;
        self.game_res_w = config.render_width as f32;
        self.game_res_h = config.render_height as f32;
        self.debug = config.debug;
        self.pixmaps_dir = config.pixmaps_dir.clone();
        self.default_camera_range = config.camera_range;
    }

    /// Editor preview mode: sprites are drawn in their start pose.
    pub fn editor_enabled(&self) -> bool {
        self.editor.is_enabled()
    }

    pub fn viewport(&self) -> Rect {
        self.camera.viewport(self.game_res_w, self.game_res_h)
    }

    /// Queue the symmetric touch event pair for a dispatched collision.
    ///
    /// Nothing is queued outside a level, while editing, or for boundary
    /// collisions from the partner's side.
    pub fn fire_touch_events(&mut self, subject: Entity, partner: Option<Entity>) {
        if self.level.is_none() || self.editor_enabled() {
            return;
        }

        self.touches.push(TouchEvent {
            sprite: subject,
            touched_by: partner,
        });
        if let Some(partner) = partner {
            self.touches.push(TouchEvent {
                sprite: partner,
                touched_by: Some(subject),
            });
        }
    }

    /// Hand out the touch events queued so far, in firing order.
    pub fn take_touch_events(&mut self) -> Vec<TouchEvent> {
        std::mem::take(&mut self.touches)
    }

    pub fn pending_touch_events(&self) -> usize {
        self.touches.len()
    }
}
