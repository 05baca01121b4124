//! Engine configuration.
//!
//! Settings are loaded from an INI file. Missing values keep their defaults.
//!
//! # Configuration File Format
//!
//! ```ini
//! [render]
//! width = 800
//! height = 600
//!
//! [sprites]
//! camera_range = 1000
//!
//! [paths]
//! pixmaps = data/pixmaps
//!
//! [debug]
//! enabled = false
//!
//! [timing]
//! speed_factor = 1.0
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

const DEFAULT_RENDER_WIDTH: u32 = 800;
const DEFAULT_RENDER_HEIGHT: u32 = 600;
const DEFAULT_CAMERA_RANGE: i32 = 1000;
const DEFAULT_PIXMAPS_DIR: &str = "data/pixmaps";
const DEFAULT_DEBUG: bool = false;
const DEFAULT_SPEED_FACTOR: f32 = 1.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Engine configuration.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Game resolution width; the visible viewport size.
    pub render_width: u32,
    /// Game resolution height.
    pub render_height: u32,
    /// Camera range given to new sprites.
    pub camera_range: i32,
    /// Base directory for image paths written to level files.
    pub pixmaps_dir: PathBuf,
    /// Emit debug collision rects.
    pub debug: bool,
    /// Frame-rate correction factor.
    pub speed_factor: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            camera_range: DEFAULT_CAMERA_RANGE,
            pixmaps_dir: PathBuf::from(DEFAULT_PIXMAPS_DIR),
            debug: DEFAULT_DEBUG,
            speed_factor: DEFAULT_SPEED_FACTOR,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        if let Some(width) = config.getuint("render", "width").ok().flatten() {
            self.render_width = width as u32;
        }
        if let Some(height) = config.getuint("render", "height").ok().flatten() {
            self.render_height = height as u32;
        }
        if let Some(range) = config.getint("sprites", "camera_range").ok().flatten() {
            self.camera_range = range as i32;
        }
        if let Some(dir) = config.get("paths", "pixmaps") {
            self.pixmaps_dir = PathBuf::from(dir);
        }
        if let Some(debug) = config.getbool("debug", "enabled").ok().flatten() {
            self.debug = debug;
        }
        if let Some(factor) = config.getfloat("timing", "speed_factor").ok().flatten() {
            self.speed_factor = factor as f32;
        }

        info!(
            "Loaded config: {}x{} resolution, camera_range={}, pixmaps={:?}, debug={}, speed_factor={}",
            self.render_width,
            self.render_height,
            self.camera_range,
            self.pixmaps_dir,
            self.debug,
            self.speed_factor
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("render", "width", Some(self.render_width.to_string()));
        config.set("render", "height", Some(self.render_height.to_string()));
        config.set("sprites", "camera_range", Some(self.camera_range.to_string()));
        config.set(
            "paths",
            "pixmaps",
            Some(self.pixmaps_dir.to_string_lossy().into_owned()),
        );
        config.set("debug", "enabled", Some(self.debug.to_string()));
        config.set("timing", "speed_factor", Some(self.speed_factor.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.render_width, self.render_height)
    }
}
