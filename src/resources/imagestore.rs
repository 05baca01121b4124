//! Image lookup.
//!
//! Sprites resolve image paths through an [`ImageProvider`]. Loading and
//! decoding belong to the asset layer; [`ImageStore`] is an in-memory
//! provider fed with already described images.

use std::path::{Path, PathBuf};

use bevy_ecs::prelude::*;
use log::warn;
use rustc_hash::FxHashMap;

use crate::components::image::{AnimFrame, Image, ImageHandle};

/// Image substituted when a path cannot be resolved.
pub const PLACEHOLDER_IMAGE: &str = "game/image_not_found.png";
const PLACEHOLDER_SIZE: f32 = 32.0;

/// Resolves paths to shared image handles.
pub trait ImageProvider {
    fn get_image(&mut self, path: &Path) -> Option<ImageHandle>;

    /// Frames of an animated image set file.
    fn get_image_set(&mut self, _path: &Path) -> Option<Vec<AnimFrame>> {
        None
    }

    /// The designated "image not found" image.
    fn placeholder(&mut self) -> ImageHandle;
}

/// In-memory image provider.
#[derive(Resource, Debug, Default)]
pub struct ImageStore {
    images: FxHashMap<PathBuf, ImageHandle>,
    sets: FxHashMap<PathBuf, Vec<AnimFrame>>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under its own path.
    pub fn insert(&mut self, image: Image) -> ImageHandle {
        let handle = image.into_handle();
        self.images.insert(handle.path.clone(), handle.clone());
        handle
    }

    /// Register an image set under `path`.
    pub fn insert_set(&mut self, path: impl Into<PathBuf>, frames: Vec<AnimFrame>) {
        self.sets.insert(path.into(), frames);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageProvider for ImageStore {
    fn get_image(&mut self, path: &Path) -> Option<ImageHandle> {
        self.images.get(path).cloned()
    }

    fn get_image_set(&mut self, path: &Path) -> Option<Vec<AnimFrame>> {
        self.sets.get(path).cloned()
    }

    fn placeholder(&mut self) -> ImageHandle {
        let path = Path::new(PLACEHOLDER_IMAGE);
        if let Some(image) = self.images.get(path) {
            return image.clone();
        }
        warn!("Placeholder image not registered, creating {}", PLACEHOLDER_IMAGE);
        self.insert(Image::new(PLACEHOLDER_IMAGE, PLACEHOLDER_SIZE, PLACEHOLDER_SIZE))
    }
}
