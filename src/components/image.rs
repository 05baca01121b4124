//! Image handles shared between sprites.
//!
//! Images are owned by the [`ImageProvider`](crate::resources::imagestore::ImageProvider)
//! and handed out as reference-counted [`ImageHandle`]s. A sprite may also be
//! given a uniquely created image it owns; see [`SpriteMut::set_image`](crate::components::sprite::SpriteMut::set_image).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Vec2, Vec3};

/// Image metadata a sprite needs for geometry and drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub path: PathBuf,
    pub name: String,
    pub editor_tags: String,
    /// Texture size.
    pub start_w: f32,
    pub start_h: f32,
    /// Drawn size (texture size after the image's own settings).
    pub w: f32,
    pub h: f32,
    /// Internal drawing offset.
    pub int_x: f32,
    pub int_y: f32,
    /// Collision rect relative to the image's top-left.
    pub col_pos: Vec2,
    pub col_w: f32,
    pub col_h: f32,
    pub base_rotation: Vec3,
    /// Marked obsolete by the asset settings; outlined in the editor.
    pub obsolete: bool,
}

pub type ImageHandle = Arc<Image>;

impl Image {
    /// Image of the given size whose collision rect covers the whole image.
    pub fn new(path: impl Into<PathBuf>, w: f32, h: f32) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            editor_tags: String::new(),
            start_w: w,
            start_h: h,
            w,
            h,
            int_x: 0.0,
            int_y: 0.0,
            col_pos: Vec2::ZERO,
            col_w: w,
            col_h: h,
            base_rotation: Vec3::ZERO,
            obsolete: false,
        }
    }

    pub fn with_collision(mut self, x: f32, y: f32, w: f32, h: f32) -> Self {
        self.col_pos = Vec2::new(x, y);
        self.col_w = w;
        self.col_h = h;
        self
    }

    pub fn with_internal_offset(mut self, x: f32, y: f32) -> Self {
        self.int_x = x;
        self.int_y = y;
        self
    }

    pub fn with_editor_tags(mut self, tags: impl Into<String>) -> Self {
        self.editor_tags = tags.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_handle(self) -> ImageHandle {
        Arc::new(self)
    }
}

/// One frame of an image set.
#[derive(Clone, Debug)]
pub struct AnimFrame {
    pub image: ImageHandle,
    /// Display time in milliseconds.
    pub time: u32,
}

impl AnimFrame {
    pub fn new(image: ImageHandle, time: u32) -> Self {
        Self { image, time }
    }
}
