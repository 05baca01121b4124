//! Conversion between sprites and level/savegame nodes.

use std::path::{Component as PathComponent, Path, PathBuf};

use log::{debug, warn};

use crate::components::massivity::{MassiveType, SpriteArray};
use crate::components::sprite::{SpriteBundle, SpriteRef};
use crate::resources::context::SimContext;
use crate::resources::imagestore::{ImageProvider, PLACEHOLDER_IMAGE};
use crate::savegame::node::Node;

/// Path as written to level files, always with forward slashes.
///
/// Absolute paths are made relative to `base`, climbing out of it with `..`
/// when needed. A relative `base` is resolved against the working
/// directory. Relative paths and paths on another root are kept as given.
pub fn relative_image_path(path: &Path, base: &Path) -> String {
    let relative = if path.is_absolute() {
        relative_to(path, &absolute(base)).unwrap_or_else(|| path.to_path_buf())
    } else {
        path.to_path_buf()
    };
    relative.to_string_lossy().replace('\\', "/")
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(e) => {
            debug!("No working directory to resolve {:?}: {}", path, e);
            path.to_path_buf()
        }
    }
}

fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if !base.is_absolute() {
        return None;
    }
    let path: Vec<PathComponent> = path.components().filter(|c| *c != PathComponent::CurDir).collect();
    let base: Vec<PathComponent> = base.components().filter(|c| *c != PathComponent::CurDir).collect();
    // another drive or root
    if path.first() != base.first() {
        return None;
    }

    let common = path.iter().zip(&base).take_while(|(a, b)| a == b).count();
    let mut relative = PathBuf::new();
    for _ in &base[common..] {
        relative.push("..");
    }
    for component in &path[common..] {
        relative.push(component.as_os_str());
    }
    Some(relative)
}

impl SpriteBundle {
    /// Build a sprite from a level node (`posx`, `posy`, `uid`, `image`, `type`).
    ///
    /// `.png` images are loaded directly, any other path names an image set
    /// registered as `main`. When neither resolves the placeholder image is
    /// used.
    pub fn from_node(node: &Node, images: &mut dyn ImageProvider, ctx: &SimContext) -> SpriteBundle {
        let mut bundle = SpriteBundle::new(node.name.clone());
        let mut sprite = bundle.view();
        sprite.sprite_mut().camera_range = ctx.default_camera_range;

        let x = node.attribute_f32("posx").unwrap_or(0.0);
        let y = node.attribute_f32("posy").unwrap_or(0.0);
        sprite.set_pos(x, y, true, ctx);

        if let Some(uid) = node.attribute("uid").and_then(|v| v.trim().parse().ok()) {
            sprite.sprite_mut().uid = uid;
        }

        let filename = node.attribute("image").unwrap_or_default();
        sprite.sprite_mut().image_filename = filename.to_string();
        let path = Path::new(filename);

        let loaded = if path.extension().is_some_and(|ext| ext == "png") {
            match images.get_image(path) {
                Some(image) => {
                    sprite.set_image(Some(image), true, false, ctx);
                    true
                }
                None => false,
            }
        } else {
            match images.get_image_set(path) {
                Some(frames) => sprite.add_image_set("main", frames) && sprite.set_image_set("main", true, ctx),
                None => false,
            }
        };

        if !loaded {
            warn!("Level file is invalid, image does not load: '{}'", filename);
            sprite.sprite_mut().image_filename = PLACEHOLDER_IMAGE.to_string();
            let placeholder = images.placeholder();
            sprite.set_image(Some(placeholder), true, false, ctx);
        }

        let massive_type = node
            .attribute("type")
            .and_then(MassiveType::from_name)
            .unwrap_or(MassiveType::Passive);
        sprite.set_massive_type(massive_type);

        bundle
    }
}

impl SpriteRef<'_> {
    /// `type` attribute derived from the partition, empty when the
    /// massivity name should be used instead.
    pub fn default_xml_type_name(&self) -> String {
        match self.massivity.array() {
            SpriteArray::Undefined => "undefined".to_string(),
            SpriteArray::Hud => "hud".to_string(),
            SpriteArray::Anim => "animation".to_string(),
            other => {
                debug!("No level type name for partition {:?}", other);
                String::new()
            }
        }
    }

    pub fn xml_type_name(&self) -> String {
        match self.sprite.behavior() {
            Some(behavior) => behavior.xml_type_name(self),
            None => self.default_xml_type_name(),
        }
    }

    /// Append this sprite to `parent` as a level node and return the new node.
    pub fn save_to_node<'n>(&self, parent: &'n mut Node, ctx: &SimContext) -> &'n mut Node {
        let sprite = self.sprite;
        let node = parent.add_child(sprite.type_name.clone());

        let start = self.geometry.start_pos;
        node.set_attribute("posx", start.x as i32);
        node.set_attribute("posy", start.y as i32);
        node.set_attribute("uid", sprite.uid);

        let image_path = if !sprite.image_filename.is_empty() {
            PathBuf::from(&sprite.image_filename)
        } else if let Some(image) = sprite.start_image().or(sprite.image()) {
            image.path.clone()
        } else {
            warn!("Saving sprite of type '{}' without an image", sprite.type_name);
            PathBuf::new()
        };
        node.set_attribute("image", relative_image_path(&image_path, &ctx.pixmaps_dir));

        let type_name = self.xml_type_name();
        if type_name.is_empty() {
            node.set_attribute("type", self.massivity.massive_type().name());
        } else {
            node.set_attribute("type", type_name);
        }

        node
    }

    /// Base savegame attributes: massivity and start position.
    pub fn write_savegame_base(&self, node: &mut Node) {
        let start = self.geometry.start_pos;
        node.set_attribute("type", self.massivity.massive_type().name());
        node.set_attribute("posx", start.x as i32);
        node.set_attribute("posy", start.y as i32);
    }

    /// Fill a savegame object node. Returns whether the node should be kept.
    pub fn save_to_savegame_node(&self, node: &mut Node) -> bool {
        match self.sprite.behavior() {
            Some(behavior) => behavior.save_to_savegame_node(self, node),
            None => {
                self.write_savegame_base(node);
                false
            }
        }
    }
}
