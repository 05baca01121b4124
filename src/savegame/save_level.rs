//! Per-level savegame block.
//!
//! ```text
//! level  level_name, player_posx?, player_posy?
//! ├── mruby_data?          one script_data per saved script table
//! │   └── script_data
//! │       └── script_data_entry  name, type, value
//! ├── objects_data         regular objects that asked to be kept
//! └── spawned_objects      runtime-created objects, as level nodes
//! ```

use glam::Vec2;

use crate::components::sprite::{SpriteBundle, SpriteRef};
use crate::resources::context::SimContext;
use crate::resources::imagestore::ImageProvider;
use crate::savegame::node::Node;

/// One script table: entry name to (type, value), in insertion order.
pub type ScriptData = Vec<(String, (String, String))>;

/// Saved state of a regular object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveLevelObject {
    pub type_name: String,
    pub properties: Vec<(String, String)>,
}

impl SaveLevelObject {
    pub fn from_node(node: &Node) -> Self {
        Self {
            type_name: node.attribute("type").unwrap_or_default().to_string(),
            properties: node.attributes.clone(),
        }
    }

    pub fn exists(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    /// Value of a property, empty when missing.
    pub fn get_value(&self, name: &str) -> &str {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct SaveLevel {
    pub name: String,
    /// Player position, only for the level the player is in.
    pub player_pos: Option<Vec2>,
    pub script_data: Vec<ScriptData>,
    /// Filled by [`SaveLevel::load_from_node`].
    pub regular_objects: Vec<SaveLevelObject>,
    /// Filled by [`SaveLevel::load_from_node`].
    pub spawned_objects: Vec<Node>,
}

impl SaveLevel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Write the `level` block.
    ///
    /// Regular sprites are only written when they report state worth keeping;
    /// spawned sprites are always written as full level nodes.
    pub fn save_to_node<'a, 'b>(
        &self,
        parent: &'a mut Node,
        regular: impl IntoIterator<Item = SpriteRef<'b>>,
        spawned: impl IntoIterator<Item = SpriteRef<'b>>,
        ctx: &SimContext,
    ) -> &'a mut Node {
        let level = parent.add_child("level");
        level.set_attribute("level_name", &self.name);

        if let Some(pos) = self.player_pos {
            level.set_attribute("player_posx", pos.x);
            level.set_attribute("player_posy", pos.y);
        }

        if !self.script_data.is_empty() {
            let datas = level.add_child("mruby_data");
            for data in &self.script_data {
                let data_node = datas.add_child("script_data");
                for (name, (kind, value)) in data {
                    let entry = data_node.add_child("script_data_entry");
                    entry.set_attribute("name", name);
                    entry.set_attribute("type", kind);
                    entry.set_attribute("value", value);
                }
            }
        }

        let objects = level.add_child("objects_data");
        for sprite in regular {
            let mut object = Node::new("object");
            if sprite.save_to_savegame_node(&mut object) {
                objects.push_child(object);
            }
        }

        let spawned_node = level.add_child("spawned_objects");
        for sprite in spawned {
            sprite.save_to_node(spawned_node, ctx);
        }

        level
    }

    /// Read a `level` block written by [`SaveLevel::save_to_node`].
    pub fn load_from_node(node: &Node) -> Result<SaveLevel, String> {
        if node.name != "level" {
            return Err(format!("Expected a 'level' node, found '{}'", node.name));
        }

        let name = node
            .attribute("level_name")
            .ok_or_else(|| "Level node without level_name".to_string())?;
        let mut save = SaveLevel::new(name);

        if let (Some(x), Some(y)) = (node.attribute_f32("player_posx"), node.attribute_f32("player_posy")) {
            save.player_pos = Some(Vec2::new(x, y));
        }

        if let Some(datas) = node.child("mruby_data") {
            for data_node in datas.children_named("script_data") {
                let data = data_node
                    .children_named("script_data_entry")
                    .map(|entry| {
                        let attr = |n| entry.attribute(n).unwrap_or_default().to_string();
                        (attr("name"), (attr("type"), attr("value")))
                    })
                    .collect();
                save.script_data.push(data);
            }
        }

        if let Some(objects) = node.child("objects_data") {
            save.regular_objects = objects.children.iter().map(SaveLevelObject::from_node).collect();
        }

        if let Some(spawned) = node.child("spawned_objects") {
            save.spawned_objects = spawned.children.clone();
        }

        Ok(save)
    }

    /// Rebuild the spawned sprites of a loaded save, ready to be spawned.
    pub fn spawn_objects(&self, images: &mut dyn ImageProvider, ctx: &SimContext) -> Vec<SpriteBundle> {
        self.spawned_objects
            .iter()
            .map(|node| {
                let mut bundle = SpriteBundle::from_node(node, images, ctx);
                bundle.sprite.spawned = true;
                bundle
            })
            .collect()
    }
}
