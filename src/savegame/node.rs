//! Ordered node tree used for level files and savegames.
//!
//! Attribute and child order is preserved so that a written file reads back
//! in the order it was produced. Trees are stored on disk as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an attribute, replacing an existing one of the same name in place.
    pub fn set_attribute(&mut self, name: &str, value: impl ToString) {
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as a number; missing or malformed values give `None`.
    pub fn attribute_f32(&self, name: &str) -> Option<f32> {
        self.attribute(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Append an empty child and return it.
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut Node {
        self.children.push(Node::new(name));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize node '{}': {e}", self.name))
    }

    pub fn from_json(json: &str) -> Result<Node, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse node tree: {e}"))
    }

    pub fn write_to_file(&self, path: &Path) -> Result<(), String> {
        let content = self.to_json()?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write {}: {e}", path.display()))
    }

    pub fn read_from_file(path: &Path) -> Result<Node, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        Node::from_json(&content)
    }
}
