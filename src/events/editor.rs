//! Editor collaborator interface.
//!
//! Sprites populate the object configuration panel of whichever editor is
//! active. The panel widgets themselves live in the editor implementation.

/// Which editor, if any, is currently running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditorMode {
    #[default]
    Disabled,
    Level,
    World,
}

impl EditorMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, EditorMode::Disabled)
    }
}

/// Widget description handed to the configuration panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigWidget {
    /// Single-line text input. `name` identifies the widget in change callbacks.
    TextBox { name: String, text: String },
}

/// Object configuration panel of an editor.
pub trait Editor {
    fn add_config_widget(&mut self, label: &str, tooltip: &str, widget: ConfigWidget);
    fn show_config_panel(&mut self);
    fn hide_config_panel(&mut self);
}

/// Panics when no editor is active. Editor hooks must only be called from
/// inside an editing session.
pub fn require_editor(mode: EditorMode) -> EditorMode {
    if !mode.is_enabled() {
        panic!("Unknown editing environment");
    }
    mode
}
