//! Messages exchanged with collaborators outside the sprite model.
//!
//! - [`editor`] – configuration panel interface and editor mode
//! - [`touch`] – touch notifications fired during collision dispatch

pub mod editor;
pub mod touch;
