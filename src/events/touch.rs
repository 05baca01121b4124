//! Touch notifications for the scripting layer.
//!
//! While a level is being played every dispatched collision between two
//! sprites fires a pair of [`TouchEvent`]s, one from each side. Collision
//! dispatch buffers them in the [`SimContext`](crate::resources::context::SimContext)
//! and the collision handling system triggers them once the pass is over.
//!
//! Observers react to them in-world. [`forward_touch_events`] hands them to a
//! scripting host living on another thread through a [`TouchBridge`].

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::debug;

/// `sprite` was touched by `touched_by`.
///
/// `touched_by` is `None` for collisions with the level boundary.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchEvent {
    pub sprite: Entity,
    pub touched_by: Option<Entity>,
}

/// Create the channel pair used by a [`TouchBridge`].
pub fn touch_channel() -> (Sender<TouchEvent>, Receiver<TouchEvent>) {
    unbounded::<TouchEvent>()
}

/// Sending end of the channel to the scripting host.
#[derive(Resource, Clone, Debug)]
pub struct TouchBridge {
    pub tx: Sender<TouchEvent>,
}

impl TouchBridge {
    pub fn new(tx: Sender<TouchEvent>) -> Self {
        Self { tx }
    }
}

/// Observer forwarding every [`TouchEvent`] over the [`TouchBridge`].
pub fn forward_touch_events(trigger: On<TouchEvent>, bridge: Option<Res<TouchBridge>>) {
    let Some(bridge) = bridge else {
        return;
    };
    if bridge.tx.send(*trigger.event()).is_err() {
        debug!("Touch event receiver is gone");
    }
}
