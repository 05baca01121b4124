//! Massivity: how other objects collide with a sprite.
//!
//! The [`MassiveType`] decides which [`SpriteArray`] partition a sprite is
//! routed to, its base depth and whether it can carry other objects. The
//! [`Massivity`] component carries the derived values on a sprite entity.
//!
//! Depth ordering, back to front: passive, half-massive/climbable, massive,
//! player, front-passive.

use bevy_ecs::prelude::Component;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

pub const POS_Z_PASSIVE_START: f32 = 0.01;
pub const POS_Z_HALFMASSIVE_START: f32 = 0.04;
pub const POS_Z_MASSIVE_START: f32 = 0.08;
pub const POS_Z_PLAYER: f32 = 0.0999;
pub const POS_Z_FRONT_PASSIVE_START: f32 = 0.1;
/// Smallest depth step between two sprites.
pub const POS_Z_DELTA: f32 = 0.000001;

/// Collision-response category of a sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MassiveType {
    Undefined,
    Passive,
    Massive,
    FrontPassive,
    HalfMassive,
    Climbable,
}

impl MassiveType {
    /// Canonical name used in level files.
    pub fn name(&self) -> &'static str {
        match self {
            MassiveType::Undefined => "undefined",
            MassiveType::Passive => "passive",
            MassiveType::Massive => "massive",
            MassiveType::FrontPassive => "front_passive",
            MassiveType::HalfMassive => "halfmassive",
            MassiveType::Climbable => "climbable",
        }
    }

    /// Parse a level-file name. Unknown names are logged and yield `None`.
    pub fn from_name(name: &str) -> Option<MassiveType> {
        match name {
            "undefined" => Some(MassiveType::Undefined),
            "passive" => Some(MassiveType::Passive),
            "massive" => Some(MassiveType::Massive),
            "front_passive" | "frontpassive" => Some(MassiveType::FrontPassive),
            "halfmassive" | "half_massive" => Some(MassiveType::HalfMassive),
            "climbable" => Some(MassiveType::Climbable),
            other => {
                warn!("Unknown massive type '{}'", other);
                None
            }
        }
    }

    /// Partition the sprite belongs to. `None` for [`MassiveType::Undefined`].
    pub fn array(&self) -> Option<SpriteArray> {
        match self {
            MassiveType::Undefined => None,
            MassiveType::Massive => Some(SpriteArray::Massive),
            MassiveType::Passive | MassiveType::FrontPassive => Some(SpriteArray::Passive),
            MassiveType::HalfMassive | MassiveType::Climbable => Some(SpriteArray::Active),
        }
    }

    /// Base depth of the category. `None` for [`MassiveType::Undefined`].
    pub fn base_z(&self) -> Option<f32> {
        match self {
            MassiveType::Undefined => None,
            MassiveType::Passive => Some(POS_Z_PASSIVE_START),
            MassiveType::HalfMassive | MassiveType::Climbable => Some(POS_Z_HALFMASSIVE_START),
            MassiveType::Massive => Some(POS_Z_MASSIVE_START),
            MassiveType::FrontPassive => Some(POS_Z_FRONT_PASSIVE_START),
        }
    }

    /// Whether other objects may stand on a sprite of this category.
    pub fn can_be_ground(&self) -> bool {
        matches!(self, MassiveType::Massive | MassiveType::HalfMassive)
    }
}

/// Logical partition used for collision routing and draw ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteArray {
    Undefined,
    Player,
    Enemy,
    Massive,
    Passive,
    Active,
    Lava,
    Hud,
    Anim,
}

/// Massivity of a sprite entity and the values derived from it.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Massivity {
    massive_type: MassiveType,
    array: SpriteArray,
    pos_z: f32,
    can_be_ground: bool,
    reorder_requested: bool,
}

impl Default for Massivity {
    fn default() -> Self {
        Self {
            massive_type: MassiveType::Passive,
            array: SpriteArray::Undefined,
            pos_z: 0.0,
            can_be_ground: false,
            reorder_requested: false,
        }
    }
}

impl Massivity {
    pub fn massive_type(&self) -> MassiveType {
        self.massive_type
    }

    pub fn array(&self) -> SpriteArray {
        self.array
    }

    /// Assign the partition directly, for sprites outside the massivity
    /// table (player, enemies, HUD).
    pub fn set_array(&mut self, array: SpriteArray) {
        self.array = array;
    }

    pub fn pos_z(&self) -> f32 {
        self.pos_z
    }

    pub fn set_pos_z(&mut self, z: f32) {
        self.pos_z = z;
    }

    pub fn can_be_ground(&self) -> bool {
        self.can_be_ground
    }

    pub fn set_can_be_ground(&mut self, enable: bool) {
        self.can_be_ground = enable;
    }

    /// Change the massivity.
    ///
    /// Re-derives partition, base depth and the ground flag, then requests a
    /// move to the back of the draw order. The request is served by
    /// [`SpriteRegistry::apply_reorder_requests`](crate::resources::spriteregistry::SpriteRegistry::apply_reorder_requests).
    pub fn set_massive_type(&mut self, massive_type: MassiveType) {
        self.massive_type = massive_type;

        match (massive_type.array(), massive_type.base_z()) {
            (Some(array), Some(z)) => {
                self.array = array;
                self.pos_z = z;
                self.can_be_ground = massive_type.can_be_ground();
            }
            _ => debug!("Massive type {:?} has no partition", massive_type),
        }

        self.reorder_requested = true;
    }

    pub fn reorder_requested(&self) -> bool {
        self.reorder_requested
    }

    pub fn take_reorder_request(&mut self) -> bool {
        std::mem::take(&mut self.reorder_requested)
    }
}
