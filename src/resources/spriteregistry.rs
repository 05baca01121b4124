//! Processing and draw order of the sprites of a level.
//!
//! Sprite components live in the [`World`]; the [`SpriteRegistry`] resource
//! only keeps the order in which sprites are processed and drawn, plus the
//! next free level uid. Collision records refer to partners by [`Entity`],
//! so every partner lookup goes through the world and fails gracefully
//! once a partner is despawned.
//!
//! The free functions here are the world-level operations used by level
//! loading, the demo binary and tests.

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::collision::{ColValidType, Collider, Collision, CollisionPartner, CollisionQueue};
use crate::components::geometry::GeometryState;
use crate::components::massivity::{MassiveType, Massivity, SpriteArray};
use crate::components::sprite::{Sprite, SpriteBundle, SpriteMut, SpriteQueryData};
use crate::resources::context::SimContext;

#[derive(Resource, Debug, Default)]
pub struct SpriteRegistry {
    order: Vec<Entity>,
    next_uid: i32,
}

impl SpriteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the level uid of a sprite being registered. Negative uids get
    /// the next free one; the counter always moves past the returned uid.
    pub fn claim_uid(&mut self, uid: i32) -> i32 {
        let uid = if uid < 0 { self.next_uid } else { uid };
        match uid.checked_add(1) {
            Some(next) => self.next_uid = self.next_uid.max(next),
            None => warn!("Sprite uid {} leaves no free uid after it", uid),
        }
        uid
    }

    pub fn next_uid(&self) -> i32 {
        self.next_uid
    }

    pub fn push(&mut self, entity: Entity) {
        self.order.push(entity);
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        let before = self.order.len();
        self.order.retain(|other| *other != entity);
        self.order.len() != before
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.order.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entities in processing order.
    pub fn ids(&self) -> &[Entity] {
        &self.order
    }

    /// Position of every registered entity in the processing order.
    pub fn positions(&self) -> FxHashMap<Entity, usize> {
        self.order.iter().enumerate().map(|(i, e)| (*e, i)).collect()
    }

    pub fn move_to_back(&mut self, entity: Entity) {
        if let Some(index) = self.order.iter().position(|other| *other == entity) {
            let entity = self.order.remove(index);
            self.order.push(entity);
        }
    }

    /// Move every entity for which `take_request` reports a pending reorder
    /// to the back, keeping their relative order. Returns how many moved.
    pub fn apply_reorder_requests(&mut self, mut take_request: impl FnMut(Entity) -> bool) -> usize {
        let requested: Vec<Entity> = self
            .order
            .iter()
            .copied()
            .filter(|e| take_request(*e))
            .collect();
        for entity in &requested {
            self.move_to_back(*entity);
        }
        requested.len()
    }
}

/// Spawn a sprite and register it at the back of the order. Sprites without
/// a level uid get the next free one.
pub fn spawn_sprite(world: &mut World, mut bundle: SpriteBundle) -> Entity {
    let mut registry = world.get_resource_or_insert_with(SpriteRegistry::new);
    bundle.sprite.uid = registry.claim_uid(bundle.sprite.uid);
    // a fresh sprite is already at the back
    bundle.massivity.take_reorder_request();

    let entity = world.spawn(bundle).id();
    world.resource_mut::<SpriteRegistry>().push(entity);
    entity
}

/// Despawn a sprite and drop it from the order.
pub fn despawn_sprite(world: &mut World, entity: Entity) -> bool {
    if let Some(mut registry) = world.get_resource_mut::<SpriteRegistry>() {
        registry.remove(entity);
    }
    world.despawn(entity)
}

pub fn find_by_uid(world: &mut World, uid: i32) -> Option<Entity> {
    let mut query = world.query::<(Entity, &Sprite)>();
    query
        .iter(world)
        .find(|(_, s)| s.uid == uid)
        .map(|(e, _)| e)
}

/// Number of live sprites in a partition.
pub fn get_array_num(world: &mut World, array: SpriteArray) -> usize {
    let mut query = world.query::<(&Sprite, &Massivity)>();
    query
        .iter(world)
        .filter(|(s, m)| m.array() == array && !s.is_destroyed())
        .count()
}

/// Change a sprite's massivity and move it to the back of the order.
pub fn set_massive_type(world: &mut World, entity: Entity, massive_type: MassiveType) -> bool {
    let Some(mut massivity) = world.get_mut::<Massivity>(entity) else {
        warn!("Cannot change massivity of unknown sprite {:?}", entity);
        return false;
    };
    massivity.set_massive_type(massive_type);
    massivity.take_reorder_request();
    world
        .get_resource_or_insert_with(SpriteRegistry::new)
        .move_to_back(entity);
    true
}

/// Serve the reorder requests of every registered sprite.
pub fn apply_reorder_requests(world: &mut World) -> usize {
    world
        .try_resource_scope(|world, mut registry: Mut<SpriteRegistry>| {
            registry.apply_reorder_requests(|e| {
                world
                    .get_mut::<Massivity>(e)
                    .is_some_and(|mut m| m.take_reorder_request())
            })
        })
        .unwrap_or(0)
}

pub fn massive_type_of(world: &World, entity: Entity) -> Option<MassiveType> {
    world.get::<Massivity>(entity).map(|m| m.massive_type())
}

/// Build a collision record of `subject` against `partner`.
///
/// `partner` of `None` is a boundary collision. Unknown sprites yield `None`.
pub fn create_collision(
    world: &World,
    subject: Entity,
    partner: Option<Entity>,
    valid_type: ColValidType,
) -> Option<Collision> {
    let subject = world.get::<GeometryState>(subject)?;
    let partner = match partner {
        Some(id) => Some(CollisionPartner {
            id,
            array: world.get::<Massivity>(id)?.array(),
            col_rect: &world.get::<GeometryState>(id)?.col_rect,
        }),
        None => None,
    };
    Collision::create(Some(&subject.col_rect), partner, valid_type)
}

/// Create and queue a collision on `subject`.
pub fn add_collision(
    world: &mut World,
    subject: Entity,
    partner: Option<Entity>,
    valid_type: ColValidType,
    add_if_new: bool,
) -> bool {
    let collision = create_collision(world, subject, partner, valid_type);
    match world.get_mut::<CollisionQueue>(subject) {
        Some(mut queue) => queue.add(collision, add_if_new),
        None => false,
    }
}

/// Most recent blocking collision queued on `entity`.
pub fn last_blocking_collision(world: &World, entity: Entity) -> Option<Collision> {
    world
        .get::<CollisionQueue>(entity)?
        .last_blocking_collision(|partner| massive_type_of(world, partner))
        .cloned()
}

/// Run `f` on a mutable view of a spawned sprite and the [`SimContext`].
///
/// `None` when `entity` is not a sprite or no context is present.
pub fn with_sprite_mut<R>(
    world: &mut World,
    entity: Entity,
    f: impl FnOnce(&mut SpriteMut<'_>, &mut SimContext) -> R,
) -> Option<R> {
    world
        .try_resource_scope(|world, mut ctx: Mut<SimContext>| {
            let mut query = world.query::<SpriteQueryData>();
            let item = query.get_mut(world, entity).ok()?;
            let mut view = SpriteMut::from_item(item);
            Some(f(&mut view, &mut *ctx))
        })
        .flatten()
}

/// Drain and dispatch the collision queue of one sprite outside the
/// schedule. Touch events stay buffered in the context.
pub fn handle_collisions(world: &mut World, entity: Entity) -> usize {
    with_sprite_mut(world, entity, |view, ctx| view.handle_collisions(ctx)).unwrap_or(0)
}

pub fn destroy_sprite(world: &mut World, entity: Entity) -> bool {
    with_sprite_mut(world, entity, |view, ctx| {
        view.destroy(ctx);
        view.sprite().is_destroyed()
    })
    .unwrap_or(false)
}

/// Despawn destroyed sprites. Returns how many were removed.
pub fn cleanup_destroyed(world: &mut World) -> usize {
    let mut query = world.query::<(Entity, &Sprite)>();
    let destroyed: Vec<Entity> = query
        .iter(world)
        .filter(|(_, s)| s.is_destroyed())
        .map(|(e, _)| e)
        .collect();
    for entity in &destroyed {
        debug!("Removing destroyed sprite {:?}", entity);
        despawn_sprite(world, *entity);
    }
    destroyed.len()
}
