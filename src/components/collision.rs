//! Collision records and the per-sprite collision queue.
//!
//! The physics pass creates a [`Collision`] for every overlap it detects and
//! queues it on the sprite. Once per step the queue is drained and each record
//! is dispatched to exactly one [`CollisionHandler`] method chosen by the
//! partner's [`SpriteArray`].
//!
//! Draining swaps the queue with an empty one first, so handlers can queue
//! follow-up collisions without touching the batch being dispatched.

use bevy_ecs::prelude::*;
use log::debug;
use smallvec::SmallVec;

use crate::components::geometry::Rect;
use crate::components::massivity::{MassiveType, SpriteArray};
use crate::resources::context::SimContext;

/// Side of the subject on which the partner was hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectDirection {
    Undefined,
    Left,
    Right,
    Up,
    Down,
}

/// How a detected collision should be treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColValidType {
    /// Explicit "no collision" marker. Records are never built for it.
    NotValid,
    /// Overlap worth reporting, but it does not block movement.
    Internal,
    /// Real, movement-blocking collision.
    Blocking,
}

/// What a collision record knows about the partner.
#[derive(Clone, Copy, Debug)]
pub struct CollisionPartner<'a> {
    pub id: Entity,
    pub array: SpriteArray,
    pub col_rect: &'a Rect,
}

/// A single collision detected during the current step.
///
/// The partner is referenced by entity only. It may have been despawned by
/// the time the record is dispatched, so resolve it through the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Collision {
    /// `None` for collisions with the level boundary.
    pub partner: Option<Entity>,
    pub array: SpriteArray,
    pub direction: ObjectDirection,
    pub valid_type: ColValidType,
}

impl Collision {
    /// Build a collision record.
    ///
    /// Returns `None` when there is no subject or `valid_type` is
    /// [`ColValidType::NotValid`].
    pub fn create(
        subject: Option<&Rect>,
        partner: Option<CollisionPartner<'_>>,
        valid_type: ColValidType,
    ) -> Option<Collision> {
        let subject = subject?;
        if valid_type == ColValidType::NotValid {
            return None;
        }

        let mut collision = Collision {
            partner: None,
            array: SpriteArray::Undefined,
            direction: ObjectDirection::Undefined,
            valid_type,
        };

        if let Some(partner) = partner {
            collision.partner = Some(partner.id);
            collision.array = partner.array;
            collision.direction = direction_between(subject, partner.col_rect);
        }

        Some(collision)
    }

    pub fn is_blocking(&self) -> bool {
        self.valid_type == ColValidType::Blocking
    }
}

/// Direction of `other` as seen from `base`.
///
/// Picks the side with the smallest overlap; on a tie the vertical side wins.
pub fn direction_between(base: &Rect, other: &Rect) -> ObjectDirection {
    let overlap_right = base.right() - other.x;
    let overlap_left = other.right() - base.x;
    let overlap_down = base.bottom() - other.y;
    let overlap_up = other.bottom() - base.y;

    let min_x = overlap_left.min(overlap_right);
    let min_y = overlap_up.min(overlap_down);

    if min_y <= min_x {
        if overlap_down <= overlap_up {
            ObjectDirection::Down
        } else {
            ObjectDirection::Up
        }
    } else if overlap_right <= overlap_left {
        ObjectDirection::Right
    } else {
        ObjectDirection::Left
    }
}

pub type CollisionList = SmallVec<[Collision; 4]>;

/// Collisions queued on one sprite for the current step.
#[derive(Component, Clone, Debug, Default)]
pub struct CollisionQueue {
    collisions: CollisionList,
}

impl CollisionQueue {
    /// Queue a collision. With `add_if_new` a record whose partner is already
    /// queued is discarded. Returns whether the record was queued.
    pub fn add(&mut self, collision: Option<Collision>, add_if_new: bool) -> bool {
        let Some(collision) = collision else {
            return false;
        };

        if add_if_new && self.is_collision_included(collision.partner) {
            return false;
        }

        self.collisions.push(collision);
        true
    }

    /// Queue every collision of `list`, leaving it empty.
    pub fn add_collisions(&mut self, list: &mut Vec<Collision>, add_if_new: bool) {
        for collision in list.drain(..) {
            self.add(Some(collision), add_if_new);
        }
    }

    pub fn delete(&mut self, index: usize) -> Option<Collision> {
        if index < self.collisions.len() {
            Some(self.collisions.remove(index))
        } else {
            None
        }
    }

    pub fn delete_last(&mut self) -> Option<Collision> {
        self.collisions.pop()
    }

    /// Index of the first collision in `direction`.
    pub fn is_collision_in_direction(&self, direction: ObjectDirection) -> Option<usize> {
        self.collisions.iter().position(|c| c.direction == direction)
    }

    pub fn is_collision_included(&self, partner: Option<Entity>) -> bool {
        self.collisions.iter().any(|c| c.partner == partner)
    }

    /// Most recent collision regardless of blocking.
    pub fn last_collision(&self) -> Option<&Collision> {
        self.collisions.last()
    }

    /// Most recent collision that blocks movement.
    ///
    /// Passive partners never block, neither do climbable partners in the
    /// active partition. `massive_type_of` resolves a partner entity; boundary
    /// collisions and unresolvable partners count as blocking.
    pub fn last_blocking_collision<F>(&self, massive_type_of: F) -> Option<&Collision>
    where
        F: Fn(Entity) -> Option<MassiveType>,
    {
        self.collisions.iter().rev().find(|col| {
            let Some(mass) = col.partner.and_then(&massive_type_of) else {
                return true;
            };
            if mass == MassiveType::Passive {
                return false;
            }
            !(col.array == SpriteArray::Active && mass == MassiveType::Climbable)
        })
    }

    pub fn clear(&mut self) {
        self.collisions.clear();
    }

    /// Swap the queue with an empty one and hand out the old batch.
    pub fn take(&mut self) -> CollisionList {
        std::mem::take(&mut self.collisions)
    }

    pub fn len(&self) -> usize {
        self.collisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collisions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collision> {
        self.collisions.iter()
    }
}

/// Category handlers. All default to doing nothing.
pub trait CollisionHandler {
    fn handle_collision_player(&mut self, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_enemy(&mut self, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_massive(&mut self, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_passive(&mut self, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_lava(&mut self, _collision: &Collision, _ctx: &mut SimContext) {}
}

/// Route one record to its category handler. Returns `false` for
/// categories without a handler.
pub fn dispatch_collision<H>(handler: &mut H, collision: &Collision, ctx: &mut SimContext) -> bool
where
    H: CollisionHandler + ?Sized,
{
    match collision.array {
        SpriteArray::Player => handler.handle_collision_player(collision, ctx),
        SpriteArray::Enemy => handler.handle_collision_enemy(collision, ctx),
        SpriteArray::Massive | SpriteArray::Active => handler.handle_collision_massive(collision, ctx),
        SpriteArray::Passive => handler.handle_collision_passive(collision, ctx),
        SpriteArray::Lava => handler.handle_collision_lava(collision, ctx),
        other => {
            debug!("Dropping collision with unhandled category {:?}", other);
            return false;
        }
    }
    true
}

/// Anything that owns a collision queue.
pub trait Collider: CollisionHandler {
    fn collisions(&self) -> &CollisionQueue;
    fn collisions_mut(&mut self) -> &mut CollisionQueue;

    /// Identity reported in touch events. Bare collidables have none and
    /// never emit touch events.
    fn touch_identity(&self) -> Option<Entity> {
        None
    }

    /// Drain the queue and dispatch every record in arrival order.
    ///
    /// Returns the number of records dispatched to a handler.
    fn handle_collisions(&mut self, ctx: &mut SimContext) -> usize {
        let batch = self.collisions_mut().take();
        let subject = self.touch_identity();
        let mut dispatched = 0;

        for collision in batch.iter() {
            if let Some(subject) = subject {
                ctx.fire_touch_events(subject, collision.partner);
            }
            if dispatch_collision(self, collision, ctx) {
                dispatched += 1;
            }
        }

        dispatched
    }
}

/// Minimal collidable: geometry and a queue, no sprite identity.
#[derive(Clone, Debug, Default)]
pub struct BareCollidable {
    pub col_rect: Rect,
    pub collisions: CollisionQueue,
}

impl CollisionHandler for BareCollidable {}

impl Collider for BareCollidable {
    fn collisions(&self) -> &CollisionQueue {
        &self.collisions
    }

    fn collisions_mut(&mut self) -> &mut CollisionQueue {
        &mut self.collisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    fn record(partner: Entity, array: SpriteArray) -> Collision {
        Collision {
            partner: Some(partner),
            array,
            direction: ObjectDirection::Undefined,
            valid_type: ColValidType::Blocking,
        }
    }

    #[derive(Default)]
    struct Counting {
        queue: CollisionQueue,
        seen: Vec<&'static str>,
        bump_with: Option<Entity>,
    }

    impl CollisionHandler for Counting {
        fn handle_collision_player(&mut self, _c: &Collision, _ctx: &mut SimContext) {
            self.seen.push("player");
        }
        fn handle_collision_enemy(&mut self, _c: &Collision, _ctx: &mut SimContext) {
            self.seen.push("enemy");
        }
        fn handle_collision_massive(&mut self, _c: &Collision, _ctx: &mut SimContext) {
            self.seen.push("massive");
            if let Some(partner) = self.bump_with.take() {
                self.queue.add(Some(record(partner, SpriteArray::Lava)), false);
            }
        }
        fn handle_collision_passive(&mut self, _c: &Collision, _ctx: &mut SimContext) {
            self.seen.push("passive");
        }
        fn handle_collision_lava(&mut self, _c: &Collision, _ctx: &mut SimContext) {
            self.seen.push("lava");
        }
    }

    impl Collider for Counting {
        fn collisions(&self) -> &CollisionQueue {
            &self.queue
        }
        fn collisions_mut(&mut self) -> &mut CollisionQueue {
            &mut self.queue
        }
    }

    #[test]
    fn test_create_rejects_missing_subject_and_invalid() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(Collision::create(None, None, ColValidType::Blocking).is_none());
        assert!(Collision::create(Some(&rect), None, ColValidType::NotValid).is_none());
        let boundary = Collision::create(Some(&rect), None, ColValidType::Internal).unwrap();
        assert_eq!(boundary.partner, None);
        assert_eq!(boundary.direction, ObjectDirection::Undefined);
    }

    #[test]
    fn test_create_resolves_partner_and_direction() {
        let e = entities(1);
        let base = Rect::new(0.0, 0.0, 10.0, 10.0);
        let below = Rect::new(0.0, 8.0, 10.0, 10.0);
        let col = Collision::create(
            Some(&base),
            Some(CollisionPartner {
                id: e[0],
                array: SpriteArray::Massive,
                col_rect: &below,
            }),
            ColValidType::Blocking,
        )
        .unwrap();
        assert_eq!(col.partner, Some(e[0]));
        assert_eq!(col.array, SpriteArray::Massive);
        assert_eq!(col.direction, ObjectDirection::Down);
    }

    #[test]
    fn test_direction_horizontal_and_tie() {
        let base = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            direction_between(&base, &Rect::new(8.0, 0.0, 10.0, 10.0)),
            ObjectDirection::Right
        );
        assert_eq!(
            direction_between(&base, &Rect::new(-8.0, 0.0, 10.0, 10.0)),
            ObjectDirection::Left
        );
        assert_eq!(
            direction_between(&base, &Rect::new(-8.0, -8.0, 10.0, 10.0)),
            ObjectDirection::Up
        );
    }

    #[test]
    fn test_add_if_new_keeps_one_per_partner() {
        let e = entities(1);
        let mut q = CollisionQueue::default();
        assert!(q.add(Some(record(e[0], SpriteArray::Enemy)), true));
        assert!(!q.add(Some(record(e[0], SpriteArray::Enemy)), true));
        assert_eq!(q.len(), 1);
        assert!(q.add(Some(record(e[0], SpriteArray::Enemy)), false));
        assert_eq!(q.len(), 2);
        assert!(!q.add(None, false));
    }

    #[test]
    fn test_drain_dispatches_each_record_and_empties() {
        let e = entities(1);
        let mut c = Counting::default();
        for array in [
            SpriteArray::Player,
            SpriteArray::Enemy,
            SpriteArray::Active,
            SpriteArray::Passive,
            SpriteArray::Hud,
        ] {
            c.queue.add(Some(record(e[0], array)), false);
        }
        let mut ctx = SimContext::default();
        assert_eq!(c.handle_collisions(&mut ctx), 4);
        assert_eq!(c.seen, vec!["player", "enemy", "massive", "passive"]);
        assert!(c.queue.is_empty());
    }

    #[test]
    fn test_handler_enqueue_lands_in_next_batch() {
        let e = entities(3);
        let mut c = Counting {
            bump_with: Some(e[2]),
            ..Default::default()
        };
        c.queue.add(Some(record(e[0], SpriteArray::Massive)), false);
        c.queue.add(Some(record(e[1], SpriteArray::Passive)), false);
        let mut ctx = SimContext::default();

        assert_eq!(c.handle_collisions(&mut ctx), 2);
        assert_eq!(c.seen, vec!["massive", "passive"]);
        assert_eq!(c.queue.len(), 1);

        assert_eq!(c.handle_collisions(&mut ctx), 1);
        assert_eq!(c.seen.last(), Some(&"lava"));
        assert!(c.queue.is_empty());
    }

    #[test]
    fn test_last_blocking_skips_passive_and_climbable() {
        let e = entities(3);
        let mut q = CollisionQueue::default();
        q.add(Some(record(e[0], SpriteArray::Massive)), false);
        q.add(Some(record(e[1], SpriteArray::Active)), false);
        q.add(Some(record(e[2], SpriteArray::Passive)), false);
        let lookup = |id: Entity| {
            if id == e[0] {
                Some(MassiveType::Massive)
            } else if id == e[1] {
                Some(MassiveType::Climbable)
            } else {
                Some(MassiveType::Passive)
            }
        };
        assert_eq!(q.last_blocking_collision(lookup).unwrap().partner, Some(e[0]));
        assert_eq!(q.last_collision().unwrap().partner, Some(e[2]));
    }

    #[test]
    fn test_unresolved_partner_blocks() {
        let e = entities(1);
        let mut q = CollisionQueue::default();
        q.add(Some(record(e[0], SpriteArray::Passive)), false);
        assert!(q.last_blocking_collision(|_| None).is_some());
    }

    #[test]
    fn test_queue_helpers() {
        let e = entities(2);
        let mut q = CollisionQueue::default();
        let mut left = record(e[0], SpriteArray::Enemy);
        left.direction = ObjectDirection::Left;
        let mut batch = vec![record(e[1], SpriteArray::Enemy), left];
        q.add_collisions(&mut batch, true);
        assert!(batch.is_empty());
        assert_eq!(q.is_collision_in_direction(ObjectDirection::Left), Some(1));
        assert_eq!(q.is_collision_in_direction(ObjectDirection::Up), None);
        assert!(q.is_collision_included(Some(e[1])));
        assert_eq!(q.delete_last().unwrap().partner, Some(e[0]));
        assert!(q.delete(5).is_none());
        q.clear();
        assert!(q.is_empty());
    }
}
