use bevy_ecs::prelude::*;
use log::debug;

use crate::components::collision::{ColValidType, Collider, Collision, CollisionPartner, CollisionQueue};
use crate::components::geometry::{GeometryState, Rect};
use crate::components::massivity::{Massivity, SpriteArray};
use crate::components::sprite::{Sprite, SpriteMut, SpriteQueryData};
use crate::resources::context::SimContext;
use crate::resources::spriteregistry::SpriteRegistry;

/// Partitions whose sprites move and therefore collect collisions.
fn is_moving(array: SpriteArray) -> bool {
    matches!(
        array,
        SpriteArray::Player | SpriteArray::Enemy | SpriteArray::Active
    )
}

struct Candidate {
    entity: Entity,
    array: SpriteArray,
    col_rect: Rect,
    can_be_ground: bool,
}

/// Naive pairwise overlap test.
///
/// Every moving sprite gets one collision per overlapping partner, blocking
/// when the partner can be stood on. Sprites are visited in registry order.
pub fn collision_detector(
    registry: Res<SpriteRegistry>,
    mut query: Query<(&Sprite, &GeometryState, &Massivity, &mut CollisionQueue)>,
) {
    // first snapshot everything that may collide
    let candidates: Vec<Candidate> = registry
        .ids()
        .iter()
        .filter_map(|e| {
            let (sprite, geometry, massivity, _) = query.get(*e).ok()?;
            (sprite.is_active() && sprite.valid_update()).then(|| Candidate {
                entity: *e,
                array: massivity.array(),
                col_rect: geometry.col_rect,
                can_be_ground: massivity.can_be_ground(),
            })
        })
        .collect();

    let mut found: Vec<(Entity, Collision)> = Vec::new();
    for subject in candidates.iter().filter(|c| is_moving(c.array)) {
        for partner in &candidates {
            if partner.entity == subject.entity || !subject.col_rect.overlaps(&partner.col_rect) {
                continue;
            }
            let valid = if partner.can_be_ground {
                ColValidType::Blocking
            } else {
                ColValidType::Internal
            };
            let collision = Collision::create(
                Some(&subject.col_rect),
                Some(CollisionPartner {
                    id: partner.entity,
                    array: partner.array,
                    col_rect: &partner.col_rect,
                }),
                valid,
            );
            if let Some(collision) = collision {
                found.push((subject.entity, collision));
            }
        }
    }

    let mut queued = 0;
    for (subject, collision) in found {
        if let Ok((_, _, _, mut queue)) = query.get_mut(subject) {
            if queue.add(Some(collision), true) {
                queued += 1;
            }
        }
    }
    if queued > 0 {
        debug!("Queued {} collisions", queued);
    }
}

/// Drain and dispatch every sprite's collision queue in registry order,
/// apply the reordering requested by the handlers, then trigger the touch
/// events fired during dispatch.
pub fn collision_handling(
    mut commands: Commands,
    mut registry: ResMut<SpriteRegistry>,
    mut ctx: ResMut<SimContext>,
    mut query: Query<SpriteQueryData>,
) {
    let mut dispatched = 0;
    for entity in registry.ids().to_vec() {
        let Ok(item) = query.get_mut(entity) else {
            continue;
        };
        let mut view = SpriteMut::from_item(item);
        dispatched += view.handle_collisions(&mut ctx);
    }

    registry.apply_reorder_requests(|e| {
        query
            .get_mut(e)
            .is_ok_and(|(_, _, _, _, mut massivity, _, _)| massivity.take_reorder_request())
    });

    let touches = ctx.take_touch_events();
    if dispatched > 0 {
        debug!("Dispatched {} collisions, {} touch events", dispatched, touches.len());
    }
    for event in touches {
        commands.trigger(event);
    }
}
