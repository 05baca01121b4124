use bevy_ecs::prelude::*;

use crate::components::sprite::{SpriteMut, SpriteQueryData};
use crate::resources::context::SimContext;

/// Advance the frame animation of every live sprite within camera range.
pub fn animation(ctx: Res<SimContext>, mut query: Query<SpriteQueryData>) {
    for item in query.iter_mut() {
        let (_, sprite, _, _, _, animation, _) = &item;
        if !sprite.valid_update() || !sprite.is_active() || !animation.enabled {
            continue;
        }
        let mut view = SpriteMut::from_item(item);
        if !view.as_ref().is_in_range(&ctx) {
            continue;
        }
        view.update_animation(&ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::image::{AnimFrame, Image};
    use crate::components::sprite::{Sprite, SpriteBundle};
    use std::sync::Arc;

    #[test]
    fn test_animation_advances_in_range_sprites_only() {
        let mut world = World::new();
        world.insert_resource(SimContext::default());
        let ctx = SimContext::default();
        let a = Image::new("walk_1.png", 16.0, 16.0).into_handle();
        let b = Image::new("walk_2.png", 16.0, 16.0).into_handle();

        let mut ids = Vec::new();
        for x in [10.0, 9000.0] {
            let mut bundle = SpriteBundle::new("sprite");
            let mut s = bundle.view();
            s.add_image_set("main", vec![AnimFrame::new(a.clone(), 50), AnimFrame::new(b.clone(), 50)]);
            s.set_image_set("main", true, &ctx);
            s.set_pos(x, 10.0, true, &ctx);
            ids.push(world.spawn(bundle).id());
        }

        world.resource_mut::<SimContext>().elapsed_ticks = 60;
        let mut schedule = Schedule::default();
        schedule.add_systems(animation);
        schedule.run(&mut world);

        let image = |e: Entity| world.get::<Sprite>(e).unwrap().image().unwrap().clone();
        assert!(Arc::ptr_eq(&image(ids[0]), &b));
        assert!(Arc::ptr_eq(&image(ids[1]), &a));
    }
}
