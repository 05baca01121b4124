//! Sprite model integration tests: geometry, collision dispatch, lifecycle
//! and whole simulation steps driven through a bevy world.

use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;

use spritecore::components::collision::{
    BareCollidable, ColValidType, Collider, Collision, CollisionHandler, CollisionQueue, ObjectDirection,
};
use spritecore::components::geometry::GeometryState;
use spritecore::components::image::{Image, ImageHandle};
use spritecore::components::massivity::{MassiveType, Massivity, SpriteArray};
use spritecore::components::sprite::{Sprite, SpriteBehavior, SpriteBundle, SpriteMut};
use spritecore::events::editor::EditorMode;
use spritecore::events::touch::{TouchBridge, TouchEvent, forward_touch_events, touch_channel};
use spritecore::resources::context::{LevelContext, SimContext};
use spritecore::resources::spriteregistry::{
    SpriteRegistry, add_collision, destroy_sprite, last_blocking_collision, set_massive_type, spawn_sprite,
    with_sprite_mut,
};
use spritecore::systems::collision::{collision_detector, collision_handling};
use spritecore::systems::render::{DrawList, DrawRequest, render};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// A world inside a level, with touch events forwarded to the returned
/// receiver.
fn make_world() -> (World, Receiver<TouchEvent>) {
    let (touch_tx, touch_rx) = touch_channel();
    let mut ctx = SimContext::default();
    ctx.level = Some(LevelContext::new("test"));

    let mut world = World::new();
    world.insert_resource(ctx);
    world.insert_resource(SpriteRegistry::new());
    world.insert_resource(DrawList::default());
    world.insert_resource(TouchBridge::new(touch_tx));
    world.add_observer(forward_touch_events);
    world.flush();
    (world, touch_rx)
}

fn tick_detector(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems(collision_detector);
    schedule.run(world);
}

fn tick_handling(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems(collision_handling);
    schedule.run(world);
}

fn tick_render(world: &mut World) {
    let mut schedule = Schedule::default();
    schedule.add_systems(render);
    schedule.run(world);
}

fn image(w: f32, h: f32) -> ImageHandle {
    Image::new("test/image.png", w, h).into_handle()
}

fn bundle_at(ctx: &SimContext, x: f32, y: f32, w: f32, h: f32, mass: MassiveType) -> SpriteBundle {
    let mut b = SpriteBundle::new("sprite");
    let mut s = b.view();
    s.set_image(Some(image(w, h)), true, false, ctx);
    s.set_pos(x, y, true, ctx);
    s.set_massive_type(mass);
    b
}

fn sprite_at(world: &mut World, x: f32, y: f32, w: f32, h: f32, mass: MassiveType) -> Entity {
    let ctx = world.resource::<SimContext>().clone();
    let b = bundle_at(&ctx, x, y, w, h, mass);
    spawn_sprite(world, b)
}

/// Records which handler saw which partner and optionally queues a
/// follow-up collision from inside the handler.
#[derive(Debug, Clone, Default)]
struct Recorder {
    seen: Arc<Mutex<Vec<(&'static str, Option<Entity>)>>>,
    follow_up: bool,
}

impl Recorder {
    fn log(&self, handler: &'static str, collision: &Collision) {
        self.seen.lock().unwrap().push((handler, collision.partner));
    }
}

impl SpriteBehavior for Recorder {
    fn duplicate(&self) -> Box<dyn SpriteBehavior> {
        Box::new(self.clone())
    }

    fn handle_collision_player(&mut self, _s: &mut SpriteMut<'_>, c: &Collision, _ctx: &mut SimContext) {
        self.log("player", c);
    }

    fn handle_collision_enemy(&mut self, _s: &mut SpriteMut<'_>, c: &Collision, _ctx: &mut SimContext) {
        self.log("enemy", c);
    }

    fn handle_collision_massive(&mut self, sprite: &mut SpriteMut<'_>, c: &Collision, _ctx: &mut SimContext) {
        self.log("massive", c);
        if self.follow_up {
            let bump = Collision::create(Some(&sprite.geometry().col_rect), None, ColValidType::Internal);
            sprite.collisions_mut().add(bump, false);
        }
    }

    fn handle_collision_passive(&mut self, _s: &mut SpriteMut<'_>, c: &Collision, _ctx: &mut SimContext) {
        self.log("passive", c);
    }

    fn handle_collision_lava(&mut self, _s: &mut SpriteMut<'_>, c: &Collision, _ctx: &mut SimContext) {
        self.log("lava", c);
    }
}

#[test]
fn incremental_scaling_matches_direct_scaling() {
    let ctx = SimContext::default();
    let mut direct = SpriteBundle::new("sprite");
    let mut stepped = SpriteBundle::new("sprite");
    for b in [&mut direct, &mut stepped] {
        let mut s = b.view();
        s.set_scale_affects_rect(true);
        s.set_image(Some(image(40.0, 20.0)), true, false, &ctx);
    }

    for scale in [2.0, 0.5, 1.0, 3.0, 0.0, 1.5] {
        stepped.view().set_scale_x(scale, false, &ctx);
    }
    direct.view().set_scale_x(1.5, false, &ctx);

    assert!(approx_eq(stepped.geometry.rect.w, 60.0));
    assert!(approx_eq(stepped.geometry.rect.w, direct.geometry.rect.w));
    assert!(approx_eq(stepped.geometry.col_rect.w, direct.geometry.col_rect.w));
}

#[test]
fn quarter_turns_swap_and_half_turns_mirror() {
    let ctx = SimContext::default();
    let offset_image = Image::new("test/offset.png", 40.0, 20.0)
        .with_collision(5.0, 2.0, 10.0, 8.0)
        .into_handle();

    for degrees in [270.0, 300.0, -60.0] {
        let mut b = SpriteBundle::new("sprite");
        let mut s = b.view();
        s.set_rotation_affects_rect(true);
        s.set_image(Some(offset_image.clone()), true, false, &ctx);
        s.set_rotation_z(degrees, true, &ctx);
        let g = &b.geometry;
        assert_eq!((g.rect.w, g.rect.h), (20.0, 40.0), "rotation {degrees}");
        assert_eq!((g.col_rect.w, g.col_rect.h), (8.0, 10.0));
    }

    let mut b = SpriteBundle::new("sprite");
    let mut s = b.view();
    s.set_rotation_affects_rect(true);
    s.set_image(Some(offset_image), true, false, &ctx);
    s.set_rotation_z(200.0, true, &ctx);
    let g = &b.geometry;
    assert_eq!((g.rect.w, g.rect.h), (40.0, 20.0));
    assert!(approx_eq(g.col_pos.x, 40.0 - (10.0 + 5.0)));
    assert!(approx_eq(g.col_pos.y, 20.0 - (8.0 + 2.0)));
}

#[test]
fn origin_position_counts_as_unset_start() {
    let ctx = SimContext::default();
    let mut b = SpriteBundle::new("sprite");
    let mut s = b.view();
    s.set_pos(0.0, 0.0, true, &ctx);
    // a later move without new_start still rewrites the start position
    s.set_pos(50.0, 60.0, false, &ctx);
    assert_eq!(b.geometry.start_pos, b.geometry.pos);
}

#[test]
fn add_if_new_keeps_one_record_per_partner() {
    let (mut world, _touch_rx) = make_world();
    let subject = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    let wall = sprite_at(&mut world, 20.0, 0.0, 32.0, 32.0, MassiveType::Massive);

    assert!(add_collision(&mut world, subject, Some(wall), ColValidType::Blocking, true));
    assert!(!add_collision(&mut world, subject, Some(wall), ColValidType::Blocking, true));
    assert_eq!(world.get::<CollisionQueue>(subject).unwrap().len(), 1);

    assert!(add_collision(&mut world, subject, Some(wall), ColValidType::Blocking, false));
    assert_eq!(world.get::<CollisionQueue>(subject).unwrap().len(), 2);
}

#[test]
fn dispatch_routes_by_category_and_drains_the_batch() {
    let (mut world, _touch_rx) = make_world();
    let recorder = Recorder {
        follow_up: true,
        ..Recorder::default()
    };
    let seen = recorder.seen.clone();

    let ctx = world.resource::<SimContext>().clone();
    let mut subject = bundle_at(&ctx, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    subject.sprite.set_behavior(Box::new(recorder));
    let subject = spawn_sprite(&mut world, subject);

    let mut partners = Vec::new();
    for (array, mass) in [
        (None, MassiveType::Massive),
        (None, MassiveType::Climbable),
        (None, MassiveType::Passive),
        (Some(SpriteArray::Enemy), MassiveType::Passive),
        (Some(SpriteArray::Lava), MassiveType::Passive),
        (Some(SpriteArray::Hud), MassiveType::Passive),
    ] {
        let mut p = bundle_at(&ctx, 10.0, 10.0, 32.0, 32.0, mass);
        if let Some(array) = array {
            p.massivity.set_array(array);
        }
        partners.push(spawn_sprite(&mut world, p));
    }
    for partner in &partners {
        add_collision(&mut world, subject, Some(*partner), ColValidType::Internal, true);
    }

    tick_handling(&mut world);

    // the hud record has no handler
    let handlers: Vec<&str> = seen.lock().unwrap().iter().map(|(h, _)| *h).collect();
    assert_eq!(handlers, vec!["massive", "massive", "passive", "enemy", "lava"]);

    // only the follow-ups queued by the handlers remain, for the next step
    let queue = world.get::<CollisionQueue>(subject).unwrap();
    assert_eq!(queue.len(), 2);
    assert!(queue.iter().all(|c| c.partner.is_none()));
}

#[test]
fn dispatch_triggers_symmetric_touch_events() {
    let (mut world, touch_rx) = make_world();
    let subject = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    let partner = sprite_at(&mut world, 10.0, 0.0, 32.0, 32.0, MassiveType::Massive);

    add_collision(&mut world, subject, Some(partner), ColValidType::Blocking, true);
    add_collision(&mut world, subject, None, ColValidType::Blocking, true);
    tick_handling(&mut world);

    let events: Vec<TouchEvent> = touch_rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            TouchEvent { sprite: subject, touched_by: Some(partner) },
            TouchEvent { sprite: partner, touched_by: Some(subject) },
            TouchEvent { sprite: subject, touched_by: None },
        ]
    );
    assert_eq!(world.resource::<SimContext>().pending_touch_events(), 0);

    world.resource_mut::<SimContext>().editor = EditorMode::Level;
    add_collision(&mut world, subject, Some(partner), ColValidType::Blocking, true);
    tick_handling(&mut world);
    assert!(touch_rx.try_iter().next().is_none());
}

#[test]
fn touch_observers_see_events_after_dispatch() {
    let (mut world, _touch_rx) = make_world();
    let observed: Arc<Mutex<Vec<TouchEvent>>> = Arc::default();
    let sink = observed.clone();
    world.add_observer(move |trigger: On<TouchEvent>| {
        sink.lock().unwrap().push(*trigger.event());
    });
    world.flush();

    let subject = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    let partner = sprite_at(&mut world, 10.0, 0.0, 32.0, 32.0, MassiveType::Massive);
    add_collision(&mut world, subject, Some(partner), ColValidType::Blocking, true);
    tick_handling(&mut world);

    assert_eq!(observed.lock().unwrap().len(), 2);
}

#[test]
fn bare_collidables_never_fire_touch_events() {
    let mut ctx = SimContext::default();
    ctx.level = Some(LevelContext::new("test"));
    let mut bare = BareCollidable::default();
    let col_rect = bare.col_rect;
    bare.collisions_mut().add(
        Collision::create(Some(&col_rect), None, ColValidType::Blocking),
        false,
    );
    // the boundary record has no category and is dropped
    assert_eq!(bare.handle_collisions(&mut ctx), 0);
    assert!(bare.collisions().is_empty());
    assert_eq!(ctx.pending_touch_events(), 0);
    bare.handle_collision_lava(
        &Collision::create(Some(&col_rect), None, ColValidType::Internal).unwrap(),
        &mut ctx,
    );
}

#[test]
fn destroy_is_idempotent_and_respects_protection() {
    let (mut world, _touch_rx) = make_world();
    let s = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Massive);
    assert!(destroy_sprite(&mut world, s));
    destroy_sprite(&mut world, s);
    let sprite = world.get::<Sprite>(s).unwrap();
    assert!(sprite.is_destroyed());
    assert!(sprite.image().is_none());
    assert!(!sprite.valid_update());

    let protected = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Massive);
    world.get_mut::<Sprite>(protected).unwrap().disallow_managed_delete = true;
    destroy_sprite(&mut world, protected);
    destroy_sprite(&mut world, protected);
    let sprite = world.get::<Sprite>(protected).unwrap();
    assert!(!sprite.is_destroyed());
    assert!(sprite.image().is_some());
    assert!(sprite.valid_draw());
}

#[test]
fn massivity_round_trip_restores_passive_partition() {
    let (mut world, _touch_rx) = make_world();
    let id = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    set_massive_type(&mut world, id, MassiveType::Massive);
    set_massive_type(&mut world, id, MassiveType::Passive);
    let massivity = world.get::<Massivity>(id).unwrap();
    assert!(!massivity.can_be_ground());
    assert_eq!(massivity.array(), SpriteArray::Passive);
}

#[test]
fn climbable_partners_do_not_block() {
    let (mut world, _touch_rx) = make_world();
    let subject = sprite_at(&mut world, 0.0, 0.0, 32.0, 32.0, MassiveType::Passive);
    let ladder = sprite_at(&mut world, 0.0, 10.0, 32.0, 32.0, MassiveType::Climbable);
    add_collision(&mut world, subject, Some(ladder), ColValidType::Internal, true);

    assert!(last_blocking_collision(&world, subject).is_none());
    let last = world
        .get::<CollisionQueue>(subject)
        .unwrap()
        .last_collision()
        .cloned();
    assert_eq!(last.map(|c| c.partner), Some(Some(ladder)));
}

#[test]
fn falling_player_lands_on_ground() {
    let (mut world, touch_rx) = make_world();
    let ground = sprite_at(&mut world, 0.0, 100.0, 200.0, 32.0, MassiveType::Massive);

    let ctx = world.resource::<SimContext>().clone();
    let mut player = bundle_at(&ctx, 50.0, 0.0, 16.0, 16.0, MassiveType::Passive);
    player.massivity.set_array(SpriteArray::Player);
    let player = spawn_sprite(&mut world, player);

    let mut landed_after = None;
    for step in 0..100 {
        tick_detector(&mut world);
        let blocked = last_blocking_collision(&world, player).is_some_and(|c| c.direction == ObjectDirection::Down);
        tick_handling(&mut world);
        if blocked {
            landed_after = Some(step);
            break;
        }
        with_sprite_mut(&mut world, player, |s, ctx| s.move_by(0.0, 5.0, false, ctx));
    }

    assert!(landed_after.is_some());
    let geometry = world.get::<GeometryState>(player).unwrap();
    assert!(geometry.col_rect.bottom() > 100.0);
    assert!(geometry.col_rect.y < 100.0);
    assert!(touch_rx.try_iter().any(|e| e.sprite == ground));

    tick_render(&mut world);
    let surfaces = world
        .resource::<DrawList>()
        .requests
        .iter()
        .filter(|r| matches!(r, DrawRequest::Surface(_)))
        .count();
    assert_eq!(surfaces, 2);
}
