//! Sprite model demo driver.
//!
//! Loads a level (a JSON node tree of sprite nodes) or builds a small demo
//! level into a bevy [`World`], then runs a number of fixed steps of one
//! schedule:
//!
//! 1. copy config and camera changes into the context
//! 2. detect overlaps and queue collisions
//! 3. move the player unless it stands on something
//! 4. drain and dispatch every collision queue, trigger touch events
//! 5. advance animations
//! 6. build draw requests
//! 7. despawn destroyed sprites
//!
//! Touch events reach the host over the touch bridge and are logged every
//! step. The resulting level state can be written as a savegame block.
//!
//! # Running
//!
//! ```sh
//! cargo run -- --steps 120 --save save.json
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use clap::Parser;
use log::{debug, info, warn};

use spritecore::components::collision::{Collision, ObjectDirection};
use spritecore::components::image::Image;
use spritecore::components::massivity::{POS_Z_PLAYER, SpriteArray};
use spritecore::components::sprite::{SpriteBehavior, SpriteBundle, SpriteMut, SpriteRef};
use spritecore::events::touch::{TouchBridge, forward_touch_events, touch_channel};
use spritecore::resources::camera::Camera;
use spritecore::resources::context::{LevelContext, SimContext};
use spritecore::resources::gameconfig::GameConfig;
use spritecore::resources::imagestore::{ImageProvider, ImageStore};
use spritecore::resources::spriteregistry::{SpriteRegistry, last_blocking_collision, spawn_sprite, with_sprite_mut};
use spritecore::savegame::node::Node;
use spritecore::savegame::save_level::SaveLevel;
use spritecore::systems::animation::animation;
use spritecore::systems::cleanup::cleanup_destroyed;
use spritecore::systems::collision::{collision_detector, collision_handling};
use spritecore::systems::gameconfig::apply_gameconfig_changes;
use spritecore::systems::render::{DrawList, render};

const STEP_MS: u32 = 16;
const FALL_SPEED: f32 = 4.0;

/// Sprite model demo
#[derive(Parser)]
#[command(version, about = "Runs the sprite model over a level for a number of steps.")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Level file (JSON node tree). A demo level is used when omitted.
    #[arg(long, value_name = "PATH")]
    level: Option<PathBuf>,

    /// Number of simulation steps.
    #[arg(long, default_value_t = 60)]
    steps: u32,

    /// Write the savegame block of the level here after the run.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

/// Reports its first landing.
#[derive(Debug, Clone, Default)]
struct Player {
    grounded: bool,
}

impl SpriteBehavior for Player {
    fn duplicate(&self) -> Box<dyn SpriteBehavior> {
        Box::new(self.clone())
    }

    fn handle_collision_massive(&mut self, sprite: &mut SpriteMut<'_>, collision: &Collision, _ctx: &mut SimContext) {
        if collision.is_blocking() && collision.direction == ObjectDirection::Down && !self.grounded {
            info!("'{}' landed", sprite.sprite().name);
            self.grounded = true;
        }
    }

    fn handle_collision_passive(&mut self, sprite: &mut SpriteMut<'_>, collision: &Collision, _ctx: &mut SimContext) {
        debug!("'{}' passes {:?}", sprite.sprite().name, collision.partner);
    }
}

/// The sprite driven by [`player_gravity`].
#[derive(Resource, Clone, Copy, Debug)]
struct PlayerEntity(Entity);

fn demo_images() -> ImageStore {
    let mut images = ImageStore::new();
    images.insert(Image::new("ground/grass.png", 256.0, 32.0));
    images.insert(Image::new("deco/bush.png", 48.0, 32.0));
    images.insert(Image::new("player/small.png", 32.0, 32.0).with_collision(4.0, 0.0, 24.0, 32.0));
    images
}

fn demo_level() -> Node {
    let mut level = Node::new("level_file");
    for (x, y, image, kind) in [
        (0, 400, "ground/grass.png", "massive"),
        (256, 400, "ground/grass.png", "massive"),
        (120, 368, "deco/bush.png", "passive"),
    ] {
        let node = level.add_child("sprite");
        node.set_attribute("posx", x);
        node.set_attribute("posy", y);
        node.set_attribute("image", image);
        node.set_attribute("type", kind);
    }
    level
}

fn spawn_player(world: &mut World) -> Entity {
    let ctx = world.resource::<SimContext>().clone();
    let image = world
        .resource_mut::<ImageStore>()
        .get_image(std::path::Path::new("player/small.png"));

    let mut bundle = SpriteBundle::with_behavior("player", Box::new(Player::default()));
    {
        let mut player = bundle.view();
        player.sprite_mut().name = "player".to_string();
        player.set_image(image, true, false, &ctx);
        player.set_pos(128.0, 200.0, true, &ctx);
        player.massivity_mut().set_array(SpriteArray::Player);
        player.massivity_mut().set_pos_z(POS_Z_PLAYER);
        player.sprite_mut().spawned = true;
    }
    spawn_sprite(world, bundle)
}

/// Let the player fall until its last blocking collision is below it.
fn player_gravity(world: &mut World) {
    let Some(player) = world.get_resource::<PlayerEntity>().map(|p| p.0) else {
        return;
    };
    let standing = last_blocking_collision(world, player).is_some_and(|c| c.direction == ObjectDirection::Down);
    if !standing {
        with_sprite_mut(world, player, |sprite, ctx| sprite.move_by(0.0, FALL_SPEED, false, ctx));
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("{e}, using defaults");
    }

    let level_node = match &cli.level {
        Some(path) => match Node::read_from_file(path) {
            Ok(node) => node,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => demo_level(),
    };

    let (touch_tx, touch_rx) = touch_channel();
    let mut ctx = SimContext::from_config(&config);
    ctx.level = Some(LevelContext::new("demo"));

    let mut world = World::new();
    world.insert_resource(ctx);
    world.insert_resource(config);
    world.insert_resource(Camera::default());
    world.insert_resource(demo_images());
    world.insert_resource(SpriteRegistry::new());
    world.insert_resource(DrawList::default());
    world.insert_resource(TouchBridge::new(touch_tx));
    world.add_observer(forward_touch_events);
    // Ensure the observer is registered before any system triggers events.
    world.flush();

    for node in &level_node.children {
        let bundle = world.resource_scope(|world, mut images: Mut<ImageStore>| {
            SpriteBundle::from_node(node, &mut *images, world.resource::<SimContext>())
        });
        spawn_sprite(&mut world, bundle);
    }
    let player = spawn_player(&mut world);
    world.insert_resource(PlayerEntity(player));
    info!(
        "Level loaded with {} sprites",
        world.resource::<SpriteRegistry>().len()
    );

    let mut update = Schedule::default();
    update.add_systems(
        (
            apply_gameconfig_changes,
            collision_detector,
            player_gravity,
            collision_handling,
            animation,
            render,
            cleanup_destroyed,
        )
            .chain(),
    );

    for step in 0..cli.steps {
        world.resource_mut::<SimContext>().elapsed_ticks = STEP_MS;
        update.run(&mut world);

        for event in touch_rx.try_iter() {
            debug!("step {step}: {:?} touched by {:?}", event.sprite, event.touched_by);
        }
        debug!(
            "step {step}: {} draw requests",
            world.resource::<DrawList>().requests.len()
        );
    }

    if let Some(pos) = world.get::<spritecore::components::geometry::GeometryState>(player).map(|g| g.pos) {
        info!("Player ended at ({}, {})", pos.x, pos.y);
    }

    if let Some(path) = cli.save {
        let mut save = SaveLevel::new("demo");
        save.player_pos = SpriteRef::from_world(&world, player).map(|s| s.geometry.pos);

        let (spawned, regular): (Vec<SpriteRef>, Vec<SpriteRef>) = world
            .resource::<SpriteRegistry>()
            .ids()
            .iter()
            .filter(|e| **e != player)
            .filter_map(|e| SpriteRef::from_world(&world, *e))
            .partition(|s| s.sprite.spawned);

        let mut root = Node::new("savegame");
        save.save_to_node(&mut root, regular, spawned, world.resource::<SimContext>());
        match root.write_to_file(&path) {
            Ok(()) => info!("Savegame written to {}", path.display()),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }
}
