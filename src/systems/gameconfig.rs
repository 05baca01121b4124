use bevy_ecs::prelude::*;
use log::info;

use crate::resources::camera::Camera;
use crate::resources::context::SimContext;
use crate::resources::gameconfig::GameConfig;

/// Copy a changed [`GameConfig`] or [`Camera`] into the [`SimContext`].
///
/// Must run before the systems that read the context.
pub fn apply_gameconfig_changes(
    config: Option<Res<GameConfig>>,
    camera: Option<Res<Camera>>,
    mut ctx: ResMut<SimContext>,
) {
    if let Some(config) = config {
        if config.is_changed() {
            info!(
                "Applying config: {}x{}, speed factor {}",
                config.render_width, config.render_height, config.speed_factor
            );
            ctx.apply_config(&config);
        }
    }
    if let Some(camera) = camera {
        if camera.is_changed() {
            ctx.camera = *camera;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(apply_gameconfig_changes);
        schedule.run(world);
    }

    #[test]
    fn test_changes_reach_context() {
        let mut world = World::new();
        world.insert_resource(SimContext::default());
        world.insert_resource(GameConfig {
            render_width: 320,
            ..Default::default()
        });
        world.insert_resource(Camera::new(40.0, 0.0));
        tick(&mut world);
        assert_eq!(world.resource::<SimContext>().game_res_w, 320.0);
        assert_eq!(world.resource::<SimContext>().camera.x, 40.0);

        world.resource_mut::<Camera>().x = 80.0;
        tick(&mut world);
        assert_eq!(world.resource::<SimContext>().camera.x, 80.0);
    }

    #[test]
    fn test_missing_resources_are_fine() {
        let mut world = World::new();
        world.insert_resource(SimContext::default());
        tick(&mut world);
        assert_eq!(world.resource::<SimContext>().camera, Camera::default());
    }
}
