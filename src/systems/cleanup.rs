use bevy_ecs::prelude::*;
use log::debug;

use crate::components::sprite::Sprite;
use crate::resources::spriteregistry::SpriteRegistry;

/// Despawn destroyed sprites and drop them from the registry.
///
/// Protected sprites never reach the destroyed state, so everything found
/// here can go.
pub fn cleanup_destroyed(
    mut commands: Commands,
    mut registry: ResMut<SpriteRegistry>,
    query: Query<(Entity, &Sprite)>,
) {
    for (entity, sprite) in query.iter() {
        if sprite.is_destroyed() {
            debug!("Removing destroyed sprite {:?}", entity);
            registry.remove(entity);
            commands.entity(entity).despawn();
        }
    }
}
