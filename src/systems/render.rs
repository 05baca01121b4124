//! Draw request generation.
//!
//! The renderer is an external collaborator: this pass only turns the
//! drawable sprites into [`DrawRequest`]s sorted back to front and stores
//! them in the [`DrawList`] resource. Normal play draws the live pose; the
//! editor preview draws the start pose.

use bevy_ecs::prelude::*;
use glam::{Vec2, Vec3};
use log::debug;

use crate::components::animation::Animation;
use crate::components::collision::CollisionQueue;
use crate::components::geometry::{GeometryState, Rect, ScaleDirections};
use crate::components::image::{Image, ImageHandle};
use crate::components::massivity::{MassiveType, Massivity};
use crate::components::sprite::{Sprite, SpriteRef};
use crate::components::tint::{Color, CombineType, Tint};
use crate::resources::context::SimContext;
use crate::resources::spriteregistry::SpriteRegistry;

const DEBUG_IMAGE_RECT_Z: f32 = 0.000008;
const DEBUG_COL_RECT_Z: f32 = 0.000007;
const OBSOLETE_RECT_Z: f32 = 0.000005;

/// Textured quad for one sprite.
#[derive(Clone, Debug)]
pub struct SurfaceRequest {
    pub sprite: Entity,
    pub image: ImageHandle,
    /// Unscaled size of the texture.
    pub w: f32,
    pub h: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rotation: Vec3,
    pub scale: Vec2,
    pub no_camera: bool,
    pub color: Color,
    pub combine_type: CombineType,
    pub combine_color: [f32; 3],
    /// Shadow offset and color, when the sprite casts one.
    pub shadow: Option<(f32, Color)>,
}

/// Rectangle outline or fill.
#[derive(Clone, Debug, PartialEq)]
pub struct RectRequest {
    pub rect: Rect,
    pub z: f32,
    pub color: Color,
    pub filled: bool,
    pub no_camera: bool,
}

#[derive(Clone, Debug)]
pub enum DrawRequest {
    Surface(SurfaceRequest),
    Rect(RectRequest),
}

impl DrawRequest {
    pub fn z(&self) -> f32 {
        match self {
            DrawRequest::Surface(s) => s.z,
            DrawRequest::Rect(r) => r.z,
        }
    }
}

/// Requests built by the last [`render`] pass, back to front.
#[derive(Resource, Debug, Default)]
pub struct DrawList {
    pub requests: Vec<DrawRequest>,
}

/// Collision rect color in debug mode.
fn massivity_color(massive_type: MassiveType) -> Color {
    match massive_type {
        MassiveType::Massive => Color::new(255, 0, 0, 128),
        MassiveType::HalfMassive => Color::new(255, 165, 0, 128),
        MassiveType::Climbable => Color::new(128, 0, 128, 128),
        MassiveType::FrontPassive => Color::new(144, 238, 144, 128),
        MassiveType::Passive => Color::new(0, 128, 0, 128),
        MassiveType::Undefined => Color::new(0, 0, 0, 128),
    }
}

/// Position along one axis after anchoring the scaled image.
///
/// `grow_before` and `grow_after` are the scale-direction flags for the
/// left/up and right/down edges.
fn anchored(pos: f32, internal: f32, size: f32, scale: f32, grow_before: bool, grow_after: bool) -> (f32, f32) {
    if scale == 1.0 {
        return (pos + internal, 1.0);
    }
    match (grow_before, grow_after) {
        (true, true) => (pos + internal * scale - size * 0.5 * (scale - 1.0), scale),
        (false, true) => (pos + internal * scale, scale),
        (true, false) => (pos + internal * scale - size * (scale - 1.0), scale),
        (false, false) => (pos + internal, 1.0),
    }
}

fn surface_request(
    sprite: &SpriteRef<'_>,
    id: Entity,
    image: &ImageHandle,
    pos: Vec2,
    rotation: Vec3,
    scale: Vec2,
    z: f32,
) -> SurfaceRequest {
    let dirs: ScaleDirections = sprite.geometry.scale_directions;
    let (x, scale_x) = anchored(pos.x, image.int_x, image.w, scale.x, dirs.left, dirs.right);
    let (y, scale_y) = anchored(pos.y, image.int_y, image.h, scale.y, dirs.up, dirs.down);
    let tint = sprite.tint;

    SurfaceRequest {
        sprite: id,
        image: image.clone(),
        w: image.start_w,
        h: image.start_h,
        x,
        y,
        z,
        rotation: rotation + image.base_rotation,
        scale: Vec2::new(scale_x, scale_y),
        no_camera: sprite.sprite.ignores_camera(),
        color: tint.color,
        combine_type: tint.combine_type,
        combine_color: tint.combine_color,
        shadow: (tint.shadow_pos != 0.0).then_some((tint.shadow_pos, tint.shadow_color)),
    }
}

/// Image rect as drawn, for the debug overlay.
fn debug_image_rect(g: &GeometryState, image: &Image) -> Rect {
    let mut rect = g.rect;
    if !g.scale_affects_rect {
        let dirs = g.scale_directions;
        if dirs.up {
            rect.y += image.int_y * g.scale.y - image.h * 0.5 * (g.scale.y - 1.0);
        }
        if dirs.down {
            rect.h += image.h * (g.scale.y - 1.0);
        }
        if dirs.left {
            rect.x += image.int_x * g.scale.x - image.w * 0.5 * (g.scale.x - 1.0);
        }
        if dirs.right {
            rect.w += image.w * (g.scale.x - 1.0);
        }
    }
    rect
}

/// Requests for a single sprite, empty when it is not drawable.
pub fn sprite_draw_requests(view: &SpriteRef<'_>, ctx: &SimContext) -> Vec<DrawRequest> {
    let mut requests = Vec::new();
    let Some(id) = view.id else {
        return requests;
    };
    if !view.is_draw_valid(ctx) {
        return requests;
    }

    let sprite: &Sprite = view.sprite;
    let g = view.geometry;
    let pos_z = view.massivity.pos_z();
    let no_camera = sprite.ignores_camera();
    let editor = ctx.editor_enabled();
    let surface = if editor {
        let z = if sprite.editor_pos_z > 0.0 {
            sprite.editor_pos_z
        } else {
            pos_z
        };
        sprite
            .start_image()
            .map(|img| surface_request(view, id, img, g.start_pos, g.start_rotation, g.start_scale, z))
    } else {
        sprite
            .image()
            .map(|img| surface_request(view, id, img, g.pos, g.rotation, g.scale, pos_z))
    };
    requests.extend(surface.map(DrawRequest::Surface));

    if ctx.debug {
        if let Some(image) = sprite.image() {
            requests.push(DrawRequest::Rect(RectRequest {
                rect: debug_image_rect(g, image),
                z: pos_z + DEBUG_IMAGE_RECT_Z,
                color: Color::LIGHTGREY,
                filled: false,
                no_camera,
            }));
        }
        requests.push(DrawRequest::Rect(RectRequest {
            rect: g.col_rect,
            z: pos_z + DEBUG_COL_RECT_Z,
            color: massivity_color(view.massivity.massive_type()),
            filled: true,
            no_camera,
        }));
    }

    if editor && sprite.image().is_some_and(|img| img.obsolete) {
        requests.push(DrawRequest::Rect(RectRequest {
            rect: g.col_rect,
            z: pos_z + OBSOLETE_RECT_Z,
            color: Color::RED,
            filled: true,
            no_camera: false,
        }));
    }

    requests
}

/// Build the [`DrawList`] from every drawable sprite, back to front.
///
/// Pending massivity reorders are applied first. The sort is stable, so
/// sprites at the same depth keep the registry order and the last one moved
/// to the back is drawn on top.
pub fn render(
    ctx: Res<SimContext>,
    mut registry: ResMut<SpriteRegistry>,
    mut draw_list: ResMut<DrawList>,
    mut query: Query<(
        Entity,
        &Sprite,
        &GeometryState,
        &CollisionQueue,
        &mut Massivity,
        &Animation,
        &Tint,
    )>,
) {
    let moved = registry.apply_reorder_requests(|e| {
        query
            .get_mut(e)
            .is_ok_and(|(_, _, _, _, mut massivity, _, _)| massivity.take_reorder_request())
    });
    if moved > 0 {
        debug!("Moved {} sprites to the back before drawing", moved);
    }

    let mut requests: Vec<DrawRequest> = registry
        .ids()
        .iter()
        .filter_map(|e| query.get(*e).ok())
        .flat_map(|item| sprite_draw_requests(&SpriteRef::from_item(item), &ctx))
        .collect();
    requests.sort_by(|a, b| a.z().total_cmp(&b.z()));
    draw_list.requests = requests;
}
