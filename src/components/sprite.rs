//! The sprite entity.
//!
//! A sprite is an entity carrying the [`Sprite`] component (visual
//! assignment and lifecycle flags) next to its [`GeometryState`],
//! [`CollisionQueue`], [`Massivity`], [`Animation`] and [`Tint`]. The
//! components are spawned together as a [`SpriteBundle`].
//!
//! Operations that touch several components go through a view:
//! [`SpriteMut`] for mutation and [`SpriteRef`] for reads. Both can be built
//! from a query item, from the world, or from a bundle that has not been
//! spawned yet. Type-specific reactions live in a [`SpriteBehavior`] object
//! owned by the sprite.
//!
//! Lifecycle: a new sprite is passive with no image and an undefined
//! partition. It is active as long as it is not destroyed;
//! [`SpriteMut::destroy`] is one-way.
//!
//! Draw and update validity are cached and recomputed whenever something
//! they depend on changes.

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::{debug, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::components::animation::Animation;
use crate::components::collision::{Collider, Collision, CollisionHandler, CollisionQueue};
use crate::components::geometry::{GeometryState, ScaleDirections};
use crate::components::image::{AnimFrame, ImageHandle};
use crate::components::massivity::{MassiveType, Massivity};
use crate::components::tint::Tint;
use crate::events::editor::{ConfigWidget, Editor, require_editor};
use crate::resources::camera::Camera;
use crate::resources::context::SimContext;
use crate::resources::imagestore::ImageProvider;
use crate::savegame::level::relative_image_path;
use crate::savegame::node::Node;

/// Below this camera range sprites only update while on screen.
pub const MIN_CAMERA_RANGE: i32 = 300;
pub const DEFAULT_CAMERA_RANGE: i32 = 1000;
/// Name of the image text box in the editor panel.
pub const EDITOR_IMAGE_WIDGET: &str = "editor_sprite_image";

/// Type-specific hooks of a sprite.
///
/// Every method has a default matching a plain decorative sprite.
pub trait SpriteBehavior: fmt::Debug + Send + Sync {
    /// Behaviour for a copy of the sprite.
    fn duplicate(&self) -> Box<dyn SpriteBehavior>;

    /// Plain sprites take their name from the start image and get the
    /// default editor panel.
    fn is_basic_sprite(&self) -> bool {
        false
    }

    /// Value of the level-file `type` attribute. Empty means "use the
    /// massivity name".
    fn xml_type_name(&self, sprite: &SpriteRef<'_>) -> String {
        sprite.default_xml_type_name()
    }

    /// Fill a savegame node. Return `true` when the node carries state worth
    /// keeping.
    fn save_to_savegame_node(&self, sprite: &SpriteRef<'_>, node: &mut Node) -> bool {
        sprite.write_savegame_base(node);
        false
    }

    fn handle_collision_player(&mut self, _sprite: &mut SpriteMut<'_>, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_enemy(&mut self, _sprite: &mut SpriteMut<'_>, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_massive(&mut self, _sprite: &mut SpriteMut<'_>, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_passive(&mut self, _sprite: &mut SpriteMut<'_>, _collision: &Collision, _ctx: &mut SimContext) {}
    fn handle_collision_lava(&mut self, _sprite: &mut SpriteMut<'_>, _collision: &Collision, _ctx: &mut SimContext) {}

    /// Populate the editor panel for non-basic sprites. Implementations
    /// must finish with [`SpriteMut::editor_init`].
    fn editor_activate(&mut self, _sprite: &mut SpriteMut<'_>, _editor: &mut dyn Editor, _ctx: &SimContext) {}

    /// Sync editor widgets with the sprite state.
    fn editor_state_update(&mut self, _sprite: &mut SpriteMut<'_>) {}

    /// Name shown in the editor.
    fn create_name(&self, sprite: &SpriteRef<'_>) -> String {
        sprite.sprite.name.clone()
    }
}

/// Behaviour of a plain decorative sprite.
#[derive(Clone, Copy, Debug, Default)]
pub struct BasicSprite;

impl SpriteBehavior for BasicSprite {
    fn duplicate(&self) -> Box<dyn SpriteBehavior> {
        Box::new(*self)
    }

    fn is_basic_sprite(&self) -> bool {
        true
    }
}

/// Identity, visual assignment and lifecycle of a sprite.
#[derive(Component, Debug)]
pub struct Sprite {
    /// Declared type tag; names the node in level files.
    pub type_name: String,
    pub name: String,
    pub editor_tags: String,
    /// Unique level identifier, `-1` until assigned.
    pub uid: i32,
    /// Image path as written in the level file.
    pub image_filename: String,
    /// Depth used in the editor when positive.
    pub editor_pos_z: f32,
    pub camera_range: i32,
    /// Created at runtime rather than authored in the level.
    pub spawned: bool,
    pub suppress_save: bool,
    /// Protects the sprite from [`SpriteMut::destroy`].
    pub disallow_managed_delete: bool,

    image: Option<ImageHandle>,
    start_image: Option<ImageHandle>,
    owns_image: bool,
    images: Vec<AnimFrame>,
    image_sets: FxHashMap<String, Vec<AnimFrame>>,

    active: bool,
    destroyed: bool,
    no_camera: bool,
    valid_draw: bool,
    valid_update: bool,

    behavior: Option<Box<dyn SpriteBehavior>>,
}

impl Sprite {
    fn with_behavior(type_name: impl Into<String>, behavior: Box<dyn SpriteBehavior>) -> Self {
        Self {
            type_name: type_name.into(),
            name: String::new(),
            editor_tags: String::new(),
            uid: -1,
            image_filename: String::new(),
            editor_pos_z: 0.0,
            camera_range: DEFAULT_CAMERA_RANGE,
            spawned: false,
            suppress_save: false,
            disallow_managed_delete: false,
            image: None,
            start_image: None,
            owns_image: false,
            images: Vec::new(),
            image_sets: FxHashMap::default(),
            active: true,
            destroyed: false,
            no_camera: false,
            valid_draw: true,
            valid_update: true,
            behavior: Some(behavior),
        }
    }

    pub fn is_basic_sprite(&self) -> bool {
        self.behavior.as_ref().is_some_and(|b| b.is_basic_sprite())
    }

    /// Replace the behaviour, e.g. when a level turns a basic sprite into something richer.
    pub fn set_behavior(&mut self, behavior: Box<dyn SpriteBehavior>) {
        self.behavior = Some(behavior);
    }

    pub(crate) fn behavior(&self) -> Option<&dyn SpriteBehavior> {
        self.behavior.as_deref()
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn start_image(&self) -> Option<&ImageHandle> {
        self.start_image.as_ref()
    }

    /// Whether the active image is owned by this sprite.
    pub fn owns_image(&self) -> bool {
        self.owns_image
    }

    /// Frames of the active image set.
    pub fn images(&self) -> &[AnimFrame] {
        &self.images
    }

    pub fn has_image_set(&self, name: &str) -> bool {
        self.image_sets.contains_key(name)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn ignores_camera(&self) -> bool {
        self.no_camera
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn is_update_valid(&self) -> bool {
        !self.destroyed
    }

    /// Cached draw validity.
    pub fn valid_draw(&self) -> bool {
        self.valid_draw
    }

    /// Cached update validity.
    pub fn valid_update(&self) -> bool {
        self.valid_update
    }
}

/// Components of one sprite, spawned together.
#[derive(Bundle, Debug)]
pub struct SpriteBundle {
    pub sprite: Sprite,
    pub geometry: GeometryState,
    pub collisions: CollisionQueue,
    pub massivity: Massivity,
    pub animation: Animation,
    pub tint: Tint,
}

impl SpriteBundle {
    /// A basic sprite.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self::with_behavior(type_name, Box::new(BasicSprite))
    }

    pub fn with_behavior(type_name: impl Into<String>, behavior: Box<dyn SpriteBehavior>) -> Self {
        Self {
            sprite: Sprite::with_behavior(type_name, behavior),
            geometry: GeometryState::default(),
            collisions: CollisionQueue::default(),
            massivity: Massivity::default(),
            animation: Animation::default(),
            tint: Tint::default(),
        }
    }

    /// Mutable view of a sprite that has not been spawned yet.
    pub fn view(&mut self) -> SpriteMut<'_> {
        SpriteMut {
            id: None,
            sprite: &mut self.sprite,
            geometry: &mut self.geometry,
            collisions: &mut self.collisions,
            massivity: &mut self.massivity,
            animation: &mut self.animation,
            tint: &mut self.tint,
        }
    }

    pub fn as_ref(&self) -> SpriteRef<'_> {
        SpriteRef {
            id: None,
            sprite: &self.sprite,
            geometry: &self.geometry,
            collisions: &self.collisions,
            massivity: &self.massivity,
            animation: &self.animation,
            tint: &self.tint,
        }
    }
}

/// Query data giving mutable access to every sprite component.
pub type SpriteQueryData = (
    Entity,
    &'static mut Sprite,
    &'static mut GeometryState,
    &'static mut CollisionQueue,
    &'static mut Massivity,
    &'static mut Animation,
    &'static mut Tint,
);

/// One item of a `Query<SpriteQueryData>`.
pub type SpriteItem<'a> = (
    Entity,
    Mut<'a, Sprite>,
    Mut<'a, GeometryState>,
    Mut<'a, CollisionQueue>,
    Mut<'a, Massivity>,
    Mut<'a, Animation>,
    Mut<'a, Tint>,
);

/// Query data giving read access to every sprite component.
pub type SpriteRefData = (
    Entity,
    &'static Sprite,
    &'static GeometryState,
    &'static CollisionQueue,
    &'static Massivity,
    &'static Animation,
    &'static Tint,
);

/// Mutable view over the components of one sprite.
#[derive(Debug)]
pub struct SpriteMut<'a> {
    id: Option<Entity>,
    sprite: &'a mut Sprite,
    geometry: &'a mut GeometryState,
    collisions: &'a mut CollisionQueue,
    massivity: &'a mut Massivity,
    animation: &'a mut Animation,
    tint: &'a mut Tint,
}

impl<'a> SpriteMut<'a> {
    pub fn from_item((id, sprite, geometry, collisions, massivity, animation, tint): SpriteItem<'a>) -> Self {
        Self {
            id: Some(id),
            sprite: sprite.into_inner(),
            geometry: geometry.into_inner(),
            collisions: collisions.into_inner(),
            massivity: massivity.into_inner(),
            animation: animation.into_inner(),
            tint: tint.into_inner(),
        }
    }

    pub fn id(&self) -> Option<Entity> {
        self.id
    }

    pub fn as_ref(&self) -> SpriteRef<'_> {
        SpriteRef {
            id: self.id,
            sprite: &*self.sprite,
            geometry: &*self.geometry,
            collisions: &*self.collisions,
            massivity: &*self.massivity,
            animation: &*self.animation,
            tint: &*self.tint,
        }
    }

    pub fn sprite(&self) -> &Sprite {
        &*self.sprite
    }

    /// Name, tags, uid and the other plain fields.
    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut *self.sprite
    }

    pub fn geometry(&self) -> &GeometryState {
        &*self.geometry
    }

    pub fn massivity(&self) -> &Massivity {
        &*self.massivity
    }

    pub fn massivity_mut(&mut self) -> &mut Massivity {
        &mut *self.massivity
    }

    pub fn animation(&self) -> &Animation {
        &*self.animation
    }

    pub fn tint(&self) -> &Tint {
        &*self.tint
    }

    pub fn tint_mut(&mut self) -> &mut Tint {
        &mut *self.tint
    }

    /// Run `f` with the behaviour temporarily taken out of the sprite.
    fn run_behavior<R>(&mut self, f: impl FnOnce(&mut dyn SpriteBehavior, &mut SpriteMut<'a>) -> R) -> Option<R> {
        let mut behavior = self.sprite.behavior.take()?;
        let result = f(behavior.as_mut(), self);
        if self.sprite.behavior.is_none() {
            self.sprite.behavior = Some(behavior);
        }
        Some(result)
    }

    // --- geometry -------------------------------------------------------

    pub fn set_pos(&mut self, x: f32, y: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_pos(x, y, new_start, ctx.editor_enabled());
        self.update_valid_draw(ctx);
    }

    pub fn set_pos_x(&mut self, x: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_pos_x(x, new_start, ctx.editor_enabled());
        self.update_valid_draw(ctx);
    }

    pub fn set_pos_y(&mut self, y: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_pos_y(y, new_start, ctx.editor_enabled());
        self.update_valid_draw(ctx);
    }

    /// Move by a delta, scaled by the frame-rate factor unless `real`.
    pub fn move_by(&mut self, dx: f32, dy: f32, real: bool, ctx: &SimContext) {
        if self
            .geometry
            .move_by(dx, dy, real, ctx.speed_factor, ctx.editor_enabled())
        {
            self.update_valid_draw(ctx);
        }
    }

    /// Stand on `other`, the geometry of another sprite.
    pub fn set_on_top(&mut self, other: &GeometryState, optimize_horizontal: bool, ctx: &SimContext) {
        self.geometry
            .set_on_top(other, optimize_horizontal, ctx.editor_enabled());
        self.update_valid_draw(ctx);
    }

    pub fn update_position_rect(&mut self, ctx: &SimContext) {
        self.geometry.update_position_rect(ctx.editor_enabled());
        self.update_valid_draw(ctx);
    }

    pub fn set_scale_x(&mut self, scale: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_scale_x(scale, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_scale_y(&mut self, scale: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_scale_y(scale, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_scale(&mut self, scale: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_scale(scale, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_rotation_x(&mut self, degrees: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_rotation_x(degrees, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_rotation_y(&mut self, degrees: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_rotation_y(degrees, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_rotation_z(&mut self, degrees: f32, new_start: bool, ctx: &SimContext) {
        self.geometry.set_rotation_z(degrees, new_start);
        self.update_valid_draw(ctx);
    }

    pub fn set_rotation_affects_rect(&mut self, enable: bool) {
        self.geometry.rotation_affects_rect = enable;
    }

    pub fn set_scale_affects_rect(&mut self, enable: bool) {
        self.geometry.scale_affects_rect = enable;
    }

    pub fn set_scale_directions(&mut self, up: bool, down: bool, left: bool, right: bool) {
        self.geometry.scale_directions = ScaleDirections {
            up,
            down,
            left,
            right,
        };
    }

    // --- visuals --------------------------------------------------------

    /// Assign the active image.
    ///
    /// With `new_start` the start image (editor preview, level files) is
    /// replaced too; it is always replaced while unset. With `owned` the
    /// sprite takes ownership of a uniquely created image and releases it on
    /// the next reassignment.
    pub fn set_image(&mut self, image: Option<ImageHandle>, new_start: bool, owned: bool, ctx: &SimContext) {
        if self.sprite.owns_image {
            if let Some(old) = self.sprite.image.take() {
                if self
                    .sprite
                    .start_image
                    .as_ref()
                    .is_some_and(|start| Arc::ptr_eq(start, &old))
                {
                    self.sprite.start_image = None;
                }
                debug!("Releasing owned image {:?}", old.path);
            }
            self.sprite.owns_image = false;
        }

        self.sprite.image = image.clone();

        match image.as_deref() {
            Some(img) => {
                let g = &mut *self.geometry;
                g.col_pos = img.col_pos;
                if g.scale_affects_rect {
                    g.col_rect.w = img.col_w * g.scale.x;
                    g.col_rect.h = img.col_h * g.scale.y;
                    g.rect.w = img.w * g.scale.x;
                    g.rect.h = img.h * g.scale.y;
                } else {
                    g.col_rect.w = img.col_w;
                    g.col_rect.h = img.col_h;
                    g.rect.w = img.w;
                    g.rect.h = img.h;
                }
                if g.rotation_affects_rect {
                    g.update_rect_rotation();
                }

                self.sprite.owns_image = owned;

                if self.sprite.name.is_empty() {
                    self.sprite.name = img.name.clone();
                }
                if self.sprite.editor_tags.is_empty() {
                    self.sprite.editor_tags = img.editor_tags.clone();
                }
            }
            None => {
                let g = &mut *self.geometry;
                g.col_pos = glam::Vec2::ZERO;
                g.col_rect.w = 0.0;
                g.col_rect.h = 0.0;
                g.rect.w = 0.0;
                g.rect.h = 0.0;
            }
        }

        if self.sprite.start_image.is_none() || new_start {
            self.sprite.start_image = image;
            let is_basic = self.sprite.is_basic_sprite();
            match self.sprite.start_image.as_deref() {
                Some(start) => {
                    self.geometry.start_rect.w = start.w;
                    self.geometry.start_rect.h = start.h;
                    if is_basic {
                        self.sprite.name = start.name.clone();
                    }
                }
                None => {
                    self.geometry.start_rect.w = 0.0;
                    self.geometry.start_rect.h = 0.0;
                }
            }
        }

        // collision offset may have changed
        self.update_position_rect(ctx);
    }

    /// Register a named image set. Frames without a time use the default
    /// frame time. Empty sets are rejected.
    pub fn add_image_set(&mut self, name: impl Into<String>, frames: Vec<AnimFrame>) -> bool {
        if frames.is_empty() {
            return false;
        }
        let time_default = self.animation.time_default;
        let frames = frames
            .into_iter()
            .map(|mut f| {
                if f.time == 0 {
                    f.time = time_default;
                }
                f
            })
            .collect();
        self.sprite.image_sets.insert(name.into(), frames);
        true
    }

    /// Make a registered image set the active animation.
    pub fn set_image_set(&mut self, name: &str, new_start: bool, ctx: &SimContext) -> bool {
        let Some(frames) = self.sprite.image_sets.get(name) else {
            warn!("Sprite '{}' has no image set '{}'", self.sprite.name, name);
            return false;
        };
        let frames = frames.clone();
        let Some(first) = frames.first().map(|f| f.image.clone()) else {
            return false;
        };

        self.sprite.images = frames;
        self.animation.set_range(0, self.sprite.images.len().saturating_sub(1));
        self.animation.enabled = self.sprite.images.len() > 1;
        self.animation.reset();

        self.animation.curr_img = Some(0);
        self.set_image(Some(first), new_start, false, ctx);
        true
    }

    /// Show frame `num` of the active image set.
    pub fn set_image_num(&mut self, num: usize, ctx: &SimContext) {
        let Some(frame) = self.sprite.images.get(num) else {
            debug!("Sprite '{}' has no frame {}", self.sprite.name, num);
            return;
        };
        let image = frame.image.clone();
        self.animation.curr_img = Some(num);
        self.set_image(Some(image), false, false, ctx);
    }

    pub fn set_animation_enabled(&mut self, enabled: bool) {
        self.animation.enabled = enabled;
    }

    pub fn set_animation_speed(&mut self, speed: f32) {
        self.animation.speed = speed;
    }

    /// Advance the frame animation by the step's elapsed time.
    pub fn update_animation(&mut self, ctx: &SimContext) {
        let times: SmallVec<[u32; 16]> = self.sprite.images.iter().map(|f| f.time).collect();
        if let Some(next) = self.animation.advance(&times, ctx.elapsed_ticks) {
            self.set_image_num(next, ctx);
        }
    }

    /// Set the start image from a path typed into the editor panel.
    pub fn editor_image_text_changed(&mut self, text: &str, images: &mut dyn ImageProvider, ctx: &SimContext) {
        let image = images.get_image(std::path::Path::new(text));
        if image.is_none() {
            warn!("Editor image '{}' not found", text);
        }
        self.sprite.image_filename = text.to_string();
        self.set_image(image, true, false, ctx);
    }

    // --- massivity ------------------------------------------------------

    /// Change the massivity. The move to the back of the draw order is
    /// applied by the next collision handling or render pass.
    pub fn set_massive_type(&mut self, massive_type: MassiveType) {
        self.massivity.set_massive_type(massive_type);
    }

    // --- lifecycle ------------------------------------------------------

    pub fn set_active(&mut self, enabled: bool, ctx: &SimContext) {
        if self.sprite.active == enabled {
            return;
        }
        self.sprite.active = enabled;
        self.update_valid_draw(ctx);
        self.update_valid_update();
    }

    pub fn set_ignore_camera(&mut self, enable: bool, ctx: &SimContext) {
        if self.sprite.no_camera == enable {
            return;
        }
        self.sprite.no_camera = enable;
        self.update_valid_draw(ctx);
    }

    /// Destroy the sprite. Idempotent and irreversible.
    ///
    /// Queued collisions are always dropped. Protected sprites stop there.
    pub fn destroy(&mut self, ctx: &SimContext) {
        if self.sprite.destroyed {
            return;
        }

        self.collisions.clear();

        if self.sprite.disallow_managed_delete {
            return;
        }

        self.sprite.destroyed = true;
        self.sprite.active = false;
        self.sprite.valid_draw = false;
        self.sprite.valid_update = false;
        self.set_image(None, true, false, ctx);
    }

    pub fn update_valid_draw(&mut self, ctx: &SimContext) {
        self.sprite.valid_draw = self.as_ref().is_draw_valid(ctx);
    }

    pub fn update_valid_update(&mut self) {
        self.sprite.valid_update = self.sprite.is_update_valid();
    }

    // --- editor ---------------------------------------------------------

    /// Called when the sprite is selected in an editor.
    ///
    /// # Panics
    /// When no editor is active.
    pub fn editor_activate(&mut self, editor: &mut dyn Editor, ctx: &SimContext) {
        if !self.sprite.is_basic_sprite() {
            self.run_behavior(|b, s| b.editor_activate(s, editor, ctx));
            return;
        }

        require_editor(ctx.editor);

        let text = self
            .sprite
            .start_image
            .as_ref()
            .map(|img| relative_image_path(&img.path, &ctx.pixmaps_dir))
            .unwrap_or_default();
        editor.add_config_widget(
            "Image",
            "Image filename",
            ConfigWidget::TextBox {
                name: EDITOR_IMAGE_WIDGET.to_string(),
                text,
            },
        );

        self.editor_init(editor, ctx);
    }

    /// Called when the sprite is deselected.
    ///
    /// # Panics
    /// When no editor is active.
    pub fn editor_deactivate(&mut self, editor: &mut dyn Editor, ctx: &SimContext) {
        require_editor(ctx.editor);
        editor.hide_config_panel();
    }

    /// Sync widgets and show the panel. Ends every `editor_activate`.
    ///
    /// # Panics
    /// When no editor is active.
    pub fn editor_init(&mut self, editor: &mut dyn Editor, ctx: &SimContext) {
        self.run_behavior(|b, s| b.editor_state_update(s));
        require_editor(ctx.editor);
        editor.show_config_panel();
    }
}

impl CollisionHandler for SpriteMut<'_> {
    fn handle_collision_player(&mut self, collision: &Collision, ctx: &mut SimContext) {
        self.run_behavior(|b, s| b.handle_collision_player(s, collision, ctx));
    }

    fn handle_collision_enemy(&mut self, collision: &Collision, ctx: &mut SimContext) {
        self.run_behavior(|b, s| b.handle_collision_enemy(s, collision, ctx));
    }

    fn handle_collision_massive(&mut self, collision: &Collision, ctx: &mut SimContext) {
        self.run_behavior(|b, s| b.handle_collision_massive(s, collision, ctx));
    }

    fn handle_collision_passive(&mut self, collision: &Collision, ctx: &mut SimContext) {
        self.run_behavior(|b, s| b.handle_collision_passive(s, collision, ctx));
    }

    fn handle_collision_lava(&mut self, collision: &Collision, ctx: &mut SimContext) {
        self.run_behavior(|b, s| b.handle_collision_lava(s, collision, ctx));
    }
}

impl Collider for SpriteMut<'_> {
    fn collisions(&self) -> &CollisionQueue {
        &*self.collisions
    }

    fn collisions_mut(&mut self) -> &mut CollisionQueue {
        &mut *self.collisions
    }

    fn touch_identity(&self) -> Option<Entity> {
        self.id
    }
}

/// Read-only view over the components of one sprite.
#[derive(Clone, Copy, Debug)]
pub struct SpriteRef<'a> {
    pub id: Option<Entity>,
    pub sprite: &'a Sprite,
    pub geometry: &'a GeometryState,
    pub collisions: &'a CollisionQueue,
    pub massivity: &'a Massivity,
    pub animation: &'a Animation,
    pub tint: &'a Tint,
}

impl<'a> SpriteRef<'a> {
    pub fn from_item(
        (id, sprite, geometry, collisions, massivity, animation, tint): (
            Entity,
            &'a Sprite,
            &'a GeometryState,
            &'a CollisionQueue,
            &'a Massivity,
            &'a Animation,
            &'a Tint,
        ),
    ) -> Self {
        Self {
            id: Some(id),
            sprite,
            geometry,
            collisions,
            massivity,
            animation,
            tint,
        }
    }

    /// View of a spawned sprite. `None` when `entity` is not a sprite.
    pub fn from_world(world: &'a World, entity: Entity) -> Option<Self> {
        Some(Self {
            id: Some(entity),
            sprite: world.get::<Sprite>(entity)?,
            geometry: world.get::<GeometryState>(entity)?,
            collisions: world.get::<CollisionQueue>(entity)?,
            massivity: world.get::<Massivity>(entity)?,
            animation: world.get::<Animation>(entity)?,
            tint: world.get::<Tint>(entity)?,
        })
    }

    pub fn is_on_top(&self, other: &GeometryState) -> bool {
        self.geometry.is_on_top(other)
    }

    /// Whether the draw rect intersects the viewport. Camera-ignoring
    /// sprites are tested against the viewport at the origin.
    pub fn is_visible_on_screen(&self, ctx: &SimContext) -> bool {
        let viewport = if self.sprite.no_camera {
            Camera::default().viewport(ctx.game_res_w, ctx.game_res_h)
        } else {
            ctx.viewport()
        };
        self.geometry.rect.intersects(&viewport)
    }

    /// Whether the sprite's center lies within `camera_range` of the screen center.
    pub fn is_in_range(&self, ctx: &SimContext) -> bool {
        if self.sprite.camera_range < MIN_CAMERA_RANGE {
            return self.is_visible_on_screen(ctx);
        }

        let range = self.sprite.camera_range as f32;
        let center = self.geometry.rect.center();
        let screen_center_x = ctx.camera.x + ctx.game_res_w / 2.0;
        let screen_center_y = ctx.camera.y + ctx.game_res_h / 2.0;

        !(center.x < screen_center_x - range
            || center.y < screen_center_y - range
            || center.x > screen_center_x + range
            || center.y > screen_center_y + range)
    }

    pub fn is_draw_valid(&self, ctx: &SimContext) -> bool {
        if !ctx.editor_enabled() {
            if !self.sprite.active || self.sprite.image.is_none() {
                return false;
            }
        } else if self.sprite.destroyed || self.sprite.start_image.is_none() {
            return false;
        }

        self.is_visible_on_screen(ctx)
    }

    /// Name shown in the editor.
    pub fn create_name(&self) -> String {
        match self.sprite.behavior() {
            Some(b) => b.create_name(self),
            None => self.sprite.name.clone(),
        }
    }

    /// Unspawned copy placed at this sprite's start pose, without uid.
    pub fn copy(&self, ctx: &SimContext) -> SpriteBundle {
        let behavior = match self.sprite.behavior() {
            Some(b) => b.duplicate(),
            None => Box::new(BasicSprite),
        };
        let mut bundle = SpriteBundle::with_behavior(self.sprite.type_name.clone(), behavior);

        {
            let mut view = bundle.view();
            view.set_rotation_affects_rect(self.geometry.rotation_affects_rect);
            view.set_scale_affects_rect(self.geometry.scale_affects_rect);
            view.geometry.scale_directions = self.geometry.scale_directions;

            view.sprite.image_filename = self.sprite.image_filename.clone();
            view.set_image(self.sprite.start_image.clone(), true, false, ctx);
            view.sprite.images = self.sprite.images.clone();
            view.sprite.image_sets = self.sprite.image_sets.clone();
            *view.animation = self.animation.clone();

            let g = self.geometry;
            view.set_pos(g.start_pos.x, g.start_pos.y, true, ctx);
            view.set_scale_x(g.start_scale.x, true, ctx);
            view.set_scale_y(g.start_scale.y, true, ctx);
            view.set_rotation_x(g.start_rotation.x, true, ctx);
            view.set_rotation_y(g.start_rotation.y, true, ctx);
            view.set_rotation_z(g.start_rotation.z, true, ctx);

            view.massivity.set_array(self.massivity.array());
            view.set_massive_type(self.massivity.massive_type());
            view.massivity.set_can_be_ground(self.massivity.can_be_ground());

            view.set_ignore_camera(self.sprite.no_camera, ctx);
            *view.tint = *self.tint;
            view.sprite.editor_pos_z = self.sprite.editor_pos_z;
            view.sprite.camera_range = self.sprite.camera_range;
            view.sprite.spawned = self.sprite.spawned;
            view.sprite.suppress_save = self.sprite.suppress_save;
            view.sprite.disallow_managed_delete = self.sprite.disallow_managed_delete;
            view.set_active(self.sprite.active, ctx);
        }

        bundle.sprite.uid = -1;
        bundle
    }
}
