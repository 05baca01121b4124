//! Position, collision and draw rectangles of a sprite.
//!
//! [`GeometryState`] keeps the live position, the authored start pose and the
//! rectangles derived from them. Every mutation that moves the sprite or
//! changes its size re-derives the rectangles before returning, so readers
//! never observe a stale draw or collision rect.
//!
//! Rotation angles are normalized to `[0, 360)` with Euclidean remainder, so
//! `-90` becomes `270`.

use bevy_ecs::prelude::Component;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Below this a Z rotation counts as "not rotated".
const ROTATION_EPSILON: f32 = 0.00001;

/// Axis-aligned rectangle in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Exact overlap test. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || self.x > other.right()
            || self.bottom() < other.y
            || self.y > other.bottom())
    }

    /// Strict overlap test used for collision detection; touching edges do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }
}

/// Which edges move when the sprite is scaled.
///
/// Both flags of an axis set means the sprite grows around the image's
/// center, a single flag means it grows towards that side only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDirections {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for ScaleDirections {
    fn default() -> Self {
        Self {
            up: false,
            down: true,
            left: false,
            right: true,
        }
    }
}

/// Geometry of a sprite: live pose, start pose and derived rectangles.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct GeometryState {
    /// Live position (top-left of the image rect).
    pub pos: Vec2,
    /// Authored position, used for the editor preview and level files.
    pub start_pos: Vec2,
    /// Collision rect offset relative to `pos`.
    pub col_pos: Vec2,
    /// Collision rect in world space.
    pub col_rect: Rect,
    /// Draw rect in world space.
    pub rect: Rect,
    /// Rect of the start image at the start position (editor preview).
    pub start_rect: Rect,
    /// Rotation in degrees around x, y and z.
    pub rotation: Vec3,
    pub start_rotation: Vec3,
    pub scale: Vec2,
    pub start_scale: Vec2,
    pub rotation_affects_rect: bool,
    pub scale_affects_rect: bool,
    pub scale_directions: ScaleDirections,
}

impl Default for GeometryState {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            start_pos: Vec2::ZERO,
            col_pos: Vec2::ZERO,
            col_rect: Rect::default(),
            rect: Rect::default(),
            start_rect: Rect::default(),
            rotation: Vec3::ZERO,
            start_rotation: Vec3::ZERO,
            scale: Vec2::ONE,
            start_scale: Vec2::ONE,
            rotation_affects_rect: false,
            scale_affects_rect: false,
            scale_directions: ScaleDirections::default(),
        }
    }
}

/// Normalize an angle to `[0, 360)`.
pub fn normalize_degrees(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

impl GeometryState {
    /// Set the live position.
    ///
    /// The start position is overwritten when `new_start` is set or when it
    /// was never set, i.e. both start coordinates are exactly zero. A sprite
    /// authored at the origin is therefore indistinguishable from an unset one.
    pub fn set_pos(&mut self, x: f32, y: f32, new_start: bool, preview: bool) {
        self.pos = Vec2::new(x, y);

        if new_start || (self.start_pos.x == 0.0 && self.start_pos.y == 0.0) {
            self.start_pos = self.pos;
        }

        self.update_position_rect(preview);
    }

    pub fn set_pos_x(&mut self, x: f32, new_start: bool, preview: bool) {
        self.pos.x = x;
        if new_start {
            self.start_pos.x = x;
        }
        self.update_position_rect(preview);
    }

    pub fn set_pos_y(&mut self, y: f32, new_start: bool, preview: bool) {
        self.pos.y = y;
        if new_start {
            self.start_pos.y = y;
        }
        self.update_position_rect(preview);
    }

    /// Move by a delta. Unless `real` is set the delta is multiplied by the
    /// frame-rate `speed_factor`. Returns `false` when both deltas are zero and
    /// nothing was touched.
    pub fn move_by(&mut self, dx: f32, dy: f32, real: bool, speed_factor: f32, preview: bool) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        let delta = if real {
            Vec2::new(dx, dy)
        } else {
            Vec2::new(dx, dy) * speed_factor
        };
        self.pos += delta;

        self.update_position_rect(preview);
        true
    }

    /// Re-derive the rect positions from the current pose.
    ///
    /// In preview mode the draw rects sit at the start position while the
    /// collision rect keeps following the live position.
    pub fn update_position_rect(&mut self, preview: bool) {
        let anchor = if preview { self.start_pos } else { self.pos };

        self.rect.x = anchor.x;
        self.rect.y = anchor.y;
        self.start_rect.x = anchor.x;
        self.start_rect.y = anchor.y;

        self.col_rect.x = self.pos.x + self.col_pos.x;
        self.col_rect.y = self.pos.y + self.col_pos.y;
    }

    /// Set the horizontal scale. Zero is ignored.
    ///
    /// With `scale_affects_rect` the widths are divided by the old scale and
    /// multiplied by the new one; a scale of exactly 1.0 skips that step.
    pub fn set_scale_x(&mut self, scale: f32, new_start: bool) {
        if scale == 0.0 {
            return;
        }

        if self.scale_affects_rect && self.scale.x != 1.0 {
            self.col_rect.w /= self.scale.x;
            self.rect.w /= self.scale.x;
        }

        self.scale.x = scale;

        if self.scale_affects_rect && self.scale.x != 1.0 {
            self.col_rect.w *= self.scale.x;
            self.rect.w *= self.scale.x;
        }

        if new_start {
            self.start_scale.x = self.scale.x;
        }
    }

    /// Set the vertical scale. Zero is ignored.
    pub fn set_scale_y(&mut self, scale: f32, new_start: bool) {
        if scale == 0.0 {
            return;
        }

        if self.scale_affects_rect && self.scale.y != 1.0 {
            self.col_rect.h /= self.scale.y;
            self.rect.h /= self.scale.y;
        }

        self.scale.y = scale;

        if self.scale_affects_rect && self.scale.y != 1.0 {
            self.col_rect.h *= self.scale.y;
            self.rect.h *= self.scale.y;
        }

        if new_start {
            self.start_scale.y = self.scale.y;
        }
    }

    pub fn set_scale(&mut self, scale: f32, new_start: bool) {
        self.set_scale_x(scale, new_start);
        self.set_scale_y(scale, new_start);
    }

    pub fn set_rotation_x(&mut self, degrees: f32, new_start: bool) {
        self.rotation.x = normalize_degrees(degrees);
        if new_start {
            self.start_rotation.x = self.rotation.x;
        }
        if self.rotation_affects_rect {
            self.update_rect_rotation_x();
        }
    }

    pub fn set_rotation_y(&mut self, degrees: f32, new_start: bool) {
        self.rotation.y = normalize_degrees(degrees);
        if new_start {
            self.start_rotation.y = self.rotation.y;
        }
        if self.rotation_affects_rect {
            self.update_rect_rotation_y();
        }
    }

    pub fn set_rotation_z(&mut self, degrees: f32, new_start: bool) {
        self.rotation.z = normalize_degrees(degrees);
        if new_start {
            self.start_rotation.z = self.rotation.z;
        }
        if self.rotation_affects_rect {
            self.update_rect_rotation_z();
        }
    }

    pub fn update_rect_rotation(&mut self) {
        self.update_rect_rotation_x();
        self.update_rect_rotation_y();
        self.update_rect_rotation_z();
    }

    /// Flip around the x axis mirrors the collision offset vertically.
    fn update_rect_rotation_x(&mut self) {
        if self.rotation.x >= 180.0 {
            self.col_pos.y = self.rect.h - (self.col_rect.h + self.col_pos.y);
        }
    }

    /// Flip around the y axis mirrors the collision offset horizontally.
    fn update_rect_rotation_y(&mut self) {
        if self.rotation.y >= 180.0 {
            self.col_pos.x = self.rect.w - (self.col_rect.w + self.col_pos.x);
        }
    }

    // Thresholds are checked from the highest down, so 270 takes the first branch.
    fn update_rect_rotation_z(&mut self) {
        let rot = self.rotation.z;

        if rot >= 270.0 {
            self.col_pos = Vec2::new(self.col_pos.y, self.col_pos.x);
            self.swap_dimensions();
        } else if rot >= 180.0 {
            self.col_pos.x = self.rect.w - (self.col_rect.w + self.col_pos.x);
            self.col_pos.y = self.rect.h - (self.col_rect.h + self.col_pos.y);
        } else if rot >= ROTATION_EPSILON {
            let orig_x = self.col_pos.x;
            self.col_pos.x = self.rect.h - (self.col_rect.h + self.col_pos.y);
            self.col_pos.y = orig_x;
            self.swap_dimensions();
        }
    }

    fn swap_dimensions(&mut self) {
        std::mem::swap(&mut self.rect.w, &mut self.rect.h);
        std::mem::swap(&mut self.col_rect.w, &mut self.col_rect.h);
    }

    /// Place this sprite just above `other`'s collision rect.
    ///
    /// With `optimize_horizontal` a sprite that is not horizontally over
    /// `other` is moved to a third of its width.
    pub fn set_on_top(&mut self, other: &GeometryState, optimize_horizontal: bool, preview: bool) {
        self.pos.y = other.col_rect.y - self.col_pos.y - self.col_rect.h - 0.1;

        if optimize_horizontal
            && (self.pos.x < other.pos.x || self.pos.x > other.pos.x + other.col_rect.w)
        {
            self.pos.x = other.pos.x + other.col_rect.w / 3.0;
        }

        self.update_position_rect(preview);
    }

    /// True when this collision rect lies above `other`'s and overlaps it horizontally.
    pub fn is_on_top(&self, other: &GeometryState) -> bool {
        self.col_rect.right() > other.col_rect.x
            && self.col_rect.x < other.col_rect.right()
            && self.col_rect.bottom() < other.col_rect.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn sized(w: f32, h: f32) -> GeometryState {
        let mut g = GeometryState::default();
        g.rect.w = w;
        g.rect.h = h;
        g.col_rect.w = w;
        g.col_rect.h = h;
        g
    }

    #[test]
    fn test_set_pos_first_call_sets_start() {
        let mut g = GeometryState::default();
        g.set_pos(10.0, 20.0, false, false);
        assert_eq!(g.start_pos, Vec2::new(10.0, 20.0));

        g.set_pos(30.0, 40.0, false, false);
        assert_eq!(g.pos, Vec2::new(30.0, 40.0));
        assert_eq!(g.start_pos, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_set_pos_origin_start_counts_as_unset() {
        // Known edge case: a start pose at the origin is overwritten by the next move.
        let mut g = GeometryState::default();
        g.set_pos(0.0, 0.0, true, false);
        g.set_pos(5.0, 6.0, false, false);
        assert_eq!(g.start_pos, Vec2::new(5.0, 6.0));
    }

    #[test]
    fn test_set_pos_updates_rects() {
        let mut g = sized(10.0, 10.0);
        g.col_pos = Vec2::new(2.0, 3.0);
        g.set_pos(100.0, 50.0, true, false);
        assert_eq!(g.rect.x, 100.0);
        assert_eq!(g.rect.y, 50.0);
        assert_eq!(g.col_rect.x, 102.0);
        assert_eq!(g.col_rect.y, 53.0);
    }

    #[test]
    fn test_preview_rect_uses_start_but_collision_uses_live() {
        let mut g = sized(10.0, 10.0);
        g.set_pos(10.0, 10.0, true, true);
        g.set_pos(50.0, 60.0, false, true);
        assert_eq!(g.rect.x, 10.0);
        assert_eq!(g.start_rect.y, 10.0);
        assert_eq!(g.col_rect.x, 50.0);
        assert_eq!(g.col_rect.y, 60.0);
    }

    #[test]
    fn test_move_by_applies_speed_factor() {
        let mut g = GeometryState::default();
        assert!(g.move_by(2.0, 4.0, false, 0.5, false));
        assert_eq!(g.pos, Vec2::new(1.0, 2.0));
        assert!(g.move_by(2.0, 4.0, true, 0.5, false));
        assert_eq!(g.pos, Vec2::new(3.0, 6.0));
    }

    #[test]
    fn test_move_by_zero_is_noop() {
        let mut g = GeometryState::default();
        g.col_pos = Vec2::new(5.0, 5.0);
        assert!(!g.move_by(0.0, 0.0, false, 1.0, false));
        // rect was never re-derived
        assert_eq!(g.col_rect.x, 0.0);
    }

    #[test]
    fn test_scale_zero_ignored() {
        let mut g = sized(40.0, 20.0);
        g.scale_affects_rect = true;
        g.set_scale_x(0.0, false);
        assert_eq!(g.scale.x, 1.0);
        assert_eq!(g.rect.w, 40.0);
    }

    #[test]
    fn test_scale_is_incremental_and_associative() {
        let mut g = sized(40.0, 20.0);
        g.scale_affects_rect = true;
        g.set_scale_x(2.0, false);
        assert!(approx_eq(g.rect.w, 80.0));
        g.set_scale_x(3.0, false);
        g.set_scale_x(0.5, false);
        assert!(approx_eq(g.rect.w, 20.0));
        assert!(approx_eq(g.col_rect.w, 20.0));
        g.set_scale_x(1.0, false);
        assert!(approx_eq(g.rect.w, 40.0));
    }

    #[test]
    fn test_scale_without_affects_rect_keeps_size() {
        let mut g = sized(40.0, 20.0);
        g.set_scale_y(2.0, true);
        assert_eq!(g.rect.h, 20.0);
        assert_eq!(g.start_scale.y, 2.0);
    }

    #[test]
    fn test_rotation_normalized_non_negative() {
        let mut g = GeometryState::default();
        g.set_rotation_z(-90.0, false);
        assert!(approx_eq(g.rotation.z, 270.0));
        g.set_rotation_z(725.0, true);
        assert!(approx_eq(g.rotation.z, 5.0));
        assert!(approx_eq(g.start_rotation.z, 5.0));
    }

    #[test]
    fn test_rotation_270_and_300_swap_dimensions() {
        for deg in [270.0, 300.0] {
            let mut g = sized(40.0, 20.0);
            g.rotation_affects_rect = true;
            g.set_rotation_z(deg, false);
            assert_eq!((g.rect.w, g.rect.h), (20.0, 40.0));
            assert_eq!((g.col_rect.w, g.col_rect.h), (20.0, 40.0));
        }
    }

    #[test]
    fn test_rotation_200_mirrors_offset() {
        let mut g = sized(40.0, 20.0);
        g.col_rect.w = 30.0;
        g.col_rect.h = 10.0;
        g.col_pos = Vec2::new(2.0, 4.0);
        g.rotation_affects_rect = true;
        g.set_rotation_z(200.0, false);
        assert_eq!((g.rect.w, g.rect.h), (40.0, 20.0));
        assert_eq!(g.col_pos, Vec2::new(8.0, 6.0));
    }

    #[test]
    fn test_rotation_90_rotates_offset() {
        let mut g = sized(40.0, 20.0);
        g.col_rect.h = 10.0;
        g.col_pos = Vec2::new(2.0, 4.0);
        g.rotation_affects_rect = true;
        g.set_rotation_z(90.0, false);
        assert_eq!(g.col_pos, Vec2::new(6.0, 2.0));
        assert_eq!((g.rect.w, g.rect.h), (20.0, 40.0));
    }

    #[test]
    fn test_rotation_without_affects_rect_keeps_rect() {
        let mut g = sized(40.0, 20.0);
        g.set_rotation_z(90.0, false);
        assert_eq!((g.rect.w, g.rect.h), (40.0, 20.0));
    }

    #[test]
    fn test_set_on_top() {
        let mut ground = sized(100.0, 10.0);
        ground.set_pos(0.0, 200.0, true, false);
        let mut g = sized(10.0, 20.0);
        g.set_pos(500.0, 0.0, true, false);
        g.set_on_top(&ground, true, false);
        assert!(approx_eq(g.pos.y, 200.0 - 20.0 - 0.1));
        assert!(approx_eq(g.pos.x, 100.0 / 3.0));
        assert!(g.is_on_top(&ground));
    }

    #[test]
    fn test_rect_intersects_touching_edges() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.overlaps(&b));
    }
}
