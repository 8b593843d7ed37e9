//! Screen ↔ world coordinate transform.
//!
//! The canvas is drawn as `translate(pan) scale(scale)`, so a world point
//! `w` appears at `w * scale + pan` on screen. Zooming keeps the world point
//! under the cursor fixed.

use crate::config::EditorConfig;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub pan_x: f32,
    pub pan_y: f32,
    pub scale: f32,
    /// Visible area in screen pixels.
    pub width: f32,
    pub height: f32,
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            scale: 1.0,
            width,
            height,
            min_scale: 0.2,
            max_scale: 3.0,
        }
    }

    pub fn with_config(width: f32, height: f32, config: &EditorConfig) -> Self {
        Self {
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            ..Self::new(width, height)
        }
    }

    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn to_world(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.pan_x) / self.scale, (sy - self.pan_y) / self.scale)
    }

    pub fn to_screen(&self, wx: f32, wy: f32) -> (f32, f32) {
        (wx * self.scale + self.pan_x, wy * self.scale + self.pan_y)
    }

    /// Convert a screen-space distance into world units.
    pub fn to_world_len(&self, len: f32) -> f32 {
        len / self.scale
    }

    pub fn world_rect_to_screen(&self, r: &Rect) -> Rect {
        let (x, y) = self.to_screen(r.x, r.y);
        Rect::new(x, y, r.width * self.scale, r.height * self.scale)
    }

    pub fn screen_rect_to_world(&self, r: &Rect) -> Rect {
        let (x, y) = self.to_world(r.x, r.y);
        Rect::new(x, y, r.width / self.scale, r.height / self.scale)
    }

    /// Set the scale (clamped) while keeping the world point under the
    /// screen point `(mx, my)` fixed. Returns `true` if the scale changed.
    pub fn set_scale_about(&mut self, mx: f32, my: f32, scale: f32) -> bool {
        let new_scale = self.clamp_scale(scale);
        if new_scale == self.scale {
            return false;
        }
        // World point under the cursor, with the transform before zooming.
        let (wx, wy) = self.to_world(mx, my);
        self.scale = new_scale;
        self.pan_x = mx - wx * new_scale;
        self.pan_y = my - wy * new_scale;
        true
    }

    /// Apply a wheel event at `(mx, my)`. Scrolling up (negative `delta_y`)
    /// zooms in by `-delta_y * intensity`.
    pub fn zoom_at(&mut self, mx: f32, my: f32, delta_y: f32, intensity: f32) -> bool {
        let target = self.scale + -delta_y * intensity;
        self.set_scale_about(mx, my, target)
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// World point currently at the center of the visible area.
    pub fn center_world(&self) -> (f32, f32) {
        self.to_world(self.width / 2.0, self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    #[test]
    fn world_screen_roundtrip() {
        let vp = Viewport {
            pan_x: 37.0,
            pan_y: -12.5,
            scale: 1.7,
            ..Viewport::default()
        };
        let (wx, wy) = vp.to_world(400.0, 300.0);
        let (sx, sy) = vp.to_screen(wx, wy);
        assert!(close(sx, 400.0) && close(sy, 300.0));
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut vp = Viewport::default();
        let cursor = (400.0, 300.0);
        for delta in [-120.0, -300.0, 80.0, -1000.0, 2500.0, -40.0] {
            let before = vp.to_world(cursor.0, cursor.1);
            vp.zoom_at(cursor.0, cursor.1, delta, 0.001);
            let after = vp.to_world(cursor.0, cursor.1);
            assert!(
                close(before.0, after.0) && close(before.1, after.1),
                "world point drifted: {before:?} -> {after:?} at scale {}",
                vp.scale
            );
        }
    }

    #[test]
    fn zoom_to_one_and_a_half_at_cursor() {
        let mut vp = Viewport::default();
        assert!(vp.set_scale_about(400.0, 300.0, 1.5));
        // worldX = 400 at scale 1 / pan 0, so 400 = 400 * 1.5 + pan_x.
        assert!(close(vp.pan_x, 400.0 - 400.0 * 1.5));
        assert!(close(vp.pan_y, 300.0 - 300.0 * 1.5));
        assert!(close(400.0 * vp.scale + vp.pan_x, 400.0));
    }

    #[test]
    fn scale_is_clamped() {
        let mut vp = Viewport::default();
        vp.zoom_at(0.0, 0.0, -100_000.0, 0.001);
        assert_eq!(vp.scale, 3.0);
        vp.zoom_at(0.0, 0.0, 100_000.0, 0.001);
        assert_eq!(vp.scale, 0.2);
        // Already at the bound: no change reported.
        assert!(!vp.zoom_at(0.0, 0.0, 500.0, 0.001));
    }

    #[test]
    fn center_world_follows_pan_and_scale() {
        let mut vp = Viewport::new(800.0, 600.0);
        vp.pan_by(100.0, 50.0);
        vp.scale = 2.0;
        assert_eq!(vp.center_world(), (150.0, 125.0));
    }
}
