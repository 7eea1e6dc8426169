//! Screen-space ↔ image-space conversion.
//!
//! The image is drawn with its top-left corner at the canvas origin and both
//! axes multiplied by the scale factor, so mapping is a plain division.

use egui::{Pos2, Rect, Vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    /// Top-left corner of the canvas in window coordinates.
    origin: Pos2,
    scale: f32,
}

impl CoordinateMapper {
    pub fn new(origin: Pos2, scale: f32) -> Self {
        debug_assert!(scale > 0.0, "scale must be positive");
        Self { origin, scale }
    }

    /// Mapper for positions that are already relative to the canvas origin.
    pub fn at_origin(scale: f32) -> Self {
        Self::new(Pos2::ZERO, scale)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Convert a window position to image space.
    pub fn to_image(&self, screen_pos: Pos2) -> Pos2 {
        let rel = screen_pos - self.origin;
        Pos2::new(rel.x / self.scale, rel.y / self.scale)
    }

    /// Convert an image-space position to window coordinates.
    pub fn to_screen(&self, img_pos: Pos2) -> Pos2 {
        self.origin + img_pos.to_vec2() * self.scale
    }

    pub fn len_to_screen(&self, len: f32) -> f32 {
        len * self.scale
    }

    /// Screen rectangle covered by an image of `image_size` pixels.
    pub fn image_rect_on_screen(&self, image_size: Vec2) -> Rect {
        Rect::from_min_size(self.origin, image_size * self.scale)
    }
}
