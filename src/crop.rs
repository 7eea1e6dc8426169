//! Cropping the displayed image to a rectangle drawn over it.

use egui::Rect;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{AnnotatorError, Result};

/// Crop box in image-space pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            x: rect.min.x,
            y: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }

    /// Pixel dimensions of the cropped buffer; fractional sizes truncate.
    pub fn output_size(&self) -> (u32, u32) {
        (
            self.width.max(0.0).trunc() as u32,
            self.height.max(0.0).trunc() as u32,
        )
    }
}

/// Copy the region under `rect` into a new image of `rect`'s size.
///
/// Source pixels are sampled at `rect × scale`, matching how the canvas was
/// laid out when the box was drawn. Output pixels whose source falls outside
/// the image are left transparent.
pub fn crop_image(image: &DynamicImage, rect: &CropRect, scale: f32) -> Result<DynamicImage> {
    let (out_w, out_h) = rect.output_size();
    let empty = AnnotatorError::EmptyCrop {
        width: rect.width,
        height: rect.height,
    };
    if out_w == 0 || out_h == 0 {
        return Err(empty);
    }

    let (img_w, img_h) = image.dimensions();
    let src_min = (rect.x * scale, rect.y * scale);
    let src_max = ((rect.x + rect.width) * scale, (rect.y + rect.height) * scale);
    if src_max.0 <= 0.0 || src_max.1 <= 0.0 || src_min.0 >= img_w as f32 || src_min.1 >= img_h as f32 {
        return Err(empty);
    }

    let step_x = rect.width / out_w as f32;
    let step_y = rect.height / out_h as f32;
    let source = image.to_rgba8();
    let cropped = RgbaImage::from_fn(out_w, out_h, |ox, oy| {
        let sx = ((rect.x + (ox as f32 + 0.5) * step_x) * scale).floor();
        let sy = ((rect.y + (oy as f32 + 0.5) * step_y) * scale).floor();
        if sx >= 0.0 && sy >= 0.0 && (sx as u32) < img_w && (sy as u32) < img_h {
            *source.get_pixel(sx as u32, sy as u32)
        } else {
            Rgba([0, 0, 0, 0])
        }
    });

    tracing::info!(
        from = ?(img_w, img_h),
        to = ?(out_w, out_h),
        scale,
        "cropped image"
    );
    Ok(DynamicImage::ImageRgba8(cropped))
}
