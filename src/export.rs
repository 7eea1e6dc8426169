//! Flattening the annotated canvas into a raster file.
//!
//! The export reproduces what is on screen: the image at the current scale
//! with brightness applied, shape outlines, and measurement labels.

use std::io::Cursor;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut, draw_text_mut, text_size};

use crate::annotation::{Annotation, Geometry};
use crate::error::{AnnotatorError, Result};

pub const DEFAULT_EXPORT_NAME: &str = "annotated-image.png";

/// Label height in image pixels; multiplied by the scale like every other
/// overlay dimension.
pub const LABEL_SIZE: f32 = 12.0;

/// Additive brightening: every color channel is shifted by
/// `(multiplier - 1) * 255` and clamped. Alpha is untouched.
pub fn apply_brightness(image: &DynamicImage, multiplier: f32) -> RgbaImage {
    let mut rgba = image.to_rgba8();
    let offset = (multiplier - 1.0) * 255.0;
    if offset == 0.0 {
        return rgba;
    }
    for pixel in rgba.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (f32::from(*channel) + offset).round().clamp(0.0, 255.0) as u8;
        }
    }
    rgba
}

/// Canvas size for an image of `width × height` shown at `scale`.
pub fn canvas_size(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (
        (width as f32 * scale).round() as u32,
        (height as f32 * scale).round() as u32,
    )
}

/// Render the canvas as shown at `scale`: the brightened image, every
/// annotation outline and every measurement label.
pub fn flatten(
    image: &DynamicImage,
    annotations: &[Annotation],
    brightness: f32,
    scale: f32,
) -> RgbaImage {
    let base = apply_brightness(image, brightness);
    let (w, h) = canvas_size(base.width(), base.height(), scale);
    let mut canvas = if (w, h) == base.dimensions() {
        base
    } else {
        imageops::resize(&base, w, h, FilterType::Triangle)
    };

    for ann in annotations {
        draw_outline(&mut canvas, ann, scale);
    }

    match label_font() {
        Some(font) => {
            for ann in annotations {
                draw_label(&mut canvas, &font, ann, scale);
            }
        }
        None if !annotations.is_empty() => {
            tracing::warn!("no label font available, exporting outlines only");
        }
        None => {}
    }
    canvas
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| AnnotatorError::Export(format!("cannot encode PNG: {e}")))?;
    Ok(buffer.into_inner())
}

/// Flatten and encode the canvas as PNG bytes.
pub fn export_canvas(
    image: &DynamicImage,
    annotations: &[Annotation],
    brightness: f32,
    scale: f32,
) -> Result<Vec<u8>> {
    let (w, h) = canvas_size(image.width(), image.height(), scale);
    if w == 0 || h == 0 {
        return Err(AnnotatorError::Export(format!(
            "canvas of {}x{} at scale {scale} has no pixels",
            image.width(),
            image.height()
        )));
    }
    encode_png(&flatten(image, annotations, brightness, scale))
}

/// Export to `path`, returning the number of bytes written.
pub fn export_to_file(
    path: &Path,
    image: &DynamicImage,
    annotations: &[Annotation],
    brightness: f32,
    scale: f32,
) -> Result<usize> {
    let bytes = export_canvas(image, annotations, brightness, scale)?;
    std::fs::write(path, &bytes)?;
    tracing::info!(
        path = %path.display(),
        annotations = annotations.len(),
        scale,
        "exported canvas"
    );
    Ok(bytes.len())
}

fn draw_outline(canvas: &mut RgbaImage, ann: &Annotation, scale: f32) {
    let (first, second) = ann.shape().stroke_colors();
    let (c1, c2) = (Rgba(first.rgba()), Rgba(second.rgba()));
    let at = |p: &(f32, f32)| (p.0 * scale, p.1 * scale);

    match ann.geometry() {
        Geometry::Rectangle {
            x,
            y,
            width,
            height,
        } => {
            let (x0, y0) = (x * scale, y * scale);
            let (x1, y1) = ((x + width) * scale, (y + height) * scale);
            let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
            for i in 0..4 {
                stroke_segment(canvas, corners[i], corners[(i + 1) % 4], 2.0 * scale, c1);
            }
        }
        Geometry::Circle { x, y, diameter } => {
            stroke_circle(canvas, (x * scale, y * scale), diameter / 2.0 * scale, scale, c1);
        }
        Geometry::Line { points: [a, b] } => {
            stroke_segment(canvas, at(a), at(b), scale, c1);
        }
        Geometry::Angle { points: [p1, p2, p3] } => {
            stroke_segment(canvas, at(p1), at(p2), scale, c1);
            stroke_segment(canvas, at(p2), at(p3), scale, c2);
        }
    }
}

/// A segment `width` pixels wide, laid down as parallel one-pixel lines
/// half a pixel apart.
fn stroke_segment(canvas: &mut RgbaImage, a: (f32, f32), b: (f32, f32), width: f32, color: Rgba<u8>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = dx.hypot(dy);
    let (nx, ny) = if len > 0.0 { (-dy / len, dx / len) } else { (0.0, 0.0) };
    let passes = ((width.max(1.0) - 1.0) * 2.0).round() as i32 + 1;
    for k in 0..passes {
        let offset = k as f32 * 0.5 - (passes - 1) as f32 * 0.25;
        draw_line_segment_mut(
            canvas,
            (a.0 + nx * offset, a.1 + ny * offset),
            (b.0 + nx * offset, b.1 + ny * offset),
            color,
        );
    }
}

fn stroke_circle(canvas: &mut RgbaImage, center: (f32, f32), radius: f32, width: f32, color: Rgba<u8>) {
    if radius <= 0.0 {
        return;
    }
    let center = (center.0.round() as i32, center.1.round() as i32);
    let half = ((width.max(1.0) - 1.0) / 2.0).round() as i32;
    let radius = radius.round() as i32;
    for r in (radius - half).max(1)..=radius + half {
        draw_hollow_circle_mut(canvas, center, r, color);
    }
}

/// The proportional face egui renders labels with on screen.
fn label_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let name = defs.families.get(&egui::FontFamily::Proportional)?.first()?;
    let data = defs.font_data.get(name)?;
    FontArc::try_from_vec(data.font.to_vec()).ok()
}

fn draw_label(canvas: &mut RgbaImage, font: &FontArc, ann: &Annotation, scale: f32) {
    let text = ann.measurement_text();
    let px = PxScale::from(LABEL_SIZE * scale);
    let (tw, th) = text_size(px, font, text);
    if tw == 0 || th == 0 {
        return;
    }
    // Text is rendered upright on a transparent tile, then composited with
    // the tile's top-left corner pinned to the anchor.
    let mut tile = RgbaImage::new(tw + 2, th + 2);
    draw_text_mut(&mut tile, Rgba(ann.label_fill().rgba()), 1, 1, px, font, text);

    let anchor = ann.geometry().label_anchor();
    composite_rotated(
        canvas,
        &tile,
        (anchor.x * scale, anchor.y * scale),
        ann.label_angle(),
    );
}

/// Alpha-composite `tile` onto `canvas`, rotated by `angle` radians about its
/// top-left corner placed at `origin`. The tile holds premultiplied color.
fn composite_rotated(canvas: &mut RgbaImage, tile: &RgbaImage, origin: (f32, f32), angle: f32) {
    let (sin, cos) = angle.sin_cos();
    let (tw, th) = (tile.width() as f32, tile.height() as f32);
    let corners = [(0.0, 0.0), (tw, 0.0), (0.0, th), (tw, th)]
        .map(|(u, v)| (origin.0 + u * cos - v * sin, origin.1 + u * sin + v * cos));
    let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
    let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max).ceil();
    let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max).ceil();
    let max_x = (max_x.max(0.0) as u32).min(canvas.width());
    let max_y = (max_y.max(0.0) as u32).min(canvas.height());

    for y in min_y..max_y {
        for x in min_x..max_x {
            let (px, py) = (x as f32 + 0.5 - origin.0, y as f32 + 0.5 - origin.1);
            let u = px * cos + py * sin;
            let v = -px * sin + py * cos;
            if u < 0.0 || v < 0.0 || u >= tw || v >= th {
                continue;
            }
            let src = tile.get_pixel(u as u32, v as u32);
            let alpha = f32::from(src[3]) / 255.0;
            if alpha == 0.0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(x, y);
            for c in 0..3 {
                let blended = f32::from(src[c]) + f32::from(dst[c]) * (1.0 - alpha);
                dst[c] = blended.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = dst[3].max(src[3]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::DisplayColor;
    use crate::geometry::PIXELS_TO_MM;

    const GREY: Rgba<u8> = Rgba([100, 100, 100, 255]);

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, GREY))
    }

    fn count_in(img: &RgbaImage, x0: u32, y0: u32, x1: u32, y1: u32, pred: impl Fn(&Rgba<u8>) -> bool) -> usize {
        let mut n = 0;
        for y in y0..y1.min(img.height()) {
            for x in x0..x1.min(img.width()) {
                if pred(img.get_pixel(x, y)) {
                    n += 1;
                }
            }
        }
        n
    }

    fn near(img: &RgbaImage, x: u32, y: u32, color: DisplayColor) -> bool {
        count_in(img, x.saturating_sub(1), y.saturating_sub(1), x + 2, y + 2, |p| {
            p.0 == color.rgba()
        }) > 0
    }

    fn yellowish(p: &Rgba<u8>) -> bool {
        p[0] > 200 && p[1] > 200 && p[2] < 60
    }

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Annotation {
        Annotation::finalize(
            Geometry::Rectangle {
                x,
                y,
                width,
                height,
            },
            PIXELS_TO_MM,
        )
    }

    #[test]
    fn test_brightness_is_additive_and_clamped() {
        let bright = apply_brightness(&blank(2, 2), 2.0);
        assert_eq!(bright.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        let dark = apply_brightness(&blank(2, 2), 0.0);
        assert_eq!(dark.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        let half = apply_brightness(&blank(2, 2), 1.2);
        assert_eq!(half.get_pixel(1, 1), &Rgba([151, 151, 151, 255]));
    }

    #[test]
    fn test_neutral_brightness_keeps_pixels() {
        let same = apply_brightness(&blank(3, 3), 1.0);
        assert_eq!(same.get_pixel(2, 2), &GREY);
    }

    #[test]
    fn test_flatten_draws_outlines() {
        let line = Annotation::finalize(
            Geometry::Line {
                points: [(0.0, 45.0), (49.0, 45.0)],
            },
            PIXELS_TO_MM,
        );
        let out = flatten(&blank(50, 50), &[rect(10.0, 10.0, 20.0, 20.0), line], 1.0, 1.0);
        // Bottom edge; the label sits above the top one.
        assert!(near(&out, 20, 30, DisplayColor::Green));
        assert!(near(&out, 25, 45, DisplayColor::Cyan));
        // Interior stays untouched.
        assert_eq!(out.get_pixel(20, 20), &GREY);
    }

    #[test]
    fn test_flatten_draws_circle_outline() {
        let circle = Annotation::finalize(
            Geometry::Circle {
                x: 25.0,
                y: 25.0,
                diameter: 20.0,
            },
            PIXELS_TO_MM,
        );
        let out = flatten(&blank(50, 50), &[circle], 1.0, 1.0);
        assert!(near(&out, 35, 25, DisplayColor::Blue));
        assert_eq!(out.get_pixel(25, 25), &GREY);
    }

    #[test]
    fn test_labels_are_rasterized() {
        // At scale 3 the label is 36 px high, so glyph stems are fully covered.
        let ann = rect(10.0, 30.0, 40.0, 20.0);
        let anchor = ann.geometry().label_anchor();
        let out = flatten(&blank(120, 80), &[ann], 1.0, 3.0);
        let (ax, ay) = ((anchor.x * 3.0) as u32, (anchor.y * 3.0) as u32);
        let hits = count_in(&out, ax, ay, ax + 200, ay + 45, yellowish);
        assert!(hits > 20, "only {hits} label pixels");
        // No label pixels far from the anchor.
        assert_eq!(count_in(&out, 0, 200, 360, 240, yellowish), 0);
    }

    #[test]
    fn test_line_label_uses_yellow_fill() {
        let line = Annotation::finalize(
            Geometry::Line {
                points: [(5.0, 20.0), (75.0, 20.0)],
            },
            PIXELS_TO_MM,
        );
        let out = flatten(&blank(80, 40), &[line], 1.0, 3.0);
        // Label sits below the line's midpoint, at (120, 60) on the canvas.
        assert!(count_in(&out, 110, 60, 240, 110, yellowish) > 20);
    }

    #[test]
    fn test_flatten_follows_scale() {
        let out = flatten(&blank(100, 50), &[], 1.0, 2.0);
        assert_eq!(out.dimensions(), (200, 100));
        let out = flatten(&blank(100, 50), &[rect(10.0, 10.0, 20.0, 20.0)], 1.0, 0.5);
        assert_eq!(out.dimensions(), (50, 25));
        assert!(near(&out, 10, 15, DisplayColor::Green));
    }

    #[test]
    fn test_scaled_outline_lands_on_scaled_coordinates() {
        let line = Annotation::finalize(
            Geometry::Line {
                points: [(0.0, 10.0), (40.0, 10.0)],
            },
            PIXELS_TO_MM,
        );
        let out = flatten(&blank(50, 50), &[line], 1.0, 2.0);
        assert!(near(&out, 40, 20, DisplayColor::Cyan));
        assert!(!near(&out, 40, 10, DisplayColor::Cyan));
    }

    #[test]
    fn test_export_writes_decodable_png_at_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_NAME);
        let written = export_to_file(&path, &blank(8, 6), &[], 1.0, 1.5).unwrap();
        assert!(written > 0);
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 9));
    }

    #[test]
    fn test_export_of_empty_image_fails() {
        let empty = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));
        assert!(matches!(
            export_canvas(&empty, &[], 1.0, 1.0),
            Err(AnnotatorError::Export(_))
        ));
    }
}
