//! Measurement formulas.
//!
//! All inputs are image-space pixels; outputs are millimeters, square
//! millimeters or degrees, rounded to two decimals.

use std::f64::consts::PI;
use std::fmt;

use egui::Pos2;
use serde::{Deserialize, Serialize};

/// Pixels per millimeter at an assumed 96 DPI.
pub const PIXELS_TO_MM: f64 = 3.7795275591;

/// Rounds half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn distance(a: Pos2, b: Pos2) -> f64 {
    let dx = f64::from(b.x) - f64::from(a.x);
    let dy = f64::from(b.y) - f64::from(a.y);
    dx.hypot(dy)
}

pub fn rectangle_area_mm2(width_px: f32, height_px: f32, pixels_per_mm: f64) -> f64 {
    round2(f64::from(width_px) * f64::from(height_px) / pixels_per_mm.powi(2))
}

pub fn circle_area_mm2(diameter_px: f32, pixels_per_mm: f64) -> f64 {
    let radius_mm = f64::from(diameter_px) / 2.0 / pixels_per_mm;
    round2(PI * radius_mm.powi(2))
}

pub fn line_length_mm(a: Pos2, b: Pos2, pixels_per_mm: f64) -> f64 {
    round2(distance(a, b) / pixels_per_mm)
}

/// Angle swept from the `vertex → p1` arm to the `vertex → p3` arm, in
/// degrees within `[0, 360)`.
pub fn angle_degrees(p1: Pos2, vertex: Pos2, p3: Pos2) -> f64 {
    let polar = |p: Pos2| {
        (f64::from(p.y) - f64::from(vertex.y)).atan2(f64::from(p.x) - f64::from(vertex.x))
    };
    let mut angle = (polar(p3) - polar(p1)).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    let angle = round2(angle);
    // 359.999 rounds up to 360.00
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

/// A derived measurement, rendered as the annotation label.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Measurement {
    /// Square millimeters.
    Area(f64),
    /// Millimeters.
    Length(f64),
    /// Degrees.
    Angle(f64),
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Area(v) => write!(f, "Area: {v:.2} mm²"),
            Self::Length(v) => write!(f, "Length: {v:.2} mm"),
            Self::Angle(v) => write!(f, "Angle: {v:.2}°"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn test_one_square_millimeter() {
        let px = PIXELS_TO_MM as f32;
        let area = rectangle_area_mm2(px, px, PIXELS_TO_MM);
        assert_eq!(Measurement::Area(area).to_string(), "Area: 1.00 mm²");
    }

    #[test]
    fn test_ten_millimeter_square() {
        let area = rectangle_area_mm2(37.795, 37.795, PIXELS_TO_MM);
        assert_eq!(Measurement::Area(area).to_string(), "Area: 100.00 mm²");
    }

    #[test]
    fn test_circle_of_one_millimeter_radius() {
        let area = circle_area_mm2(2.0 * PIXELS_TO_MM as f32, PIXELS_TO_MM);
        assert_eq!(Measurement::Area(area).to_string(), "Area: 3.14 mm²");
    }

    #[test]
    fn test_circle_of_ten_millimeter_radius() {
        let area = circle_area_mm2(75.59, PIXELS_TO_MM);
        assert_eq!(Measurement::Area(area).to_string(), "Area: 314.15 mm²");
    }

    #[test]
    fn test_line_lengths() {
        let px = PIXELS_TO_MM as f32;
        let one = line_length_mm(pos2(0.0, 0.0), pos2(px, 0.0), PIXELS_TO_MM);
        assert_eq!(Measurement::Length(one).to_string(), "Length: 1.00 mm");
        let ten = line_length_mm(pos2(0.0, 0.0), pos2(37.795, 0.0), PIXELS_TO_MM);
        assert_eq!(Measurement::Length(ten).to_string(), "Length: 10.00 mm");
    }

    #[test]
    fn test_diagonal_line_uses_euclidean_distance() {
        let px = PIXELS_TO_MM as f32;
        let length = line_length_mm(pos2(0.0, 0.0), pos2(3.0 * px, 4.0 * px), PIXELS_TO_MM);
        assert_eq!(length, 5.0);
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_degrees(pos2(1.0, 0.0), pos2(0.0, 0.0), pos2(0.0, 1.0));
        assert_eq!(angle, 90.0);
        assert_eq!(Measurement::Angle(angle).to_string(), "Angle: 90.00°");
    }

    #[test]
    fn test_straight_angle() {
        let angle = angle_degrees(pos2(1.0, 0.0), pos2(0.0, 0.0), pos2(-1.0, 0.0));
        assert_eq!(angle, 180.0);
    }

    #[test]
    fn test_reflex_angle_is_normalized() {
        // Swapping the arms of a right angle sweeps the other way round.
        let angle = angle_degrees(pos2(0.0, 1.0), pos2(0.0, 0.0), pos2(1.0, 0.0));
        assert_eq!(angle, 270.0);
    }

    #[test]
    fn test_angle_stays_below_full_turn() {
        let samples = [
            (pos2(1.0, 0.0), pos2(1.0, -0.00001)),
            (pos2(-1.0, 0.0), pos2(-1.0, 0.00001)),
            (pos2(3.0, 4.0), pos2(3.0, 4.0)),
            (pos2(-2.0, -5.0), pos2(7.0, 1.0)),
        ];
        for (p1, p3) in samples {
            let angle = angle_degrees(p1, pos2(0.0, 0.0), p3);
            assert!((0.0..360.0).contains(&angle), "{angle} out of range");
        }
    }

    #[test]
    fn test_angle_relative_to_vertex() {
        let angle = angle_degrees(pos2(11.0, 5.0), pos2(10.0, 5.0), pos2(10.0, 6.0));
        assert_eq!(angle, 90.0);
    }

    #[test]
    fn test_zero_sized_shapes_measure_zero() {
        assert_eq!(rectangle_area_mm2(0.0, 25.0, PIXELS_TO_MM), 0.0);
        assert_eq!(circle_area_mm2(0.0, PIXELS_TO_MM), 0.0);
        assert_eq!(line_length_mm(pos2(4.0, 4.0), pos2(4.0, 4.0), PIXELS_TO_MM), 0.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235001), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
