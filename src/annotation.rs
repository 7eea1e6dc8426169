//! Finalized measurement records and the append-only store holding them.

use egui::{pos2, Pos2};
use serde::{Deserialize, Serialize};

use crate::geometry::{self, Measurement};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rectangle,
    Circle,
    Line,
    Angle,
}

impl Shape {
    /// Color of the measurement label.
    pub fn label_color(self) -> DisplayColor {
        match self {
            Self::Rectangle => DisplayColor::Yellow,
            Self::Circle => DisplayColor::Orange,
            Self::Line => DisplayColor::Cyan,
            Self::Angle => DisplayColor::Magenta,
        }
    }

    /// Outline colors; an angle uses one per arm.
    pub fn stroke_colors(self) -> (DisplayColor, DisplayColor) {
        match self {
            Self::Rectangle => (DisplayColor::Green, DisplayColor::Green),
            Self::Circle => (DisplayColor::Blue, DisplayColor::Blue),
            Self::Line => (DisplayColor::Cyan, DisplayColor::Cyan),
            Self::Angle => (DisplayColor::Purple, DisplayColor::Cyan),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Yellow,
    Orange,
    Cyan,
    Magenta,
    Green,
    Blue,
    Purple,
    Red,
}

impl DisplayColor {
    pub fn rgba(self) -> [u8; 4] {
        match self {
            Self::Yellow => [255, 255, 0, 255],
            Self::Orange => [255, 165, 0, 255],
            Self::Cyan => [0, 255, 255, 255],
            Self::Magenta => [255, 0, 255, 255],
            Self::Green => [0, 128, 0, 255],
            Self::Blue => [0, 0, 255, 255],
            Self::Purple => [128, 0, 128, 255],
            Self::Red => [255, 0, 0, 255],
        }
    }

    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b, a] = self.rgba();
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

/// Image-space geometry of a finalized shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Geometry {
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// `(x, y)` is the center.
    Circle { x: f32, y: f32, diameter: f32 },
    Line { points: [(f32, f32); 2] },
    /// The middle point is the vertex.
    Angle { points: [(f32, f32); 3] },
}

impl Geometry {
    pub fn shape(&self) -> Shape {
        match self {
            Self::Rectangle { .. } => Shape::Rectangle,
            Self::Circle { .. } => Shape::Circle,
            Self::Line { .. } => Shape::Line,
            Self::Angle { .. } => Shape::Angle,
        }
    }

    pub fn measure(&self, pixels_per_mm: f64) -> Measurement {
        match self {
            Self::Rectangle { width, height, .. } => {
                Measurement::Area(geometry::rectangle_area_mm2(*width, *height, pixels_per_mm))
            }
            Self::Circle { diameter, .. } => {
                Measurement::Area(geometry::circle_area_mm2(*diameter, pixels_per_mm))
            }
            Self::Line { points: [a, b] } => {
                Measurement::Length(geometry::line_length_mm(to_pos(*a), to_pos(*b), pixels_per_mm))
            }
            Self::Angle { points: [p1, p2, p3] } => Measurement::Angle(geometry::angle_degrees(
                to_pos(*p1),
                to_pos(*p2),
                to_pos(*p3),
            )),
        }
    }

    /// Zero width/height/diameter/length, or an angle arm of zero length.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Rectangle { width, height, .. } => *width == 0.0 || *height == 0.0,
            Self::Circle { diameter, .. } => *diameter == 0.0,
            Self::Line { points: [a, b] } => a == b,
            Self::Angle { points: [p1, p2, p3] } => p1 == p2 || p3 == p2,
        }
    }

    /// Position of the measurement label in image space.
    pub fn label_anchor(&self) -> Pos2 {
        match self {
            Self::Rectangle { x, y, .. } => pos2(*x, *y - 15.0),
            Self::Circle { x, y, diameter } => {
                let r = diameter / 2.0;
                pos2(x - r, y - r - 15.0)
            }
            Self::Line { points: [a, b] } => pos2((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0),
            Self::Angle { points: [p1, _, p3] } => pos2((p1.0 + p3.0) / 2.0, (p1.1 + p3.1) / 2.0),
        }
    }
}

fn to_pos(p: (f32, f32)) -> Pos2 {
    pos2(p.0, p.1)
}

/// A finalized measurement. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(flatten)]
    geometry: Geometry,
    measurement: Measurement,
    measurement_text: String,
    color: DisplayColor,
    degenerate: bool,
}

impl Annotation {
    /// Derive measurement, label and color for `geometry`.
    pub fn finalize(geometry: Geometry, pixels_per_mm: f64) -> Self {
        let measurement = geometry.measure(pixels_per_mm);
        let degenerate = geometry.is_degenerate();
        Self {
            measurement_text: measurement.to_string(),
            color: geometry.shape().label_color(),
            measurement,
            degenerate,
            geometry,
        }
    }

    pub fn shape(&self) -> Shape {
        self.geometry.shape()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn measurement_text(&self) -> &str {
        &self.measurement_text
    }

    pub fn color(&self) -> DisplayColor {
        self.color
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Fill used when the label is drawn. Length and angle labels are
    /// yellow; area labels use the shape's own color.
    pub fn label_fill(&self) -> DisplayColor {
        match self.shape() {
            Shape::Line | Shape::Angle => DisplayColor::Yellow,
            Shape::Rectangle | Shape::Circle => self.color,
        }
    }

    /// Rotation of the label in radians; line labels follow the line.
    pub fn label_angle(&self) -> f32 {
        match &self.geometry {
            Geometry::Line { points: [a, b] } => (b.1 - a.1).atan2(b.0 - a.0),
            _ => 0.0,
        }
    }
}

/// Ordered annotations of the current image. Entries can only be appended;
/// the whole sequence can be cleared.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, annotation: Annotation) {
        if annotation.is_degenerate() {
            tracing::warn!(
                shape = ?annotation.shape(),
                "recording degenerate {}",
                annotation.measurement_text()
            );
        } else {
            tracing::debug!(shape = ?annotation.shape(), "{}", annotation.measurement_text());
        }
        self.annotations.push(annotation);
    }

    pub fn clear(&mut self) {
        tracing::debug!(count = self.annotations.len(), "clearing annotations");
        self.annotations.clear();
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn to_vec(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }
}

impl<'a> IntoIterator for &'a AnnotationStore {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
