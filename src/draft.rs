//! Pointer-gesture state machine for the shape being drawn.
//!
//! Positions fed into the machine are already in image space (see
//! [`crate::mapper`]). Transitions consume the current state and return the
//! next one; finalizing a gesture reports what it produced instead of writing
//! into shared state.

use egui::{Pos2, Rect};

use crate::annotation::{Annotation, Geometry};
use crate::crop::CropRect;
use crate::geometry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Rectangle,
    Circle,
    Line,
    Angle,
    Crop,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Circle,
        Tool::Rectangle,
        Tool::Line,
        Tool::Angle,
        Tool::Crop,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Line => "Line",
            Self::Angle => "Angle",
            Self::Crop => "Crop",
        }
    }

    /// The drag gesture this tool draws with. Angles are picked by clicks
    /// and have none.
    pub fn drag_tool(self) -> Option<DragTool> {
        match self {
            Self::Rectangle => Some(DragTool::Rectangle),
            Self::Circle => Some(DragTool::Circle),
            Self::Line => Some(DragTool::Line),
            Self::Crop => Some(DragTool::Crop),
            Self::Angle => None,
        }
    }
}

/// Tools drawn with a single press-drag-release gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DragTool {
    Rectangle,
    Circle,
    Line,
    Crop,
}

/// Tentative geometry of a drag-drawn shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DraftGeometry {
    /// Rectangle and crop box.
    Rect(Rect),
    Circle { center: Pos2, diameter: f32 },
    Segment([Pos2; 2]),
}

impl DraftGeometry {
    fn empty(tool: DragTool, origin: Pos2) -> Self {
        match tool {
            DragTool::Rectangle | DragTool::Crop => Self::Rect(Rect::from_min_max(origin, origin)),
            DragTool::Circle => Self::Circle {
                center: origin,
                diameter: 0.0,
            },
            DragTool::Line => Self::Segment([origin, origin]),
        }
    }

    fn stretch(self, origin: Pos2, point: Pos2) -> Self {
        match self {
            Self::Rect(_) => Self::Rect(Rect::from_two_pos(origin, point)),
            Self::Circle { center, .. } => Self::Circle {
                center,
                diameter: 2.0 * geometry::distance(center, point) as f32,
            },
            Self::Segment(_) => Self::Segment([origin, point]),
        }
    }

    fn into_geometry(self) -> Geometry {
        match self {
            Self::Rect(rect) => Geometry::Rectangle {
                x: rect.min.x,
                y: rect.min.y,
                width: rect.width(),
                height: rect.height(),
            },
            Self::Circle { center, diameter } => Geometry::Circle {
                x: center.x,
                y: center.y,
                diameter,
            },
            Self::Segment([a, b]) => Geometry::Line {
                points: [(a.x, a.y), (b.x, b.y)],
            },
        }
    }
}

/// What a completed gesture produced.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureOutcome {
    None,
    Annotation(Annotation),
    Crop(CropRect),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DraftState {
    #[default]
    Idle,
    Drawing {
        tool: DragTool,
        origin: Pos2,
        geometry: DraftGeometry,
    },
    /// Points picked so far for an angle, vertex second.
    AngleCollecting { points: Vec<Pos2> },
}

impl DraftState {
    pub const ANGLE_POINTS: usize = 3;

    pub fn pointer_down(self, tool: Option<Tool>, point: Pos2) -> Self {
        let Some(tool) = tool else {
            return self;
        };
        match (tool.drag_tool(), self) {
            (None, Self::AngleCollecting { mut points }) => {
                if points.len() < Self::ANGLE_POINTS {
                    points.push(point);
                }
                Self::AngleCollecting { points }
            }
            (None, _) => Self::AngleCollecting {
                points: vec![point],
            },
            (Some(tool), previous) => {
                if let Self::AngleCollecting { points } = previous {
                    tracing::debug!(picked = points.len(), "discarding unfinished angle");
                }
                Self::Drawing {
                    tool,
                    origin: point,
                    geometry: DraftGeometry::empty(tool, point),
                }
            }
        }
    }

    pub fn pointer_move(self, point: Pos2) -> Self {
        match self {
            Self::Drawing {
                tool,
                origin,
                geometry,
            } => Self::Drawing {
                tool,
                origin,
                geometry: geometry.stretch(origin, point),
            },
            other => other,
        }
    }

    pub fn pointer_up(self, pixels_per_mm: f64) -> (Self, GestureOutcome) {
        match self {
            Self::Drawing {
                tool: DragTool::Crop,
                geometry: DraftGeometry::Rect(rect),
                ..
            } => (Self::Idle, GestureOutcome::Crop(CropRect::from_rect(rect))),
            Self::Drawing { geometry, .. } => {
                let annotation = Annotation::finalize(geometry.into_geometry(), pixels_per_mm);
                (Self::Idle, GestureOutcome::Annotation(annotation))
            }
            Self::AngleCollecting { points } if points.len() == Self::ANGLE_POINTS => {
                let geometry = Geometry::Angle {
                    points: [
                        (points[0].x, points[0].y),
                        (points[1].x, points[1].y),
                        (points[2].x, points[2].y),
                    ],
                };
                let annotation = Annotation::finalize(geometry, pixels_per_mm);
                (Self::Idle, GestureOutcome::Annotation(annotation))
            }
            other => (other, GestureOutcome::None),
        }
    }

    /// Drop whatever is in progress.
    pub fn cancel(self) -> Self {
        Self::Idle
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn angle_points(&self) -> &[Pos2] {
        match self {
            Self::AngleCollecting { points } => points,
            _ => &[],
        }
    }

    /// Geometry of the shape being dragged, for the preview overlay.
    pub fn preview(&self) -> Option<(DragTool, DraftGeometry)> {
        match self {
            Self::Drawing { tool, geometry, .. } => Some((*tool, *geometry)),
            _ => None,
        }
    }
}
