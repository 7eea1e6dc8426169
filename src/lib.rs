//! Measurex: measure shapes drawn over medical images.
//!
//! The interaction core (coordinate mapping, the draft state machine, zoom
//! and view state) is independent of the window; [`app`] wires it to egui.

pub mod annotation;
pub mod app;
pub mod config;
pub mod crop;
pub mod draft;
pub mod error;
pub mod export;
pub mod gallery;
pub mod geometry;
pub mod mapper;
pub mod session;
pub mod view;
pub mod zoom;

pub use annotation::{Annotation, AnnotationStore, DisplayColor, Geometry, Shape};
pub use config::AnnotatorConfig;
pub use crop::{crop_image, CropRect};
pub use draft::{DragTool, DraftState, GestureOutcome, Tool};
pub use error::{AnnotatorError, Result};
pub use geometry::{Measurement, PIXELS_TO_MM};
pub use mapper::CoordinateMapper;
pub use session::AnnotatorSession;
pub use view::{ViewAction, ViewState};
pub use zoom::ZoomController;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}
