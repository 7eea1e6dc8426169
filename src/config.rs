//! Runtime configuration.
//!
//! Every field has a default, so a configuration file only needs to name the
//! values it overrides:
//!
//! ```json
//! { "pixels_per_mm": 4.0, "zoom_steps": 10 }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotatorError, Result};
use crate::geometry::PIXELS_TO_MM;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Pixels per millimeter used for every measurement. Not calibrated.
    pub pixels_per_mm: f64,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Multiplier applied by one zoom-in request (divisor for zoom-out).
    pub zoom_factor: f32,
    /// Number of frames a zoom transition is spread over.
    pub zoom_steps: u32,
    /// Scale applied after an image has been cropped.
    pub crop_scale: f32,
    pub window_size: [f32; 2],
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            pixels_per_mm: PIXELS_TO_MM,
            min_scale: 0.2,
            max_scale: 5.0,
            zoom_factor: 1.2,
            zoom_steps: 20,
            crop_scale: 1.2,
            window_size: [1200.0, 800.0],
        }
    }
}

impl AnnotatorConfig {
    /// Reads and validates a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config = Self::from_json(&data)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.pixels_per_mm.is_finite() && self.pixels_per_mm > 0.0) {
            return Err(AnnotatorError::InvalidConfig(format!(
                "pixels_per_mm must be positive, got {}",
                self.pixels_per_mm
            )));
        }
        if !(self.min_scale > 0.0 && self.min_scale < self.max_scale) {
            return Err(AnnotatorError::InvalidConfig(format!(
                "scale bounds must satisfy 0 < min < max, got {}..{}",
                self.min_scale, self.max_scale
            )));
        }
        if self.zoom_factor <= 1.0 {
            return Err(AnnotatorError::InvalidConfig(format!(
                "zoom_factor must be greater than 1, got {}",
                self.zoom_factor
            )));
        }
        if self.zoom_steps == 0 {
            return Err(AnnotatorError::InvalidConfig(
                "zoom_steps must be at least 1".to_string(),
            ));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.crop_scale) {
            return Err(AnnotatorError::InvalidConfig(format!(
                "crop_scale {} lies outside {}..{}",
                self.crop_scale, self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }
}
