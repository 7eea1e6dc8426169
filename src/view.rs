//! Presentation state of the annotator screen.
//!
//! `ViewState` is a small `Copy` value; changes go through [`ViewState::reduce`]
//! so every update is an explicit [`ViewAction`].

use crate::config::AnnotatorConfig;
use crate::draft::Tool;

pub const MIN_BRIGHTNESS: f32 = 0.0;
pub const MAX_BRIGHTNESS: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewAction {
    SelectTool(Option<Tool>),
    SetScale(f32),
    SetBrightness(f32),
    /// Applied after the image has been replaced by a crop.
    ResetAfterCrop,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    scale: f32,
    brightness: f32,
    tool: Option<Tool>,
    min_scale: f32,
    max_scale: f32,
    crop_scale: f32,
}

impl ViewState {
    pub fn new(config: &AnnotatorConfig) -> Self {
        Self {
            scale: 1.0_f32.clamp(config.min_scale, config.max_scale),
            brightness: 1.0,
            tool: None,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            crop_scale: config.crop_scale,
        }
    }

    #[must_use]
    pub fn reduce(self, action: ViewAction) -> Self {
        match action {
            ViewAction::SelectTool(tool) => Self { tool, ..self },
            ViewAction::SetScale(scale) => Self {
                scale: scale.clamp(self.min_scale, self.max_scale),
                ..self
            },
            ViewAction::SetBrightness(brightness) => Self {
                brightness: brightness.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS),
                ..self
            },
            ViewAction::ResetAfterCrop => Self {
                scale: self.crop_scale,
                ..self
            },
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn tool(&self) -> Option<Tool> {
        self.tool
    }
}
