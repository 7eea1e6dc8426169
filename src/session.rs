//! One annotator screen's worth of state: the image being measured, the
//! view, the draft under the pointer and the finished annotations.

use std::path::Path;

use egui::{Pos2, Vec2};
use image::DynamicImage;

use crate::annotation::{Annotation, AnnotationStore};
use crate::config::AnnotatorConfig;
use crate::crop::crop_image;
use crate::draft::{DraftState, GestureOutcome, Tool};
use crate::error::Result;
use crate::export;
use crate::mapper::CoordinateMapper;
use crate::view::{ViewAction, ViewState};
use crate::zoom::ZoomController;

pub struct AnnotatorSession {
    image: DynamicImage,
    view: ViewState,
    zoom: ZoomController,
    draft: DraftState,
    annotations: AnnotationStore,
    pixels_per_mm: f64,
    /// Bumped whenever the displayed pixels change (crop, brightness).
    revision: u64,
}

impl AnnotatorSession {
    pub fn new(image: DynamicImage, config: &AnnotatorConfig) -> Self {
        Self {
            image,
            view: ViewState::new(config),
            zoom: ZoomController::new(config),
            draft: DraftState::Idle,
            annotations: AnnotationStore::new(),
            pixels_per_mm: config.pixels_per_mm,
            revision: 0,
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn image_size(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn draft(&self) -> &DraftState {
        &self.draft
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mapper for a canvas whose top-left corner sits at `origin`.
    pub fn mapper(&self, origin: Pos2) -> CoordinateMapper {
        CoordinateMapper::new(origin, self.view.scale())
    }

    pub fn dispatch(&mut self, action: ViewAction) {
        let before = self.view;
        self.view = self.view.reduce(action);
        if before.brightness() != self.view.brightness() {
            self.revision += 1;
        }
    }

    pub fn select_tool(&mut self, tool: Option<Tool>) {
        self.dispatch(ViewAction::SelectTool(tool));
    }

    pub fn pointer_down(&mut self, mapper: &CoordinateMapper, screen_pos: Pos2) {
        let point = mapper.to_image(screen_pos);
        self.draft = std::mem::take(&mut self.draft).pointer_down(self.view.tool(), point);
    }

    pub fn pointer_move(&mut self, mapper: &CoordinateMapper, screen_pos: Pos2) {
        let point = mapper.to_image(screen_pos);
        self.draft = std::mem::take(&mut self.draft).pointer_move(point);
    }

    /// Finish the current gesture. A finished shape is appended to the
    /// annotations; a finished crop box replaces the image.
    pub fn pointer_up(&mut self) -> Result<GestureOutcome> {
        let (draft, outcome) = std::mem::take(&mut self.draft).pointer_up(self.pixels_per_mm);
        self.draft = draft;
        match &outcome {
            GestureOutcome::Annotation(annotation) => self.annotations.push(annotation.clone()),
            GestureOutcome::Crop(rect) => {
                let cropped = crop_image(&self.image, rect, self.view.scale())?;
                self.replace_image(cropped);
            }
            GestureOutcome::None => {}
        }
        Ok(outcome)
    }

    pub fn cancel_gesture(&mut self) {
        self.draft = std::mem::take(&mut self.draft).cancel();
    }

    fn replace_image(&mut self, image: DynamicImage) {
        if !self.annotations.is_empty() {
            tracing::info!(
                count = self.annotations.len(),
                "annotations keep their coordinates after crop"
            );
        }
        self.image = image;
        self.zoom.cancel();
        self.dispatch(ViewAction::ResetAfterCrop);
        self.revision += 1;
    }

    pub fn zoom_in(&mut self) {
        self.zoom.zoom_in(self.view.scale());
    }

    pub fn zoom_out(&mut self) {
        self.zoom.zoom_out(self.view.scale());
    }

    /// Advance a running zoom by one frame. Returns true while the zoom is
    /// still in progress and another frame is needed.
    pub fn tick_zoom(&mut self) -> bool {
        if let Some(scale) = self.zoom.tick() {
            self.dispatch(ViewAction::SetScale(scale));
        }
        self.zoom.is_animating()
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// Export the canvas as currently shown, zoom included.
    pub fn export_to(&self, path: &Path) -> Result<usize> {
        export::export_to_file(
            path,
            &self.image,
            self.annotations.as_slice(),
            self.view.brightness(),
            self.view.scale(),
        )
    }

    /// Hand the image and annotations over to the save receiver.
    pub fn into_saved(self) -> (DynamicImage, Vec<Annotation>) {
        (self.image, self.annotations.to_vec())
    }
}
