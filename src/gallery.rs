//! The set of opened images the annotator is launched from.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::annotation::Annotation;
use crate::error::{AnnotatorError, Result};

#[derive(Clone, Debug)]
pub struct GalleryImage {
    name: String,
    path: Option<PathBuf>,
    image: DynamicImage,
}

impl GalleryImage {
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path).map_err(|source| AnnotatorError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "opened image");
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            image,
        })
    }

    pub fn from_image(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            path: None,
            image,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

#[derive(Debug, Default)]
pub struct Gallery {
    images: Vec<GalleryImage>,
    current: usize,
    /// Bumped on every change so cached textures can be invalidated.
    revision: u64,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, image: GalleryImage) {
        self.images.push(image);
        self.revision += 1;
    }

    /// Open every path; files that fail to decode are skipped and their
    /// errors returned.
    pub fn open_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<AnnotatorError> {
        let mut errors = Vec::new();
        for path in paths {
            match GalleryImage::open(path.as_ref()) {
                Ok(image) => self.add(image),
                Err(e) => {
                    tracing::warn!("{e}");
                    errors.push(e);
                }
            }
        }
        errors
    }

    pub fn remove(&mut self, index: usize) -> Option<GalleryImage> {
        if index >= self.images.len() {
            return None;
        }
        let removed = self.images.remove(index);
        if self.current > index || self.current >= self.images.len() {
            self.current = self.current.saturating_sub(1);
        }
        self.revision += 1;
        Some(removed)
    }

    pub fn select(&mut self, index: usize) -> bool {
        if index < self.images.len() {
            self.current = index;
            self.revision += 1;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        if !self.images.is_empty() {
            self.select((self.current + 1) % self.images.len());
        }
    }

    pub fn prev(&mut self) {
        if !self.images.is_empty() {
            let len = self.images.len();
            self.select((self.current + len - 1) % len);
        }
    }

    pub fn current(&self) -> Option<&GalleryImage> {
        self.images.get(self.current)
    }

    pub fn current_index(&self) -> Option<usize> {
        (!self.images.is_empty()).then_some(self.current)
    }

    pub fn images(&self) -> &[GalleryImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receiver of the annotator's save action: the edited image replaces the
    /// current entry and the annotations are logged. Nothing is persisted.
    pub fn on_save(&mut self, image: DynamicImage, annotations: &[Annotation]) {
        let Some(entry) = self.images.get_mut(self.current) else {
            tracing::warn!("save with no current image");
            return;
        };
        entry.image = image;
        match serde_json::to_string(annotations) {
            Ok(json) => tracing::info!(image = %entry.name, annotations = %json, "saved annotations"),
            Err(e) => tracing::warn!("cannot serialize annotations: {e}"),
        }
        self.revision += 1;
    }
}
