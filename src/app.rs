use std::path::PathBuf;

use eframe::egui;
use image::RgbaImage;

use crate::annotation::{Annotation, DisplayColor, Geometry};
use crate::config::AnnotatorConfig;
use crate::draft::{DraftGeometry, GestureOutcome, Tool};
use crate::export::{self, DEFAULT_EXPORT_NAME, LABEL_SIZE};
use crate::gallery::Gallery;
use crate::mapper::CoordinateMapper;
use crate::session::AnnotatorSession;
use crate::view::{ViewAction, MAX_BRIGHTNESS, MIN_BRIGHTNESS};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

// ── Screens ─────────────────────────────────────────────────────────────────

enum Screen {
    Gallery,
    Annotator(Box<AnnotatorScreen>),
}

/// What the annotator asks its host to do when it closes.
enum AnnotatorEvent {
    Back,
    Save,
}

struct AnnotatorScreen {
    session: AnnotatorSession,
    texture: Option<(u64, egui::TextureHandle)>,
}

// ── App ─────────────────────────────────────────────────────────────────────

pub struct MeasurexApp {
    config: AnnotatorConfig,
    gallery: Gallery,
    screen: Screen,
    preview: Option<(u64, egui::TextureHandle)>,
    dark_mode: bool,
    status: Option<String>,
}

impl MeasurexApp {
    pub fn new(config: AnnotatorConfig, image_paths: &[PathBuf]) -> Self {
        let mut app = Self {
            config,
            gallery: Gallery::new(),
            screen: Screen::Gallery,
            preview: None,
            dark_mode: true,
            status: None,
        };
        app.open_files(image_paths);
        app
    }

    fn open_files(&mut self, paths: &[PathBuf]) {
        let errors = self.gallery.open_files(paths);
        self.status = match errors.as_slice() {
            [] => None,
            [only] => Some(only.to_string()),
            [first, rest @ ..] => Some(format!("{first} (and {} more)", rest.len())),
        };
    }

    fn pick_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_files()
        {
            self.open_files(&paths);
        }
    }

    fn start_annotating(&mut self) {
        if let Some(entry) = self.gallery.current() {
            tracing::info!(image = entry.name(), "annotating");
            let session = AnnotatorSession::new(entry.image().clone(), &self.config);
            self.screen = Screen::Annotator(Box::new(AnnotatorScreen {
                session,
                texture: None,
            }));
        }
    }

    fn show_gallery(&mut self, ctx: &egui::Context) {
        let mut annotate = false;

        egui::TopBottomPanel::top("gallery_toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Open images…").clicked() {
                    self.pick_files();
                }
                ui.separator();
                theme_toggle(ui, &mut self.dark_mode);
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(ui.visuals().warn_fg_color, status);
                }
            });
        });

        if self.gallery.is_empty() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    ui.label("Open one or more images to start measuring.");
                });
            });
            return;
        }

        let mut remove = None;
        let mut select = None;
        egui::SidePanel::left("gallery_list")
            .resizable(true)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let current = self.gallery.current_index();
                    for (i, entry) in self.gallery.images().iter().enumerate() {
                        ui.horizontal(|ui| {
                            if ui.small_button("✖").on_hover_text("Remove").clicked() {
                                remove = Some(i);
                            }
                            let mut label = ui.selectable_label(current == Some(i), entry.name());
                            if let Some(path) = entry.path() {
                                label = label.on_hover_text(path.display().to_string());
                            }
                            if label.clicked() {
                                select = Some(i);
                            }
                        });
                    }
                });
            });
        if let Some(i) = select {
            self.gallery.select(i);
        }
        if let Some(i) = remove {
            self.gallery.remove(i);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("<").clicked() {
                    self.gallery.prev();
                }
                if ui.button(">").clicked() {
                    self.gallery.next();
                }
                ui.separator();
                if ui.button("Annotate").clicked() {
                    annotate = true;
                }
            });
            ui.separator();

            let revision = self.gallery.revision();
            let Some(entry) = self.gallery.current() else {
                return;
            };
            if self.preview.as_ref().map(|(r, _)| *r) != Some(revision) {
                let texture = load_texture(ctx, "preview", &entry.image().to_rgba8());
                self.preview = Some((revision, texture));
            }
            if let Some((_, texture)) = &self.preview {
                let size = texture.size_vec2();
                let available = ui.available_size();
                let fit = (available.x / size.x).min(available.y / size.y).min(1.0);
                ui.centered_and_justified(|ui| {
                    ui.image((texture.id(), size * fit));
                });
            }
        });

        if annotate {
            self.start_annotating();
        }
    }
}

impl AnnotatorScreen {
    fn ensure_texture(&mut self, ctx: &egui::Context) {
        let revision = self.session.revision();
        if self.texture.as_ref().map(|(r, _)| *r) == Some(revision) {
            return;
        }
        let rgba = export::apply_brightness(self.session.image(), self.session.view().brightness());
        self.texture = Some((revision, load_texture(ctx, "annotated", &rgba)));
    }

    fn export(&self, status: &mut Option<String>) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(DEFAULT_EXPORT_NAME)
            .add_filter("PNG image", &["png"])
            .save_file()
        else {
            return;
        };
        *status = Some(match self.session.export_to(&path) {
            Ok(_) => format!("Exported to {}", path.display()),
            Err(e) => {
                tracing::error!("{e}");
                e.to_string()
            }
        });
    }

    fn show(
        &mut self,
        ctx: &egui::Context,
        dark_mode: &mut bool,
        status: &mut Option<String>,
    ) -> Option<AnnotatorEvent> {
        self.ensure_texture(ctx);
        let mut event = None;

        // Toolbar
        egui::TopBottomPanel::top("annotator_toolbar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                let selected = self.session.view().tool();
                for tool in Tool::ALL {
                    if ui
                        .selectable_label(selected == Some(tool), tool.label())
                        .clicked()
                    {
                        self.session.select_tool(Some(tool));
                    }
                }
                ui.separator();
                if ui.button("Export").clicked() {
                    self.export(status);
                }
                if ui.button("Back").clicked() {
                    event = Some(AnnotatorEvent::Back);
                }
                if ui.button("Save").clicked() {
                    event = Some(AnnotatorEvent::Save);
                }
                ui.separator();
                if ui.button("Zoom In").clicked() {
                    self.session.zoom_in();
                }
                if ui.button("Zoom Out").clicked() {
                    self.session.zoom_out();
                }
                if ui.button("Clear").clicked() {
                    self.session.clear_annotations();
                }
                ui.separator();
                theme_toggle(ui, dark_mode);
                ui.label(format!("Zoom: {:.0}%", self.session.view().scale() * 100.0));
                if let Some(msg) = status.as_ref() {
                    ui.separator();
                    ui.label(msg.as_str());
                }
            });
        });

        // Brightness
        egui::SidePanel::left("brightness").show(ctx, |ui| {
            ui.label("Brightness");
            let mut brightness = self.session.view().brightness();
            let slider = egui::Slider::new(&mut brightness, MIN_BRIGHTNESS..=MAX_BRIGHTNESS)
                .step_by(0.01)
                .vertical();
            if ui.add(slider).changed() {
                self.session.dispatch(ViewAction::SetBrightness(brightness));
            }
        });

        // Canvas
        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(egui::Color32::BLACK))
            .show(ctx, |ui| {
                egui::ScrollArea::both().show(ui, |ui| {
                    let scale = self.session.view().scale();
                    let (response, painter) = ui.allocate_painter(
                        self.session.image_size() * scale,
                        egui::Sense::click_and_drag(),
                    );
                    let mapper = self.session.mapper(response.rect.min);

                    if let Some((_, tex)) = &self.texture {
                        painter.image(
                            tex.id(),
                            mapper.image_rect_on_screen(self.session.image_size()),
                            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                            egui::Color32::WHITE,
                        );
                    }

                    draw_annotations(&painter, &mapper, self.session.annotations().as_slice());
                    draw_draft(&painter, &mapper, &self.session);

                    if self.session.view().tool().is_some() && response.hovered() {
                        ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
                    }
                    self.handle_pointer(ctx, &response, &mapper, status);
                });
            });

        if self.session.tick_zoom() {
            ctx.request_repaint();
        }
        event
    }

    fn handle_pointer(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        mapper: &CoordinateMapper,
        status: &mut Option<String>,
    ) {
        let (pressed, released, pointer) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        if pressed && response.hovered() {
            if let Some(pos) = pointer {
                self.session.pointer_down(mapper, pos);
            }
        }
        if !self.session.draft().is_idle() {
            if let Some(pos) = pointer {
                self.session.pointer_move(mapper, pos);
            }
        }
        if released {
            match self.session.pointer_up() {
                Ok(GestureOutcome::Crop(_)) => {
                    let (w, h) = (self.session.image().width(), self.session.image().height());
                    *status = Some(format!("Cropped to {w}×{h}"));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("{e}");
                    *status = Some(e.to_string());
                }
            }
        }
    }
}

// ── Drawing ─────────────────────────────────────────────────────────────────

fn draw_annotations(painter: &egui::Painter, mapper: &CoordinateMapper, annotations: &[Annotation]) {
    for ann in annotations {
        let (first, second) = ann.shape().stroke_colors();
        let thin = egui::Stroke::new(mapper.len_to_screen(1.0), first.to_egui());
        match ann.geometry() {
            Geometry::Rectangle {
                x,
                y,
                width,
                height,
            } => {
                let rect = egui::Rect::from_min_size(
                    mapper.to_screen(egui::pos2(*x, *y)),
                    egui::vec2(*width, *height) * mapper.scale(),
                );
                let stroke = egui::Stroke::new(mapper.len_to_screen(2.0), first.to_egui());
                painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
            }
            Geometry::Circle { x, y, diameter } => {
                painter.circle_stroke(
                    mapper.to_screen(egui::pos2(*x, *y)),
                    mapper.len_to_screen(diameter / 2.0),
                    thin,
                );
            }
            Geometry::Line { points: [a, b] } => {
                painter.line_segment(
                    [
                        mapper.to_screen(egui::pos2(a.0, a.1)),
                        mapper.to_screen(egui::pos2(b.0, b.1)),
                    ],
                    thin,
                );
            }
            Geometry::Angle { points: [p1, p2, p3] } => {
                let [s1, s2, s3] = [p1, p2, p3].map(|p| mapper.to_screen(egui::pos2(p.0, p.1)));
                painter.line_segment([s1, s2], thin);
                painter.line_segment(
                    [s2, s3],
                    egui::Stroke::new(mapper.len_to_screen(1.0), second.to_egui()),
                );
            }
        }
        draw_label(painter, mapper, ann);
    }
}

fn draw_label(painter: &egui::Painter, mapper: &CoordinateMapper, ann: &Annotation) {
    let color = ann.label_fill().to_egui();
    let galley = painter.layout_no_wrap(
        ann.measurement_text().to_owned(),
        egui::FontId::proportional(mapper.len_to_screen(LABEL_SIZE)),
        color,
    );
    let pos = mapper.to_screen(ann.geometry().label_anchor());
    let text = egui::epaint::TextShape::new(pos, galley, color).with_angle(ann.label_angle());
    painter.add(text);
}

fn draw_draft(painter: &egui::Painter, mapper: &CoordinateMapper, session: &AnnotatorSession) {
    let red = DisplayColor::Red.to_egui();
    let stroke = egui::Stroke::new(mapper.len_to_screen(1.0), red);

    if let Some((_, geometry)) = session.draft().preview() {
        match geometry {
            DraftGeometry::Rect(rect) => {
                let screen = egui::Rect::from_min_max(mapper.to_screen(rect.min), mapper.to_screen(rect.max));
                painter.rect_stroke(screen, 0.0, stroke, egui::StrokeKind::Middle);
            }
            DraftGeometry::Circle { center, diameter } => {
                painter.circle_stroke(mapper.to_screen(center), mapper.len_to_screen(diameter / 2.0), stroke);
            }
            DraftGeometry::Segment([a, b]) => {
                painter.line_segment([mapper.to_screen(a), mapper.to_screen(b)], stroke);
            }
        }
    }

    for point in session.draft().angle_points() {
        painter.circle_filled(mapper.to_screen(*point), mapper.len_to_screen(3.0), red);
    }
}

fn theme_toggle(ui: &mut egui::Ui, dark_mode: &mut bool) {
    let label = if *dark_mode { "☀ Light" } else { "🌙 Dark" };
    if ui.button(label).clicked() {
        *dark_mode = !*dark_mode;
    }
}

fn load_texture(ctx: &egui::Context, name: &str, rgba: &RgbaImage) -> egui::TextureHandle {
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.as_flat_samples();
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
    ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR)
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for MeasurexApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        });

        let event = if let Screen::Annotator(screen) = &mut self.screen {
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                screen.session.cancel_gesture();
            }
            screen.show(ctx, &mut self.dark_mode, &mut self.status)
        } else {
            self.show_gallery(ctx);
            None
        };

        match event {
            Some(AnnotatorEvent::Back) => {
                tracing::info!("leaving annotator, discarding annotations");
                self.screen = Screen::Gallery;
            }
            Some(AnnotatorEvent::Save) => {
                if let Screen::Annotator(screen) = std::mem::replace(&mut self.screen, Screen::Gallery) {
                    let (image, annotations) = screen.session.into_saved();
                    self.gallery.on_save(image, &annotations);
                }
            }
            None => {}
        }
    }
}
