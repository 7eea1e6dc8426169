use egui::{pos2, Pos2};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use measurex::gallery::{Gallery, GalleryImage};
use measurex::{
    AnnotatorConfig, AnnotatorSession, GestureOutcome, Shape, Tool, ViewAction, PIXELS_TO_MM,
};

fn checkerboard(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            Rgba([220, 220, 220, 255])
        } else {
            Rgba([30, 30, 30, 255])
        }
    }))
}

fn drag(session: &mut AnnotatorSession, tool: Tool, from: Pos2, to: Pos2) -> GestureOutcome {
    session.select_tool(Some(tool));
    let mapper = session.mapper(Pos2::ZERO);
    session.pointer_down(&mapper, from);
    session.pointer_move(&mapper, to);
    session.pointer_up().unwrap()
}

#[test]
fn measures_every_shape_kind() {
    let mut session = AnnotatorSession::new(checkerboard(400, 300), &AnnotatorConfig::default());
    let px = PIXELS_TO_MM as f32;

    drag(&mut session, Tool::Rectangle, pos2(10.0, 10.0), pos2(10.0 + px, 10.0 + px));
    drag(&mut session, Tool::Circle, pos2(100.0, 100.0), pos2(100.0 + px, 100.0));
    drag(&mut session, Tool::Line, pos2(0.0, 0.0), pos2(3.0 * px, 4.0 * px));

    session.select_tool(Some(Tool::Angle));
    let mapper = session.mapper(Pos2::ZERO);
    for p in [pos2(60.0, 50.0), pos2(50.0, 50.0), pos2(40.0, 50.0)] {
        session.pointer_down(&mapper, p);
        session.pointer_up().unwrap();
    }

    let texts: Vec<&str> = session
        .annotations()
        .iter()
        .map(|a| a.measurement_text())
        .collect();
    assert_eq!(
        texts,
        vec![
            "Area: 1.00 mm²",
            "Area: 3.14 mm²",
            "Length: 5.00 mm",
            "Angle: 180.00°",
        ]
    );
    let shapes: Vec<Shape> = session.annotations().iter().map(|a| a.shape()).collect();
    assert_eq!(shapes, vec![Shape::Rectangle, Shape::Circle, Shape::Line, Shape::Angle]);
}

#[test]
fn zoomed_canvas_measures_image_pixels() {
    let mut session = AnnotatorSession::new(checkerboard(400, 300), &AnnotatorConfig::default());
    session.dispatch(ViewAction::SetScale(2.0));
    let px = PIXELS_TO_MM as f32;
    // Dragging two screen millimeters at 2x covers one image millimeter.
    drag(&mut session, Tool::Line, pos2(0.0, 0.0), pos2(2.0 * px, 0.0));
    assert_eq!(
        session.annotations().as_slice()[0].measurement_text(),
        "Length: 1.00 mm"
    );
}

#[test]
fn crop_then_export_and_save() {
    let mut session = AnnotatorSession::new(checkerboard(120, 90), &AnnotatorConfig::default());
    drag(&mut session, Tool::Rectangle, pos2(5.0, 5.0), pos2(25.0, 25.0));
    let outcome = drag(&mut session, Tool::Crop, pos2(10.0, 20.0), pos2(74.0, 68.0));
    assert!(matches!(outcome, GestureOutcome::Crop(_)));
    assert_eq!(session.image().dimensions(), (64, 48));
    assert_eq!(session.view().scale(), 1.2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    session.export_to(&path).unwrap();
    // The export follows the 1.2 scale set by the crop: round(64·1.2) × round(48·1.2).
    assert_eq!(image::open(&path).unwrap().dimensions(), (77, 58));

    let mut gallery = Gallery::new();
    gallery.add(GalleryImage::from_image("scan", checkerboard(120, 90)));
    let (image, annotations) = session.into_saved();
    gallery.on_save(image, &annotations);
    assert_eq!(gallery.current().unwrap().image().dimensions(), (64, 48));
    assert_eq!(annotations.len(), 1);
}

#[test]
fn zoom_requests_stay_within_bounds() {
    let mut session = AnnotatorSession::new(checkerboard(10, 10), &AnnotatorConfig::default());
    for _ in 0..25 {
        session.zoom_in();
        while session.tick_zoom() {}
        assert!(session.view().scale() <= 5.0);
    }
    for _ in 0..40 {
        session.zoom_out();
        while session.tick_zoom() {}
        assert!(session.view().scale() >= 0.2);
    }
    assert_eq!(session.view().scale(), 0.2);
}

#[test]
fn clear_removes_everything() {
    let mut session = AnnotatorSession::new(checkerboard(50, 50), &AnnotatorConfig::default());
    for i in 0..5 {
        let offset = i as f32 * 5.0;
        drag(&mut session, Tool::Line, pos2(offset, 0.0), pos2(offset, 10.0));
    }
    assert_eq!(session.annotations().len(), 5);
    session.clear_annotations();
    assert_eq!(session.annotations().len(), 0);
}
