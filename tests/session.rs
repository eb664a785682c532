use image::{Rgba, RgbaImage};

use layer_editor::modules::helpers::image_export;
use layer_editor::{
    EditSession, EditorError, EditorSettings, ExportFormat, ExportOptions, FilterKind, FilterParams, LayerKind,
    RestoreMode, ShapeKind, ToolKind, Transform,
};

fn settings(w: u32, h: u32) -> EditorSettings {
    EditorSettings { canvas_width: w, canvas_height: h, ..EditorSettings::default() }
}

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    image_export::encode(&RgbaImage::from_pixel(w, h, Rgba(px)), &ExportOptions::default()).unwrap()
}

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 5) as u8, (y * 3) as u8, ((x + y) * 2) as u8, 255]))
}

#[test]
fn half_opacity_red_layer_and_back() {
    let mut session = EditSession::new(settings(64, 64));
    let id = session.load_image_as_layer(&png(64, 64, [255, 0, 0, 255])).unwrap();
    assert!(session.surface().pixels().all(|p| p.0 == [255, 0, 0, 255]));

    session.set_layer_opacity(id, 0.5).unwrap();
    assert!(session.surface().pixels().all(|p| p.0 == [255, 0, 0, 128]));

    let restored = session.undo().unwrap().clone();
    assert!(restored.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    assert_eq!(session.layers().len(), 1);
    assert_eq!(session.active_layer().map(|l| l.opacity()), Some(1.0));

    let before = session.surface().clone();
    assert!(matches!(session.undo(), Err(EditorError::NothingToUndo)));
    assert_eq!(session.surface(), &before);
}

#[test]
fn grayscale_then_rotate() {
    let mut session = EditSession::new(settings(60, 60));
    session.add_generated_layer(gradient(40, 60), LayerKind::Generated);

    session.apply_filter(FilterKind::Grayscale, FilterParams::default()).unwrap();
    let layer = session.active_layer().unwrap();
    assert!(layer.image().pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
    let gray = layer.image().clone();

    session.apply_transform(Transform::Rotate90).unwrap();
    assert_eq!(session.active_layer().unwrap().size(), (60, 40));
    for _ in 0..3 { session.apply_transform(Transform::Rotate90).unwrap(); }
    assert_eq!(session.active_layer().unwrap().image(), &gray);
}

#[test]
fn history_grows_by_one_per_edit() {
    let mut session = EditSession::new(settings(32, 32));
    let id = session.add_shape_layer(ShapeKind::Rect);
    session.set_layer_opacity(id, 0.7).unwrap();
    session.apply_filter(FilterKind::Invert, FilterParams::default()).unwrap();
    session.apply_transform(Transform::crop()).unwrap();
    session.begin_stroke(1.0, 1.0, ToolKind::Brush).unwrap();
    session.extend_stroke(20.0, 20.0);
    session.end_stroke();
    assert_eq!(session.history_len(), 5);
}

#[test]
fn undo_then_redo_is_bit_identical() {
    for mode in [RestoreMode::Flatten, RestoreMode::Structured] {
        let mut session = EditSession::new(EditorSettings { restore_mode: mode, ..settings(50, 50) });
        session.add_generated_layer(gradient(50, 50), LayerKind::Generated);
        session.add_shape_layer(ShapeKind::Circle);
        session.apply_filter(FilterKind::Sepia, FilterParams::new(20, 40)).unwrap();
        let edited = session.surface().clone();

        session.undo().unwrap();
        assert_ne!(session.surface(), &edited);
        let redone = session.redo().unwrap().clone();
        assert_eq!(redone, edited, "{mode:?}");
        assert!(!session.can_redo());
    }
}

#[test]
fn new_edit_invalidates_redo() {
    let mut session = EditSession::new(settings(16, 16));
    session.add_generated_layer(gradient(16, 16), LayerKind::Generated);
    session.apply_filter(FilterKind::Invert, FilterParams::default()).unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());

    session.apply_transform(Transform::FlipVertical).unwrap();
    assert!(!session.can_redo());
    assert!(matches!(session.redo(), Err(EditorError::NothingToRedo)));
}

#[test]
fn structured_restore_keeps_the_layer_stack() {
    let mut session = EditSession::new(EditorSettings { restore_mode: RestoreMode::Structured, ..settings(20, 20) });
    let bottom = session.add_generated_layer(gradient(20, 20), LayerKind::Generated);
    let top = session.add_shape_layer(ShapeKind::Rect);
    session.set_layer_opacity(top, 0.25).unwrap();

    session.undo().unwrap();
    assert_eq!(session.layers().len(), 2);
    assert_eq!(session.layers().get(top).map(|l| l.opacity()), Some(1.0));
    assert!(session.layers().get(bottom).is_some());

    let third = session.add_shape_layer(ShapeKind::Circle);
    assert!(third != bottom && third != top);
}

#[test]
fn flatten_restore_collapses_to_one_layer() {
    let mut session = EditSession::new(settings(20, 20));
    session.add_generated_layer(gradient(20, 20), LayerKind::Generated);
    session.add_shape_layer(ShapeKind::Rect);
    session.add_shape_layer(ShapeKind::Circle);

    session.undo().unwrap();
    assert_eq!(session.layers().len(), 1);
    let layer = session.active_layer().unwrap();
    assert_eq!(layer.kind, LayerKind::Flattened);
    assert_eq!(layer.image(), session.surface());
}

#[test]
fn exported_png_decodes_to_the_surface() {
    let mut session = EditSession::new(settings(24, 18));
    session.add_generated_layer(gradient(24, 18), LayerKind::Generated);
    session.add_shape_layer(ShapeKind::Circle);

    let bytes = session.export_surface(ExportFormat::Png).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
    assert_eq!(&image_export::decode(&bytes).unwrap(), session.surface());
}

#[test]
fn composite_is_deterministic_and_zero_opacity_is_invisible() {
    let build = || {
        let mut session = EditSession::new(settings(30, 30));
        session.add_generated_layer(gradient(30, 30), LayerKind::Generated);
        let shape = session.add_shape_layer(ShapeKind::Circle);
        session.set_layer_position(shape, -40, -35).unwrap();
        (session, shape)
    };
    let (mut a, shape) = build();
    let (b, _) = build();
    assert_eq!(a.surface(), b.surface());

    a.set_layer_opacity(shape, 0.0).unwrap();
    assert_eq!(a.surface(), &gradient(30, 30));
}

#[test]
fn resize_is_not_an_edit_and_undo_restores_the_recorded_size() {
    let mut session = EditSession::new(settings(8, 8));
    session.add_generated_layer(gradient(8, 8), LayerKind::Generated);
    session.apply_transform(Transform::FlipHorizontal).unwrap();

    session.resize_canvas(4, 12).unwrap();
    assert_eq!(session.history_len(), 2);
    assert_eq!(session.undo().unwrap().dimensions(), (8, 8));
}

#[test]
fn text_layer_composites_onto_the_canvas() {
    let mut session = EditSession::new(settings(200, 50));
    let id = session.add_text_layer("Hello", None).unwrap();
    assert_eq!(session.layers().get(id).map(|l| (l.kind, l.size())), Some((LayerKind::Text, (100, 40))));
    assert!(session.surface().pixels().any(|p| p.0[3] > 0));
    assert!((100..200).all(|x| session.surface().get_pixel(x, 10).0[3] == 0));
}
