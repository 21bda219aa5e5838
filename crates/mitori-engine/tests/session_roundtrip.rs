//! Integration test: drive a workspace through a realistic session,
//! serialize it to JSON, restore it, and compare states and pixels.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{Rgba, RgbaImage};
use mitori_engine::{Mode, SessionState, Workspace};

/// A small gradient image so rendered output is position-dependent.
fn test_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            u8::try_from(x * 255 / width.max(1)).unwrap_or(255),
            u8::try_from(y * 255 / height.max(1)).unwrap_or(255),
            60,
            255,
        ])
    })
}

#[test]
fn full_session_survives_a_json_round_trip() {
    let mut ws = Workspace::new();
    ws.resize_canvas(800, 600);
    ws.load_image(test_image(640, 480));

    // Build up a realistic session: a generated grid plus a manual
    // point, a crop, and tweaked display settings.
    ws.generate_grid(4, 3).unwrap();
    ws.set_mode(Mode::Grid);
    assert!(ws.add_grid_point(400.0, 300.0));
    ws.set_virtual_size(64.0, 48.0).unwrap();
    ws.set_grid_lightness(75);
    ws.set_grayscale(true);
    ws.set_keep_aspect_ratio(true);
    ws.set_aspect_ratio(4.0, 3.0).unwrap();
    ws.set_mode(Mode::Const);

    let snapshot = ws.export_session().expect("export should succeed");
    let json = serde_json::to_string(&snapshot).unwrap();

    // The wire format keeps its schema names.
    assert!(json.contains("\"imageURI\":\"data:image/png;base64,"));
    assert!(json.contains("\"grid_points\""));
    assert!(json.contains("\"version\""));

    let parsed: SessionState = serde_json::from_str(&json).unwrap();
    let mut restored = Workspace::new();
    restored.resize_canvas(800, 600);
    restored.import_session(&parsed).expect("import should succeed");

    // Point lists match in length, order, position, and flags.
    assert_eq!(restored.grid_points(), ws.grid_points());
    assert_eq!(restored.selection_rect(), ws.selection_rect());

    // Scalar state matches.
    assert_eq!(restored.mode(), Mode::Const);
    assert!(restored.grayscale());
    assert_eq!(restored.grid_lightness(), 75);
    assert_eq!(restored.virtual_size(), (64.0, 48.0));
    assert!(restored.keep_aspect_ratio());
    assert_eq!(restored.aspect_ratio(), (4.0, 3.0));
    assert_eq!(restored.dimensions(), ws.dimensions());
    assert_eq!(restored.crop_rect(), ws.crop_rect());
    assert_eq!(restored.distance_labels(), ws.distance_labels());

    // Pixel geometry matches once both sides have rendered.
    let original_frame = ws.render().unwrap();
    let restored_frame = restored.render().unwrap();
    assert_eq!(original_frame.data(), restored_frame.data());
}

#[test]
fn crop_then_export_preserves_composed_rectangle() {
    let mut ws = Workspace::new();
    ws.resize_canvas(1000, 1000);
    ws.load_image(test_image(1000, 1000));

    ws.set_mode(Mode::Resize);
    assert!(ws.move_resize_point(0, 250.0, 250.0));
    assert!(ws.move_resize_point(1, 750.0, 750.0));
    ws.crop_to_selection().unwrap();

    let snapshot = ws.export_session().unwrap();
    assert!((snapshot.source_x - 250.0).abs() < 1e-6);
    assert!((snapshot.source_y - 250.0).abs() < 1e-6);
    assert!((snapshot.source_width - 500.0).abs() < 1e-6);
    assert!((snapshot.source_height - 500.0).abs() < 1e-6);

    let mut restored = Workspace::new();
    restored.resize_canvas(1000, 1000);
    restored.import_session(&snapshot).unwrap();
    assert_eq!(restored.crop_rect(), ws.crop_rect());

    // The embedded image is the untouched original, so resetting the
    // crop on the restored workspace recovers the full frame.
    restored.reset_crop().unwrap();
    assert_eq!(restored.crop_rect(), Some(mitori_engine::CropRect::full(1000, 1000)));
}
