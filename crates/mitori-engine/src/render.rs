//! Raster renderer: image, reference lines, selection, and label bars.
//!
//! Draws one complete frame into a `tiny-skia` pixmap sized to the
//! canvas. The overlay depends on the mode: GRID and CONST show lines
//! and distance-label bars, RESIZE shows only the selection outline,
//! IMAGE shows the bare image. Interactive handles are *not* drawn
//! here; the hosting UI places them from the engine's reported
//! positions.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use tiny_skia::{
    FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::filter;
use crate::labels::DistanceLabel;
use crate::selection::SelectionRect;
use crate::source::ImageSource;
use crate::types::{EngineError, GridPoint, Mode};
use crate::viewport::Viewport;

/// Thickness of the top and right distance-label bars, in pixels.
pub const LABEL_BAR_SIZE: f32 = 30.0;

/// Integer upscale applied to the 8x8 label glyphs.
const GLYPH_SCALE: u32 = 2;

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// The image to draw, if one is loaded.
    pub source: Option<&'a ImageSource>,
    /// Cached placement of the image box on the canvas.
    pub viewport: &'a Viewport,
    /// Canvas width in pixels.
    pub canvas_width: u32,
    /// Canvas height in pixels.
    pub canvas_height: u32,
    /// Which overlay to draw.
    pub mode: Mode,
    /// Whether to apply the grayscale post-filter.
    pub grayscale: bool,
    /// Lightness of the grid color (0–100).
    pub grid_lightness: u8,
    /// Reference points supplying the overlay lines.
    pub grid_points: &'a [GridPoint],
    /// Normalized selection rectangle (RESIZE overlay).
    pub selection: SelectionRect,
    /// Distance labels along the x axis.
    pub labels_x: &'a [DistanceLabel],
    /// Distance labels along the y axis.
    pub labels_y: &'a [DistanceLabel],
}

/// Render a frame into a freshly allocated pixmap.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCanvasSize`] when the canvas has no
/// drawable area.
pub fn render(frame: &Frame<'_>) -> Result<Pixmap, EngineError> {
    let mut pixmap =
        Pixmap::new(frame.canvas_width, frame.canvas_height).ok_or(EngineError::InvalidCanvasSize {
            width: frame.canvas_width,
            height: frame.canvas_height,
        })?;

    if let Some(source) = frame.source {
        draw_source(&mut pixmap, source, frame.viewport);
    }

    if frame.grayscale {
        filter::grayscale_in_place(pixmap.data_mut());
    }

    match frame.mode {
        Mode::Image => {}
        Mode::Resize => draw_selection_outline(&mut pixmap, frame),
        Mode::Grid | Mode::Const => {
            draw_grid_lines(&mut pixmap, frame);
            draw_label_bars(&mut pixmap, frame);
        }
    }

    Ok(pixmap)
}

/// Convert a rendered pixmap (premultiplied RGBA) to a straight-alpha
/// `RgbaImage` suitable for PNG encoding.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pixmap_to_rgba_image(pixmap: &Pixmap) -> image::RgbaImage {
    let data = pixmap.data();
    let mut out = image::RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in out.pixels_mut().enumerate() {
        let offset = i * 4;
        let alpha = data[offset + 3];
        if alpha == 0 {
            *pixel = image::Rgba([0, 0, 0, 0]);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let r = u16::from(data[offset]) * 255 / u16::from(alpha);
            let g = u16::from(data[offset + 1]) * 255 / u16::from(alpha);
            let b = u16::from(data[offset + 2]) * 255 / u16::from(alpha);
            *pixel = image::Rgba([r as u8, g as u8, b as u8, alpha]);
        }
    }
    out
}

/// Gray value for the grid color `hsl(0, 0%, L%)`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lightness_to_gray(lightness: u8) -> u8 {
    (f64::from(lightness.min(100)) / 100.0 * 255.0).round() as u8
}

/// Draw the cropped image scaled into the viewport rectangle.
#[allow(clippy::cast_possible_truncation)]
fn draw_source(pixmap: &mut Pixmap, source: &ImageSource, viewport: &Viewport) {
    if !viewport.is_drawable() {
        return;
    }
    let Some(crop_pixmap) = crop_to_pixmap(source) else {
        return;
    };

    let sx = (viewport.draw_width / f64::from(crop_pixmap.width())) as f32;
    let sy = (viewport.draw_height / f64::from(crop_pixmap.height())) as f32;
    let transform = Transform::from_scale(sx, sy)
        .post_translate(viewport.offset_x as f32, viewport.offset_y as f32);

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, crop_pixmap.as_ref(), &paint, transform, None);
}

/// Extract the crop region as a premultiplied pixmap.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn crop_to_pixmap(source: &ImageSource) -> Option<Pixmap> {
    let bitmap = source.bitmap();
    let crop = source.crop();

    let x0 = (crop.x.round().max(0.0) as u32).min(bitmap.width().saturating_sub(1));
    let y0 = (crop.y.round().max(0.0) as u32).min(bitmap.height().saturating_sub(1));
    let width = (crop.width.round().max(1.0) as u32).min(bitmap.width() - x0);
    let height = (crop.height.round().max(1.0) as u32).min(bitmap.height() - y0);

    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            let pixel = bitmap.get_pixel(x, y).0;
            let alpha = u16::from(pixel[3]);
            // Premultiply: tiny-skia pixmaps store premultiplied RGBA.
            data.push(((u16::from(pixel[0]) * alpha + 127) / 255) as u8);
            data.push(((u16::from(pixel[1]) * alpha + 127) / 255) as u8);
            data.push(((u16::from(pixel[2]) * alpha + 127) / 255) as u8);
            data.push(pixel[3]);
        }
    }

    Pixmap::from_vec(data, IntSize::from_wh(width, height)?)
}

/// Stroke every flagged reference line across the full canvas span.
#[allow(clippy::cast_possible_truncation)]
fn draw_grid_lines(pixmap: &mut Pixmap, frame: &Frame<'_>) {
    let gray = lightness_to_gray(frame.grid_lightness);
    let mut paint = Paint::default();
    paint.set_color_rgba8(gray, gray, gray, 255);

    let stroke = Stroke::default();
    let canvas_w = f64::from(frame.canvas_width);
    let canvas_h = f64::from(frame.canvas_height);

    for point in frame.grid_points {
        let (local_x, local_y) = frame.viewport.logical_to_local(point.x, point.y);

        if point.horizontal {
            let mut pb = PathBuilder::new();
            pb.move_to(0.0, local_y as f32);
            pb.line_to(canvas_w as f32, local_y as f32);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
        if point.vertical {
            let mut pb = PathBuilder::new();
            pb.move_to(local_x as f32, 0.0);
            pb.line_to(local_x as f32, canvas_h as f32);
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
    }
}

/// Fill the semi-transparent top and right bars and write the labels.
#[allow(clippy::cast_possible_truncation)]
fn draw_label_bars(pixmap: &mut Pixmap, frame: &Frame<'_>) {
    let mut bar_paint = Paint::default();
    bar_paint.set_color_rgba8(0, 0, 0, 77);

    let canvas_w = frame.canvas_width as f32;
    let canvas_h = frame.canvas_height as f32;
    let vp = frame.viewport;

    // Full-span bars, then a second pass over the image span so the
    // region carrying labels reads darker.
    let rects = [
        Rect::from_xywh(0.0, 0.0, canvas_w, LABEL_BAR_SIZE),
        Rect::from_xywh(
            canvas_w - LABEL_BAR_SIZE,
            LABEL_BAR_SIZE,
            LABEL_BAR_SIZE,
            (canvas_h - LABEL_BAR_SIZE).max(0.0),
        ),
        Rect::from_xywh(
            vp.offset_x as f32,
            0.0,
            (vp.draw_width as f32).max(0.0),
            LABEL_BAR_SIZE,
        ),
        Rect::from_xywh(
            canvas_w - LABEL_BAR_SIZE,
            vp.offset_y as f32,
            LABEL_BAR_SIZE,
            (vp.draw_height as f32).max(0.0),
        ),
    ];
    for rect in rects.into_iter().flatten() {
        pixmap.fill_rect(rect, &bar_paint, Transform::identity(), None);
    }

    for label in frame.labels_x {
        draw_label_text(
            pixmap,
            &label.value.to_string(),
            label.center as f32,
            LABEL_BAR_SIZE / 2.0,
        );
    }
    for label in frame.labels_y {
        draw_label_text(
            pixmap,
            &label.value.to_string(),
            canvas_w - LABEL_BAR_SIZE / 2.0,
            label.center as f32,
        );
    }
}

/// Draw white bitmap text centered on the given canvas position.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn draw_label_text(pixmap: &mut Pixmap, text: &str, center_x: f32, center_y: f32) {
    let scale = GLYPH_SCALE as i32;
    let glyph_size = 8 * scale;
    let text_width = text.chars().count() as i32 * glyph_size;
    let origin_x = (center_x as i32) - text_width / 2;
    let origin_y = (center_y as i32) - glyph_size / 2;

    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let data = pixmap.data_mut();

    let mut cursor_x = origin_x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch) else {
            cursor_x += glyph_size;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row >> col_idx) & 1 == 0 {
                    continue;
                }
                let px = cursor_x + col_idx * scale;
                let py = origin_y + row_idx as i32 * scale;
                for sy in 0..scale {
                    for sx in 0..scale {
                        let tx = px + sx;
                        let ty = py + sy;
                        if tx >= 0 && ty >= 0 && tx < width && ty < height {
                            let offset = (ty * width + tx) as usize * 4;
                            data[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
                        }
                    }
                }
            }
        }
        cursor_x += glyph_size;
    }
}

/// Stroke the selection rectangle outline in the grid color.
#[allow(clippy::cast_possible_truncation)]
fn draw_selection_outline(pixmap: &mut Pixmap, frame: &Frame<'_>) {
    let rect = frame.selection;
    let (left, top) = frame
        .viewport
        .logical_to_local(rect.top_left.x, rect.top_left.y);
    let (right, bottom) = frame
        .viewport
        .logical_to_local(rect.bottom_right.x, rect.bottom_right.y);

    let Some(outline) = Rect::from_ltrb(left as f32, top as f32, right as f32, bottom as f32)
    else {
        return;
    };

    let gray = lightness_to_gray(frame.grid_lightness);
    let mut paint = Paint::default();
    paint.set_color_rgba8(gray, gray, gray, 255);

    let path = PathBuilder::from_rect(outline);
    pixmap.stroke_path(
        &path,
        &paint,
        &Stroke::default(),
        Transform::identity(),
        None,
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn frame_parts() -> (ImageSource, Viewport) {
        let source = ImageSource::new(RgbaImage::from_pixel(100, 100, Rgba([200, 40, 40, 255])));
        let viewport = Viewport::compute(200.0, 200.0, 100.0, 100.0, 1.0);
        (source, viewport)
    }

    fn base_frame<'a>(
        source: &'a ImageSource,
        viewport: &'a Viewport,
        mode: Mode,
    ) -> Frame<'a> {
        Frame {
            source: Some(source),
            viewport,
            canvas_width: 200,
            canvas_height: 200,
            mode,
            grayscale: false,
            grid_lightness: 50,
            grid_points: &[],
            selection: crate::selection::ResizeSelection::new().rect(),
            labels_x: &[],
            labels_y: &[],
        }
    }

    #[test]
    fn image_mode_draws_only_the_image() {
        let (source, viewport) = frame_parts();
        let frame = base_frame(&source, &viewport, Mode::Image);
        let pixmap = render(&frame).unwrap();

        // Center of the drawn image: the source color, opaque.
        let center = pixmap.pixel(100, 100).unwrap();
        assert_eq!(center.alpha(), 255);
        assert_eq!(center.red(), 200);

        // No label bar in IMAGE mode: corner outside the image box is empty.
        let corner = pixmap.pixel(1, 1).unwrap();
        assert_eq!(corner.alpha(), 0);
    }

    #[test]
    fn grid_mode_draws_label_bars() {
        let (source, viewport) = frame_parts();
        let frame = base_frame(&source, &viewport, Mode::Grid);
        let pixmap = render(&frame).unwrap();

        // Top-left corner sits inside the translucent top bar.
        let corner = pixmap.pixel(1, 1).unwrap();
        assert!(corner.alpha() > 0);
        assert!(corner.alpha() < 255);
    }

    #[test]
    fn const_mode_draws_lines_like_grid_mode() {
        let (source, viewport) = frame_parts();
        let points = [GridPoint::new(50.0, 50.0)];
        let mut frame = base_frame(&source, &viewport, Mode::Const);
        frame.grid_points = &points;
        frame.grid_lightness = 100;
        let pixmap = render(&frame).unwrap();

        // The vertical line at x=50% crosses below the image box.
        let below_image = pixmap.pixel(100, 195).unwrap();
        assert!(below_image.alpha() > 0, "expected a line pixel at x=100");
    }

    #[test]
    fn grayscale_flag_desaturates_canvas() {
        let (source, viewport) = frame_parts();
        let mut frame = base_frame(&source, &viewport, Mode::Image);
        frame.grayscale = true;
        let pixmap = render(&frame).unwrap();

        let center = pixmap.pixel(100, 100).unwrap();
        assert_eq!(center.red(), center.green());
        assert_eq!(center.green(), center.blue());
    }

    #[test]
    fn resize_mode_strokes_selection_outline() {
        let (source, viewport) = frame_parts();
        let mut sel = crate::selection::ResizeSelection::new();
        sel.restore(
            [
                crate::types::ResizePoint { x: 25.0, y: 25.0 },
                crate::types::ResizePoint { x: 75.0, y: 75.0 },
            ],
            false,
            (1.0, 1.0),
        );
        let mut frame = base_frame(&source, &viewport, Mode::Resize);
        frame.selection = sel.rect();
        frame.grid_lightness = 100;
        let pixmap = render(&frame).unwrap();

        // Left selection edge: logical x=25 on a 100px-wide viewport at
        // offset 50 lands on canvas x=75. The white stroke lightens the
        // red source pixel there.
        let on_edge = pixmap.pixel(75, 100).unwrap();
        assert!(on_edge.green() > 40, "expected stroke over the source pixel");
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let (source, viewport) = frame_parts();
        let mut frame = base_frame(&source, &viewport, Mode::Image);
        frame.canvas_width = 0;
        assert!(matches!(
            render(&frame),
            Err(EngineError::InvalidCanvasSize { .. }),
        ));
    }

    #[test]
    fn pixmap_conversion_recovers_straight_alpha() {
        let (source, viewport) = frame_parts();
        let frame = base_frame(&source, &viewport, Mode::Image);
        let pixmap = render(&frame).unwrap();
        let rgba = pixmap_to_rgba_image(&pixmap);
        assert_eq!(rgba.dimensions(), (200, 200));
        assert_eq!(rgba.get_pixel(100, 100).0, [200, 40, 40, 255]);
        assert_eq!(rgba.get_pixel(1, 1).0[3], 0);
    }

    #[test]
    fn missing_image_renders_blank_canvas() {
        let viewport = Viewport::default();
        let frame = Frame {
            source: None,
            viewport: &viewport,
            canvas_width: 64,
            canvas_height: 64,
            mode: Mode::Image,
            grayscale: false,
            grid_lightness: 50,
            grid_points: &[],
            selection: crate::selection::ResizeSelection::new().rect(),
            labels_x: &[],
            labels_y: &[],
        };
        let pixmap = render(&frame).unwrap();
        assert!(pixmap.pixels().iter().all(|p| p.alpha() == 0));
    }
}
