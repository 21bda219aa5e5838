//! Viewport transform between canvas pixels and logical image space.
//!
//! The cropped image is fitted into the canvas (shrunk to fit, never
//! enlarged past 1:1 unless zoomed), scaled by the zoom factor, and
//! centered. Every coordinate conversion and every redraw goes through
//! the cached result, so it is recomputed exactly once per canvas
//! resize, crop change, or zoom change.

/// Decimal digits kept by [`Viewport::local_to_logical`].
///
/// Logical coordinates are quantized so serialized sessions stay
/// diff-stable across export/import cycles.
const LOGICAL_DIGITS: i32 = 5;

/// Cached placement of the drawn image box on the canvas.
///
/// Offsets may be negative when the zoomed image is larger than the
/// canvas; that produces clipping, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Left edge of the drawn image box, in canvas pixels.
    pub offset_x: f64,
    /// Top edge of the drawn image box, in canvas pixels.
    pub offset_y: f64,
    /// Drawn image width in canvas pixels.
    pub draw_width: f64,
    /// Drawn image height in canvas pixels.
    pub draw_height: f64,
}

impl Viewport {
    /// Compute the viewport for a cropped image on a canvas.
    ///
    /// The crop is shrunk by `min(canvas_w/crop_w, canvas_h/crop_h)`
    /// only when that factor is below one, then multiplied by `scale`
    /// and centered. Draw dimensions are never negative.
    #[must_use]
    pub fn compute(canvas_w: f64, canvas_h: f64, crop_w: f64, crop_h: f64, scale: f64) -> Self {
        if crop_w <= 0.0 || crop_h <= 0.0 {
            return Self::default();
        }

        let fit = (canvas_w / crop_w).min(canvas_h / crop_h);
        let mut draw_width = crop_w;
        let mut draw_height = crop_h;
        if fit < 1.0 {
            draw_width *= fit;
            draw_height *= fit;
        }
        draw_width *= scale;
        draw_height *= scale;

        Self {
            offset_x: (canvas_w - draw_width) / 2.0,
            offset_y: (canvas_h - draw_height) / 2.0,
            draw_width,
            draw_height,
        }
    }

    /// Convert a logical position (percent of the drawn image box) to
    /// canvas pixels.
    #[must_use]
    pub fn logical_to_local(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.draw_width * (x / 100.0) + self.offset_x,
            self.draw_height * (y / 100.0) + self.offset_y,
        )
    }

    /// Convert a canvas-pixel position to logical coordinates,
    /// quantized to five decimal digits.
    ///
    /// Returns the logical origin when the viewport is degenerate
    /// (nothing drawn yet), so stray pointer input cannot produce NaN.
    #[must_use]
    pub fn local_to_logical(&self, x: f64, y: f64) -> (f64, f64) {
        if self.draw_width <= 0.0 || self.draw_height <= 0.0 {
            return (0.0, 0.0);
        }
        (
            round_digits((x - self.offset_x) / self.draw_width * 100.0, LOGICAL_DIGITS),
            round_digits((y - self.offset_y) / self.draw_height * 100.0, LOGICAL_DIGITS),
        )
    }

    /// Whether the viewport has a drawable image box.
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.draw_width > 0.0 && self.draw_height > 0.0
    }
}

/// Round to a fixed number of decimal digits, producing a number
/// (half-away-from-zero, like `Math.round` on the shifted value).
#[must_use]
pub fn round_digits(value: f64, digits: i32) -> f64 {
    let pow = 10f64.powi(digits);
    (value * pow).round() / pow
}
