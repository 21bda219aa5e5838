//! The resize selection: two corner points defining a crop rectangle.
//!
//! Corners are stored in drag order and normalized on read, so "a" is
//! always the geometric top-left no matter which corner the user
//! grabbed first. An optional aspect-ratio lock constrains corner
//! drags to the target ratio.

use crate::types::{EngineError, ResizePoint};

/// Hard floor for the selection rectangle in logical units.
///
/// Keeps an aspect-locked drag from collapsing to a zero-size
/// rectangle, which would make the crop degenerate.
const MIN_RECT_SIZE: f64 = 0.5;

/// A normalized logical rectangle (top-left / bottom-right corners).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Geometric top-left corner.
    pub top_left: ResizePoint,
    /// Geometric bottom-right corner.
    pub bottom_right: ResizePoint,
}

impl SelectionRect {
    /// Rectangle width in logical units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.bottom_right.x - self.top_left.x
    }

    /// Rectangle height in logical units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom_right.y - self.top_left.y
    }
}

/// Exactly two corner points, an aspect-ratio lock, and its target.
#[derive(Debug, Clone)]
pub struct ResizeSelection {
    points: [ResizePoint; 2],
    keep_aspect_ratio: bool,
    aspect_ratio: (f64, f64),
}

impl Default for ResizeSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeSelection {
    /// A full-frame selection with the lock disabled.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            points: [
                ResizePoint { x: 0.0, y: 0.0 },
                ResizePoint { x: 100.0, y: 100.0 },
            ],
            keep_aspect_ratio: false,
            aspect_ratio: (1.0, 1.0),
        }
    }

    /// The two corners in stored (drag) order, for serialization.
    #[must_use]
    pub const fn points(&self) -> [ResizePoint; 2] {
        self.points
    }

    /// Whether corner drags are constrained to the target ratio.
    #[must_use]
    pub const fn keep_aspect_ratio(&self) -> bool {
        self.keep_aspect_ratio
    }

    /// Enable or disable the aspect-ratio lock.
    pub const fn set_keep_aspect_ratio(&mut self, keep: bool) {
        self.keep_aspect_ratio = keep;
    }

    /// The target aspect ratio as `(width, height)`.
    #[must_use]
    pub const fn aspect_ratio(&self) -> (f64, f64) {
        self.aspect_ratio
    }

    /// The normalized rectangle, independent of drag order.
    #[must_use]
    pub fn rect(&self) -> SelectionRect {
        let [a, b] = self.points;
        SelectionRect {
            top_left: ResizePoint {
                x: a.x.min(b.x),
                y: a.y.min(b.y),
            },
            bottom_right: ResizePoint {
                x: a.x.max(b.x),
                y: a.y.max(b.y),
            },
        }
    }

    /// Reset to the full frame. Called on image load and after a crop
    /// commits.
    pub const fn reset(&mut self) {
        self.points = [
            ResizePoint { x: 0.0, y: 0.0 },
            ResizePoint { x: 100.0, y: 100.0 },
        ];
    }

    /// Restore both corners from a session snapshot.
    pub const fn restore(&mut self, points: [ResizePoint; 2], keep: bool, ratio: (f64, f64)) {
        self.points = points;
        self.keep_aspect_ratio = keep;
        self.aspect_ratio = ratio;
    }

    /// Re-center the selection as the largest `width:height` rectangle
    /// inscribed in the working image.
    ///
    /// `crop_w`/`crop_h` are the working image dimensions in source
    /// pixels; whichever axis binds first becomes 100% and the other is
    /// derived from the ratio.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidAspectRatio`] when either ratio
    /// component is non-finite or not positive.
    pub fn set_aspect_ratio(
        &mut self,
        width: f64,
        height: f64,
        crop_w: f64,
        crop_h: f64,
    ) -> Result<(), EngineError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(EngineError::InvalidAspectRatio { width, height });
        }
        self.aspect_ratio = (width, height);

        let (width_pct, height_pct) = if crop_w / width < crop_h / height {
            // Width is the binding constraint: span it fully.
            let desired_px_height = (crop_w / width) * height;
            (100.0, desired_px_height / crop_h * 100.0)
        } else {
            let desired_px_width = (crop_h / height) * width;
            (desired_px_width / crop_w * 100.0, 100.0)
        };

        let left = (100.0 - width_pct) / 2.0;
        let top = (100.0 - height_pct) / 2.0;
        self.points = [
            ResizePoint { x: left, y: top },
            ResizePoint {
                x: left + width_pct,
                y: top + height_pct,
            },
        ];
        Ok(())
    }

    /// Drag one corner to a new logical position.
    ///
    /// Without the lock the corner simply follows the pointer. With the
    /// lock, the candidate rectangle spanned from the opposite corner is
    /// replaced by the nearest aspect-matching rectangle contained in
    /// it, floored at [`MIN_RECT_SIZE`] so it can never degenerate; the
    /// drag direction supplies the signs.
    ///
    /// Returns `false` for an index other than 0 or 1.
    pub fn drag_corner(&mut self, index: usize, x: f64, y: f64) -> bool {
        if index > 1 {
            return false;
        }
        if !self.keep_aspect_ratio {
            self.points[index] = ResizePoint { x, y };
            return true;
        }

        let anchor = self.points[1 - index];
        let target_width = x - anchor.x;
        let target_height = y - anchor.y;
        let w_sign = if target_width < 0.0 { -1.0 } else { 1.0 };
        let h_sign = if target_height < 0.0 { -1.0 } else { 1.0 };

        let (ar_w, ar_h) = self.aspect_ratio;
        let mut fitted = fit_aspect_rect(ar_w, ar_h, target_width.abs(), target_height.abs());
        if fitted.0 < MIN_RECT_SIZE || fitted.1 < MIN_RECT_SIZE {
            fitted = fit_aspect_rect(ar_w, ar_h, MIN_RECT_SIZE, MIN_RECT_SIZE);
        }

        self.points[index] = ResizePoint {
            x: anchor.x + w_sign * fitted.0,
            y: anchor.y + h_sign * fitted.1,
        };
        true
    }

    /// Translate the whole rectangle so its top-left lands on the given
    /// logical position, preserving size.
    pub fn translate_to(&mut self, x: f64, y: f64) {
        let rect = self.rect();
        let width = rect.width();
        let height = rect.height();
        self.points = [
            ResizePoint { x, y },
            ResizePoint {
                x: x + width,
                y: y + height,
            },
        ];
    }
}

/// Scale a `ratio_w:ratio_h` rectangle to the largest size contained in
/// `max_w`×`max_h`.
///
/// The scale factor is `min(max_w/ratio_w, max_h/ratio_h)`, which fits
/// the rectangle to whichever dimension is smaller relative to the
/// target.
fn fit_aspect_rect(ratio_w: f64, ratio_h: f64, max_w: f64, max_h: f64) -> (f64, f64) {
    let scale = (max_w / ratio_w).min(max_h / ratio_h);
    (ratio_w * scale, ratio_h * scale)
}
