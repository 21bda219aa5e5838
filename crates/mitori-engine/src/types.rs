//! Shared types for the mitori workspace engine.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// bitmaps without depending on `image` directly.
pub use image::RgbaImage;

/// Workspace interaction mode.
///
/// Governs which overlay is rendered and which pointer interactions
/// the engine accepts. Serialized as its integer discriminant so
/// session files stay compact and schema-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Mode {
    /// Reference lines, draggable points, and distance labels.
    Grid,
    /// Rectangular selection on the image for cropping.
    Resize,
    /// Lines and distances rendered without interactivity.
    #[default]
    Const,
    /// Just the image.
    Image,
}

impl From<Mode> for u8 {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Grid => 0,
            Mode::Resize => 1,
            Mode::Const => 2,
            Mode::Image => 3,
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Grid),
            1 => Ok(Self::Resize),
            2 => Ok(Self::Const),
            3 => Ok(Self::Image),
            _ => Err(EngineError::SessionField("mode")),
        }
    }
}

/// A reference point in logical coordinates (percent of the drawn
/// image box, 0–100 on both axes).
///
/// The `horizontal`/`vertical` flags select which reference line(s)
/// the point contributes: a horizontal line at its `y`, a vertical
/// line at its `x`, or both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    /// Horizontal position as a percentage of the drawn image width.
    pub x: f64,
    /// Vertical position as a percentage of the drawn image height.
    pub y: f64,
    /// Whether the point draws a horizontal line.
    pub horizontal: bool,
    /// Whether the point draws a vertical line.
    pub vertical: bool,
}

impl GridPoint {
    /// Create a point with both line flags enabled (the state a
    /// freshly placed point starts in).
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            horizontal: true,
            vertical: true,
        }
    }
}

/// One corner of the resize selection, in logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizePoint {
    /// Horizontal position as a percentage of the drawn image width.
    pub x: f64,
    /// Vertical position as a percentage of the drawn image height.
    pub y: f64,
}

/// A sub-region of the source bitmap, in source-pixel units.
///
/// The crop rectangle is the part of the original image currently
/// treated as "the image"; all logical coordinates are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    /// Left edge in source pixels.
    pub x: f64,
    /// Top edge in source pixels.
    pub y: f64,
    /// Width in source pixels.
    pub width: f64,
    /// Height in source pixels.
    pub height: f64,
}

impl CropRect {
    /// The full-frame crop for a bitmap of the given size.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: f64::from(width),
            height: f64::from(height),
        }
    }

    /// Clamp the rectangle so it lies entirely within `width`×`height`.
    ///
    /// Degenerate rectangles collapse to at least one pixel so the
    /// viewport math never divides by zero.
    #[must_use]
    pub fn clamped_to(self, width: u32, height: u32) -> Self {
        let max_w = f64::from(width);
        let max_h = f64::from(height);
        let x = self.x.clamp(0.0, (max_w - 1.0).max(0.0));
        let y = self.y.clamp(0.0, (max_h - 1.0).max(0.0));
        Self {
            x,
            y,
            width: self.width.clamp(1.0, max_w - x),
            height: self.height.clamp(1.0, max_h - y),
        }
    }
}

/// Errors reported by the workspace engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Failed to decode image bytes.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyImage,

    /// An operation requires a loaded image.
    #[error("no image loaded")]
    NoImage,

    /// Grid generation was asked for a zero-cell axis.
    #[error("grid must have at least one cell per axis, got {n}x{m}")]
    InvalidGridCells {
        /// Requested horizontal cell count.
        n: u32,
        /// Requested vertical cell count.
        m: u32,
    },

    /// Aspect-ratio dimensions must be finite and positive.
    #[error("invalid aspect ratio {width}:{height}")]
    InvalidAspectRatio {
        /// Requested ratio width.
        width: f64,
        /// Requested ratio height.
        height: f64,
    },

    /// Virtual dimensions must be finite and positive.
    #[error("invalid virtual size {width}x{height}")]
    InvalidVirtualSize {
        /// Requested virtual width.
        width: f64,
        /// Requested virtual height.
        height: f64,
    },

    /// Zoom scale must be finite and positive.
    #[error("invalid zoom scale {0}")]
    InvalidScale(f64),

    /// The canvas has no drawable area.
    #[error("canvas size {width}x{height} is not drawable")]
    InvalidCanvasSize {
        /// Canvas width in pixels.
        width: u32,
        /// Canvas height in pixels.
        height: u32,
    },

    /// A session snapshot field is missing or malformed.
    #[error("invalid session field: {0}")]
    SessionField(&'static str),

    /// The session's embedded image could not be restored.
    #[error("invalid session image: {0}")]
    SessionImage(String),

    /// A load completion arrived after a newer load superseded it.
    #[error("image load superseded by a newer request")]
    StaleLoad,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_u8() {
        for mode in [Mode::Grid, Mode::Resize, Mode::Const, Mode::Image] {
            let raw = u8::from(mode);
            assert_eq!(Mode::try_from(raw).unwrap(), mode);
        }
    }

    #[test]
    fn mode_rejects_unknown_discriminant() {
        assert!(Mode::try_from(4).is_err());
        assert!(Mode::try_from(255).is_err());
    }

    #[test]
    fn mode_serializes_as_integer() {
        let json = serde_json::to_string(&Mode::Resize).unwrap();
        assert_eq!(json, "1");
    }

    #[test]
    fn grid_point_starts_with_both_flags() {
        let p = GridPoint::new(25.0, 75.0);
        assert!(p.horizontal);
        assert!(p.vertical);
    }

    #[test]
    fn crop_full_covers_bitmap() {
        let crop = CropRect::full(640, 480);
        assert!((crop.x).abs() < f64::EPSILON);
        assert!((crop.width - 640.0).abs() < f64::EPSILON);
        assert!((crop.height - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn crop_clamp_restores_invariant() {
        let crop = CropRect {
            x: -10.0,
            y: 5.0,
            width: 700.0,
            height: 480.0,
        };
        let clamped = crop.clamped_to(640, 480);
        assert!(clamped.x >= 0.0);
        assert!(clamped.x + clamped.width <= 640.0);
        assert!(clamped.y + clamped.height <= 480.0);
    }

    #[test]
    fn grid_point_serde_round_trip() {
        let p = GridPoint {
            x: 33.33333,
            y: 66.66667,
            horizontal: false,
            vertical: true,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: GridPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
