//! Session snapshots: the full engine state as a JSON-friendly value.
//!
//! The image travels embedded as a PNG `data:` URI so a single file
//! restores the whole workspace. Import validates everything before
//! any state is touched; a malformed snapshot fails fast instead of
//! leaving the engine half-mutated.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::types::{EngineError, GridPoint, Mode, ResizePoint};

/// Current snapshot schema version.
///
/// The original session format carried no version marker; snapshots
/// written before this field existed deserialize as version 1.
pub const SESSION_VERSION: u32 = 1;

/// Serialized aspect-ratio target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRatio {
    /// Ratio width component.
    pub x: f64,
    /// Ratio height component.
    pub y: f64,
}

/// The complete serializable engine state.
///
/// Field names match the session file schema; the viewport fields
/// (`image_*`) are a cache and are recomputed after import, but they
/// are kept in the file so snapshots are self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// The original bitmap as a PNG `data:` URI.
    #[serde(rename = "imageURI")]
    pub image_uri: String,
    /// Interaction mode.
    pub mode: Mode,
    /// Crop rectangle left edge, source pixels.
    pub source_x: f64,
    /// Crop rectangle top edge, source pixels.
    pub source_y: f64,
    /// Crop rectangle width, source pixels.
    pub source_width: f64,
    /// Crop rectangle height, source pixels.
    pub source_height: f64,
    /// Cached viewport left edge, canvas pixels.
    pub image_x: f64,
    /// Cached viewport top edge, canvas pixels.
    pub image_y: f64,
    /// Cached drawn width, canvas pixels.
    pub image_width: f64,
    /// Cached drawn height, canvas pixels.
    pub image_height: f64,
    /// Grid points in insertion order.
    pub grid_points: Vec<GridPoint>,
    /// The two resize selection corners in stored order.
    pub resize_points: Vec<ResizePoint>,
    /// Whether the aspect-ratio lock is engaged.
    pub keep_aspect_ratio: bool,
    /// Aspect-ratio target.
    pub resize_aspect_ratio: AspectRatio,
    /// Grid color as a CSS `hsl(...)` string.
    pub grid_color: String,
    /// Lightness component of the grid color (0–100).
    pub grid_color_light: u8,
    /// Whether the grayscale filter is active.
    pub grayscale: bool,
    /// Virtual width used for distance labels.
    pub virtual_width: f64,
    /// Virtual height used for distance labels.
    pub virtual_height: f64,
}

const fn default_version() -> u32 {
    SESSION_VERSION
}

impl SessionState {
    /// Check every field that later code divides by or indexes with.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionField`] naming the first invalid
    /// field.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.version == 0 || self.version > SESSION_VERSION {
            return Err(EngineError::SessionField("version"));
        }
        if self.resize_points.len() != 2 {
            return Err(EngineError::SessionField("resize_points"));
        }
        if !(self.source_width.is_finite() && self.source_width > 0.0) {
            return Err(EngineError::SessionField("source_width"));
        }
        if !(self.source_height.is_finite() && self.source_height > 0.0) {
            return Err(EngineError::SessionField("source_height"));
        }
        if !(self.source_x.is_finite() && self.source_y.is_finite()) {
            return Err(EngineError::SessionField("source_x"));
        }
        if !(self.virtual_width.is_finite() && self.virtual_width > 0.0) {
            return Err(EngineError::SessionField("virtual_width"));
        }
        if !(self.virtual_height.is_finite() && self.virtual_height > 0.0) {
            return Err(EngineError::SessionField("virtual_height"));
        }
        if !(self.resize_aspect_ratio.x.is_finite() && self.resize_aspect_ratio.x > 0.0) {
            return Err(EngineError::SessionField("resize_aspect_ratio"));
        }
        if !(self.resize_aspect_ratio.y.is_finite() && self.resize_aspect_ratio.y > 0.0) {
            return Err(EngineError::SessionField("resize_aspect_ratio"));
        }
        if self.grid_color_light > 100 {
            return Err(EngineError::SessionField("grid_color_light"));
        }
        let all_coords_finite = self
            .grid_points
            .iter()
            .map(|p| (p.x, p.y))
            .chain(self.resize_points.iter().map(|p| (p.x, p.y)))
            .all(|(x, y)| x.is_finite() && y.is_finite());
        if !all_coords_finite {
            return Err(EngineError::SessionField("grid_points"));
        }
        Ok(())
    }
}

/// Encode a bitmap as a PNG `data:` URI.
///
/// # Errors
///
/// Returns [`EngineError::SessionImage`] if PNG encoding fails.
pub fn encode_image_uri(bitmap: &RgbaImage) -> Result<String, EngineError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| EngineError::SessionImage(e.to_string()))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(png_bytes)))
}

/// Decode a `data:` URI back into a bitmap.
///
/// # Errors
///
/// Returns [`EngineError::SessionImage`] when the URI has no base64
/// payload, the payload is not valid base64, or the decoded bytes are
/// not a decodable image.
pub fn decode_image_uri(uri: &str) -> Result<RgbaImage, EngineError> {
    let payload = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or_else(|| EngineError::SessionImage("not a base64 data URI".into()))?;

    let bytes = BASE64
        .decode(payload)
        .map_err(|e| EngineError::SessionImage(format!("invalid base64 payload: {e}")))?;

    let decoded = image::load_from_memory(&bytes)
        .map_err(|e| EngineError::SessionImage(format!("embedded image: {e}")))?;
    Ok(decoded.to_rgba8())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample_state() -> SessionState {
        SessionState {
            version: SESSION_VERSION,
            image_uri: String::new(),
            mode: Mode::Grid,
            source_x: 0.0,
            source_y: 0.0,
            source_width: 100.0,
            source_height: 100.0,
            image_x: 10.0,
            image_y: 10.0,
            image_width: 80.0,
            image_height: 80.0,
            grid_points: vec![GridPoint::new(50.0, 50.0)],
            resize_points: vec![
                ResizePoint { x: 0.0, y: 0.0 },
                ResizePoint { x: 100.0, y: 100.0 },
            ],
            keep_aspect_ratio: false,
            resize_aspect_ratio: AspectRatio { x: 1.0, y: 1.0 },
            grid_color: "hsl(0, 0%, 50%)".into(),
            grid_color_light: 50,
            grayscale: false,
            virtual_width: 100.0,
            virtual_height: 100.0,
        }
    }

    #[test]
    fn image_uri_round_trips() {
        let bitmap = RgbaImage::from_fn(3, 2, |x, y| {
            Rgba([u8::try_from(x).unwrap() * 40, u8::try_from(y).unwrap() * 90, 7, 255])
        });
        let uri = encode_image_uri(&bitmap).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let back = decode_image_uri(&uri).unwrap();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.as_raw(), bitmap.as_raw());
    }

    #[test]
    fn non_data_uri_is_rejected() {
        assert!(matches!(
            decode_image_uri("https://example.com/image.png"),
            Err(EngineError::SessionImage(_)),
        ));
    }

    #[test]
    fn corrupt_base64_is_rejected() {
        assert!(decode_image_uri("data:image/png;base64,!!not-base64!!").is_err());
    }

    #[test]
    fn valid_state_passes_validation() {
        assert!(sample_state().validate().is_ok());
    }

    #[test]
    fn wrong_resize_point_count_fails() {
        let mut state = sample_state();
        state.resize_points.pop();
        assert!(matches!(
            state.validate(),
            Err(EngineError::SessionField("resize_points")),
        ));
    }

    #[test]
    fn non_finite_coordinates_fail() {
        let mut state = sample_state();
        state.grid_points[0].x = f64::NAN;
        assert!(state.validate().is_err());
    }

    #[test]
    fn degenerate_source_rect_fails() {
        let mut state = sample_state();
        state.source_width = 0.0;
        assert!(matches!(
            state.validate(),
            Err(EngineError::SessionField("source_width")),
        ));
    }

    #[test]
    fn future_schema_version_fails() {
        let mut state = sample_state();
        state.version = SESSION_VERSION + 1;
        assert!(matches!(
            state.validate(),
            Err(EngineError::SessionField("version")),
        ));
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let mut json = serde_json::to_value(sample_state()).unwrap();
        json.as_object_mut().unwrap().remove("version");
        let state: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(state.version, SESSION_VERSION);
    }

    #[test]
    fn json_uses_schema_field_names() {
        let json = serde_json::to_value(sample_state()).unwrap();
        let object = json.as_object().unwrap();
        assert!(object.contains_key("imageURI"));
        assert!(object.contains_key("grid_points"));
        assert!(object.contains_key("keep_aspect_ratio"));
        assert_eq!(object["mode"], serde_json::json!(0));
    }
}
