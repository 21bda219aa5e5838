//! Image source: the immutable original bitmap plus the current crop.
//!
//! The bitmap is never modified after load. Cropping only moves the
//! crop rectangle, so repeated crops compose and `reset_crop` can
//! always restore the full frame.

use image::RgbaImage;

use crate::types::{CropRect, EngineError};

/// The loaded bitmap and the sub-region currently treated as "the image".
#[derive(Debug, Clone)]
pub struct ImageSource {
    bitmap: RgbaImage,
    crop: CropRect,
}

impl ImageSource {
    /// Wrap a decoded bitmap with a full-frame crop.
    #[must_use]
    pub fn new(bitmap: RgbaImage) -> Self {
        let crop = CropRect::full(bitmap.width(), bitmap.height());
        Self { bitmap, crop }
    }

    /// Decode raw image bytes (PNG, JPEG, BMP, WebP) into a source.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::EmptyImage`] if `bytes` is empty and
    /// [`EngineError::ImageDecode`] if the data cannot be decoded.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::EmptyImage);
        }
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::new(decoded.to_rgba8()))
    }

    /// The untouched original bitmap.
    #[must_use]
    pub const fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }

    /// Width of the original bitmap in pixels.
    #[must_use]
    pub fn natural_width(&self) -> u32 {
        self.bitmap.width()
    }

    /// Height of the original bitmap in pixels.
    #[must_use]
    pub fn natural_height(&self) -> u32 {
        self.bitmap.height()
    }

    /// The current crop rectangle in source pixels.
    #[must_use]
    pub const fn crop(&self) -> CropRect {
        self.crop
    }

    /// Replace the crop rectangle, clamping it to the bitmap bounds.
    ///
    /// Used by session import, where the rectangle comes from
    /// untrusted data.
    pub fn set_crop(&mut self, crop: CropRect) {
        self.crop = crop.clamped_to(self.bitmap.width(), self.bitmap.height());
    }

    /// Commit a logical selection as the new crop.
    ///
    /// The selection corners are percentages of the *current* crop, so
    /// repeated crops compose: each crop is relative to the region that
    /// was visible when it was made.
    pub fn crop_to(&mut self, top_left: (f64, f64), bottom_right: (f64, f64)) {
        let prev = self.crop;
        let next = CropRect {
            x: prev.width * (top_left.0 / 100.0) + prev.x,
            y: prev.height * (top_left.1 / 100.0) + prev.y,
            width: prev.width * ((bottom_right.0 - top_left.0) / 100.0),
            height: prev.height * ((bottom_right.1 - top_left.1) / 100.0),
        };
        self.set_crop(next);
    }

    /// Restore the crop to the full natural image bounds.
    pub fn reset_crop(&mut self) {
        self.crop = CropRect::full(self.bitmap.width(), self.bitmap.height());
    }
}
