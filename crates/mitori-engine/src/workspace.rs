//! The workspace engine façade.
//!
//! [`Workspace`] owns the image source, viewport, grid and resize
//! point sets, distance labels, and all the scalar flags, and exposes
//! the operations the hosting UI calls. It is an explicitly
//! constructed object with a single owner; "exactly one active
//! workspace" is the owner's decision, not a global's.
//!
//! Every mutating method documents its side effects. Methods that
//! change geometry recompute the cached viewport and distance labels
//! immediately, so a caller can re-render right after any call.

use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::grid::GridPointSet;
use crate::labels::{self, DistanceLabel};
use crate::render::{self, Frame};
use crate::selection::{ResizeSelection, SelectionRect};
use crate::session::{self, AspectRatio, SessionState};
use crate::source::ImageSource;
use crate::types::{CropRect, EngineError, GridPoint, Mode};
use crate::viewport::{Viewport, round_digits};

/// Ticket for an in-flight image load.
///
/// Completing a load with a stale token (one superseded by a newer
/// `begin_load`) is rejected without touching state, so a slow decode
/// can never resurrect an abandoned image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// The workspace engine.
#[derive(Debug, Clone)]
pub struct Workspace {
    source: Option<ImageSource>,
    canvas_width: u32,
    canvas_height: u32,
    scale: f64,
    mode: Mode,
    viewport: Viewport,
    grid: GridPointSet,
    selection: ResizeSelection,
    grayscale: bool,
    grid_lightness: u8,
    virtual_width: f64,
    virtual_height: f64,
    labels_x: Vec<DistanceLabel>,
    labels_y: Vec<DistanceLabel>,
    load_epoch: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Create an engine with no image, a zero-size canvas, and default
    /// flags. The host must call [`Self::resize_canvas`] before the
    /// first render.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            canvas_width: 0,
            canvas_height: 0,
            scale: 1.0,
            mode: Mode::default(),
            viewport: Viewport::default(),
            grid: GridPointSet::new(),
            selection: ResizeSelection::new(),
            grayscale: false,
            grid_lightness: 50,
            virtual_width: 100.0,
            virtual_height: 100.0,
            labels_x: Vec::new(),
            labels_y: Vec::new(),
            load_epoch: 0,
        }
    }

    // ---- canvas and viewport ------------------------------------------------

    /// Update the canvas pixel size. Recomputes the viewport and labels.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.canvas_width = width;
        self.canvas_height = height;
        self.update_viewport();
    }

    /// The cached viewport.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Canvas size in pixels as `(width, height)`.
    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }

    /// Set the zoom scale. Recomputes the viewport and labels.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidScale`] for non-finite or
    /// non-positive values. The host UI typically bounds the scale to
    /// [0.5, 2.5]; the engine accepts any positive value.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), EngineError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EngineError::InvalidScale(scale));
        }
        self.scale = scale;
        self.update_viewport();
        Ok(())
    }

    /// Current zoom scale.
    #[must_use]
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    fn update_viewport(&mut self) {
        let (crop_w, crop_h) = self
            .source
            .as_ref()
            .map_or((0.0, 0.0), |s| (s.crop().width, s.crop().height));
        self.viewport = Viewport::compute(
            f64::from(self.canvas_width),
            f64::from(self.canvas_height),
            crop_w,
            crop_h,
            self.scale,
        );
        self.update_labels();
    }

    fn update_labels(&mut self) {
        if self.source.is_none() {
            self.labels_x.clear();
            self.labels_y.clear();
            return;
        }
        (self.labels_x, self.labels_y) = labels::compute(
            self.grid.points(),
            &self.viewport,
            self.virtual_width,
            self.virtual_height,
        );
    }

    // ---- mode and flags -----------------------------------------------------

    /// Switch the interaction mode. Which handles the host shows and
    /// which overlay renders both follow from this.
    pub const fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Current interaction mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Toggle the grayscale post-filter.
    pub const fn set_grayscale(&mut self, grayscale: bool) {
        self.grayscale = grayscale;
    }

    /// Whether the grayscale filter is active.
    #[must_use]
    pub const fn grayscale(&self) -> bool {
        self.grayscale
    }

    /// Set the lightness of the grid color (clamped to 0–100).
    pub fn set_grid_lightness(&mut self, lightness: u8) {
        self.grid_lightness = lightness.min(100);
    }

    /// Lightness of the grid color.
    #[must_use]
    pub const fn grid_lightness(&self) -> u8 {
        self.grid_lightness
    }

    /// The grid color as a CSS `hsl(...)` string, for the host's
    /// handle styling.
    #[must_use]
    pub fn grid_color_css(&self) -> String {
        format!("hsl(0, 0%, {}%)", self.grid_lightness)
    }

    /// Set the virtual dimensions used to scale distance labels.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidVirtualSize`] for non-finite or
    /// non-positive dimensions.
    pub fn set_virtual_size(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(EngineError::InvalidVirtualSize { width, height });
        }
        self.virtual_width = width;
        self.virtual_height = height;
        self.update_labels();
        Ok(())
    }

    /// Virtual dimensions as `(width, height)`.
    #[must_use]
    pub const fn virtual_size(&self) -> (f64, f64) {
        (self.virtual_width, self.virtual_height)
    }

    // ---- image lifecycle ----------------------------------------------------

    /// Begin an asynchronous image load, superseding any in-flight one.
    pub const fn begin_load(&mut self) -> LoadToken {
        self.load_epoch += 1;
        LoadToken(self.load_epoch)
    }

    /// Complete an asynchronous load with the fetched bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::StaleLoad`] (state untouched) when a
    /// newer load was begun since `token` was issued; otherwise decode
    /// errors from the image data.
    pub fn complete_load(&mut self, token: LoadToken, bytes: &[u8]) -> Result<(), EngineError> {
        if token.0 != self.load_epoch {
            return Err(EngineError::StaleLoad);
        }
        let source = ImageSource::from_bytes(bytes)?;
        self.install_source(source);
        Ok(())
    }

    /// Load an image from raw encoded bytes, synchronously.
    ///
    /// # Errors
    ///
    /// Returns decode errors from the image data.
    pub fn load_image_bytes(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let token = self.begin_load();
        self.complete_load(token, bytes)
    }

    /// Load an already-decoded bitmap, synchronously.
    pub fn load_image(&mut self, bitmap: RgbaImage) {
        self.load_epoch += 1;
        self.install_source(ImageSource::new(bitmap));
    }

    /// Replace the source and reset all image-dependent state.
    fn install_source(&mut self, source: ImageSource) {
        let (virtual_w, virtual_h) =
            reduced_aspect_ratio(source.natural_width(), source.natural_height());
        self.source = Some(source);

        self.selection = ResizeSelection::new();
        self.scale = 1.0;
        self.grayscale = false;
        self.grid_lightness = 50;
        self.virtual_width = f64::from(virtual_w);
        self.virtual_height = f64::from(virtual_h);
        self.grid.clear();
        self.update_viewport();
    }

    /// Natural (uncropped) image dimensions, if an image is loaded.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.source
            .as_ref()
            .map(|s| (s.natural_width(), s.natural_height()))
    }

    /// The current crop rectangle, if an image is loaded.
    #[must_use]
    pub fn crop_rect(&self) -> Option<CropRect> {
        self.source.as_ref().map(ImageSource::crop)
    }

    // ---- grid interactions --------------------------------------------------

    /// Place a grid point at a canvas-pixel position.
    ///
    /// Only valid in GRID mode: other modes ignore the call (stray
    /// pointer events are not errors) and `false` is returned.
    pub fn add_grid_point(&mut self, local_x: f64, local_y: f64) -> bool {
        if self.mode != Mode::Grid || self.source.is_none() {
            return false;
        }
        let (x, y) = self.viewport.local_to_logical(local_x, local_y);
        self.grid.add(x, y);
        self.update_labels();
        true
    }

    /// Cycle a point's line flags (secondary click): both →
    /// vertical-only → horizontal-only → both. GRID mode only.
    pub fn cycle_grid_point(&mut self, index: usize) -> bool {
        if self.mode != Mode::Grid {
            return false;
        }
        let changed = self.grid.cycle_flags(index);
        if changed {
            self.update_labels();
        }
        changed
    }

    /// Remove a point (sustained secondary press). GRID mode only.
    pub fn remove_grid_point(&mut self, index: usize) -> bool {
        if self.mode != Mode::Grid {
            return false;
        }
        let removed = self.grid.remove(index);
        if removed {
            self.update_labels();
        }
        removed
    }

    /// Drag a point to a canvas-pixel position. GRID mode only.
    pub fn move_grid_point(&mut self, index: usize, local_x: f64, local_y: f64) -> bool {
        if self.mode != Mode::Grid {
            return false;
        }
        let (x, y) = self.viewport.local_to_logical(local_x, local_y);
        let moved = self.grid.move_to(index, x, y);
        if moved {
            self.update_labels();
        }
        moved
    }

    /// Replace the grid with an evenly spaced `n`×`m` cell grid.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidGridCells`] when either axis has
    /// zero cells.
    pub fn generate_grid(&mut self, n: u32, m: u32) -> Result<(), EngineError> {
        self.grid.generate(n, m)?;
        self.update_labels();
        Ok(())
    }

    /// Remove every grid point.
    pub fn clear_grid_points(&mut self) {
        self.grid.clear();
        self.update_labels();
    }

    /// Grid points in insertion order.
    #[must_use]
    pub fn grid_points(&self) -> &[GridPoint] {
        self.grid.points()
    }

    /// Canvas-pixel positions of the grid handles, in point order.
    #[must_use]
    pub fn grid_handles(&self) -> Vec<(f64, f64)> {
        self.grid
            .points()
            .iter()
            .map(|p| self.viewport.logical_to_local(p.x, p.y))
            .collect()
    }

    /// Distance labels as `(x_axis, y_axis)`.
    #[must_use]
    pub fn distance_labels(&self) -> (&[DistanceLabel], &[DistanceLabel]) {
        (&self.labels_x, &self.labels_y)
    }

    // ---- resize interactions ------------------------------------------------

    /// Whether corner drags preserve the target aspect ratio.
    #[must_use]
    pub const fn keep_aspect_ratio(&self) -> bool {
        self.selection.keep_aspect_ratio()
    }

    /// Engage or release the aspect-ratio lock.
    pub const fn set_keep_aspect_ratio(&mut self, keep: bool) {
        self.selection.set_keep_aspect_ratio(keep);
    }

    /// The aspect-ratio target as `(width, height)`.
    #[must_use]
    pub const fn aspect_ratio(&self) -> (f64, f64) {
        self.selection.aspect_ratio()
    }

    /// Re-center the selection as the largest `width:height` rectangle
    /// inscribed in the working image.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] without an image, or
    /// [`EngineError::InvalidAspectRatio`] for degenerate ratios.
    pub fn set_aspect_ratio(&mut self, width: f64, height: f64) -> Result<(), EngineError> {
        let crop = self.crop_rect().ok_or(EngineError::NoImage)?;
        self.selection
            .set_aspect_ratio(width, height, crop.width, crop.height)
    }

    /// Drag a selection corner to a canvas-pixel position. RESIZE mode
    /// only.
    pub fn move_resize_point(&mut self, index: usize, local_x: f64, local_y: f64) -> bool {
        if self.mode != Mode::Resize {
            return false;
        }
        let (x, y) = self.viewport.local_to_logical(local_x, local_y);
        self.selection.drag_corner(index, x, y)
    }

    /// Drag the whole selection so its top-left lands on a canvas-pixel
    /// position. RESIZE mode only.
    pub fn move_selection(&mut self, local_x: f64, local_y: f64) -> bool {
        if self.mode != Mode::Resize {
            return false;
        }
        let (x, y) = self.viewport.local_to_logical(local_x, local_y);
        self.selection.translate_to(x, y);
        true
    }

    /// Canvas-pixel positions of the two selection corner handles.
    #[must_use]
    pub fn resize_handles(&self) -> [(f64, f64); 2] {
        let [a, b] = self.selection.points();
        [
            self.viewport.logical_to_local(a.x, a.y),
            self.viewport.logical_to_local(b.x, b.y),
        ]
    }

    /// The normalized selection rectangle in canvas pixels as
    /// `(x, y, width, height)`, for the host's rectangle overlay.
    #[must_use]
    pub fn selection_rect_local(&self) -> (f64, f64, f64, f64) {
        let rect = self.selection.rect();
        let (left, top) = self
            .viewport
            .logical_to_local(rect.top_left.x, rect.top_left.y);
        let (right, bottom) = self
            .viewport
            .logical_to_local(rect.bottom_right.x, rect.bottom_right.y);
        (left, top, right - left, bottom - top)
    }

    /// Commit the selection as the new crop.
    ///
    /// The selection composes onto the current crop (repeated crops are
    /// relative to the visible region), grid points stay anchored to
    /// the image content, and the selection resets to full frame.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] without an image.
    pub fn crop_to_selection(&mut self) -> Result<(), EngineError> {
        let source = self.source.as_mut().ok_or(EngineError::NoImage)?;
        let rect = self.selection.rect();
        let previous = source.crop();
        source.crop_to(
            (rect.top_left.x, rect.top_left.y),
            (rect.bottom_right.x, rect.bottom_right.y),
        );
        let current = source.crop();

        self.remap_grid_points(previous, current);
        self.selection.reset();
        self.update_viewport();
        Ok(())
    }

    /// Restore the crop to the full natural image bounds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] without an image.
    pub fn reset_crop(&mut self) -> Result<(), EngineError> {
        let source = self.source.as_mut().ok_or(EngineError::NoImage)?;
        let previous = source.crop();
        source.reset_crop();
        let current = source.crop();

        self.remap_grid_points(previous, current);
        self.selection.reset();
        self.update_viewport();
        Ok(())
    }

    /// Re-express grid point coordinates after the crop moved from
    /// `previous` to `current`.
    ///
    /// A point's source-pixel position is the invariant: logical
    /// coordinates are percentages of the crop, so they are converted
    /// through source pixels into the new crop's space.
    fn remap_grid_points(&mut self, previous: CropRect, current: CropRect) {
        if current.width <= 0.0 || current.height <= 0.0 {
            return;
        }
        for index in 0..self.grid.len() {
            let point = self.grid.points()[index];
            let source_px_x = previous.x + point.x / 100.0 * previous.width;
            let source_px_y = previous.y + point.y / 100.0 * previous.height;
            let x = round_digits((source_px_x - current.x) / current.width * 100.0, 5);
            let y = round_digits((source_px_y - current.y) / current.height * 100.0, 5);
            self.grid.move_to(index, x, y);
        }
    }

    // ---- rendering ----------------------------------------------------------

    /// Render the current state into a pixmap.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCanvasSize`] when the canvas has
    /// no drawable area.
    pub fn render(&self) -> Result<Pixmap, EngineError> {
        render::render(&Frame {
            source: self.source.as_ref(),
            viewport: &self.viewport,
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            mode: self.mode,
            grayscale: self.grayscale,
            grid_lightness: self.grid_lightness,
            grid_points: self.grid.points(),
            selection: self.selection_rect(),
            labels_x: &self.labels_x,
            labels_y: &self.labels_y,
        })
    }

    /// The normalized selection rectangle in logical coordinates.
    #[must_use]
    pub fn selection_rect(&self) -> SelectionRect {
        self.selection.rect()
    }

    // ---- session codec ------------------------------------------------------

    /// Capture the full engine state as a serializable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoImage`] without an image, or
    /// [`EngineError::SessionImage`] if the bitmap cannot be encoded.
    pub fn export_session(&self) -> Result<SessionState, EngineError> {
        let source = self.source.as_ref().ok_or(EngineError::NoImage)?;
        let crop = source.crop();
        let (ratio_w, ratio_h) = self.selection.aspect_ratio();

        Ok(SessionState {
            version: session::SESSION_VERSION,
            image_uri: session::encode_image_uri(source.bitmap())?,
            mode: self.mode,
            source_x: crop.x,
            source_y: crop.y,
            source_width: crop.width,
            source_height: crop.height,
            image_x: self.viewport.offset_x,
            image_y: self.viewport.offset_y,
            image_width: self.viewport.draw_width,
            image_height: self.viewport.draw_height,
            grid_points: self.grid.points().to_vec(),
            resize_points: self.selection.points().to_vec(),
            keep_aspect_ratio: self.selection.keep_aspect_ratio(),
            resize_aspect_ratio: AspectRatio {
                x: ratio_w,
                y: ratio_h,
            },
            grid_color: self.grid_color_css(),
            grid_color_light: self.grid_lightness,
            grayscale: self.grayscale,
            virtual_width: self.virtual_width,
            virtual_height: self.virtual_height,
        })
    }

    /// Replace the engine state from a snapshot.
    ///
    /// Everything is validated and decoded before any state changes;
    /// a malformed snapshot leaves the workspace untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionField`] or
    /// [`EngineError::SessionImage`] describing the first problem
    /// found.
    pub fn import_session(&mut self, state: &SessionState) -> Result<(), EngineError> {
        state.validate()?;
        let bitmap = session::decode_image_uri(&state.image_uri)?;

        // All fallible work is done; swap the state in.
        self.load_epoch += 1;
        let mut source = ImageSource::new(bitmap);
        source.set_crop(CropRect {
            x: state.source_x,
            y: state.source_y,
            width: state.source_width,
            height: state.source_height,
        });
        self.source = Some(source);

        self.mode = state.mode;
        self.scale = 1.0;
        self.grayscale = state.grayscale;
        self.grid_lightness = state.grid_color_light;
        self.virtual_width = state.virtual_width;
        self.virtual_height = state.virtual_height;

        self.grid.clear();
        for point in &state.grid_points {
            self.grid.push(*point);
        }

        self.selection.restore(
            [state.resize_points[0], state.resize_points[1]],
            state.keep_aspect_ratio,
            (state.resize_aspect_ratio.x, state.resize_aspect_ratio.y),
        );

        self.update_viewport();
        Ok(())
    }
}

/// Reduce image dimensions to their smallest integer ratio, the
/// default virtual size for a freshly loaded image.
fn reduced_aspect_ratio(width: u32, height: u32) -> (u32, u32) {
    let divisor = gcd(width, height);
    if divisor == 0 {
        return (width.max(1), height.max(1));
    }
    (width / divisor, height / divisor)
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;

    fn loaded_workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.resize_canvas(1000, 1000);
        ws.load_image(RgbaImage::from_pixel(1000, 1000, Rgba([90, 120, 30, 255])));
        ws
    }

    #[test]
    fn load_resets_image_dependent_state() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Grid);
        assert!(ws.add_grid_point(500.0, 500.0));
        ws.set_grayscale(true);
        ws.set_scale(2.0).unwrap();

        ws.load_image(RgbaImage::from_pixel(1920, 1080, Rgba([0, 0, 0, 255])));
        assert!(ws.grid_points().is_empty());
        assert!(!ws.grayscale());
        assert!((ws.scale() - 1.0).abs() < 1e-9);
        // Virtual size defaults to the reduced natural aspect ratio.
        assert_eq!(ws.virtual_size(), (16.0, 9.0));
    }

    #[test]
    fn add_grid_point_is_mode_gated() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Image);
        assert!(!ws.add_grid_point(500.0, 500.0));
        assert!(ws.grid_points().is_empty());

        ws.set_mode(Mode::Grid);
        assert!(ws.add_grid_point(500.0, 500.0));
        assert_eq!(ws.grid_points().len(), 1);
        let point = ws.grid_points()[0];
        assert!((point.x - 50.0).abs() < 1e-4);
        assert!((point.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn grid_point_moves_update_labels() {
        let mut ws = loaded_workspace();
        ws.set_virtual_size(100.0, 100.0).unwrap();
        ws.set_mode(Mode::Grid);
        ws.add_grid_point(500.0, 500.0);

        let (x_labels, _) = ws.distance_labels();
        assert_eq!(x_labels.iter().map(|l| l.value).collect::<Vec<_>>(), vec![50, 50]);

        ws.move_grid_point(0, 250.0, 250.0);
        let (x_labels, y_labels) = ws.distance_labels();
        assert_eq!(x_labels.iter().map(|l| l.value).collect::<Vec<_>>(), vec![25, 75]);
        assert_eq!(y_labels.iter().map(|l| l.value).collect::<Vec<_>>(), vec![25, 75]);
    }

    #[test]
    fn crop_composes_and_keeps_grid_points_anchored() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Grid);
        ws.add_grid_point(500.0, 500.0);

        ws.set_mode(Mode::Resize);
        assert!(ws.move_resize_point(0, 250.0, 250.0));
        assert!(ws.move_resize_point(1, 750.0, 750.0));
        ws.crop_to_selection().unwrap();

        let crop = ws.crop_rect().unwrap();
        assert!((crop.x - 250.0).abs() < 1e-6);
        assert!((crop.width - 500.0).abs() < 1e-6);

        // The grid point sat at source pixel (500, 500); in the new
        // crop that is its center again.
        let point = ws.grid_points()[0];
        assert!((point.x - 50.0).abs() < 1e-4);
        assert!((point.y - 50.0).abs() < 1e-4);

        // Selection is back to full frame.
        let rect = ws.selection_rect();
        assert!((rect.top_left.x).abs() < 1e-9);
        assert!((rect.bottom_right.x - 100.0).abs() < 1e-9);
    }

    #[test]
    fn recrop_of_full_selection_is_idempotent() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Resize);
        ws.move_resize_point(0, 250.0, 250.0);
        ws.move_resize_point(1, 750.0, 750.0);
        ws.crop_to_selection().unwrap();
        let first = ws.crop_rect().unwrap();

        ws.crop_to_selection().unwrap();
        assert_eq!(ws.crop_rect().unwrap(), first);
    }

    #[test]
    fn reset_crop_restores_natural_bounds_and_points() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Grid);
        ws.add_grid_point(500.0, 500.0);

        ws.set_mode(Mode::Resize);
        ws.move_resize_point(0, 250.0, 250.0);
        ws.move_resize_point(1, 750.0, 750.0);
        ws.crop_to_selection().unwrap();
        ws.reset_crop().unwrap();

        assert_eq!(ws.crop_rect().unwrap(), CropRect::full(1000, 1000));
        let point = ws.grid_points()[0];
        assert!((point.x - 50.0).abs() < 1e-4);
        assert!((point.y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn stale_load_token_is_rejected() {
        let mut ws = loaded_workspace();
        let before = ws.dimensions();

        let stale = ws.begin_load();
        let _newer = ws.begin_load();

        let png = encode_png(4, 4);
        assert!(matches!(
            ws.complete_load(stale, &png),
            Err(EngineError::StaleLoad),
        ));
        assert_eq!(ws.dimensions(), before, "stale load must not touch state");
    }

    #[test]
    fn fresh_load_token_completes() {
        let mut ws = Workspace::new();
        ws.resize_canvas(100, 100);
        let token = ws.begin_load();
        ws.complete_load(token, &encode_png(4, 4)).unwrap();
        assert_eq!(ws.dimensions(), Some((4, 4)));
    }

    #[test]
    fn scale_validation_rejects_degenerate_values() {
        let mut ws = loaded_workspace();
        assert!(ws.set_scale(0.0).is_err());
        assert!(ws.set_scale(-1.0).is_err());
        assert!(ws.set_scale(f64::NAN).is_err());
        assert!(ws.set_scale(2.5).is_ok());
    }

    #[test]
    fn virtual_size_validation() {
        let mut ws = loaded_workspace();
        assert!(ws.set_virtual_size(0.0, 10.0).is_err());
        assert!(ws.set_virtual_size(10.0, f64::INFINITY).is_err());
        assert!(ws.set_virtual_size(21.0, 29.7).is_ok());
    }

    #[test]
    fn export_import_round_trips_state() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Grid);
        ws.generate_grid(4, 2).unwrap();
        ws.set_grayscale(true);
        ws.set_grid_lightness(80);
        ws.set_virtual_size(40.0, 50.0).unwrap();
        ws.set_keep_aspect_ratio(true);
        ws.set_aspect_ratio(16.0, 9.0).unwrap();

        let snapshot = ws.export_session().unwrap();

        let mut restored = Workspace::new();
        restored.resize_canvas(1000, 1000);
        restored.import_session(&snapshot).unwrap();

        assert_eq!(restored.grid_points(), ws.grid_points());
        assert_eq!(restored.mode(), Mode::Grid);
        assert!(restored.grayscale());
        assert_eq!(restored.grid_lightness(), 80);
        assert_eq!(restored.virtual_size(), (40.0, 50.0));
        assert!(restored.keep_aspect_ratio());
        assert_eq!(restored.selection_rect(), ws.selection_rect());
        assert_eq!(restored.dimensions(), ws.dimensions());
        assert_eq!(restored.crop_rect(), ws.crop_rect());
    }

    #[test]
    fn malformed_import_leaves_state_untouched() {
        let mut ws = loaded_workspace();
        ws.set_mode(Mode::Grid);
        ws.add_grid_point(500.0, 500.0);
        let points_before = ws.grid_points().to_vec();

        let mut snapshot = ws.export_session().unwrap();
        snapshot.resize_points.pop();
        assert!(ws.import_session(&snapshot).is_err());
        assert_eq!(ws.grid_points(), points_before.as_slice());
    }

    #[test]
    fn reduced_aspect_ratio_examples() {
        assert_eq!(reduced_aspect_ratio(1920, 1080), (16, 9));
        assert_eq!(reduced_aspect_ratio(1000, 1000), (1, 1));
        assert_eq!(reduced_aspect_ratio(640, 480), (4, 3));
        assert_eq!(reduced_aspect_ratio(17, 13), (17, 13));
    }

    #[test]
    fn selection_rect_local_matches_viewport() {
        let ws = loaded_workspace();
        let (x, y, w, h) = ws.selection_rect_local();
        let vp = ws.viewport();
        assert!((x - vp.offset_x).abs() < 1e-9);
        assert!((y - vp.offset_y).abs() < 1e-9);
        assert!((w - vp.draw_width).abs() < 1e-9);
        assert!((h - vp.draw_height).abs() < 1e-9);
    }

    fn encode_png(w: u32, h: u32) -> Vec<u8> {
        let bitmap = RgbaImage::from_pixel(w, h, Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(
            encoder,
            bitmap.as_raw(),
            bitmap.width(),
            bitmap.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
        buf
    }
}
