//! mitori-engine: the reference-grid workspace engine (sans-IO).
//!
//! Owns the image, the transform between logical (percentage) space
//! and canvas pixels, the grid and resize point models, redraw, and
//! session serialization. This crate has **no I/O dependencies** -- it
//! operates on in-memory byte slices and pixel buffers and returns
//! structured data. All browser/filesystem interaction lives in
//! `mitori-io`.
//!
//! The entry point is [`Workspace`]: construct one, give it a canvas
//! size and an image, and drive it with the operations the hosting UI
//! forwards (pointer positions in canvas pixels, mode switches, form
//! values). Rendering produces a `tiny-skia` pixmap the host can blit
//! or encode.

pub mod filter;
pub mod grid;
pub mod labels;
pub mod render;
pub mod selection;
pub mod session;
pub mod source;
pub mod types;
pub mod viewport;
pub mod workspace;

pub use labels::DistanceLabel;
pub use selection::{ResizeSelection, SelectionRect};
pub use session::{SESSION_VERSION, SessionState};
pub use source::ImageSource;
pub use types::{CropRect, EngineError, GridPoint, Mode, ResizePoint, RgbaImage};
pub use viewport::Viewport;
pub use workspace::{LoadToken, Workspace};
