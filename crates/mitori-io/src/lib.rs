//! mitori-io: Browser I/O and Dioxus component library.
//!
//! Handles file uploads, session file downloads, image fetching from
//! URLs, and Blob-URL encoding of rendered frames. All browser API
//! interaction for the mitori web application lives here; the engine
//! itself stays sans-IO.

pub mod components;
pub mod download;
pub mod fetch;
pub mod raster;

pub use components::FileUpload;
