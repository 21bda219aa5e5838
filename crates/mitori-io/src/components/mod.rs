//! Reusable Dioxus components for the mitori web application.

mod upload;

pub use upload::{FileUpload, FileUploadProps};
