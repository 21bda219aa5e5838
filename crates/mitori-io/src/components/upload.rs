//! File upload component with drag-and-drop and file picker.

use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

/// Check whether a filename has one of the allowed extensions.
fn has_allowed_extension(name: &str, allowed: &[&str]) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
}

/// Props for the [`FileUpload`] component.
#[derive(Props, Clone, PartialEq)]
pub struct FileUploadProps {
    /// Short description shown inside the drop zone ("an image",
    /// "a session file").
    pub label: String,
    /// Allowed file extensions, lowercase, without dots.
    pub extensions: Vec<&'static str>,
    /// Called with the raw file bytes and filename after a successful
    /// upload.
    pub on_upload: EventHandler<(Vec<u8>, String)>,
}

/// A drag-and-drop zone with a file picker button.
///
/// When a file with an allowed extension is selected (via the picker
/// or drag-and-drop), reads the bytes and fires `on_upload` with
/// `(bytes, filename)`. The file is only read into memory; loading it
/// into the engine is the caller's decision.
#[component]
pub fn FileUpload(props: FileUploadProps) -> Element {
    let mut dragging = use_signal(|| false);
    let mut filename = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let extensions = props.extensions.clone();
    let on_upload = props.on_upload;

    // Validate, read, and forward the first file from a list.
    //
    // Shared by the file-picker and drag-and-drop paths so the
    // validation/read/callback logic lives in one place.
    let process_files = move |files: Vec<FileData>| {
        let extensions = extensions.clone();
        async move {
            if let Some(file) = files.first() {
                let name = file.name();
                if !has_allowed_extension(&name, &extensions) {
                    error.set(Some(format!("Unsupported file type: {name}")));
                    return;
                }
                match file.read_bytes().await {
                    Ok(bytes) => {
                        filename.set(Some(name.clone()));
                        error.set(None);
                        on_upload.call((bytes.to_vec(), name));
                    }
                    Err(e) => {
                        error.set(Some(format!("Failed to read file: {e}")));
                    }
                }
            }
        }
    };

    let mut handle_files = process_files.clone();
    let mut handle_drop = process_files;

    let accept = props
        .extensions
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");

    let border_style = if dragging() {
        "border-color: #7a9bd4;"
    } else {
        "border-color: #555;"
    };

    rsx! {
        div {
            class: "upload-zone",
            style: "border: 2px dashed; border-radius: 8px; padding: 12px; text-align: center; {border_style}",
            ondragover: move |evt| {
                evt.prevent_default();
                dragging.set(true);
            },
            ondragleave: move |_| dragging.set(false),
            ondrop: move |evt: DragEvent| {
                evt.prevent_default();
                dragging.set(false);
                let files = evt.files();
                let mut handle_drop = handle_drop.clone();
                async move { handle_drop(files).await }
            },

            p { "Drop {props.label} here, or" }
            input {
                r#type: "file",
                accept: "{accept}",
                onchange: move |evt: FormEvent| {
                    let files = evt.files();
                    let mut handle_files = handle_files.clone();
                    async move { handle_files(files).await }
                },
            }

            if let Some(name) = filename() {
                p { style: "opacity: 0.7;", "Loaded: {name}" }
            }
            if let Some(message) = error() {
                p { style: "color: #d47a7a;", "{message}" }
            }
        }
    }
}
