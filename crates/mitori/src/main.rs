//! mitori web application shell.
//!
//! Thin UI over the workspace engine: it forwards canvas sizes,
//! pointer positions, and form values into `mitori-engine`, and shows
//! whatever the engine reports back (rendered frames, handle
//! positions, derived values). All geometry and state transitions
//! happen inside the engine.

use dioxus::prelude::*;
use mitori_engine::{Mode, Workspace};
use mitori_io::{FileUpload, download, fetch, raster};
use web_time::Instant;

/// Canvas size used until the first layout observation arrives.
const DEFAULT_CANVAS: (u32, u32) = (1024, 640);

/// Pointer-to-handle hit radius in canvas pixels.
const HANDLE_RADIUS: f64 = 8.0;

/// Sustained secondary-press duration that deletes a grid point.
const LONG_PRESS_MS: u128 = 750;

fn main() {
    dioxus::launch(app);
}

/// What the pointer is currently dragging.
#[derive(Clone, Copy, PartialEq)]
enum DragTarget {
    /// A grid point handle, by index.
    GridPoint(usize),
    /// A resize corner handle, by index (0 or 1).
    ResizeCorner(usize),
    /// The whole selection rectangle; the payload is the pointer
    /// offset from the rectangle's top-left corner.
    Selection(f64, f64),
}

/// A pending secondary press on a grid point, for the
/// short-cycle/long-press distinction.
#[derive(Clone, Copy)]
struct SecondaryPress {
    index: usize,
    started: Instant,
}

/// Index of the handle nearest to `(x, y)` within the hit radius.
fn nearest_handle(handles: &[(f64, f64)], x: f64, y: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, (hx, hy)) in handles.iter().enumerate() {
        let distance_sq = (hx - x).powi(2) + (hy - y).powi(2);
        if distance_sq <= HANDLE_RADIUS * HANDLE_RADIUS
            && best.is_none_or(|(_, d)| distance_sq < d)
        {
            best = Some((index, distance_sq));
        }
    }
    best.map(|(index, _)| index)
}

/// Root application component.
///
/// Owns the single [`Workspace`] instance and wires the canvas area,
/// mode switcher, and control widgets to the engine's operations.
#[allow(clippy::too_many_lines)]
fn app() -> Element {
    let mut workspace = use_signal(|| {
        let mut ws = Workspace::new();
        ws.resize_canvas(DEFAULT_CANVAS.0, DEFAULT_CANVAS.1);
        ws
    });
    let mut frame_url = use_signal(|| Option::<String>::None);
    let mut error = use_signal(|| Option::<String>::None);

    let mut drag = use_signal(|| Option::<DragTarget>::None);
    let mut secondary_press = use_signal(|| Option::<SecondaryPress>::None);

    let mut grid_cells = use_signal(|| (String::from("4"), String::from("4")));
    let mut virtual_fields = use_signal(|| (String::from("100"), String::from("100")));
    let mut ratio_fields = use_signal(|| (String::from("1"), String::from("1")));
    let mut url_field = use_signal(String::new);

    // Re-render the engine state and swap the displayed frame.
    let mut redraw = move || {
        let rendered = workspace.read().render();
        match rendered {
            Ok(frame) => match raster::frame_to_blob_url(&frame) {
                Ok(url) => {
                    if let Some(old) = frame_url.replace(Some(url)) {
                        raster::revoke_blob_url(&old);
                    }
                }
                Err(e) => error.set(Some(e.to_string())),
            },
            Err(e) => error.set(Some(e.to_string())),
        }
    };

    let mut set_mode = move |mode: Mode| {
        workspace.write().set_mode(mode);
        redraw();
    };

    let on_image_upload = move |(bytes, _name): (Vec<u8>, String)| {
        let outcome = workspace.write().load_image_bytes(&bytes);
        match outcome {
            Ok(()) => error.set(None),
            Err(e) => error.set(Some(e.to_string())),
        }
        redraw();
    };

    let on_session_upload = move |(bytes, _name): (Vec<u8>, String)| {
        let outcome = serde_json::from_slice(&bytes)
            .map_err(|e| format!("session file: {e}"))
            .and_then(|state| {
                workspace
                    .write()
                    .import_session(&state)
                    .map_err(|e| e.to_string())
            });
        match outcome {
            Ok(()) => error.set(None),
            Err(message) => error.set(Some(message)),
        }
        redraw();
    };

    let load_from_url = move |_| {
        let url = url_field();
        if url.is_empty() {
            return;
        }
        // Pair the fetch with a load token: if another load starts
        // while this request is in flight, its completion is stale and
        // the engine rejects it.
        let token = workspace.write().begin_load();
        spawn(async move {
            match fetch::fetch_image_bytes(&url).await {
                Ok(bytes) => {
                    let outcome = workspace.write().complete_load(token, &bytes);
                    match outcome {
                        Ok(()) | Err(mitori_engine::EngineError::StaleLoad) => {}
                        Err(e) => error.set(Some(e.to_string())),
                    }
                }
                Err(e) => error.set(Some(e.to_string())),
            }
            redraw();
        });
    };

    let save_session = move |_| {
        let snapshot = workspace.read().export_session();
        let outcome = snapshot
            .map_err(|e| e.to_string())
            .and_then(|state| serde_json::to_string(&state).map_err(|e| e.to_string()))
            .and_then(|json| {
                download::save_session(&json, "mitori-session.json").map_err(|e| e.to_string())
            });
        if let Err(message) = outcome {
            error.set(Some(message));
        }
    };

    let on_mouse_down = move |evt: MouseEvent| {
        let point = evt.element_coordinates();
        let (x, y) = (point.x, point.y);
        let mode = workspace.read().mode();

        if evt.trigger_button() == Some(dioxus::html::input_data::MouseButton::Secondary) {
            if mode == Mode::Grid {
                let handles = workspace.read().grid_handles();
                if let Some(index) = nearest_handle(&handles, x, y) {
                    secondary_press.set(Some(SecondaryPress {
                        index,
                        started: Instant::now(),
                    }));
                }
            }
            return;
        }

        match mode {
            Mode::Grid => {
                let handles = workspace.read().grid_handles();
                if let Some(index) = nearest_handle(&handles, x, y) {
                    drag.set(Some(DragTarget::GridPoint(index)));
                }
            }
            Mode::Resize => {
                let handles = workspace.read().resize_handles();
                if let Some(index) = nearest_handle(&handles, x, y) {
                    drag.set(Some(DragTarget::ResizeCorner(index)));
                } else {
                    let (left, top, width, height) = workspace.read().selection_rect_local();
                    if x >= left && x <= left + width && y >= top && y <= top + height {
                        drag.set(Some(DragTarget::Selection(x - left, y - top)));
                    }
                }
            }
            Mode::Const | Mode::Image => {}
        }
    };

    let on_mouse_move = move |evt: MouseEvent| {
        let Some(target) = drag() else { return };
        let point = evt.element_coordinates();
        let moved = match target {
            DragTarget::GridPoint(index) => {
                workspace.write().move_grid_point(index, point.x, point.y)
            }
            DragTarget::ResizeCorner(index) => {
                workspace.write().move_resize_point(index, point.x, point.y)
            }
            DragTarget::Selection(dx, dy) => workspace
                .write()
                .move_selection(point.x - dx, point.y - dy),
        };
        if moved {
            redraw();
        }
    };

    let on_mouse_up = move |evt: MouseEvent| {
        if let Some(press) = secondary_press.take() {
            // Sustained press deletes the point; a short press cycles
            // its line flags.
            let changed = if press.started.elapsed().as_millis() >= LONG_PRESS_MS {
                workspace.write().remove_grid_point(press.index)
            } else {
                workspace.write().cycle_grid_point(press.index)
            };
            if changed {
                redraw();
            }
            return;
        }

        if drag.take().is_some() {
            return;
        }
        if evt.trigger_button() != Some(dioxus::html::input_data::MouseButton::Primary) {
            return;
        }

        // A plain click in GRID mode places a new point; the engine
        // ignores the call in any other mode.
        let point = evt.element_coordinates();
        if workspace.write().add_grid_point(point.x, point.y) {
            redraw();
        }
    };

    let apply_grid = move |_| {
        let (n_text, m_text) = grid_cells();
        let outcome = match (n_text.trim().parse(), m_text.trim().parse()) {
            (Ok(n), Ok(m)) => workspace
                .write()
                .generate_grid(n, m)
                .map_err(|e| e.to_string()),
            _ => Err(format!("cell counts must be whole numbers: {n_text}x{m_text}")),
        };
        match outcome {
            Ok(()) => error.set(None),
            Err(message) => error.set(Some(message)),
        }
        redraw();
    };

    let apply_virtual = move |_| {
        let (w_text, h_text) = virtual_fields();
        let outcome = match (w_text.trim().parse(), h_text.trim().parse()) {
            (Ok(w), Ok(h)) => workspace
                .write()
                .set_virtual_size(w, h)
                .map_err(|e| e.to_string()),
            _ => Err(format!("virtual size must be numeric: {w_text}x{h_text}")),
        };
        match outcome {
            Ok(()) => error.set(None),
            Err(message) => error.set(Some(message)),
        }
        redraw();
    };

    let apply_ratio = move |_| {
        let (w_text, h_text) = ratio_fields();
        let outcome = match (w_text.trim().parse(), h_text.trim().parse()) {
            (Ok(w), Ok(h)) => workspace
                .write()
                .set_aspect_ratio(w, h)
                .map_err(|e| e.to_string()),
            _ => Err(format!("aspect ratio must be numeric: {w_text}:{h_text}")),
        };
        match outcome {
            Ok(()) => error.set(None),
            Err(message) => error.set(Some(message)),
        }
        redraw();
    };

    let crop = move |_| {
        let outcome = workspace.write().crop_to_selection();
        if let Err(e) = outcome {
            error.set(Some(e.to_string()));
        }
        redraw();
    };

    let restore_crop = move |_| {
        let outcome = workspace.write().reset_crop();
        if let Err(e) = outcome {
            error.set(Some(e.to_string()));
        }
        redraw();
    };

    let mode = workspace.read().mode();
    // Handle positions come from the engine; offset them so the 8px
    // dots are centered on the reported canvas coordinates.
    let grid_handles: Vec<(usize, f64, f64)> = if mode == Mode::Grid {
        workspace
            .read()
            .grid_handles()
            .iter()
            .enumerate()
            .map(|(index, (x, y))| (index, x - 4.0, y - 4.0))
            .collect()
    } else {
        Vec::new()
    };
    let resize_handles: Vec<(usize, f64, f64)> = if mode == Mode::Resize {
        workspace
            .read()
            .resize_handles()
            .iter()
            .enumerate()
            .map(|(index, (x, y))| (index, x - 4.0, y - 4.0))
            .collect()
    } else {
        Vec::new()
    };
    let handle_color = workspace.read().grid_color_css();
    let scale_percent = (workspace.read().scale() * 100.0).round();

    rsx! {
        div { style: "display: flex; gap: 16px; font-family: sans-serif;",

            // --- Workspace canvas area ---
            div {
                style: "position: relative; flex-grow: 1; background: #222;",
                onresize: move |evt| {
                    if let Ok(size) = evt.get_border_box_size() {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        workspace
                            .write()
                            .resize_canvas(size.width as u32, size.height as u32);
                        redraw();
                    }
                },
                onmousedown: on_mouse_down,
                onmousemove: on_mouse_move,
                onmouseup: on_mouse_up,
                oncontextmenu: move |evt| evt.prevent_default(),

                if let Some(url) = frame_url() {
                    img {
                        src: "{url}",
                        draggable: false,
                        style: "display: block; pointer-events: none;",
                    }
                }

                // Interactive handles, placed from engine-reported positions.
                for (index, left, top) in grid_handles {
                    div {
                        key: "grid-{index}",
                        style: "position: absolute; width: 8px; height: 8px; border-radius: 50%; \
                                background: {handle_color}; left: {left}px; top: {top}px;",
                    }
                }
                for (index, left, top) in resize_handles {
                    div {
                        key: "resize-{index}",
                        style: "position: absolute; width: 8px; height: 8px; \
                                background: {handle_color}; left: {left}px; top: {top}px;",
                    }
                }
            }

            // --- Controls ---
            div { style: "width: 280px; display: flex; flex-direction: column; gap: 12px;",

                div {
                    for (label, value) in [
                        ("Grid", Mode::Grid),
                        ("Resize", Mode::Resize),
                        ("View", Mode::Const),
                        ("Image", Mode::Image),
                    ] {
                        button {
                            style: if mode == value { "font-weight: bold;" } else { "" },
                            onclick: move |_| set_mode(value),
                            "{label}"
                        }
                    }
                }

                FileUpload {
                    label: "an image",
                    extensions: vec!["png", "jpg", "jpeg", "bmp", "webp"],
                    on_upload: on_image_upload,
                }

                div {
                    input {
                        placeholder: "https://...",
                        value: "{url_field}",
                        oninput: move |evt| url_field.set(evt.value()),
                    }
                    button { onclick: load_from_url, "Load URL" }
                }

                div {
                    "Cells: "
                    input {
                        size: 4,
                        value: "{grid_cells().0}",
                        oninput: move |evt| grid_cells.with_mut(|c| c.0 = evt.value()),
                    }
                    "x"
                    input {
                        size: 4,
                        value: "{grid_cells().1}",
                        oninput: move |evt| grid_cells.with_mut(|c| c.1 = evt.value()),
                    }
                    button { onclick: apply_grid, "Create grid" }
                }

                div {
                    "Virtual size: "
                    input {
                        size: 4,
                        value: "{virtual_fields().0}",
                        oninput: move |evt| virtual_fields.with_mut(|v| v.0 = evt.value()),
                    }
                    "x"
                    input {
                        size: 4,
                        value: "{virtual_fields().1}",
                        oninput: move |evt| virtual_fields.with_mut(|v| v.1 = evt.value()),
                    }
                    button { onclick: apply_virtual, "Refresh" }
                }

                div {
                    "Aspect ratio: "
                    input {
                        size: 4,
                        value: "{ratio_fields().0}",
                        oninput: move |evt| ratio_fields.with_mut(|r| r.0 = evt.value()),
                    }
                    ":"
                    input {
                        size: 4,
                        value: "{ratio_fields().1}",
                        oninput: move |evt| ratio_fields.with_mut(|r| r.1 = evt.value()),
                    }
                    button { onclick: apply_ratio, "Apply" }
                    label {
                        input {
                            r#type: "checkbox",
                            checked: workspace.read().keep_aspect_ratio(),
                            onchange: move |evt| {
                                workspace.write().set_keep_aspect_ratio(evt.checked());
                            },
                        }
                        "Keep ratio"
                    }
                    button { onclick: crop, "Crop" }
                    button { onclick: restore_crop, "Restore" }
                }

                div {
                    "Zoom: {scale_percent}%"
                    input {
                        r#type: "range",
                        min: 50,
                        max: 250,
                        value: "{scale_percent}",
                        oninput: move |evt| {
                            if let Ok(percent) = evt.value().parse::<f64>() {
                                let outcome = workspace.write().set_scale(percent / 100.0);
                                if outcome.is_ok() {
                                    redraw();
                                }
                            }
                        },
                    }
                }

                div {
                    "Line color"
                    input {
                        r#type: "range",
                        min: 0,
                        max: 100,
                        value: "{workspace.read().grid_lightness()}",
                        oninput: move |evt| {
                            if let Ok(lightness) = evt.value().parse::<u8>() {
                                workspace.write().set_grid_lightness(lightness);
                                redraw();
                            }
                        },
                    }
                    label {
                        input {
                            r#type: "checkbox",
                            checked: workspace.read().grayscale(),
                            onchange: move |evt| {
                                workspace.write().set_grayscale(evt.checked());
                                redraw();
                            },
                        }
                        "Black and white"
                    }
                }

                button { onclick: save_session, "Save session" }
                FileUpload {
                    label: "a session file",
                    extensions: vec!["json"],
                    on_upload: on_session_upload,
                }

                if let Some(message) = error() {
                    p { style: "color: #d47a7a;", "{message}" }
                }
            }
        }
    }
}
