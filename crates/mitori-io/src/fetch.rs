//! Image fetching over HTTP(S).
//!
//! Loads image bytes from a user-supplied URL with the browser's
//! `fetch` API. Completion ordering is the caller's concern: the app
//! pairs each fetch with an engine load token, so a stale response is
//! discarded instead of resurrecting a superseded image.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Errors that can occur while fetching image bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be constructed or sent.
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

impl From<JsValue> for FetchError {
    fn from(value: JsValue) -> Self {
        Self::Request(format!("{value:?}"))
    }
}

/// Fetch raw image bytes from a URL.
///
/// There is no timeout: a hung load simply never resolves, and the
/// workspace keeps its previous state (the engine's load token makes
/// a late completion harmless).
///
/// # Errors
///
/// Returns [`FetchError::Request`] when the browser rejects the
/// request, [`FetchError::Status`] on a non-2xx answer, and
/// [`FetchError::Body`] when the body cannot be read.
pub async fn fetch_image_bytes(url: &str) -> Result<Vec<u8>, FetchError> {
    let window = web_sys::window().ok_or_else(|| FetchError::Request("no global window".into()))?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts)?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()
        .map_err(|_| FetchError::Request("fetch did not return a Response".into()))?;

    if !response.ok() {
        return Err(FetchError::Status(response.status()));
    }

    let buffer = JsFuture::from(
        response
            .array_buffer()
            .map_err(|e| FetchError::Body(format!("{e:?}")))?,
    )
    .await
    .map_err(|e| FetchError::Body(format!("{e:?}")))?;

    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}
