//! Resource bytes over HTTP via the browser `fetch`

use futures::future::LocalBoxFuture;
use galaxy_core::{CoreError, Fetch, Result};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// Fetches paths relative to `base_url`
pub struct HttpFetch {
    base_url: String,
}

impl HttpFetch {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }
}

impl Fetch for HttpFetch {
    fn fetch<'a>(&'a self, path: &'a str) -> LocalBoxFuture<'a, Result<Vec<u8>>> {
        let url = self.url(path);
        Box::pin(async move { fetch_bytes(&url).await })
    }
}

fn js_err(url: &str, e: JsValue) -> CoreError {
    CoreError::Resource {
        name: url.to_string(),
        message: format!("{:?}", e),
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let win = web_sys::window().ok_or_else(|| CoreError::Resource {
        name: url.to_string(),
        message: "no window".to_string(),
    })?;
    let resp_val = JsFuture::from(win.fetch_with_str(url))
        .await
        .map_err(|e| js_err(url, e))?;
    let resp: web_sys::Response = resp_val.dyn_into().map_err(|e| js_err(url, e))?;

    if !resp.ok() {
        return Err(CoreError::Resource {
            name: url.to_string(),
            message: format!("HTTP {} {}", resp.status(), resp.status_text()),
        });
    }

    let buf_promise = resp.array_buffer().map_err(|e| js_err(url, e))?;
    let buf_val = JsFuture::from(buf_promise).await.map_err(|e| js_err(url, e))?;
    let u8 = js_sys::Uint8Array::new(&buf_val);
    let mut out = vec![0u8; u8.length() as usize];
    u8.copy_to(&mut out);
    Ok(out)
}
