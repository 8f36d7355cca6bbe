/// Galaxy Web - WebGL2 front end compiled to WASM
///
/// The browser entry point lives in the `wasm` module and is only built for
/// `wasm32`. Input parsing and shader sources stay portable so they can be
/// tested on the host.

pub mod bindings;
pub mod shaders;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::{start, stop, HttpFetch};

/// Optional centre-piece model, relative to the page
pub const MODEL_PATH: &str = "models/model.stl";
