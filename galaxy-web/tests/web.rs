#![cfg(target_arch = "wasm32")]

use galaxy_core::resources::{self, Source};
use galaxy_core::{galaxy, CoreError, GalaxyConfig};
use galaxy_web::HttpFetch;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn galaxy_generates_with_browser_entropy() {
    let config = GalaxyConfig {
        count: 1000,
        ..GalaxyConfig::default()
    };
    let buffer = galaxy::generate(&config, &mut StdRng::from_entropy()).unwrap();
    assert_eq!(buffer.len(), 1000);
    assert!(buffer.positions.iter().all(|v| v.is_finite()));
}

#[wasm_bindgen_test(async)]
async fn missing_resource_is_reported() {
    let fetch = HttpFetch::new("");
    let sources = [Source::model("model", "does-not-exist.stl")];
    let result = resources::load(&sources, &fetch, |_| {}).await;
    assert!(matches!(result, Err(CoreError::Resource { .. })));
}
