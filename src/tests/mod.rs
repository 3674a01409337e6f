#[cfg(not(target_arch = "wasm32"))]
mod render_property_tests;
