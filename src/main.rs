#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    hexglobe::flow::run(hexglobe::GlobeOptions::default())
}

// The browser build starts from the library's `wasm_bindgen(start)` entry.
#[cfg(target_arch = "wasm32")]
fn main() {}
