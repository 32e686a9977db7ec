//! hexglobe
//!
//! A rotating, lit globe whose land masses are drawn as a lattice of hexagonal
//! dots, with animated dashed arcs between locations, glowing points,
//! screen-space marker indicators and an atmosphere halo. Rendering runs
//! natively and in the browser (WebGL2) through wgpu and winit.
//!
//! High-level modules
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `config`: the startup configuration bundle
//! - `context`: window, GPU device, surface and size-dependent targets
//! - `data_structures`: datasets, globe description, meshes and textures
//! - `decorator`: turns datasets into a decorated globe
//! - `flow`: event loop and the self-scheduling frame driver
//! - `geo`, `hex`: coordinate conversion and the hexagonal land lattice
//! - `pipelines`: the GPU pipelines (globe, arcs, atmosphere, bloom, overlay)
//! - `render`: the pass chain and the overlay renderer
//! - `scene`: lights, background and the globe object
//! - `view_sync`: keeps the globe's point of view in step with the camera

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod decorator;
pub mod flow;
pub mod geo;
pub mod hex;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod view_sync;

pub use config::GlobeOptions;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Browser entry point: starts the stock globe inside the page container.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    flow::run(GlobeOptions::default()).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
