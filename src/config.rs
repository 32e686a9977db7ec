//! Startup configuration bundle.

use crate::{
    camera::{CameraConfig, ControlsConfig},
    data_structures::dataset::DatasetPaths,
    decorator::GlobeStyle,
    pipelines::bloom::BloomConfig,
    scene::SceneConfig,
};

/// Selector of the page element the canvas is appended to.
pub const CONTAINER_SELECTOR: &str = "[three-js=\"globe_wrapper\"]";

/// Everything fixed at startup. The `Default` is the stock globe.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeOptions {
    pub style: GlobeStyle,
    pub scene: SceneConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub bloom: BloomConfig,
    pub datasets: DatasetPaths,
    pub container_selector: String,
    pub title: String,
}

impl Default for GlobeOptions {
    fn default() -> Self {
        Self {
            style: GlobeStyle::default(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            bloom: BloomConfig::default(),
            datasets: DatasetPaths::default(),
            container_selector: CONTAINER_SELECTOR.to_string(),
            title: "hexglobe".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_globe_mounts_into_the_page_wrapper() {
        let options = GlobeOptions::default();
        assert_eq!(options.container_selector, r#"[three-js="globe_wrapper"]"#);
    }
}
