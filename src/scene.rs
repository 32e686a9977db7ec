//! Scene assembly: the globe plus lights and background.

use crate::data_structures::{colour::Colour, globe::GlobeObject};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub colour: Colour,
    pub intensity: f32,
}

/// A light shining from `position` towards the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub colour: Colour,
    pub intensity: f32,
    pub position: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Background {
    pub colour: Colour,
    /// Only scales textured backgrounds; a plain colour clears as is.
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub background: Background,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                colour: Colour::from_rgb_u32(0xffffff),
                intensity: 0.33,
            },
            directional: DirectionalLight {
                colour: Colour::from_rgb_u32(0xffffff),
                intensity: 0.1,
                position: [0.0, 1.0, 0.0],
            },
            background: Background {
                colour: Colour::from_rgb_u32(0xdddddd),
                intensity: 20.0,
            },
        }
    }
}

/// Everything the scene pass draws.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub globe: GlobeObject,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub background: Background,
}

impl Scene {
    pub fn assemble(globe: GlobeObject, config: &SceneConfig) -> Self {
        Self {
            globe,
            ambient: config.ambient,
            directional: config.directional,
            background: config.background,
        }
    }

    pub fn clear_colour(&self) -> wgpu::Color {
        self.background.colour.to_wgpu()
    }

    /// Light uniform data for the lit shaders.
    pub fn light_uniform(&self) -> LightUniform {
        let [x, y, z] = self.directional.position;
        let len = (x * x + y * y + z * z).sqrt().max(f32::EPSILON);
        let ambient = self.ambient.colour.to_linear();
        let directional = self.directional.colour.to_linear();
        LightUniform {
            ambient: [
                ambient[0] * self.ambient.intensity,
                ambient[1] * self.ambient.intensity,
                ambient[2] * self.ambient.intensity,
                0.0,
            ],
            direction: [x / len, y / len, z / len, 0.0],
            directional: [
                directional[0] * self.directional.intensity,
                directional[1] * self.directional.intensity,
                directional[2] * self.directional.intensity,
                0.0,
            ],
        }
    }
}

/// Pre-multiplied light colours and the direction towards the directional light.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub ambient: [f32; 4],
    pub direction: [f32; 4],
    pub directional: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::GlobeStyle;

    #[test]
    fn light_uniform_scales_by_intensity() {
        let scene = Scene::assemble(GlobeObject::new(GlobeStyle::default()), &SceneConfig::default());
        let light = scene.light_uniform();
        assert!((light.ambient[0] - 0.33).abs() < 1e-4);
        assert!((light.directional[1] - 0.1).abs() < 1e-4);
        assert_eq!(light.direction, [0.0, 1.0, 0.0, 0.0]);
    }
}
