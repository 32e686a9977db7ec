//! Small sRGB colour type shared by the decorator, the scene and the shaders.

/// An sRGB colour with straight alpha, components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::from_rgb_u32(0xffffff);
    pub const TRANSPARENT: Colour = Colour {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    /// Build a colour from a `0xRRGGBB` literal.
    pub const fn from_rgb_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
            a: 1.0,
        }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear-light RGBA for uniforms written to an sRGB target.
    pub fn to_linear(self) -> [f32; 4] {
        fn channel(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        [channel(self.r), channel(self.g), channel(self.b), self.a]
    }

    /// Clear colour for render pass load ops.
    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b, a] = self.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_literals() {
        let c = Colour::from_rgb_u32(0x4a71fa);
        assert_eq!(c.r, 0x4a as f32 / 255.0);
        assert_eq!(c.g, 0x71 as f32 / 255.0);
        assert_eq!(c.b, 0xfa as f32 / 255.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn linear_conversion_keeps_extremes() {
        let white = Colour::WHITE.to_linear();
        assert!(white.iter().all(|c| (c - 1.0).abs() < 1e-5), "{white:?}");
        assert_eq!(Colour::from_rgb_u32(0).to_linear(), [0.0, 0.0, 0.0, 1.0]);
    }
}
