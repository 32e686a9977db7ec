//! Model transform of the globe.
//!
//! The globe is a single object, so its transform is uploaded as a uniform
//! rather than as per-instance vertex data.

use cgmath::{Matrix, One, SquareMatrix};

/// Position, rotation (as quaternion) and uniform scale of the globe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: f32,
}

impl Transform {
    /// Identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: 1.0,
        }
    }

    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_scale(self.scale)
    }

    pub fn to_raw(&self) -> TransformRaw {
        let model = self.to_matrix();
        // Normals only need the rotation; uniform scale is renormalised in the shader.
        let normal = cgmath::Matrix4::from(self.rotation);
        let normal = normal
            .invert()
            .map(|m| m.transpose())
            .unwrap_or_else(cgmath::Matrix4::identity);
        TransformRaw {
            model: model.into(),
            normal: normal.into(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

/// The transform as stored in the model uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Rad, Rotation3, Vector4};

    #[test]
    fn identity_by_default() {
        let raw = Transform::default().to_raw();
        let identity: [[f32; 4]; 4] = cgmath::Matrix4::identity().into();
        assert_eq!(raw.model, identity);
        assert_eq!(raw.normal, identity);
    }

    #[test]
    fn scale_then_rotate() {
        let transform = Transform {
            rotation: cgmath::Quaternion::from_angle_y(Rad(std::f32::consts::FRAC_PI_2)),
            scale: 2.0,
            ..Default::default()
        };
        let v = transform.to_matrix() * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!((v.x - 2.0).abs() < 1e-5, "{v:?}");
        assert!(v.z.abs() < 1e-5, "{v:?}");
    }
}
