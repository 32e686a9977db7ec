//! Perspective camera and orbit controls.
//!
//! The camera always looks at its target. [`OrbitControls`] move it on a sphere
//! around the target with damped pointer rotation, optional zoom and pan, and
//! a constant auto-rotation.

use std::f32::consts::{PI, TAU};

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3, Vector4};
use instant::Duration;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle away from the poles so `look_at` stays defined.
const PHI_EPSILON: f32 = 1e-6;
/// Squared distance the camera must move before a change is reported.
const CHANGE_EPSILON: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Static camera parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub fovy_deg: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [200.0, 200.0, 200.0],
            fovy_deg: 50.0,
            znear: 0.1,
            zfar: 2000.0,
        }
    }
}

/// Project a world-space point to normalised device coordinates.
///
/// `x` and `y` are in `[-1, 1]` inside the viewport, `z` is the depth in `[0, 1]`
/// for points between the clip planes. Points behind the camera get `z > 1`.
pub fn project(view_proj: Matrix4<f32>, point: Vector3<f32>) -> Vector3<f32> {
    let clip = view_proj * Vector4::new(point.x, point.y, point.z, 1.0);
    if clip.w <= f32::EPSILON {
        return Vector3::new(0.0, 0.0, f32::INFINITY);
    }
    Vector3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Orbit control parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlsConfig {
    pub enable_rotate: bool,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub auto_rotate: bool,
    /// At 1.0 one revolution takes 60 seconds.
    pub auto_rotate_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_rotate: true,
            enable_damping: true,
            damping_factor: 0.05,
            enable_pan: false,
            enable_zoom: false,
            zoom_speed: 1.0,
            min_distance: 200.0,
            max_distance: 500.0,
            rotate_speed: 0.8,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
        }
    }
}

/// Spherical coordinates around the orbit target.
///
/// `phi` is the polar angle from +Y, `theta` the azimuth around +Y measured from +Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub phi: f32,
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(v: Vector3<f32>) -> Self {
        let radius = v.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Damped orbit controls with auto-rotation.
#[derive(Debug)]
pub struct OrbitControls {
    pub config: ControlsConfig,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
    state: DragState,
    last_pointer: Option<(f32, f32)>,
    /// Finger driving the current touch drag.
    active_touch: Option<u64>,
    cursor: (f32, f32),
    viewport: (u32, u32),
    fovy: Rad<f32>,
}

impl OrbitControls {
    pub fn new(config: ControlsConfig, width: u32, height: u32, fovy: Rad<f32>) -> Self {
        Self {
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            state: DragState::None,
            last_pointer: None,
            active_touch: None,
            cursor: (0.0, 0.0),
            viewport: (width, height),
            fovy,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn is_dragging(&self) -> bool {
        self.state != DragState::None
    }

    fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Start a drag at window position `(x, y)`. `pan` selects panning instead of rotating.
    pub fn pointer_down(&mut self, x: f32, y: f32, pan: bool) {
        self.state = match (pan, self.config.enable_pan, self.config.enable_rotate) {
            (true, true, _) => DragState::Pan,
            (false, _, true) => DragState::Rotate,
            _ => DragState::None,
        };
        self.last_pointer = Some((x, y));
    }

    /// Continue a drag to window position `(x, y)`.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let Some((last_x, last_y)) = self.last_pointer else {
            return;
        };
        let (dx, dy) = (x - last_x, y - last_y);
        let height = self.viewport.1.max(1) as f32;
        match self.state {
            DragState::Rotate => {
                let speed = self.config.rotate_speed;
                self.rotate_left(TAU * dx * speed / height);
                self.rotate_up(TAU * dy * speed / height);
            }
            DragState::Pan => self.pan_pixels(dx, dy),
            DragState::None => return,
        }
        self.last_pointer = Some((x, y));
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::None;
        self.last_pointer = None;
    }

    /// Scroll by `delta` notches; positive zooms in. Ignored while zoom is disabled.
    pub fn wheel(&mut self, delta: f32) {
        if !self.config.enable_zoom || delta == 0.0 {
            return;
        }
        let step = 0.95f32.powf(self.config.zoom_speed * delta.abs());
        if delta > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Feed one touch point. Only the first finger down drives the rotation.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, x: f32, y: f32) -> bool {
        match phase {
            TouchPhase::Started if self.active_touch.is_none() => {
                self.active_touch = Some(id);
                self.pointer_down(x, y, false);
                true
            }
            TouchPhase::Moved if self.active_touch == Some(id) => {
                self.pointer_move(x, y);
                true
            }
            TouchPhase::Ended | TouchPhase::Cancelled if self.active_touch == Some(id) => {
                self.active_touch = None;
                self.pointer_up();
                true
            }
            _ => false,
        }
    }

    // Stored until the next update, where it is applied in the camera's frame.
    fn pan_pixels(&mut self, dx: f32, dy: f32) {
        self.pan_offset += Vector3::new(dx, dy, 0.0);
    }

    /// Feed a window event. Returns true if the event was consumed.
    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => match (button, state) {
                (MouseButton::Left | MouseButton::Right, ElementState::Pressed) => {
                    let (x, y) = self.cursor;
                    self.pointer_down(x, y, *button == MouseButton::Right);
                    true
                }
                (_, ElementState::Released) => {
                    self.pointer_up();
                    true
                }
                _ => false,
            },
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = (x, y);
                if self.is_dragging() {
                    self.pointer_move(x, y);
                }
                self.is_dragging()
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 100.0) as f32,
                };
                self.wheel(notches);
                self.config.enable_zoom
            }
            WindowEvent::Touch(touch) => self.touch(
                touch.id,
                touch.phase,
                touch.location.x as f32,
                touch.location.y as f32,
            ),
            _ => false,
        }
    }

    /// Advance the controls by `dt` and move `camera`.
    ///
    /// `on_change` is called synchronously with the updated camera when it moved.
    pub fn update<F: FnMut(&Camera)>(&mut self, camera: &mut Camera, dt: Duration, mut on_change: F) -> bool {
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.config.auto_rotate && self.state == DragState::None {
            let angle = TAU / 60.0 * self.config.auto_rotate_speed * dt.as_secs_f32();
            self.rotate_left(angle);
        }

        let factor = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * factor;
        spherical.phi += self.delta_phi * factor;
        spherical.phi = spherical.phi.clamp(PHI_EPSILON, PI - PHI_EPSILON);

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.config.min_distance, self.config.max_distance);

        if self.pan_offset.x != 0.0 || self.pan_offset.y != 0.0 {
            let distance = offset.magnitude() * (self.fovy.0 / 2.0).tan();
            let height = self.viewport.1.max(1) as f32;
            let forward = (-offset).normalize();
            let right = forward.cross(camera.up).normalize();
            let up = right.cross(forward);
            let shift = right * (-2.0 * self.pan_offset.x * distance / height)
                + up * (2.0 * self.pan_offset.y * distance / height);
            camera.target += shift;
        }

        let previous = camera.position;
        camera.position = camera.target + spherical.to_offset();

        if self.config.enable_damping {
            self.delta_theta *= 1.0 - factor;
            self.delta_phi *= 1.0 - factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;
        self.pan_offset = Vector3::new(0.0, 0.0, 0.0);

        let moved = (camera.position - previous).magnitude2() > CHANGE_EPSILON;
        if moved {
            on_change(camera);
        }
        moved
    }
}

/// Camera state and its GPU resources.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub projection: Projection,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(
        device: &wgpu::Device,
        config: &CameraConfig,
        controls: &ControlsConfig,
        width: u32,
        height: u32,
    ) -> Self {
        use wgpu::util::DeviceExt;

        let camera = Camera::new(Point3::from(config.position), Point3::origin());
        let projection = Projection::new(
            width,
            height,
            cgmath::Deg(config.fovy_deg),
            config.znear,
            config.zfar,
        );
        let controls = OrbitControls::new(*controls, width, height, projection.fovy);

        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, &projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            projection,
            controls,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.controls.resize(width, height);
    }

    /// Recompute the uniform from the current camera and upload it.
    pub fn write(&mut self, queue: &wgpu::Queue) {
        self.uniform.update_view_proj(&self.camera, &self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }

    pub fn view_proj(&self) -> Matrix4<f32> {
        self.projection.calc_matrix() * self.camera.calc_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spherical_round_trip() {
        let v = Vector3::new(200.0, 200.0, 200.0);
        let back = Spherical::from_offset(v).to_offset();
        assert!((back - v).magnitude() < 1e-3);
    }

    #[test]
    fn projection_keeps_target_centred() {
        let camera = Camera::new(Point3::new(0.0, 0.0, 300.0), Point3::origin());
        let projection = Projection::new(800, 600, cgmath::Deg(50.0), 0.1, 2000.0);
        let view_proj = projection.calc_matrix() * camera.calc_matrix();
        let ndc = project(view_proj, Vector3::new(0.0, 0.0, 0.0));
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
        let behind = project(view_proj, Vector3::new(0.0, 0.0, 400.0));
        assert!(behind.z > 1.0 || behind.z.is_infinite());
    }
}
