//! The decorated globe: everything the render passes draw.
//!
//! A [`GlobeObject`] is produced once by [`crate::decorator::decorate`] and is
//! read-only afterwards, except for its point of view which follows the camera.

use cgmath::{EuclideanSpace, InnerSpace, Point3, Quaternion, Rad, Rotation3, Vector3};

use crate::{
    animation::{Easing, Tween},
    data_structures::{colour::Colour, dataset::ArcRecord, transform::Transform},
    decorator::GlobeStyle,
    geo::{self, GLOBE_RADIUS, GeoCoords},
};

/// Surface material of the globe sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobeMaterial {
    pub colour: Colour,
    pub emissive: Colour,
    pub emissive_intensity: f32,
}

impl Default for GlobeMaterial {
    fn default() -> Self {
        Self {
            colour: Colour::WHITE,
            emissive: Colour::from_rgb_u32(0x000000),
            emissive_intensity: 1.0,
        }
    }
}

/// A hexagonal land dot centred on a grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexCell {
    pub lat: f32,
    pub lng: f32,
    /// Angular circumradius of the hexagon in degrees.
    pub radius_deg: f32,
}

/// A decorated arc with its resolved per-record properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcDescriptor {
    pub record: ArcRecord,
    pub colour: Colour,
    /// Peak altitude in globe radii.
    pub altitude: f32,
    /// Tube diameter in angular degrees.
    pub stroke: f32,
    pub dash_length: f32,
    pub dash_gap: f32,
    pub dash_animate_ms: f32,
    pub dash_initial_gap: f32,
    pub transition_ms: f32,
}

impl ArcDescriptor {
    /// Eased growth of the arc from the surface to its full altitude, in `[0, 1]`.
    pub fn transition_progress(&self, elapsed_ms: f32) -> f32 {
        Tween::new(0.0, 1.0, self.transition_ms, Easing::QuadraticInOut).value_at(elapsed_ms)
    }
}

/// A small cylinder standing on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointDescriptor {
    pub lat: f32,
    pub lng: f32,
    pub colour: Colour,
    /// Height in globe radii.
    pub altitude: f32,
    /// Radius in angular degrees.
    pub radius: f32,
}

/// A screen-space indicator pinned to a surface position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerElement {
    pub lat: f32,
    pub lng: f32,
    /// Width and height of the element box in pixels.
    pub size_px: f32,
    /// Radius of the drawn circle in pixels.
    pub radius_px: f32,
    pub colour: Colour,
}

impl MarkerElement {
    /// Globe-local anchor on the surface.
    pub fn anchor(&self) -> Vector3<f32> {
        geo::polar_to_cartesian(self.lat, self.lng, 0.0)
    }

    /// False once the marker has rotated behind the horizon seen from `pov`.
    pub fn is_visible_from(&self, pov: &PointOfView) -> bool {
        let distance = pov.relative.magnitude();
        if distance <= GLOBE_RADIUS {
            return true;
        }
        let cos_horizon = GLOBE_RADIUS / distance;
        self.anchor().normalize().dot(pov.relative / distance) >= cos_horizon
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereDescriptor {
    pub colour: Colour,
    /// Thickness of the glow shell in globe radii.
    pub altitude: f32,
}

/// Where the viewer is, relative to the globe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointOfView {
    pub relative: Vector3<f32>,
    pub geo: GeoCoords,
}

impl PointOfView {
    pub fn from_relative(relative: Vector3<f32>) -> Self {
        Self {
            relative,
            geo: geo::cartesian_to_geo(relative),
        }
    }
}

/// Scale and spin of the globe while it animates in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntroAnimation {
    pub scale: Tween,
    pub rotation: Tween,
}

/// The single drawable of the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeObject {
    pub style: GlobeStyle,
    pub material: GlobeMaterial,
    pub position: Point3<f32>,
    pub hex_cells: Vec<HexCell>,
    pub arcs: Vec<ArcDescriptor>,
    pub points: Vec<PointDescriptor>,
    pub markers: Vec<MarkerElement>,
    pub atmosphere: Option<AtmosphereDescriptor>,
    /// Unset until the first view sync.
    pub point_of_view: Option<PointOfView>,
    pub intro: Option<IntroAnimation>,
}

impl GlobeObject {
    /// An undecorated globe at the origin.
    pub fn new(style: GlobeStyle) -> Self {
        Self {
            style,
            material: GlobeMaterial::default(),
            position: Point3::origin(),
            hex_cells: Vec::new(),
            arcs: Vec::new(),
            points: Vec::new(),
            markers: Vec::new(),
            atmosphere: None,
            point_of_view: None,
            intro: None,
        }
    }

    /// Record the viewer position relative to `globe_position`.
    pub fn set_point_of_view(&mut self, camera_position: Point3<f32>, globe_position: Point3<f32>) {
        self.point_of_view = Some(PointOfView::from_relative(camera_position - globe_position));
    }

    /// Model transform at `elapsed_ms` since startup, including the intro animation.
    pub fn transform_at(&self, elapsed_ms: f32) -> Transform {
        let (scale, angle) = match &self.intro {
            Some(intro) => (
                intro.scale.value_at(elapsed_ms),
                intro.rotation.value_at(elapsed_ms),
            ),
            None => (1.0, 0.0),
        };
        Transform {
            position: self.position.to_vec(),
            rotation: Quaternion::from_angle_y(Rad(angle)),
            scale,
        }
    }

    /// Markers that should be drawn for the current point of view while the
    /// globe is turned by `rotation`.
    pub fn visible_markers(&self, rotation: Quaternion<f32>) -> impl Iterator<Item = &MarkerElement> + '_ {
        let pov = self
            .point_of_view
            .map(|pov| PointOfView::from_relative(rotation.conjugate() * pov.relative));
        let hide = self.style.markers.hide_occluded;
        self.markers.iter().filter(move |m| match (hide, &pov) {
            (true, Some(pov)) => m.is_visible_from(pov),
            _ => true,
        })
    }
}
