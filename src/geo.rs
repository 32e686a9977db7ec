//! Geographic coordinate helpers.
//!
//! Latitudes and longitudes are in degrees. World positions are expressed in
//! globe-local space where the globe is centred on the origin with radius
//! [`GLOBE_RADIUS`], +Y points to the north pole and (lat 0, lng 0) lies on +Z.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Vector3};

/// Radius of the rendered globe in world units.
pub const GLOBE_RADIUS: f32 = 100.0;

/// A geographic position with an altitude relative to the globe radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoCoords {
    pub lat: f32,
    pub lng: f32,
    /// Height above the surface in globe radii (0 is on the surface).
    pub altitude: f32,
}

/// Convert a lat/lng (degrees) and a relative altitude into a globe-local position.
pub fn polar_to_cartesian(lat: f32, lng: f32, rel_alt: f32) -> Vector3<f32> {
    let phi = (90.0 - lat).to_radians();
    let theta = (90.0 - lng).to_radians();
    let r = GLOBE_RADIUS * (1.0 + rel_alt);
    Vector3::new(
        r * phi.sin() * theta.cos(),
        r * phi.cos(),
        r * phi.sin() * theta.sin(),
    )
}

/// Inverse of [`polar_to_cartesian`].
pub fn cartesian_to_geo(v: Vector3<f32>) -> GeoCoords {
    let r = v.magnitude();
    if r <= f32::EPSILON {
        return GeoCoords {
            lat: 0.0,
            lng: 0.0,
            altitude: -1.0,
        };
    }
    let phi = (v.y / r).clamp(-1.0, 1.0).acos();
    let theta = v.z.atan2(v.x);
    let lat = 90.0 - phi.to_degrees();
    let mut lng = 90.0 - theta.to_degrees();
    if theta < -FRAC_PI_2 {
        lng -= 360.0;
    }
    GeoCoords {
        lat,
        lng,
        altitude: r / GLOBE_RADIUS - 1.0,
    }
}

/// Unit direction of a lat/lng on the globe.
pub fn unit_direction(lat: f32, lng: f32) -> Vector3<f32> {
    polar_to_cartesian(lat, lng, 0.0) / GLOBE_RADIUS
}

/// Great-circle interpolation between two `[lng, lat]` points.
///
/// Returns `[lng, lat]` at fraction `t` of the shortest path. Antipodal inputs
/// have no unique great circle; the nearer endpoint is returned.
pub fn geo_interpolate(from: [f32; 2], to: [f32; 2], t: f32) -> [f32; 2] {
    let a = unit_direction(from[1], from[0]);
    let b = unit_direction(to[1], to[0]);
    let omega = a.dot(b).clamp(-1.0, 1.0).acos();
    let sin_omega = omega.sin();
    if omega.abs() < 1e-6 {
        return from;
    }
    if sin_omega.abs() < 1e-6 {
        return if t < 0.5 { from } else { to };
    }
    let p = a * (((1.0 - t) * omega).sin() / sin_omega) + b * ((t * omega).sin() / sin_omega);
    let coords = cartesian_to_geo(p * GLOBE_RADIUS);
    [coords.lng, coords.lat]
}

/// A ring of `[lng, lat]` degree pairs prepared for repeated containment tests.
///
/// Longitudes are unwrapped once so rings crossing the antimeridian stay
/// contiguous. A ring whose unwrapped longitudes travel a full turn encloses a
/// pole; it is closed through that pole so the cap below (or above) the
/// coastline counts as inside.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedRing {
    vertices: Vec<[f32; 2]>,
    /// Lower bound of the longitude window test points are shifted into.
    window_start: f32,
    encloses_pole: bool,
}

impl PreparedRing {
    pub fn new(ring: &[[f32; 2]]) -> Self {
        let mut vertices = unwrap_ring(ring);
        let (first, last) = match (vertices.first(), vertices.last()) {
            (Some(first), Some(last)) => (first[0], last[0]),
            _ => {
                return Self {
                    vertices,
                    window_start: -180.0,
                    encloses_pole: false,
                }
            }
        };

        let encloses_pole = (last - first).abs() > 180.0;
        let window_start = if encloses_pole {
            let mean_lat = vertices.iter().map(|v| v[1]).sum::<f32>() / vertices.len() as f32;
            let pole = if mean_lat < 0.0 { -90.0 } else { 90.0 };
            vertices.push([last, pole]);
            vertices.push([first, pole]);
            first.min(last)
        } else {
            first - 180.0
        };
        Self {
            vertices,
            window_start,
            encloses_pole,
        }
    }

    /// True when the ring encloses a pole.
    pub fn encloses_pole(&self) -> bool {
        self.encloses_pole
    }

    /// Even-odd containment of `[lng, lat]`.
    pub fn contains(&self, point: [f32; 2]) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        let lng = (point[0] - self.window_start).rem_euclid(360.0) + self.window_start;
        let lat = point[1];

        let mut inside = false;
        let mut j = self.vertices.len() - 1;
        for i in 0..self.vertices.len() {
            let [xi, yi] = self.vertices[i];
            let [xj, yj] = self.vertices[j];
            if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

fn unwrap_ring(ring: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let mut out = Vec::with_capacity(ring.len() + 2);
    let Some(first) = ring.first() else {
        return out;
    };
    let mut previous = first[0];
    for &[lng, lat] in ring {
        let mut lng = lng;
        while lng - previous > 180.0 {
            lng -= 360.0;
        }
        while lng - previous < -180.0 {
            lng += 360.0;
        }
        out.push([lng, lat]);
        previous = lng;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn origin_of_lat_lng_lies_on_positive_z() {
        let v = polar_to_cartesian(0.0, 0.0, 0.0);
        assert!(close(v.x, 0.0, 1e-4));
        assert!(close(v.y, 0.0, 1e-4));
        assert!(close(v.z, GLOBE_RADIUS, 1e-4));
    }

    #[test]
    fn north_pole_lies_on_positive_y() {
        let v = polar_to_cartesian(90.0, 0.0, 0.0);
        assert!(close(v.y, GLOBE_RADIUS, 1e-3));
    }

    #[test]
    fn east_is_positive_x() {
        let v = polar_to_cartesian(0.0, 90.0, 0.0);
        assert!(close(v.x, GLOBE_RADIUS, 1e-3));
    }

    #[test]
    fn geo_of_diagonal_camera_position() {
        let geo = cartesian_to_geo(Vector3::new(200.0, 200.0, 200.0));
        assert!(close(geo.lat, 35.264, 1e-2), "{:?}", geo);
        assert!(close(geo.lng, 45.0, 1e-3), "{:?}", geo);
        assert!(close(geo.altitude, 2.4641, 1e-3), "{:?}", geo);
    }

    #[test]
    fn western_longitudes_stay_in_range() {
        let v = polar_to_cartesian(10.0, -135.0, 0.5);
        let geo = cartesian_to_geo(v);
        assert!(close(geo.lng, -135.0, 1e-3), "{:?}", geo);
        assert!(close(geo.lat, 10.0, 1e-3));
        assert!(close(geo.altitude, 0.5, 1e-4));
    }

    #[test]
    fn interpolation_hits_endpoints_and_midpoint() {
        let a = [0.0, 0.0];
        let b = [90.0, 0.0];
        let start = geo_interpolate(a, b, 0.0);
        let end = geo_interpolate(a, b, 1.0);
        let mid = geo_interpolate(a, b, 0.5);
        assert!(close(start[0], 0.0, 1e-3));
        assert!(close(end[0], 90.0, 1e-3));
        assert!(close(mid[0], 45.0, 1e-3));
        assert!(close(mid[1], 0.0, 1e-3));
    }

    #[test]
    fn ring_containment() {
        let square = PreparedRing::new(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]);
        assert!(!square.encloses_pole());
        assert!(square.contains([5.0, 5.0]));
        assert!(!square.contains([15.0, 5.0]));
        assert!(!square.contains([5.0, -1.0]));
    }

    #[test]
    fn ring_across_antimeridian() {
        let ring = PreparedRing::new(&[[170.0, -10.0], [-170.0, -10.0], [-170.0, 10.0], [170.0, 10.0]]);
        assert!(!ring.encloses_pole());
        assert!(ring.contains([180.0, 0.0]));
        assert!(ring.contains([-175.0, 0.0]));
        assert!(!ring.contains([0.0, 0.0]));
    }

    #[test]
    fn south_polar_cap_closed_through_the_pole_corner() {
        let ring = PreparedRing::new(&[
            [-180.0, -70.0],
            [-90.0, -75.0],
            [0.0, -70.0],
            [90.0, -75.0],
            [180.0, -70.0],
            [180.0, -90.0],
            [-180.0, -90.0],
            [-180.0, -70.0],
        ]);
        assert!(ring.encloses_pole());
        assert!(ring.contains([0.0, -72.0]));
        assert!(ring.contains([0.0, -88.0]));
        assert!(ring.contains([179.5, -80.0]));
        assert!(ring.contains([-179.5, -80.0]));
        assert!(!ring.contains([0.0, -60.0]));
        assert!(!ring.contains([0.0, 80.0]));
    }

    #[test]
    fn north_polar_ring_without_pole_vertices() {
        // Westward coastline that never touches the pole.
        let ring = PreparedRing::new(&[
            [170.0, 80.0],
            [60.0, 82.0],
            [-60.0, 80.0],
            [-170.0, 82.0],
            [170.0, 80.0],
        ]);
        assert!(ring.encloses_pole());
        assert!(ring.contains([0.0, 85.0]));
        assert!(ring.contains([120.0, 89.0]));
        assert!(!ring.contains([0.0, 70.0]));
        assert!(!ring.contains([0.0, -85.0]));
    }
}
