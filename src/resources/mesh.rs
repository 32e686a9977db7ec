//! Procedural geometry for the globe layers.
//!
//! All builders return CPU-side [`MeshData`] in globe-local space with
//! counter-clockwise front faces seen from outside the globe.

use cgmath::{InnerSpace, Vector3};

use crate::{
    data_structures::{
        globe::{ArcDescriptor, HexCell, PointDescriptor},
        mesh::{ArcVertex, LitVertex, MeshData},
    },
    geo::{self, GLOBE_RADIUS},
};

/// Segments of the globe sphere along both latitude and longitude.
pub const SPHERE_SEGMENTS: u32 = 75;

/// UV sphere of `radius` with outward normals.
pub fn sphere(radius: f32, segments: u32) -> MeshData<LitVertex> {
    let segments = segments.max(3);
    let mut data = MeshData::default();
    for i in 0..=segments {
        let lat = 90.0 - 180.0 * i as f32 / segments as f32;
        for j in 0..=segments {
            let lng = -180.0 + 360.0 * j as f32 / segments as f32;
            let normal = geo::unit_direction(lat, lng);
            data.vertices.push(LitVertex {
                position: (normal * radius).into(),
                normal: normal.into(),
            });
        }
    }
    let row = segments + 1;
    for i in 0..segments {
        for j in 0..segments {
            let c = i * row + j;
            let n = c + row;
            // Skip the degenerate triangles at the poles.
            if i != 0 {
                data.indices.extend_from_slice(&[c, n, c + 1]);
            }
            if i != segments - 1 {
                data.indices.extend_from_slice(&[c + 1, n, n + 1]);
            }
        }
    }
    data
}

/// East and north unit vectors of the tangent plane at `up`.
fn tangent_frame(up: Vector3<f32>) -> (Vector3<f32>, Vector3<f32>) {
    let pole = Vector3::unit_y();
    let east = pole.cross(up);
    let east = if east.magnitude2() < 1e-10 {
        Vector3::unit_x()
    } else {
        east.normalize()
    };
    let north = up.cross(east);
    (east, north)
}

/// Direction at angular distance `radius` (radians) from `centre` towards `bearing`.
fn offset_direction(
    centre: Vector3<f32>,
    east: Vector3<f32>,
    north: Vector3<f32>,
    radius: f32,
    bearing: f32,
) -> Vector3<f32> {
    let tangent = east * bearing.cos() + north * bearing.sin();
    (centre * radius.cos() + tangent * radius.sin()).normalize()
}

/// Flat hexagons lying on the surface, lifted by `altitude` globe radii.
pub fn hex_layer(cells: &[HexCell], altitude: f32) -> MeshData<LitVertex> {
    let r = GLOBE_RADIUS * (1.0 + altitude);
    let mut data = MeshData {
        vertices: Vec::with_capacity(cells.len() * 7),
        indices: Vec::with_capacity(cells.len() * 18),
    };
    for cell in cells {
        let centre = geo::unit_direction(cell.lat, cell.lng);
        let (east, north) = tangent_frame(centre);
        let radius = cell.radius_deg.to_radians();
        let base = data.vertices.len() as u32;
        data.vertices.push(LitVertex {
            position: (centre * r).into(),
            normal: centre.into(),
        });
        for k in 0..6 {
            let bearing = std::f32::consts::FRAC_PI_3 * k as f32;
            let dir = offset_direction(centre, east, north, radius, bearing);
            data.vertices.push(LitVertex {
                position: (dir * r).into(),
                normal: centre.into(),
            });
        }
        for k in 0..6 {
            data.indices
                .extend_from_slice(&[base, base + 1 + k, base + 1 + (k + 1) % 6]);
        }
    }
    data
}

/// Capped cylinders standing on the surface, merged into one mesh.
pub fn points(points: &[PointDescriptor], radial_segments: u32) -> MeshData<LitVertex> {
    let segments = radial_segments.max(3);
    let mut data = MeshData::default();
    for point in points {
        let centre = geo::unit_direction(point.lat, point.lng);
        let (east, north) = tangent_frame(centre);
        let radius = point.radius.to_radians();
        let bottom = GLOBE_RADIUS;
        let top = GLOBE_RADIUS * (1.0 + point.altitude);
        let base = data.vertices.len() as u32;

        for k in 0..segments {
            let bearing = std::f32::consts::TAU * k as f32 / segments as f32;
            let dir = offset_direction(centre, east, north, radius, bearing);
            let side = (east * bearing.cos() + north * bearing.sin()).normalize();
            data.vertices.push(LitVertex {
                position: (dir * bottom).into(),
                normal: side.into(),
            });
            data.vertices.push(LitVertex {
                position: (dir * top).into(),
                normal: side.into(),
            });
        }
        // Cap vertices carry the cap normal.
        let cap_centre = base + 2 * segments;
        data.vertices.push(LitVertex {
            position: (centre * top).into(),
            normal: centre.into(),
        });
        for k in 0..segments {
            let bearing = std::f32::consts::TAU * k as f32 / segments as f32;
            let dir = offset_direction(centre, east, north, radius, bearing);
            data.vertices.push(LitVertex {
                position: (dir * top).into(),
                normal: centre.into(),
            });
        }

        for k in 0..segments {
            let next = (k + 1) % segments;
            let (b0, t0) = (base + 2 * k, base + 2 * k + 1);
            let (b1, t1) = (base + 2 * next, base + 2 * next + 1);
            data.indices.extend_from_slice(&[b0, b1, t1, b0, t1, t0]);
            data.indices
                .extend_from_slice(&[cap_centre, cap_centre + 1 + k, cap_centre + 1 + next]);
        }
    }
    data
}

fn cubic_bezier(p: [Vector3<f32>; 4], t: f32) -> Vector3<f32> {
    let u = 1.0 - t;
    p[0] * (u * u * u) + p[1] * (3.0 * u * u * t) + p[2] * (3.0 * u * t * t) + p[3] * (t * t * t)
}

/// Control polygon of an arc: the endpoints on the surface and two points at a
/// quarter and three quarters of the great circle, lifted to 1.5 times `altitude`.
pub fn arc_control_points(arc: &ArcDescriptor, altitude: f32) -> [Vector3<f32>; 4] {
    let r = arc.record;
    let start = [r.start_lng, r.start_lat];
    let end = [r.end_lng, r.end_lat];
    let lift = |t: f32| {
        let [lng, lat] = geo::geo_interpolate(start, end, t);
        geo::polar_to_cartesian(lat, lng, altitude * 1.5)
    };
    [
        geo::polar_to_cartesian(r.start_lat, r.start_lng, 0.0),
        lift(0.25),
        lift(0.75),
        geo::polar_to_cartesian(r.end_lat, r.end_lng, 0.0),
    ]
}

/// Points along the arc curve at full altitude.
pub fn arc_curve(arc: &ArcDescriptor, curve_segments: u32) -> Vec<Vector3<f32>> {
    let control = arc_control_points(arc, arc.altitude);
    let segments = curve_segments.max(1);
    (0..=segments)
        .map(|k| cubic_bezier(control, k as f32 / segments as f32))
        .collect()
}

fn tube_rings(
    curve: &[Vector3<f32>],
    tube_radius: f32,
    radial_segments: u32,
) -> Vec<Vector3<f32>> {
    let mut out = Vec::with_capacity(curve.len() * radial_segments as usize);
    for (k, &p) in curve.iter().enumerate() {
        let prev = curve[k.saturating_sub(1)];
        let next = curve[(k + 1).min(curve.len() - 1)];
        let mut tangent = next - prev;
        if tangent.magnitude2() < 1e-12 {
            tangent = tangent_frame(p.normalize()).0;
        }
        let tangent = tangent.normalize();
        let up = if p.magnitude2() > 1e-12 {
            p.normalize()
        } else {
            Vector3::unit_y()
        };
        let mut normal = up - tangent * up.dot(tangent);
        if normal.magnitude2() < 1e-12 {
            normal = tangent_frame(tangent).0;
        }
        let normal = normal.normalize();
        let binormal = tangent.cross(normal);
        for j in 0..radial_segments {
            let a = std::f32::consts::TAU * j as f32 / radial_segments as f32;
            out.push(p + (normal * a.cos() + binormal * a.sin()) * tube_radius);
        }
    }
    out
}

/// Tube around an arc, with a flattened copy of every vertex for the grow-in transition.
pub fn arc_tube(
    arc: &ArcDescriptor,
    curve_segments: u32,
    radial_segments: u32,
) -> MeshData<ArcVertex> {
    let segments = curve_segments.max(1);
    let radial = radial_segments.max(3);
    let tube_radius = GLOBE_RADIUS * (arc.stroke / 2.0).to_radians();

    let lifted_curve = arc_curve(arc, segments);
    let ground_control = arc_control_points(arc, 0.0);
    let ground_curve: Vec<_> = (0..=segments)
        .map(|k| cubic_bezier(ground_control, k as f32 / segments as f32))
        .collect();

    let lifted = tube_rings(&lifted_curve, tube_radius, radial);
    let ground = tube_rings(&ground_curve, tube_radius, radial);
    let colour = arc.colour.to_linear();

    let mut data = MeshData::default();
    for k in 0..=segments {
        let t = k as f32 / segments as f32;
        for j in 0..radial {
            let idx = (k * radial + j) as usize;
            data.vertices.push(ArcVertex {
                ground: ground[idx].into(),
                lifted: lifted[idx].into(),
                colour,
                rel_distance: 1.0 - t,
                initial_gap: arc.dash_initial_gap,
            });
        }
    }
    for k in 0..segments {
        for j in 0..radial {
            let next = (j + 1) % radial;
            let a = k * radial + j;
            let b = k * radial + next;
            let c = (k + 1) * radial + j;
            let d = (k + 1) * radial + next;
            data.indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    data
}

/// All arc tubes merged into a single mesh.
pub fn arcs(arcs: &[ArcDescriptor], curve_segments: u32, radial_segments: u32) -> MeshData<ArcVertex> {
    let mut data = MeshData::default();
    for arc in arcs {
        data.extend(arc_tube(arc, curve_segments, radial_segments));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{colour::Colour, dataset::ArcRecord};

    fn signed_area_outward(data: &MeshData<LitVertex>, tri: &[u32]) -> f32 {
        let p = |i: u32| Vector3::from(data.vertices[i as usize].position);
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        (b - a).cross(c - a).dot((a + b + c) / 3.0)
    }

    #[test]
    fn sphere_faces_point_outwards() {
        let data = sphere(GLOBE_RADIUS, 12);
        assert!(!data.is_empty());
        for tri in data.indices.chunks(3) {
            assert!(signed_area_outward(&data, tri) > 0.0, "{tri:?}");
        }
    }

    #[test]
    fn hexes_face_outwards_and_sit_on_the_shell() {
        let cells = [HexCell {
            lat: 20.0,
            lng: -40.0,
            radius_deg: 0.5,
        }];
        let data = hex_layer(&cells, 0.001);
        assert_eq!(data.vertices.len(), 7);
        assert_eq!(data.indices.len(), 18);
        for v in &data.vertices {
            let r = Vector3::from(v.position).magnitude();
            assert!((r - GLOBE_RADIUS * 1.001).abs() < 1e-3);
        }
        for tri in data.indices.chunks(3) {
            assert!(signed_area_outward(&data, tri) > 0.0);
        }
    }

    #[test]
    fn hex_at_the_pole_is_well_formed() {
        let cells = [HexCell {
            lat: 90.0,
            lng: 0.0,
            radius_deg: 1.0,
        }];
        let data = hex_layer(&cells, 0.0);
        assert!(data.vertices.iter().all(|v| v.position.iter().all(|c| c.is_finite())));
    }

    #[test]
    fn points_stand_to_their_altitude() {
        let point = PointDescriptor {
            lat: 10.0,
            lng: 10.0,
            colour: Colour::WHITE,
            altitude: 0.07,
            radius: 0.05,
        };
        let data = points(&[point], 12);
        let max = data
            .vertices
            .iter()
            .map(|v| Vector3::from(v.position).magnitude())
            .fold(0.0f32, f32::max);
        assert!((max - GLOBE_RADIUS * 1.07).abs() < 1e-2);
    }

    #[test]
    fn arc_peaks_between_its_endpoints() {
        let arc = ArcDescriptor {
            record: ArcRecord {
                order: 1.0,
                status: true,
                arc_alt: 0.3,
                start_lat: 0.0,
                start_lng: -30.0,
                end_lat: 0.0,
                end_lng: 30.0,
            },
            colour: Colour::WHITE,
            altitude: 0.3,
            stroke: 0.5,
            dash_length: 0.9,
            dash_gap: 4.0,
            dash_animate_ms: 1500.0,
            dash_initial_gap: 1.0,
            transition_ms: 1200.0,
        };
        let curve = arc_curve(&arc, 64);
        let first = curve[0].magnitude();
        let mid = curve[32].magnitude();
        assert!((first - GLOBE_RADIUS).abs() < 1e-3);
        assert!(mid > GLOBE_RADIUS * 1.2, "{mid}");

        let tube = arc_tube(&arc, 64, 6);
        assert_eq!(tube.vertices.len(), 65 * 6);
        assert_eq!(tube.indices.len(), 64 * 6 * 6);
        assert_eq!(tube.vertices[0].rel_distance, 1.0);
        assert_eq!(tube.vertices[64 * 6].rel_distance, 0.0);
    }
}
