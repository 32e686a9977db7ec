//! Turns the datasets into a decorated [`GlobeObject`].
//!
//! All styling is fixed at startup through [`GlobeStyle`], whose `Default`
//! carries the look of the globe. Per-record properties are resolved here once
//! and stored on the descriptors; the render passes never consult the records.

use std::f32::consts::PI;

use crate::{
    animation::{Easing, Tween},
    data_structures::{
        colour::Colour,
        dataset::{ArcRecord, Datasets},
        globe::{
            ArcDescriptor, AtmosphereDescriptor, GlobeMaterial, GlobeObject, IntroAnimation,
            MarkerElement, PointDescriptor,
        },
    },
    hex,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HexPolygonStyle {
    pub resolution: u32,
    pub margin: f32,
    pub colour: Colour,
    /// Lift above the surface in globe radii, keeps the dots out of the sphere's depth.
    pub altitude: f32,
}

impl Default for HexPolygonStyle {
    fn default() -> Self {
        Self {
            resolution: 3,
            margin: 0.6,
            colour: Colour::from_rgb_u32(0xffffff),
            altitude: 0.001,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtmosphereStyle {
    pub show: bool,
    pub colour: Colour,
    pub altitude: f32,
}

impl Default for AtmosphereStyle {
    fn default() -> Self {
        Self {
            show: true,
            colour: Colour::from_rgb_u32(0xf9fafe),
            altitude: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcStyle {
    pub colour_active: Colour,
    pub colour_inactive: Colour,
    pub stroke_active: f32,
    pub stroke_inactive: f32,
    pub dash_length: f32,
    pub dash_gap: f32,
    pub dash_animate_ms: f32,
    pub transition_ms: f32,
    /// Initial gap per unit of `order`.
    pub initial_gap_per_order: f32,
    pub curve_segments: u32,
    pub radial_segments: u32,
}

impl Default for ArcStyle {
    fn default() -> Self {
        Self {
            // Both branches are white in the source data's styling.
            colour_active: Colour::from_rgb_u32(0xffffff),
            colour_inactive: Colour::from_rgb_u32(0xffffff),
            stroke_active: 0.5,
            stroke_inactive: 0.3,
            dash_length: 0.9,
            dash_gap: 4.0,
            dash_animate_ms: 1500.0,
            transition_ms: 1200.0,
            initial_gap_per_order: 1.0,
            curve_segments: 64,
            radial_segments: 6,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointStyle {
    pub colour: Colour,
    pub altitude: f32,
    pub radius: f32,
    pub radial_segments: u32,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            colour: Colour::from_rgb_u32(0xffffff),
            altitude: 0.07,
            radius: 0.05,
            radial_segments: 12,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub size_px: f32,
    pub radius_px: f32,
    pub colour: Colour,
    pub hide_occluded: bool,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            size_px: 10.0,
            radius_px: 4.0,
            colour: Colour::WHITE,
            hide_occluded: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntroStyle {
    pub enabled: bool,
    pub scale_ms: f32,
    pub rotation_ms: f32,
    /// Starting rotation about the polar axis in radians.
    pub start_rotation: f32,
}

impl Default for IntroStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            scale_ms: 600.0,
            rotation_ms: 1200.0,
            start_rotation: -PI / 6.0,
        }
    }
}

/// The complete look of the globe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobeStyle {
    pub hex_polygons: HexPolygonStyle,
    pub atmosphere: AtmosphereStyle,
    pub arcs: ArcStyle,
    pub points: PointStyle,
    pub markers: MarkerStyle,
    pub material: GlobeMaterial,
    pub intro: IntroStyle,
}

impl Default for GlobeStyle {
    fn default() -> Self {
        Self {
            hex_polygons: HexPolygonStyle::default(),
            atmosphere: AtmosphereStyle::default(),
            arcs: ArcStyle::default(),
            points: PointStyle::default(),
            markers: MarkerStyle::default(),
            material: GlobeMaterial {
                colour: Colour::from_rgb_u32(0x4a71fa),
                emissive: Colour::from_rgb_u32(0x84c8ff),
                emissive_intensity: 0.18,
            },
            intro: IntroStyle::default(),
        }
    }
}

pub fn arc_colour(style: &ArcStyle, record: &ArcRecord) -> Colour {
    if record.status {
        style.colour_active
    } else {
        style.colour_inactive
    }
}

pub fn arc_stroke(style: &ArcStyle, record: &ArcRecord) -> f32 {
    if record.status {
        style.stroke_active
    } else {
        style.stroke_inactive
    }
}

pub fn arc_dash_initial_gap(style: &ArcStyle, record: &ArcRecord) -> f32 {
    record.order * style.initial_gap_per_order
}

/// Build the globe from `datasets`. Empty datasets yield an undecorated but valid globe.
pub fn decorate(datasets: &Datasets, style: &GlobeStyle) -> GlobeObject {
    let mut globe = GlobeObject::new(*style);

    let hex = &style.hex_polygons;
    globe.hex_cells = hex::hex_cells(&datasets.features, hex.resolution, hex.margin);

    if style.atmosphere.show {
        globe.atmosphere = Some(AtmosphereDescriptor {
            colour: style.atmosphere.colour,
            altitude: style.atmosphere.altitude,
        });
    }

    globe.markers = datasets
        .markers
        .iter()
        .map(|m| MarkerElement {
            lat: m.lat,
            lng: m.lng,
            size_px: style.markers.size_px,
            radius_px: style.markers.radius_px,
            colour: style.markers.colour,
        })
        .collect();

    let arcs = &style.arcs;
    globe.arcs = datasets
        .arcs
        .iter()
        .map(|record| ArcDescriptor {
            record: *record,
            colour: arc_colour(arcs, record),
            altitude: record.arc_alt,
            stroke: arc_stroke(arcs, record),
            dash_length: arcs.dash_length,
            dash_gap: arcs.dash_gap,
            dash_animate_ms: arcs.dash_animate_ms,
            dash_initial_gap: arc_dash_initial_gap(arcs, record),
            transition_ms: arcs.transition_ms,
        })
        .collect();

    globe.points = datasets
        .markers
        .iter()
        .map(|m| PointDescriptor {
            lat: m.lat,
            lng: m.lng,
            colour: style.points.colour,
            altitude: style.points.altitude,
            radius: style.points.radius,
        })
        .collect();

    // Applied after construction, replacing the stock material.
    globe.material = style.material;

    if style.intro.enabled {
        globe.intro = Some(IntroAnimation {
            scale: Tween::new(1e-6, 1.0, style.intro.scale_ms, Easing::QuadraticInOut),
            rotation: Tween::new(
                style.intro.start_rotation,
                0.0,
                style.intro.rotation_ms,
                Easing::QuinticInOut,
            ),
        });
    }

    log::info!(
        "Decorated globe with {} hex cells, {} arcs, {} points and {} markers",
        globe.hex_cells.len(),
        globe.arcs.len(),
        globe.points.len(),
        globe.markers.len()
    );
    globe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intro_starts_small_and_turned() {
        let globe = decorate(&Datasets::default(), &GlobeStyle::default());
        let start = globe.transform_at(0.0);
        let end = globe.transform_at(2000.0);
        assert!(start.scale < 1e-3);
        assert!((end.scale - 1.0).abs() < 1e-6);
        assert_eq!(end.rotation, cgmath::Quaternion::new(1.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn intro_can_be_disabled() {
        let style = GlobeStyle {
            intro: IntroStyle {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let globe = decorate(&Datasets::default(), &style);
        assert!(globe.intro.is_none());
        assert_eq!(globe.transform_at(0.0).scale, 1.0);
    }
}
