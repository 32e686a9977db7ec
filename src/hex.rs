//! Hexagonal dot layer over land.
//!
//! The sphere is covered by an equal-area Fibonacci lattice with as many cells
//! as a hierarchical hexagonal grid has at the requested resolution. Each cell
//! whose centre falls inside a land feature becomes one hexagon.

use crate::data_structures::{dataset::GeoFeatureSet, globe::HexCell};

/// Number of cells at `resolution`: `2 + 120 * 7^resolution`.
pub fn cell_count(resolution: u32) -> usize {
    2 + 120 * 7usize.pow(resolution)
}

/// Angular circumradius in degrees of a regular hexagon covering `1 / count` of the sphere.
pub fn cell_radius_deg(count: usize) -> f32 {
    let area = 4.0 * std::f64::consts::PI / count.max(1) as f64;
    let radius = (area / (1.5 * 3f64.sqrt())).sqrt();
    radius.to_degrees() as f32
}

/// Centres of `count` equal-area cells as `[lng, lat]` degree pairs.
pub fn fibonacci_cells(count: usize) -> impl Iterator<Item = [f32; 2]> {
    let golden_angle = 180.0 * (3.0 - 5f64.sqrt());
    (0..count).map(move |i| {
        let y = 1.0 - 2.0 * (i as f64 + 0.5) / count as f64;
        let lat = y.asin().to_degrees();
        let mut lng = (golden_angle * i as f64).rem_euclid(360.0);
        if lng >= 180.0 {
            lng -= 360.0;
        }
        [lng as f32, lat as f32]
    })
}

/// Hexagons for every lattice cell on land, shrunk by `margin`.
pub fn hex_cells(features: &GeoFeatureSet, resolution: u32, margin: f32) -> Vec<HexCell> {
    if features.is_empty() {
        return Vec::new();
    }
    let count = cell_count(resolution);
    let radius_deg = cell_radius_deg(count) * (1.0 - margin.clamp(0.0, 1.0));
    fibonacci_cells(count)
        .filter(|&cell| features.contains(cell))
        .map(|[lng, lat]| HexCell { lat, lng, radius_deg })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_the_hierarchy() {
        assert_eq!(cell_count(0), 122);
        assert_eq!(cell_count(1), 842);
        assert_eq!(cell_count(3), 41_162);
    }

    #[test]
    fn lattice_stays_in_range() {
        for [lng, lat] in fibonacci_cells(500) {
            assert!((-180.0..180.0).contains(&lng));
            assert!((-90.0..=90.0).contains(&lat));
        }
    }

    #[test]
    fn finer_grids_have_smaller_cells() {
        assert!(cell_radius_deg(cell_count(3)) < cell_radius_deg(cell_count(2)));
        // Roughly 0.62 degrees at resolution 3.
        let r3 = cell_radius_deg(cell_count(3));
        assert!(r3 > 0.55 && r3 < 0.7, "{r3}");
    }

    #[test]
    fn no_land_no_hexes() {
        assert!(hex_cells(&GeoFeatureSet::default(), 3, 0.6).is_empty());
    }
}
