//! The three static datasets the globe is decorated from.
//!
//! - country outlines as a GeoJSON `FeatureCollection` (`custom.geo.json`)
//! - arc records under a top-level `pulls` array (`lines.json`)
//! - marker records under a top-level `maps` array (`map.json`)
//!
//! Parsing is strict about the fields that are read and ignores everything else.

use serde::Deserialize;
use thiserror::Error;

use crate::{geo::PreparedRing, resources};

/// Validation faults raised while turning raw JSON into records.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("{dataset}: malformed JSON: {source}")]
    Parse {
        dataset: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{dataset}: record {index} is invalid: {reason}")]
    InvalidRecord {
        dataset: &'static str,
        index: usize,
        reason: String,
    },
}

/// File names of the datasets, relative to the asset root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetPaths {
    pub countries: String,
    pub arcs: String,
    pub markers: String,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            countries: "custom.geo.json".to_string(),
            arcs: "lines.json".to_string(),
            markers: "map.json".to_string(),
        }
    }
}

/// A closed ring of `[lng, lat]` degree pairs.
pub type Ring = Vec<[f32; 2]>;

/// One polygon: an outer ring followed by any holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub rings: Vec<Ring>,
    /// `[min_lng, min_lat, max_lng, max_lat]` of the outer ring.
    pub bbox: [f32; 4],
    prepared: Vec<PreparedRing>,
}

impl Polygon {
    fn new(rings: Vec<Ring>) -> Self {
        let mut bbox = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
        if let Some(outer) = rings.first() {
            for &[lng, lat] in outer {
                bbox[0] = bbox[0].min(lng);
                bbox[1] = bbox[1].min(lat);
                bbox[2] = bbox[2].max(lng);
                bbox[3] = bbox[3].max(lat);
            }
        }
        let prepared = rings.iter().map(|ring| PreparedRing::new(ring)).collect();
        Self {
            rings,
            bbox,
            prepared,
        }
    }

    /// True when the outer ring spans more than half the globe in longitude,
    /// which is how antimeridian-crossing and polar rings show up in raw coordinates.
    pub fn wraps_antimeridian(&self) -> bool {
        self.bbox[2] - self.bbox[0] > 180.0
    }

    /// Even-odd containment of `[lng, lat]`, honouring holes.
    pub fn contains(&self, point: [f32; 2]) -> bool {
        if !self.wraps_antimeridian() {
            let [min_lng, min_lat, max_lng, max_lat] = self.bbox;
            if point[0] < min_lng || point[0] > max_lng || point[1] < min_lat || point[1] > max_lat
            {
                return false;
            }
        }
        let mut rings = self.prepared.iter();
        match rings.next() {
            Some(outer) if outer.contains(point) => !rings.any(|hole| hole.contains(point)),
            _ => false,
        }
    }
}

/// A country (or any other land feature) as a list of polygons.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub name: Option<String>,
    pub polygons: Vec<Polygon>,
}

impl GeoFeature {
    pub fn contains(&self, point: [f32; 2]) -> bool {
        self.polygons.iter().any(|p| p.contains(point))
    }
}

/// Parsed country outlines.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoFeatureSet {
    pub features: Vec<GeoFeature>,
}

impl GeoFeatureSet {
    pub fn contains(&self, point: [f32; 2]) -> bool {
        self.features.iter().any(|f| f.contains(point))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// One animated connection between two places.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcRecord {
    pub order: f32,
    pub status: bool,
    pub arc_alt: f32,
    pub start_lat: f32,
    pub start_lng: f32,
    pub end_lat: f32,
    pub end_lng: f32,
}

/// One location that gets a point and a marker indicator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerRecord {
    pub lat: f32,
    pub lng: f32,
}

pub type ArcSet = Vec<ArcRecord>;
pub type MarkerSet = Vec<MarkerRecord>;

/// All inputs of the decorator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Datasets {
    pub features: GeoFeatureSet,
    pub arcs: ArcSet,
    pub markers: MarkerSet,
}

impl Datasets {
    /// Fetch the three datasets concurrently from the asset root and validate them.
    pub async fn load(paths: &DatasetPaths) -> anyhow::Result<Self> {
        let (geo, arcs, markers) = futures::try_join!(
            resources::load_string(&paths.countries),
            resources::load_string(&paths.arcs),
            resources::load_string(&paths.markers),
        )?;
        let datasets = Self::from_json(&geo, &arcs, &markers)?;
        log::info!(
            "Loaded {} features, {} arcs and {} markers",
            datasets.features.len(),
            datasets.arcs.len(),
            datasets.markers.len()
        );
        Ok(datasets)
    }

    pub fn from_json(geo: &str, arcs: &str, markers: &str) -> Result<Self, DatasetError> {
        Ok(Self {
            features: parse_features(geo)?,
            arcs: parse_arcs(arcs)?,
            markers: parse_markers(markers)?,
        })
    }
}

const COUNTRIES: &str = "countries";
const ARCS: &str = "arcs";
const MARKERS: &str = "markers";

#[derive(Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, serde_json::Value>>,
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

fn parse_features(json: &str) -> Result<GeoFeatureSet, DatasetError> {
    let raw: RawFeatureCollection =
        serde_json::from_str(json).map_err(|source| DatasetError::Parse {
            dataset: COUNTRIES,
            source,
        })?;

    let mut features = Vec::with_capacity(raw.features.len());
    for (index, feature) in raw.features.into_iter().enumerate() {
        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("name").or_else(|| p.get("admin")))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let polygons = match feature.geometry {
            Some(RawGeometry::Polygon { coordinates }) => vec![to_polygon(index, coordinates)?],
            Some(RawGeometry::MultiPolygon { coordinates }) => coordinates
                .into_iter()
                .map(|p| to_polygon(index, p))
                .collect::<Result<_, _>>()?,
            Some(RawGeometry::Unsupported) | None => {
                log::debug!("Skipping feature {index} without polygon geometry");
                continue;
            }
        };
        features.push(GeoFeature { name, polygons });
    }
    Ok(GeoFeatureSet { features })
}

fn to_polygon(index: usize, rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon, DatasetError> {
    let invalid = |reason: String| DatasetError::InvalidRecord {
        dataset: COUNTRIES,
        index,
        reason,
    };
    if rings.is_empty() {
        return Err(invalid("polygon without rings".to_string()));
    }
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        if ring.len() < 3 {
            return Err(invalid(format!("ring with {} positions", ring.len())));
        }
        let mut positions = Vec::with_capacity(ring.len());
        for position in ring {
            let (lng, lat) = match position.as_slice() {
                [lng, lat, ..] => (*lng as f32, *lat as f32),
                _ => return Err(invalid("position with fewer than two values".to_string())),
            };
            check_lat_lng(lat, lng).map_err(invalid)?;
            positions.push([lng, lat]);
        }
        out.push(positions);
    }
    Ok(Polygon::new(out))
}

fn check_lat_lng(lat: f32, lng: f32) -> Result<(), String> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("longitude {lng} out of range"));
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawArcs {
    pulls: Vec<RawArc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArc {
    order: f32,
    #[serde(default)]
    status: serde_json::Value,
    arc_alt: f32,
    start_lat: f32,
    start_lng: f32,
    end_lat: f32,
    end_lng: f32,
}

/// JavaScript-style truthiness, since the source data only ever tests `status` for it.
fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn parse_arcs(json: &str) -> Result<ArcSet, DatasetError> {
    let raw: RawArcs = serde_json::from_str(json).map_err(|source| DatasetError::Parse {
        dataset: ARCS,
        source,
    })?;
    raw.pulls
        .into_iter()
        .enumerate()
        .map(|(index, arc)| -> Result<ArcRecord, DatasetError> {
            let invalid = |reason: String| DatasetError::InvalidRecord {
                dataset: ARCS,
                index,
                reason,
            };
            check_lat_lng(arc.start_lat, arc.start_lng).map_err(invalid)?;
            check_lat_lng(arc.end_lat, arc.end_lng).map_err(invalid)?;
            if !arc.arc_alt.is_finite() || arc.arc_alt < 0.0 {
                return Err(invalid(format!("arc altitude {} is negative", arc.arc_alt)));
            }
            if !arc.order.is_finite() {
                return Err(invalid("order is not finite".to_string()));
            }
            Ok(ArcRecord {
                order: arc.order,
                status: truthy(&arc.status),
                arc_alt: arc.arc_alt,
                start_lat: arc.start_lat,
                start_lng: arc.start_lng,
                end_lat: arc.end_lat,
                end_lng: arc.end_lng,
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct RawMarkers {
    maps: Vec<RawMarker>,
}

#[derive(Deserialize)]
struct RawMarker {
    lat: f32,
    lng: f32,
}

fn parse_markers(json: &str) -> Result<MarkerSet, DatasetError> {
    let raw: RawMarkers = serde_json::from_str(json).map_err(|source| DatasetError::Parse {
        dataset: MARKERS,
        source,
    })?;
    raw.maps
        .into_iter()
        .enumerate()
        .map(|(index, m)| -> Result<MarkerRecord, DatasetError> {
            check_lat_lng(m.lat, m.lng).map_err(|reason| DatasetError::InvalidRecord {
                dataset: MARKERS,
                index,
                reason,
            })?;
            Ok(MarkerRecord {
                lat: m.lat,
                lng: m.lng,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_truthiness() {
        use serde_json::json;
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("yes")));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn bbox_rejects_far_points_early() {
        let polygon = Polygon::new(vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 0.0]]]);
        assert_eq!(polygon.bbox, [0.0, 0.0, 10.0, 10.0]);
        assert!(!polygon.contains([50.0, 5.0]));
        assert!(polygon.contains([8.0, 2.0]));
    }

    #[test]
    fn holes_are_excluded() {
        let polygon = Polygon::new(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]],
        ]);
        assert!(polygon.contains([2.0, 2.0]));
        assert!(!polygon.contains([5.0, 5.0]));
    }

    #[test]
    fn rings_are_prepared_once() {
        let polygon = Polygon::new(vec![
            vec![[170.0, -10.0], [-170.0, -10.0], [-170.0, 10.0], [170.0, 10.0]],
            vec![[175.0, -2.0], [-175.0, -2.0], [-175.0, 2.0], [175.0, 2.0]],
        ]);
        assert_eq!(polygon.prepared.len(), polygon.rings.len());
        assert!(polygon.wraps_antimeridian());
        assert!(polygon.contains([-172.0, 5.0]));
        assert!(!polygon.contains([180.0, 0.0]));
    }
}
