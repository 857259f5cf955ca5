//! GeoJSON-compatible output features.
//!
//! A deliberately small model: just the geometry kinds the compiler
//! emits, serialized in GeoJSON field spelling so the output plugs into
//! any GeoJSON consumer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coordinate pair in GeoJSON order: longitude, latitude.
pub type Position = [f64; 2];

/// Provenance property: where the geometry came from.
pub const PROP_SOURCE: &str = "source:geometry";
/// Provenance property: how the geometry was derived.
pub const PROP_METHOD: &str = "source:geometry:method";
/// Provenance property: URL of the source document.
pub const PROP_URL: &str = "source:geometry:url";
/// Vertex audit property: whether the vertex approximates a curve.
pub const PROP_INTERPOLATED: &str = "source:geometry:interpolated";

/// Geometry of an emitted feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Single vertex.
    Point {
        /// The vertex.
        coordinates: Position,
    },
    /// Open path.
    LineString {
        /// Path vertices in order.
        coordinates: Vec<Position>,
    },
    /// Polygon as a list of rings; the compiler emits exactly one
    /// exterior ring.
    Polygon {
        /// Rings, exterior first.
        coordinates: Vec<Vec<Position>>,
    },
}

/// One emitted feature: geometry plus identifying and provenance
/// properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `"Feature"`.
    #[serde(rename = "type")]
    kind: String,
    /// Document id this feature was compiled from.
    pub id: String,
    /// The geometry.
    pub geometry: Geometry,
    /// Original metadata plus provenance tags.
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Create a feature.
    pub fn new(id: impl Into<String>, geometry: Geometry, properties: Map<String, Value>) -> Self {
        Self {
            kind: "Feature".to_string(),
            id: id.into(),
            geometry,
            properties,
        }
    }
}

/// A set of emitted features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type")]
    kind: String,
    /// The features, in emission order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Create a collection from emitted features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
