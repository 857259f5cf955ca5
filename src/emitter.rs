//! Geometry emitter.
//!
//! Packages computed working-grid geometry as GeoJSON-compatible
//! features: per-vertex Point features tagged with their interpolation
//! flag for spatial-quality auditing, plus one aggregate Polygon or
//! LineString. Coordinates are reprojected to geographic WGS84 here,
//! at the last possible moment, and every feature carries provenance
//! properties identifying the source document and derivation method.

use std::fmt;

use serde_json::{Map, Value};

use crate::projection::{reproject, GeoPoint, ProjectedPoint};
use crate::subdivision::Quadrilateral;
use crate::traverse::ShapeKind;
use crate::types::document::{DeedRecord, DocumentId};
use crate::types::feature::{
    Feature, Geometry, Position, PROP_INTERPOLATED, PROP_METHOD, PROP_SOURCE, PROP_URL,
};

/// Identifier of the recorder whose documents this compiler reads.
pub const GEOMETRY_SOURCE: &str = "orccompt";

/// Recorder download URL for a document.
pub fn recorder_url(id: &DocumentId) -> String {
    format!(
        "http://or.occompt.com/recorder/eagleweb/downloads/{0}.pdf?parent={0}",
        id
    )
}

/// How a feature's geometry was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryMethod {
    /// Aliquot subdivision anchored to surveyed PLSS corners.
    Plss,
    /// Metes-and-bounds traverse integration.
    MetesBounds,
}

impl fmt::Display for GeometryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plss => write!(f, "plss"),
            Self::MetesBounds => write!(f, "metes-bounds"),
        }
    }
}

/// Document metadata plus provenance tags, shared by every feature
/// emitted for one document.
fn base_properties(record: &DeedRecord, method: GeometryMethod) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("doc".to_string(), Value::from(record.document_id.as_str()));
    if let Some(date) = record.filing_date {
        properties.insert(
            "date".to_string(),
            Value::from(date.format("%Y-%m-%d").to_string()),
        );
    }
    if let Some(desc) = &record.desc {
        properties.insert("desc".to_string(), Value::from(desc.as_str()));
    }
    let url = record
        .url
        .clone()
        .unwrap_or_else(|| recorder_url(&record.document_id));
    properties.insert("url".to_string(), Value::from(url.clone()));
    for (key, value) in &record.properties {
        properties.insert(key.clone(), value.clone());
    }
    properties.insert(PROP_SOURCE.to_string(), Value::from(GEOMETRY_SOURCE));
    properties.insert(PROP_METHOD.to_string(), Value::from(method.to_string()));
    properties.insert(PROP_URL.to_string(), Value::from(url));
    properties
}

fn position(point: GeoPoint) -> Position {
    point.position()
}

/// Package an aliquot quadrilateral as a polygon feature.
///
/// The ring carries the four corners in winding order and does not
/// repeat the first vertex.
pub fn quadrilateral_feature(record: &DeedRecord, quad: &Quadrilateral) -> Feature {
    let flagged: Vec<(ProjectedPoint, bool)> =
        quad.corners().into_iter().map(|p| (p, false)).collect();
    let ring: Vec<Position> = reproject(&flagged)
        .into_iter()
        .map(|(point, _)| position(point))
        .collect();
    Feature::new(
        record.document_id.as_str(),
        Geometry::Polygon {
            coordinates: vec![ring],
        },
        base_properties(record, GeometryMethod::Plss),
    )
}

/// Package previously computed geometry under a new document's
/// metadata. Used when a description is an alias into the geometry
/// cache rather than a fresh derivation.
pub fn alias_feature(record: &DeedRecord, geometry: Geometry, method: GeometryMethod) -> Feature {
    Feature::new(
        record.document_id.as_str(),
        geometry,
        base_properties(record, method),
    )
}

/// Package a traverse path as vertex Point features plus the aggregate
/// Polygon or LineString.
pub fn traverse_features(
    record: &DeedRecord,
    points: &[(ProjectedPoint, bool)],
    kind: ShapeKind,
) -> Vec<Feature> {
    let geographic = reproject(points);
    let base = base_properties(record, GeometryMethod::MetesBounds);

    let mut features = Vec::with_capacity(geographic.len() + 1);
    for &(point, interpolated) in &geographic {
        let mut properties = base.clone();
        properties.insert(
            PROP_INTERPOLATED.to_string(),
            Value::from(if interpolated { "yes" } else { "no" }),
        );
        features.push(Feature::new(
            record.document_id.as_str(),
            Geometry::Point {
                coordinates: position(point),
            },
            properties,
        ));
    }

    let coordinates: Vec<Position> = geographic
        .iter()
        .map(|&(point, _)| position(point))
        .collect();
    let aggregate = match kind {
        ShapeKind::Outline => Geometry::Polygon {
            coordinates: vec![coordinates],
        },
        ShapeKind::Centerline => Geometry::LineString { coordinates },
    };
    features.push(Feature::new(
        record.document_id.as_str(),
        aggregate,
        base,
    ));
    features
}
