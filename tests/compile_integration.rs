//! End-to-end tests for the description compiler.
//!
//! These tests run whole deed records through the public API and check
//! the emitted GeoJSON features, including determinism of the full
//! pipeline.

use aliquot_compiler::{
    CompileError, CompilerOptions, CornerCode, CornerKey, CornerRegistry, DeedRecord, Description,
    DescriptionCompiler, Geometry, ProjectedPoint, ShapeKind, TraverseError, TraverseSpec,
};
use aliquot_compiler::types::feature::{PROP_INTERPOLATED, PROP_METHOD, PROP_SOURCE};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// A perfectly square section 12 of township 24S range 27E, placed
/// near the EPSG:2236 zone origin so reprojection stays well behaved.
fn section_registry() -> CornerRegistry {
    let mut registry = CornerRegistry::new();
    let east = 656166.67;
    let north = 100000.0;
    let points = [
        (CornerCode::Nw, 0.0, 5280.0),
        (CornerCode::N, 2640.0, 5280.0),
        (CornerCode::Ne, 5280.0, 5280.0),
        (CornerCode::W, 0.0, 2640.0),
        (CornerCode::C, 2640.0, 2640.0),
        (CornerCode::E, 5280.0, 2640.0),
        (CornerCode::Sw, 0.0, 0.0),
        (CornerCode::S, 2640.0, 0.0),
        (CornerCode::Se, 5280.0, 0.0),
    ];
    for (code, x, y) in points {
        registry.insert(
            CornerKey::new(24, 27, 12, code),
            ProjectedPoint::new(east + x, north + y),
        );
    }
    registry
}

fn text_record(id: &str, text: &str) -> DeedRecord {
    DeedRecord::new(id, Description::Text(text.to_string()))
}

fn square_traverse(id: &str, closing_distance: f64) -> DeedRecord {
    let spec = TraverseSpec {
        origin: "24 27 12 SE".to_string(),
        beginning: vec!["N 0 0 0 W 200".to_string()],
        shape: vec![
            "N 0 0 0 W 300".to_string(),
            "N 90 0 0 W 300".to_string(),
            "S 0 0 0 W 300".to_string(),
            format!("N 90 0 0 E {closing_distance}"),
        ],
        kind: ShapeKind::Outline,
        width: None,
    };
    DeedRecord::new(id, Description::Traverse(spec))
}

// ─────────────────────────────────────────────────────────────────────────────
// Aliquot pipeline
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_aliquot_quarter_of_quarter_end_to_end() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let record = text_record(
        "DOCA1",
        "That certain parcel being the NW 1/4 of the SE 1/4 of Section 12, \
         Township 24 South, Range 27 East, Orange County, Florida",
    );
    let features = compiler.compile(&record).unwrap();
    assert_eq!(features.len(), 1);

    let feature = &features[0];
    assert_eq!(feature.id, "DOCA1");
    assert_eq!(feature.properties[PROP_METHOD], "plss");
    assert_eq!(feature.properties[PROP_SOURCE], "orccompt");
    match &feature.geometry {
        Geometry::Polygon { coordinates } => {
            assert_eq!(coordinates.len(), 1);
            // Four corners, ring left open.
            assert_eq!(coordinates[0].len(), 4);
            assert_ne!(coordinates[0][0], coordinates[0][3]);
            // Geographic WGS84, lon first: west of the central
            // meridian, low northing latitude.
            for position in &coordinates[0] {
                assert!(position[0] > -82.0 && position[0] < -80.0, "{position:?}");
                assert!(position[1] > 24.0 && position[1] < 26.0, "{position:?}");
            }
        }
        other => panic!("unexpected geometry: {other:?}"),
    }
}

#[test]
fn test_ocr_hyphenation_still_compiles() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let record = text_record(
        "DOCA2",
        "the se 1/4 of sec- tion 12, town- ship 24 s, range 27 e",
    );
    let features = compiler.compile(&record).unwrap();
    assert_eq!(features.len(), 1);
}

#[test]
fn test_lot_and_subdivision_clause_yields_no_feature() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let record = text_record(
        "DOCA3",
        "Lots 3 and 4 of SUNSET HILLS SUBDIVISION of Section 12, \
         Township 24 South, Range 27 East",
    );
    let features = compiler.compile(&record).unwrap();
    assert!(features.is_empty());
}

#[test]
fn test_missing_section_corners_yield_empty_not_error() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let record = text_record(
        "DOCA4",
        "The NE 1/4 of Section 36, Township 24 South, Range 27 East",
    );
    let features = compiler.compile(&record).unwrap();
    assert!(features.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Traverse pipeline
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_closed_traverse_snaps_small_closure_gap() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    // Closing call is 0.6 ft short, inside the 1 ft threshold.
    let features = compiler.compile(&square_traverse("DOCT1", 299.4)).unwrap();

    let aggregate = features.last().unwrap();
    match &aggregate.geometry {
        Geometry::Polygon { coordinates } => {
            let ring = &coordinates[0];
            // POB, three corners, snapped endpoint equal to POB.
            assert_eq!(ring.len(), 5);
            assert_eq!(ring[0], ring[4]);
        }
        other => panic!("unexpected geometry: {other:?}"),
    }
    // Every boundary vertex is a surveyed line endpoint here.
    for vertex in &features[..features.len() - 1] {
        assert_eq!(vertex.properties[PROP_INTERPOLATED], "no");
    }
}

#[test]
fn test_closed_traverse_closure_mismatch_when_required() {
    let options = CompilerOptions {
        require_closure: true,
        ..CompilerOptions::default()
    };
    let mut compiler = DescriptionCompiler::with_options(section_registry(), options);
    // 5 ft short of the point of beginning.
    let err = compiler.compile(&square_traverse("DOCT2", 295.0)).unwrap_err();
    match err {
        CompileError::Traverse {
            source: TraverseError::ClosureMismatch { offset },
            ..
        } => assert!((offset - 5.0).abs() < 1e-6, "offset {offset}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_centerline_traverse_emits_linestring() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let spec = TraverseSpec {
        origin: "24 27 12 SW".to_string(),
        beginning: vec![],
        shape: vec![
            "N 45 0 0 E 100".to_string(),
            "N 45 0 0 W 100".to_string(),
        ],
        kind: ShapeKind::Centerline,
        width: Some(30.0),
    };
    let record = DeedRecord::new("DOCT3", Description::Traverse(spec));
    let features = compiler.compile(&record).unwrap();

    let aggregate = features.last().unwrap();
    assert_eq!(aggregate.properties[PROP_METHOD], "metes-bounds");
    match &aggregate.geometry {
        Geometry::LineString { coordinates } => assert_eq!(coordinates.len(), 3),
        other => panic!("unexpected geometry: {other:?}"),
    }
}

#[test]
fn test_curve_calls_emit_interpolated_vertices() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let spec = TraverseSpec {
        origin: "24 27 12 SW".to_string(),
        beginning: vec![],
        shape: vec![
            "N 0 0 0 E 100".to_string(),
            // 10 degrees of arc at 2 degrees per chord: 5 chords, the
            // first 4 flagged interpolated.
            "R 500 10 0 0".to_string(),
        ],
        kind: ShapeKind::Centerline,
        width: None,
    };
    let record = DeedRecord::new("DOCT4", Description::Traverse(spec));
    let features = compiler.compile(&record).unwrap();

    // POB + line endpoint + 5 chord endpoints + aggregate linestring.
    assert_eq!(features.len(), 8);
    let flags: Vec<&str> = features[..7]
        .iter()
        .map(|f| f.properties[PROP_INTERPOLATED].as_str().unwrap())
        .collect();
    assert_eq!(flags, ["no", "no", "yes", "yes", "yes", "yes", "no"]);
}

#[test]
fn test_unknown_origin_corner_is_an_error() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let spec = TraverseSpec {
        origin: "31 28 6 NW".to_string(),
        beginning: vec![],
        shape: vec!["N 0 0 0 E 100".to_string()],
        kind: ShapeKind::Outline,
        width: None,
    };
    let record = DeedRecord::new("DOCT5", Description::Traverse(spec));
    let err = compiler.compile(&record).unwrap_err();
    assert!(matches!(err, CompileError::UnresolvedOrigin { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Aliases, batches, determinism
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_alias_reuses_geometry_computed_earlier_in_the_run() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let first = compiler.compile(&square_traverse("DOCX1", 300.0)).unwrap();
    let aggregate = first.last().unwrap().geometry.clone();

    let alias = DeedRecord::new(
        "DOCX1",
        Description::Alias("as described in instrument DOCX1".to_string()),
    );
    let aliased = compiler.compile(&alias).unwrap();
    assert_eq!(aliased.len(), 1);
    assert_eq!(aliased[0].geometry, aggregate);
}

#[test]
fn test_batch_skips_failing_documents() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let records = vec![
        DeedRecord::new("DOCX2", Description::Alias("never computed".to_string())),
        text_record(
            "DOCX3",
            "The SW 1/4 of Section 12, Township 24 South, Range 27 East",
        ),
        square_traverse("DOCX4", 300.0),
    ];
    let collection = compiler.compile_batch(&records);
    let ids: Vec<&str> = collection.features.iter().map(|f| f.id.as_str()).collect();
    assert!(!ids.contains(&"DOCX2"));
    assert!(ids.contains(&"DOCX3"));
    assert!(ids.contains(&"DOCX4"));
}

#[test]
fn test_compilation_is_deterministic() {
    let records = vec![
        text_record(
            "DOCX5",
            "The NW 1/4 of the SE 1/4 of Section 12, Township 24 South, Range 27 East",
        ),
        square_traverse("DOCX6", 300.0),
    ];

    let mut first = DescriptionCompiler::new(section_registry());
    let mut second = DescriptionCompiler::new(section_registry());
    let a = serde_json::to_string(&first.compile_batch(&records)).unwrap();
    let b = serde_json::to_string(&second.compile_batch(&records)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_feature_collection_serializes_as_geojson() {
    let mut compiler = DescriptionCompiler::new(section_registry());
    let records = vec![text_record(
        "DOCX7",
        "The SE 1/4 of Section 12, Township 24 South, Range 27 East",
    )];
    let collection = compiler.compile_batch(&records);
    let value: serde_json::Value = serde_json::to_value(&collection).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"][0]["type"], "Feature");
    assert_eq!(value["features"][0]["geometry"]["type"], "Polygon");
    assert_eq!(value["features"][0]["properties"]["doc"], "DOCX7");
}
