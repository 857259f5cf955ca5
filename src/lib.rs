//! # aliquot-compiler
//!
//! Compiles free-text U.S. Public Land Survey System legal
//! descriptions into GeoJSON geometry anchored to a registry of
//! surveyed section corners.
//!
//! The compiler answers one question:
//!
//! > Given the words of a recorded deed, where on the ground is the
//! > parcel?
//!
//! ## Pipeline
//!
//! ```text
//! DeedRecord → normalize → grammar scan → AreaAggregate → Quadrilateral
//!                                  ↓                          ↓
//!                          TraverseSpec → build_path → reproject → Feature
//!                                  ↑
//!                          CornerRegistry (surveyed points, EPSG:2236)
//! ```
//!
//! Aliquot clauses ("the NW 1/4 of the SE 1/4 of Section 12 ...") are
//! folded into nested subdivisions of a corner-anchored quadrilateral.
//! Metes-and-bounds traverses (bearing and curve calls) are integrated
//! step by step from a registry corner. Both paths end in the emitter,
//! which reprojects working-grid coordinates to WGS84 and tags every
//! feature with its provenance.
//!
//! ## Determinism
//!
//! - Same registry + same record → byte-identical features
//! - All working geometry is in U.S. survey feet on the state-plane
//!   grid; reprojection happens once, at emission
//! - Batch compilation never aborts: failures are scoped to their
//!   document and logged

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod emitter;
pub mod grammar;
pub mod projection;
pub mod registry;
pub mod subdivision;
pub mod traverse;
pub mod types;

// Re-exports
pub use compiler::{CompileError, CompilerOptions, DescriptionCompiler};
pub use emitter::{GeometryMethod, GEOMETRY_SOURCE};
pub use grammar::{normalize, scan, GrammarError, ScanOutcome};
pub use projection::{GeoPoint, ProjectedPoint, PUBLIC_CRS, WORKING_CRS};
pub use registry::{CornerCode, CornerKey, CornerRegistry, RegistryError};
pub use subdivision::{AreaAggregate, Quadrilateral, SubdivisionError};
pub use traverse::{
    BearingCall, PathOptions, ShapeKind, TraverseError, TraverseOptions, TraverseSpec,
    CLOSURE_THRESHOLD_FEET,
};
pub use types::atom::{Atom, Cardinal, Corner, DistanceUnit, RangeDir, TownshipDir};
pub use types::document::{DeedRecord, Description, DocumentId};
pub use types::feature::{Feature, FeatureCollection, Geometry, Position};
