//! Core types for the description compiler.

pub mod atom;
pub mod document;
pub mod feature;

pub use atom::{Atom, Cardinal, Corner, DistanceUnit, RangeDir, TownshipDir};
pub use document::{DeedRecord, Description, DocumentId};
pub use feature::{Feature, FeatureCollection, Geometry, Position};
