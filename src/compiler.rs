//! Description compiler front-end.
//!
//! Drives one document through the pipeline its description selects:
//! free text goes through the atom grammar and the aliquot subdivision
//! engine, structured traverses through the metes-and-bounds path
//! builder. Both end at the geometry emitter.
//!
//! ## Clause assembly
//!
//! Atoms from a text description accumulate in encounter order.
//! Arrival of a `Range` atom finalizes the current clause: the buffered
//! atoms are folded into one area aggregate, its geometry computed and
//! emitted, and the buffer reset, so one document can stack several
//! parcel descriptions. A document whose trailing atoms never reach a
//! `Range` yields no feature for them and is logged as incomplete.
//!
//! ## Failure scoping
//!
//! Every failure is scoped to a single document. [`DescriptionCompiler::compile`]
//! reports it; [`DescriptionCompiler::compile_batch`] logs it and moves
//! on to the next document. Nothing here terminates a batch. Within a
//! text description the scope is narrower still: a clause that cannot
//! be computed is logged and skipped without touching the features of
//! earlier clauses.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::emitter::{self, GeometryMethod};
use crate::grammar::{self, GrammarError};
use crate::registry::{CornerKey, CornerRegistry, RegistryError};
use crate::subdivision::AreaAggregate;
use crate::traverse::{
    self, PathOptions, ShapeKind, TraverseError, TraverseOptions, TraverseSpec,
};
use crate::types::document::{DeedRecord, Description, DocumentId};
use crate::types::feature::{Feature, FeatureCollection, Geometry};

/// Compiler tunables.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Call parsing and closure tunables.
    pub traverse: TraverseOptions,
    /// Fail closed traverses that miss their point of beginning by
    /// more than the closure threshold, instead of accepting the raw
    /// endpoint.
    pub require_closure: bool,
    /// Emit the origin corner and the approach to the point of
    /// beginning as vertices.
    pub include_origin: bool,
}

/// Error raised while compiling one document.
///
/// Every variant names the document it is scoped to.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A matched atom carried an unparseable field.
    #[error("{document}: {source}")]
    Grammar {
        /// Offending document.
        document: DocumentId,
        /// Underlying grammar error.
        source: GrammarError,
    },
    /// A traverse failed to parse or close.
    #[error("{document}: {source}")]
    Traverse {
        /// Offending document.
        document: DocumentId,
        /// Underlying traverse error.
        source: TraverseError,
    },
    /// A traverse origin label did not parse.
    #[error("{document}: {source}")]
    BadOrigin {
        /// Offending document.
        document: DocumentId,
        /// Underlying registry error.
        source: RegistryError,
    },
    /// A traverse origin corner is absent from the registry.
    #[error("{document}: origin corner not in registry: {key}")]
    UnresolvedOrigin {
        /// Offending document.
        document: DocumentId,
        /// The missing corner.
        key: CornerKey,
    },
    /// An alias description references geometry never computed.
    #[error("{document}: unknown geometry alias {alias:?}")]
    UnknownAlias {
        /// Offending document.
        document: DocumentId,
        /// The alias string.
        alias: String,
    },
}

/// Compiles deed records into geometry features.
///
/// Holds the read-only corner registry and the per-run alias cache.
/// Compilation itself is a pure function of the inputs: the same record
/// against the same registry always yields byte-identical features.
pub struct DescriptionCompiler {
    registry: CornerRegistry,
    options: CompilerOptions,
    /// Aggregate geometry by document id, written after every computed
    /// geometry. Read only when a description is a bare string alias.
    geometry_cache: HashMap<DocumentId, (Geometry, GeometryMethod)>,
}

impl DescriptionCompiler {
    /// Create a compiler over a corner registry with default options.
    pub fn new(registry: CornerRegistry) -> Self {
        Self::with_options(registry, CompilerOptions::default())
    }

    /// Create a compiler with explicit options.
    pub fn with_options(registry: CornerRegistry, options: CompilerOptions) -> Self {
        Self {
            registry,
            options,
            geometry_cache: HashMap::new(),
        }
    }

    /// The registry this compiler resolves corners against.
    pub fn registry(&self) -> &CornerRegistry {
        &self.registry
    }

    /// Compile one document into zero or more features.
    ///
    /// Zero features with `Ok` is a normal outcome: descriptions with
    /// no recognizable clause, lot/subdivision-only clauses, and
    /// missing registry corners all yield nothing plus a diagnostic.
    /// Subdivision failures are scoped to their clause, so one bad
    /// clause never discards features from earlier clauses of the
    /// same document.
    pub fn compile(&mut self, record: &DeedRecord) -> Result<Vec<Feature>, CompileError> {
        match &record.description {
            Description::Text(text) => self.compile_text(record, text),
            Description::Traverse(spec) => self.compile_traverse(record, spec),
            Description::Alias(alias) => self.compile_alias(record, alias),
        }
    }

    /// Compile a batch, logging per-document failures and continuing.
    pub fn compile_batch<'a, I>(&mut self, records: I) -> FeatureCollection
    where
        I: IntoIterator<Item = &'a DeedRecord>,
    {
        let mut features = Vec::new();
        for record in records {
            match self.compile(record) {
                Ok(compiled) => features.extend(compiled),
                Err(error) => {
                    warn!(document = %record.document_id, %error, "skipping document");
                }
            }
        }
        FeatureCollection::new(features)
    }

    fn compile_text(
        &mut self,
        record: &DeedRecord,
        text: &str,
    ) -> Result<Vec<Feature>, CompileError> {
        let normalized = grammar::normalize(text);
        let outcome = grammar::scan(&normalized).map_err(|source| CompileError::Grammar {
            document: record.document_id.clone(),
            source,
        })?;

        let mut features = Vec::new();
        let mut aggregate = AreaAggregate::new();
        for atom in outcome.atoms {
            // Range closes a description group by domain convention.
            let terminal = matches!(atom, crate::types::atom::Atom::Range { .. });
            aggregate.absorb(atom);
            if !terminal {
                continue;
            }

            match aggregate.compute(&self.registry) {
                Ok(Some(quad)) => {
                    let feature = emitter::quadrilateral_feature(record, &quad);
                    self.geometry_cache.insert(
                        record.document_id.clone(),
                        (feature.geometry.clone(), GeometryMethod::Plss),
                    );
                    features.push(feature);
                }
                Ok(None) => {
                    debug!(document = %record.document_id, "clause yielded no geometry");
                }
                // A failing clause leaves its own geometry empty;
                // features from earlier clauses of the same document
                // stand.
                Err(error) => {
                    warn!(document = %record.document_id, %error, "clause yielded no geometry");
                }
            }
            aggregate = AreaAggregate::new();
        }

        if !aggregate.is_blank() {
            warn!(
                document = %record.document_id,
                "description incomplete: trailing atoms without a terminating range"
            );
        }
        Ok(features)
    }

    fn compile_traverse(
        &mut self,
        record: &DeedRecord,
        spec: &TraverseSpec,
    ) -> Result<Vec<Feature>, CompileError> {
        let key = CornerKey::from_label(&spec.origin).map_err(|source| CompileError::BadOrigin {
            document: record.document_id.clone(),
            source,
        })?;
        let origin = self
            .registry
            .get(&key)
            .ok_or_else(|| CompileError::UnresolvedOrigin {
                document: record.document_id.clone(),
                key,
            })?;

        let traverse_error = |source| CompileError::Traverse {
            document: record.document_id.clone(),
            source,
        };
        let beginning = traverse::parse_calls(&spec.beginning, &self.options.traverse, None)
            .map_err(traverse_error)?;
        let entering = beginning.last().map(|call| call.bearing);
        let shape = traverse::parse_calls(&spec.shape, &self.options.traverse, entering)
            .map_err(traverse_error)?;

        let closed = spec.kind == ShapeKind::Outline;
        let path = PathOptions {
            include_origin: self.options.include_origin,
            closed,
            // Centerlines never require closure.
            require_closure: self.options.require_closure && closed,
        };
        let points = traverse::build_path(origin, &beginning, &shape, &path, &self.options.traverse)
            .map_err(traverse_error)?;

        let features = emitter::traverse_features(record, &points, spec.kind);
        if let Some(aggregate) = features.last() {
            self.geometry_cache.insert(
                record.document_id.clone(),
                (aggregate.geometry.clone(), GeometryMethod::MetesBounds),
            );
        }
        Ok(features)
    }

    fn compile_alias(
        &mut self,
        record: &DeedRecord,
        alias: &str,
    ) -> Result<Vec<Feature>, CompileError> {
        // The cache is keyed by the document's own id; the alias string
        // itself only marks the description as a reference.
        match self.geometry_cache.get(&record.document_id) {
            Some((geometry, method)) => Ok(vec![emitter::alias_feature(
                record,
                geometry.clone(),
                *method,
            )]),
            None => Err(CompileError::UnknownAlias {
                document: record.document_id.clone(),
                alias: alias.to_string(),
            }),
        }
    }
}
