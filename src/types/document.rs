//! Input records: one deed document per compilation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::traverse::TraverseSpec;

/// Recorder-assigned document identifier, e.g. `"DOCC547925"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identifier from its recorder spelling.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The land-description payload of a document, selecting the pipeline
/// that compiles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Description {
    /// Free OCR text containing PLSS aliquot language.
    Text(String),
    /// Structured metes-and-bounds traverse.
    Traverse(TraverseSpec),
    /// Bare-string reference resolved against previously computed
    /// geometry.
    Alias(String),
}

/// One document to compile: identity, filing metadata, and its land
/// description.
///
/// Records are consumed independently; no state carries from one
/// document to the next except the explicitly documented alias cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeedRecord {
    /// Recorder document id. Becomes the feature id.
    pub document_id: DocumentId,
    /// Date the document was filed.
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    /// Short human description ("Warranty deed", road name, ...).
    #[serde(default)]
    pub desc: Option<String>,
    /// Source URL override. When absent the recorder download URL is
    /// derived from the document id.
    #[serde(default)]
    pub url: Option<String>,
    /// Additional metadata carried through onto emitted features.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// The land description to compile.
    pub description: Description,
}

impl DeedRecord {
    /// Create a record with just an id and description.
    pub fn new(document_id: impl Into<DocumentId>, description: Description) -> Self {
        Self {
            document_id: document_id.into(),
            filing_date: None,
            desc: None,
            url: None,
            properties: Map::new(),
            description,
        }
    }
}
