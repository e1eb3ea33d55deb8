//! Pathway data models.
//!
//! These are the typed records exchanged between the gateway, the pipeline and the host:
//! - `DocumentIdentifier`: what a caller asks for (id + optional revision)
//! - `RemoteDocument`: what the gateway returns for one fetch
//! - `LocalDocumentModel`: the converted, host-openable document
//! - `ReferenceKey`: namespace-qualified cross reference used for search and highlighting
//! - `PathwayInfo` / `SearchResult` / `CurationTag`: browse and search records
//!
//! Models are mostly dumb data. Policy (caching, session state) lives elsewhere.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a remote pathway, optionally pinned to a revision.
///
/// A revision of `None` (or zero on the wire) means "latest".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentIdentifier {
    pub id: String,
    pub revision: Option<u64>,
}

impl DocumentIdentifier {
    /// Build an identifier; a zero revision is normalized to "latest".
    pub fn new(id: impl Into<String>, revision: Option<u64>) -> Self {
        Self {
            id: id.into(),
            revision: revision.filter(|r| *r != 0),
        }
    }

    pub fn latest(id: impl Into<String>) -> Self {
        Self::new(id, None)
    }

    /// Revision as sent to the service: `0` for latest.
    pub fn wire_revision(&self) -> u64 {
        self.revision.unwrap_or(0)
    }

    pub fn is_latest(&self) -> bool {
        self.revision.is_none()
    }
}

impl fmt::Display for DocumentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.revision {
            Some(r) => write!(f, "{} (r{})", self.id, r),
            None => write!(f, "{} (latest)", self.id),
        }
    }
}

/// A pathway as returned by one fetch-by-id call.
///
/// `id` and `revision` are the values resolved by the service, which may differ from the
/// request when "latest" was asked for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub revision: u64,
    pub name: String,
    pub species: String,
    pub url: String,
    /// Raw GPML payload.
    pub gpml: String,
}

impl RemoteDocument {
    pub fn identifier(&self) -> DocumentIdentifier {
        DocumentIdentifier::new(self.id.clone(), Some(self.revision))
    }
}

/// Namespace-qualified external identifier (a database name plus an id in that database).
///
/// Equality is structural over both fields.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceKey {
    pub namespace: String,
    pub identifier: String,
}

impl ReferenceKey {
    pub fn new(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
        }
    }

    /// A key is usable for lookups only if it names its namespace.
    pub fn has_namespace(&self) -> bool {
        !self.namespace.trim().is_empty()
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.identifier)
    }
}

/// Error returned when a `namespace:identifier` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid reference key {0:?}: expected namespace:identifier")]
pub struct ParseReferenceKeyError(pub String);

impl FromStr for ReferenceKey {
    type Err = ParseReferenceKeyError;

    /// Splits at the first `:` so identifiers such as `CHEBI:15422` survive intact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ns, id) = s
            .split_once(':')
            .ok_or_else(|| ParseReferenceKeyError(s.to_string()))?;
        if ns.trim().is_empty() || id.trim().is_empty() {
            return Err(ParseReferenceKeyError(s.to_string()));
        }
        Ok(Self::new(ns.trim(), id.trim()))
    }
}

/// Axis-aligned bounding region in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Build from a center point and size, as GPML stores node graphics.
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }
}

/// One data node of a converted pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataNode {
    pub graph_id: Option<String>,
    pub label: String,
    pub reference: Option<ReferenceKey>,
    pub bounds: Region,
}

/// The converted, locally editable representation of a remote pathway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalDocumentModel {
    /// Resolved identifier, when the model came from the service.
    pub identifier: Option<DocumentIdentifier>,
    pub name: String,
    pub species: String,
    /// Data nodes in document order.
    pub elements: Vec<DataNode>,
    /// Serialized GPML written to the cache and handed to the host.
    pub gpml: String,
}

impl LocalDocumentModel {
    pub fn to_bytes(&self) -> &[u8] {
        self.gpml.as_bytes()
    }
}

/// Summary record for a pathway, as listed by browse and search calls.
///
/// Equality and hashing only consider the identifying fields (`id`, `revision`) so that
/// browse results collected into a set collapse duplicates of the same pathway revision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathwayInfo {
    pub id: String,
    pub url: String,
    pub name: String,
    pub species: String,
    pub revision: String,
}

impl PartialEq for PathwayInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.revision == other.revision
    }
}

impl Eq for PathwayInfo {}

impl Hash for PathwayInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.revision.hash(state);
    }
}

impl PathwayInfo {
    /// Identifier for opening this pathway at the listed revision.
    pub fn identifier(&self) -> DocumentIdentifier {
        DocumentIdentifier::new(self.id.clone(), self.revision.trim().parse().ok())
    }
}

/// One hit of a text, literature or reference search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub info: PathwayInfo,
    pub score: Option<f64>,
    /// Matched index fields, by name.
    pub fields: BTreeMap<String, String>,
}

/// A curation tag attached to a pathway revision.
///
/// Identity is `(name, pathway id)`: one tag of a given name per pathway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationTag {
    pub name: String,
    pub display_name: String,
    pub pathway: PathwayInfo,
    pub revision: String,
    pub text: String,
    pub time_modified: String,
    pub user_modified: String,
}

impl PartialEq for CurationTag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pathway.id == other.pathway.id
    }
}

impl Eq for CurationTag {}

impl Hash for CurationTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.pathway.id.hash(state);
    }
}
