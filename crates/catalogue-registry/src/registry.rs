//! Registry contract - the storage engine behind every bundle.
//!
//! Rows are addressed by `(resource type, catalogue, id, published)`. Writes
//! take a precondition so callers get insert-if-absent and optimistic
//! concurrency at the storage boundary instead of lookup-then-insert.

use async_trait::async_trait;
use catalogue_core::{Catalogue, Result, CATALOGUE_TYPE};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Address of a stored row.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub resource_type: String,
    pub catalogue_id: String,
    pub id: String,
    pub published: bool,
}

impl RecordKey {
    pub fn new(
        resource_type: impl Into<String>,
        catalogue_id: impl Into<String>,
        id: impl Into<String>,
        published: bool,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            catalogue_id: catalogue_id.into(),
            id: id.into(),
            published,
        }
    }

    pub fn with_type(&self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.published { "public" } else { "source" };
        write!(f, "{}/{}/{}@{}", self.resource_type, self.catalogue_id, self.id, level)
    }
}

/// Indexed fields plus the serialized bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub catalogue_id: String,
    pub published: bool,
    pub status: String,
    pub active: bool,
    /// Source id for public rows, the row's own id otherwise.
    pub original_id: String,
    pub payload: serde_json::Value,
}

impl Document {
    pub fn key(&self, resource_type: &str) -> RecordKey {
        RecordKey::new(resource_type, &self.catalogue_id, &self.id, self.published)
    }
}

/// Catalogue rows share the registry with resource rows.
pub fn catalogue_document(catalogue: &Catalogue) -> Result<Document> {
    Ok(Document {
        id: catalogue.catalogue_id.clone(),
        catalogue_id: catalogue.catalogue_id.clone(),
        published: false,
        status: catalogue.status.clone(),
        active: catalogue.active,
        original_id: catalogue.catalogue_id.clone(),
        payload: serde_json::to_value(catalogue)?,
    })
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub resource_type: String,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
    pub document: Document,
}

impl Record {
    pub fn key(&self) -> RecordKey {
        self.document.key(&self.resource_type)
    }
}

/// Precondition for conditional writes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WritePrecondition {
    /// Write only if no row exists under the key.
    DoesNotExist,
    /// Write only if the stored row still carries this version.
    MatchesVersion(u64),
    /// Write unconditionally.
    None,
}

/// Outcome of a conditional write. A failed precondition is a normal
/// result, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteResult {
    Success { version: u64 },
    PreconditionFailed { current_version: Option<u64> },
}

impl WriteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Exact-match filter over indexed fields. `None` fields match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub resource_type: String,
    pub catalogue_id: Option<String>,
    pub id: Option<String>,
    pub published: Option<bool>,
    pub status: Option<String>,
    pub active: Option<bool>,
    pub original_id: Option<String>,
}

impl RecordQuery {
    pub fn of_type(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    pub fn catalogue(mut self, catalogue_id: impl Into<String>) -> Self {
        self.catalogue_id = Some(catalogue_id.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn original_id(mut self, original_id: impl Into<String>) -> Self {
        self.original_id = Some(original_id.into());
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let doc = &record.document;
        record.resource_type == self.resource_type
            && self.catalogue_id.as_ref().map_or(true, |c| *c == doc.catalogue_id)
            && self.id.as_ref().map_or(true, |i| *i == doc.id)
            && self.published.map_or(true, |p| p == doc.published)
            && self.status.as_ref().map_or(true, |s| *s == doc.status)
            && self.active.map_or(true, |a| a == doc.active)
            && self.original_id.as_ref().map_or(true, |o| *o == doc.original_id)
    }

    /// Catalogues that take part in identifier resolution.
    pub fn approved_catalogues() -> Self {
        Self::of_type(CATALOGUE_TYPE)
            .status(catalogue_core::status::APPROVED_CATALOGUE)
            .active(true)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub from: usize,
    pub quantity: usize,
}

impl PageRequest {
    pub fn new(from: usize, quantity: usize) -> Self {
        Self { from, quantity }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { from: 0, quantity: 10 }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub field: String,
    pub values: Vec<FacetValue>,
}

/// One page of results; `total` counts every match, not just this page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Paging<T> {
    pub total: usize,
    pub from: usize,
    pub to: usize,
    pub results: Vec<T>,
    pub facets: Vec<Facet>,
}

impl<T> Paging<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paging<U> {
        Paging {
            total: self.total,
            from: self.from,
            to: self.to,
            results: self.results.into_iter().map(f).collect(),
            facets: self.facets,
        }
    }

    /// Page over an already filtered, ordered result set. Facets count the
    /// whole set.
    pub fn slice(all: Vec<T>, page: PageRequest, record: impl Fn(&T) -> &Record) -> Self {
        let total = all.len();
        let from = page.from.min(total);
        let to = from.saturating_add(page.quantity).min(total);
        let facets = facets(all.iter().map(record));
        let results = all.into_iter().skip(from).take(to - from).collect();
        Paging { total, from, to, results, facets }
    }

    /// `true` when a following page may hold more results.
    pub fn has_more(&self) -> bool {
        self.to < self.total
    }
}

/// Counts on `status`, `active` and `catalogue_id`.
pub fn facets<'a>(records: impl Iterator<Item = &'a Record>) -> Vec<Facet> {
    let mut status: BTreeMap<String, usize> = BTreeMap::new();
    let mut active: BTreeMap<String, usize> = BTreeMap::new();
    let mut catalogue: BTreeMap<String, usize> = BTreeMap::new();
    for r in records {
        *status.entry(r.document.status.clone()).or_default() += 1;
        *active.entry(r.document.active.to_string()).or_default() += 1;
        *catalogue.entry(r.document.catalogue_id.clone()).or_default() += 1;
    }
    [("status", status), ("active", active), ("catalogue_id", catalogue)]
        .into_iter()
        .map(|(field, counts)| Facet {
            field: field.to_string(),
            values: counts
                .into_iter()
                .map(|(value, count)| FacetValue { value, count })
                .collect(),
        })
        .collect()
}

/// The storage engine. Implementations must make each write atomic with
/// respect to its precondition.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Insert under `resource_type` if no row exists for the document's key.
    async fn add_resource(&self, resource_type: &str, document: Document) -> Result<WriteResult>;

    /// Replace an existing row. Returns `Error::NotFound` if the key is absent.
    async fn update_resource(
        &self,
        resource_type: &str,
        document: Document,
        precondition: WritePrecondition,
    ) -> Result<WriteResult>;

    /// Remove a row. Returns whether a row was removed.
    async fn delete_resource(&self, key: &RecordKey) -> Result<bool>;

    /// Move a row to another type in one step, keeping its document.
    async fn change_resource_type(&self, key: &RecordKey, new_type: &str) -> Result<Record>;

    async fn search_exact(&self, key: &RecordKey) -> Result<Option<Record>>;

    async fn search_query(&self, query: &RecordQuery) -> Result<Vec<Record>>;

    async fn get_all(&self, query: &RecordQuery, page: PageRequest) -> Result<Paging<Record>>;
}
