//! Types for the persisted work catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable external identifier of a work.
pub type WorkId = i64;

/// Label -> value mapping scraped from a work's "General Information" table.
///
/// Keys are the labels as they appear on the source page. A `BTreeMap` keeps
/// the serialized `raw_metadata` column deterministic across re-ingestion.
pub type WorkMetadata = BTreeMap<String, String>;

/// Canonical attributes of a work.
///
/// These are the fields extraction fills from known labels and the fields an
/// enricher is allowed to complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkFields {
    pub title: String,
    pub composer: String,
    pub instrumentation: String,
    pub style: String,
    pub period: String,
    pub year: String,
    pub key: String,
}

impl WorkFields {
    /// Names of the canonical attributes, in column order.
    pub const NAMES: [&'static str; 7] = [
        "title",
        "composer",
        "instrumentation",
        "style",
        "period",
        "year",
        "key",
    ];

    /// Mutable access to every attribute, paired with its name.
    pub fn fields_mut(&mut self) -> [(&'static str, &mut String); 7] {
        [
            ("title", &mut self.title),
            ("composer", &mut self.composer),
            ("instrumentation", &mut self.instrumentation),
            ("style", &mut self.style),
            ("period", &mut self.period),
            ("year", &mut self.year),
            ("key", &mut self.key),
        ]
    }

    /// Attribute values, in the same order as [`WorkFields::NAMES`].
    pub fn values(&self) -> [&str; 7] {
        [
            &self.title,
            &self.composer,
            &self.instrumentation,
            &self.style,
            &self.period,
            &self.year,
            &self.key,
        ]
    }

    /// Number of attributes that are still empty.
    pub fn missing_count(&self) -> usize {
        self.values().iter().filter(|v| v.trim().is_empty()).count()
    }
}

/// A work as persisted in the catalog table.
///
/// Re-ingesting the same `id` replaces every other column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// External catalog id (primary key).
    pub id: WorkId,
    /// Canonical attributes.
    #[serde(flatten)]
    pub fields: WorkFields,
    /// Detail page URL.
    pub permalink: String,
    /// Full label/value map as scraped.
    pub raw_metadata: WorkMetadata,
    /// Direct asset (PDF) URLs, in resolution order.
    pub pdf_urls: Vec<String>,
}

impl CatalogEntry {
    /// Create an entry with empty attributes.
    pub fn new(id: WorkId, permalink: impl Into<String>) -> Self {
        Self {
            id,
            fields: WorkFields::default(),
            permalink: permalink.into(),
            raw_metadata: WorkMetadata::new(),
            pdf_urls: Vec::new(),
        }
    }
}

/// Catalog statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Number of stored works.
    pub total_works: u64,
    /// Number of distinct composers.
    pub total_composers: u64,
}

/// Errors from catalog storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(String),

    /// Entry not found.
    #[error("entry not found: {0}")]
    NotFound(WorkId),

    /// A serialized column could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
