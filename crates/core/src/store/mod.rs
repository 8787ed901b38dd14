//! Work catalog storage.
//!
//! One row per external work id. Writes go through [`CatalogStore::upsert`],
//! an insert-or-replace keyed by [`CatalogEntry::id`] that commits each entry
//! individually, so an interrupted ingestion run leaves only complete rows.

mod sqlite;
mod types;

pub use sqlite::SqliteCatalogStore;
pub use types::*;

/// Trait for work catalog storage.
pub trait CatalogStore: Send + Sync {
    /// Insert the entry, or replace every non-id column if the id already exists.
    ///
    /// Last write wins; there is no field-level merge.
    fn upsert(&self, entry: &CatalogEntry) -> Result<(), StoreError>;

    /// Get a single entry by id.
    fn get(&self, id: WorkId) -> Result<CatalogEntry, StoreError>;

    /// Get all entries whose id is in `ids`. Unknown ids are skipped.
    fn get_many(&self, ids: &[WorkId]) -> Result<Vec<CatalogEntry>, StoreError>;

    /// Number of stored entries.
    fn count(&self) -> Result<u64, StoreError>;

    /// Work and composer counts.
    fn stats(&self) -> Result<CatalogStats, StoreError>;

    /// Remove every entry.
    fn clear(&self) -> Result<(), StoreError>;
}
