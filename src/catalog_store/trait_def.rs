//! CatalogStore trait definition.

use crate::catalog::{CatalogEntry, CatalogEntrySummary, NewCatalogEntry};
use thiserror::Error;

/// Errors surfaced by catalog storage backends.
///
/// `ConstraintViolation` is a business-rule failure (the uniqueness index
/// rejected an insert) and is kept distinct from `Unavailable` (storage
/// I/O failure) so callers can branch without string-matching messages.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("catalog uniqueness constraint violated")]
    ConstraintViolation,

    #[error("catalog storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),
}

/// Trait for catalog storage backends.
pub trait CatalogStore: Send + Sync {
    /// Case-insensitive exact match on already-trimmed artist and title.
    /// The uniqueness invariant guarantees at most one match.
    fn find_by_artist_title(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<CatalogEntry>, StoreError>;

    /// All entries in insertion (id) order, without the provider public id.
    fn list_all(&self) -> Result<Vec<CatalogEntrySummary>, StoreError>;

    fn find_by_id(&self, id: i64) -> Result<Option<CatalogEntry>, StoreError>;

    /// Insert a new entry, returning it with its store-assigned id.
    /// Fails with `ConstraintViolation` if (artist, title) already exists.
    fn insert(&self, entry: &NewCatalogEntry) -> Result<CatalogEntry, StoreError>;

    /// Delete by id, returning whether a row was removed. Deleting a
    /// non-existent id is not an error.
    fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;
}
