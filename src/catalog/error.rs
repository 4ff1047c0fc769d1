//! Catalog operation error taxonomy.

use crate::catalog_store::StoreError;
use crate::object_repository::RepositoryError;
use thiserror::Error;

/// Errors that can occur during catalog operations.
///
/// Every failure kind a caller may want to branch on has its own
/// variant. None are retried automatically and none are fatal to the
/// process.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Bad caller data, rejected before any side effect.
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The (artist, title) pair already exists. Usually rejected before
    /// any side effect, or surfaced by the store's uniqueness backstop
    /// when two concurrent creates race past the pre-check.
    #[error("the song '{title}' by '{artist}' already exists")]
    DuplicateEntry { artist: String, title: String },

    /// Absence, not a defect.
    #[error("entry not found")]
    NotFound,

    /// The remote upload failed; no metadata row was created.
    #[error("upload failed: {0}")]
    UploadFailed(#[source] RepositoryError),

    /// The remote delete failed; the local row is deliberately left
    /// intact so the entry is not silently lost while its backing object
    /// may still exist.
    #[error("remote delete failed: {0}")]
    DeleteFailed(#[source] RepositoryError),

    /// Local storage I/O failure.
    #[error("catalog storage failure: {0}")]
    StoreUnavailable(#[source] StoreError),
}
