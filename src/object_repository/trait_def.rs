//! ObjectRepository trait definition.

use async_trait::async_trait;
use thiserror::Error;

/// A successfully stored object: the provider's identifier (required to
/// delete the object later) and the public retrieval URL. The two always
/// arrive together; there is no partial-success state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub public_id: String,
    pub url: String,
}

/// Errors surfaced by the remote object store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("media store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("media store rejected request ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// Trait for remote blob-storage backends addressed by opaque identifiers.
#[async_trait]
pub trait ObjectRepository: Send + Sync {
    /// Store a binary payload under the given resource type and folder,
    /// returning the provider identifier and retrieval URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        resource_type: &str,
        folder: &str,
    ) -> Result<StoredObject, RepositoryError>;

    /// Remove a stored object. Any provider-reported error, including
    /// "object already absent", is surfaced as a failure.
    async fn delete(&self, public_id: &str, resource_type: &str) -> Result<(), RepositoryError>;
}
