//! TuneVault Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod object_repository;
pub mod server;

// Re-export commonly used types for convenience
pub use catalog::{CatalogError, CatalogService};
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use object_repository::{MediaStoreClient, ObjectRepository};
pub use server::{run_server, RequestsLoggingLevel};
