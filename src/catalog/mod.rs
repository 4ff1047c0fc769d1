mod error;
mod models;
mod service;

pub use error::CatalogError;
pub use models::{CatalogEntry, CatalogEntrySummary, CreatedEntry, NewCatalogEntry};
pub use service::CatalogService;
