mod schema;
mod store;
mod trait_def;

pub use store::SqliteCatalogStore;
pub use trait_def::{CatalogStore, StoreError};
