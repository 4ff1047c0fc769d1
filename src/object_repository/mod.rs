mod client;
mod trait_def;

pub use client::MediaStoreClient;
pub use trait_def::{ObjectRepository, RepositoryError, StoredObject};
