use serde::Serialize;

/// One recorded catalog row. `song_url` and `public_id` are set once at
/// creation and never mutated; there is no update operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: i64,
    pub artist_name: String,
    pub genre: String,
    pub song_title: String,
    pub song_url: String,
    pub public_id: String,
}

/// An entry before the store assigns its id.
#[derive(Debug, Clone)]
pub struct NewCatalogEntry {
    pub artist_name: String,
    pub genre: String,
    pub song_title: String,
    pub song_url: String,
    pub public_id: String,
}

/// Listing projection. The provider public id is internal bookkeeping
/// and is excluded here.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CatalogEntrySummary {
    pub id: i64,
    pub artist: String,
    pub genre: String,
    pub song: String,
    pub url: String,
}

/// Public fields returned to the caller after a successful create.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedEntry {
    pub artist: String,
    pub song: String,
    pub url: String,
}
