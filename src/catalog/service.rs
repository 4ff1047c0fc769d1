//! Catalog service - orchestrates the metadata store and the remote
//! object repository.
//!
//! Create workflow:
//! 1. VALIDATING: trim artist/title, reject empty input
//! 2. CHECKING_DUPLICATE: early exit on an existing (artist, title) pair
//! 3. UPLOADING: push the audio bytes to the remote media store
//! 4. PERSISTING: insert the metadata row with the upload result
//!
//! Delete workflow: locate the row, delete the remote object, then the
//! row. On partial failure the service never hides the inconsistency:
//! a failed persist leaves an orphaned remote object (logged, surfaced),
//! a failed local delete after a confirmed remote delete leaves a
//! dangling row (logged, surfaced). Neither is auto-healed.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::CatalogError;
use super::models::{CatalogEntrySummary, CreatedEntry, NewCatalogEntry};
use crate::catalog_store::{CatalogStore, StoreError};
use crate::object_repository::ObjectRepository;

/// The media store files audio under its generic binary/AV pipeline.
const AUDIO_RESOURCE_TYPE: &str = "video";

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    repository: Arc<dyn ObjectRepository>,
    upload_folder: String,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        repository: Arc<dyn ObjectRepository>,
        upload_folder: String,
    ) -> Self {
        Self {
            store,
            repository,
            upload_folder,
        }
    }

    pub fn list_all(&self) -> Result<Vec<CatalogEntrySummary>, CatalogError> {
        self.store.list_all().map_err(CatalogError::StoreUnavailable)
    }

    pub async fn create(
        &self,
        artist_name: &str,
        genre: &str,
        song_title: &str,
        audio: Vec<u8>,
    ) -> Result<CreatedEntry, CatalogError> {
        let artist = artist_name.trim();
        let title = song_title.trim();
        if artist.is_empty() {
            return Err(CatalogError::InvalidInput("artist name must not be empty"));
        }
        if title.is_empty() {
            return Err(CatalogError::InvalidInput("song title must not be empty"));
        }

        // Early exit only; the store's uniqueness index is the
        // authoritative guard against the check-then-insert race.
        if self
            .store
            .find_by_artist_title(artist, title)
            .map_err(CatalogError::StoreUnavailable)?
            .is_some()
        {
            return Err(CatalogError::DuplicateEntry {
                artist: artist.to_string(),
                title: title.to_string(),
            });
        }

        let stored = self
            .repository
            .upload(audio, AUDIO_RESOURCE_TYPE, &self.upload_folder)
            .await
            .map_err(CatalogError::UploadFailed)?;

        let entry = NewCatalogEntry {
            artist_name: artist.to_string(),
            genre: genre.to_string(),
            song_title: title.to_string(),
            song_url: stored.url.clone(),
            public_id: stored.public_id.clone(),
        };

        let persisted = match self.store.insert(&entry) {
            Ok(persisted) => persisted,
            Err(err) => {
                // The uploaded object now has no catalog row. No
                // automatic compensation; surface it and move on.
                warn!(
                    "Insert failed after upload, remote object {} is orphaned: {}",
                    stored.public_id, err
                );
                return Err(match err {
                    StoreError::ConstraintViolation => CatalogError::DuplicateEntry {
                        artist: artist.to_string(),
                        title: title.to_string(),
                    },
                    other => CatalogError::StoreUnavailable(other),
                });
            }
        };

        info!(
            "Created catalog entry {} ('{}' by '{}')",
            persisted.id, persisted.song_title, persisted.artist_name
        );

        Ok(CreatedEntry {
            artist: persisted.artist_name,
            song: persisted.song_title,
            url: persisted.song_url,
        })
    }

    /// Resolve the playable URL for an entry. The caller redirects;
    /// audio bytes are never proxied through the service.
    pub fn resolve_stream_url(&self, id: i64) -> Result<String, CatalogError> {
        let entry = self
            .store
            .find_by_id(id)
            .map_err(CatalogError::StoreUnavailable)?
            .ok_or(CatalogError::NotFound)?;
        Ok(entry.song_url)
    }

    pub async fn delete(&self, artist_name: &str, song_title: &str) -> Result<(), CatalogError> {
        let artist = artist_name.trim();
        let title = song_title.trim();

        let entry = self
            .store
            .find_by_artist_title(artist, title)
            .map_err(CatalogError::StoreUnavailable)?
            .ok_or(CatalogError::NotFound)?;

        // Remote first: the row stays until the backing object is
        // confirmed gone.
        self.repository
            .delete(&entry.public_id, AUDIO_RESOURCE_TYPE)
            .await
            .map_err(CatalogError::DeleteFailed)?;

        match self.store.delete_by_id(entry.id) {
            Ok(removed) => {
                // A concurrent delete may have removed the row already;
                // the outcome the caller asked for holds either way.
                if !removed {
                    info!("Catalog entry {} was already gone", entry.id);
                }
            }
            Err(err) => {
                warn!(
                    "Row delete failed after remote delete, entry {} (object {}) is dangling: {}",
                    entry.id, entry.public_id, err
                );
                return Err(CatalogError::StoreUnavailable(err));
            }
        }

        info!(
            "Deleted catalog entry {} ('{}' by '{}')",
            entry.id, entry.song_title, entry.artist_name
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::object_repository::{RepositoryError, StoredObject};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryCatalogStore {
        entries: Mutex<Vec<CatalogEntry>>,
        next_id: Mutex<i64>,
        fail_inserts_with_constraint: AtomicBool,
    }

    impl CatalogStore for InMemoryCatalogStore {
        fn find_by_artist_title(
            &self,
            artist: &str,
            title: &str,
        ) -> Result<Option<CatalogEntry>, StoreError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| {
                    e.artist_name.to_lowercase() == artist.to_lowercase()
                        && e.song_title.to_lowercase() == title.to_lowercase()
                })
                .cloned())
        }

        fn list_all(&self) -> Result<Vec<CatalogEntrySummary>, StoreError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .map(|e| CatalogEntrySummary {
                    id: e.id,
                    artist: e.artist_name.clone(),
                    genre: e.genre.clone(),
                    song: e.song_title.clone(),
                    url: e.song_url.clone(),
                })
                .collect())
        }

        fn find_by_id(&self, id: i64) -> Result<Option<CatalogEntry>, StoreError> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == id)
                .cloned())
        }

        fn insert(&self, entry: &NewCatalogEntry) -> Result<CatalogEntry, StoreError> {
            if self.fail_inserts_with_constraint.load(Ordering::SeqCst) {
                return Err(StoreError::ConstraintViolation);
            }
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let persisted = CatalogEntry {
                id: *next_id,
                artist_name: entry.artist_name.clone(),
                genre: entry.genre.clone(),
                song_title: entry.song_title.clone(),
                song_url: entry.song_url.clone(),
                public_id: entry.public_id.clone(),
            };
            self.entries.lock().unwrap().push(persisted.clone());
            Ok(persisted)
        }

        fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() < before)
        }
    }

    #[derive(Default)]
    struct ScriptedRepository {
        fail_uploads: AtomicBool,
        fail_deletes: AtomicBool,
        uploads: Mutex<Vec<StoredObject>>,
        deletes: Mutex<Vec<String>>,
    }

    fn provider_error() -> RepositoryError {
        RepositoryError::Provider {
            status: 500,
            message: "scripted failure".to_string(),
        }
    }

    #[async_trait]
    impl ObjectRepository for ScriptedRepository {
        async fn upload(
            &self,
            _bytes: Vec<u8>,
            _resource_type: &str,
            folder: &str,
        ) -> Result<StoredObject, RepositoryError> {
            if self.fail_uploads.load(Ordering::SeqCst) {
                return Err(provider_error());
            }
            let mut uploads = self.uploads.lock().unwrap();
            let stored = StoredObject {
                public_id: format!("{}/obj-{}", folder, uploads.len()),
                url: format!("https://media.test/{}/obj-{}", folder, uploads.len()),
            };
            uploads.push(stored.clone());
            Ok(stored)
        }

        async fn delete(
            &self,
            public_id: &str,
            _resource_type: &str,
        ) -> Result<(), RepositoryError> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(provider_error());
            }
            self.deletes.lock().unwrap().push(public_id.to_string());
            Ok(())
        }
    }

    fn make_service() -> (
        CatalogService,
        Arc<InMemoryCatalogStore>,
        Arc<ScriptedRepository>,
    ) {
        let store = Arc::new(InMemoryCatalogStore::default());
        let repository = Arc::new(ScriptedRepository::default());
        let service = CatalogService::new(
            store.clone(),
            repository.clone(),
            "catalog_audio".to_string(),
        );
        (service, store, repository)
    }

    #[tokio::test]
    async fn created_entry_appears_in_listing_trimmed_with_case_preserved() {
        let (service, _store, _repository) = make_service();

        service
            .create("  Bob ", "pop", " Song1 ", vec![1, 2, 3])
            .await
            .unwrap();

        let listed = service.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].artist, "Bob");
        assert_eq!(listed[0].song, "Song1");
        assert_eq!(listed[0].genre, "pop");
        assert!(!listed[0].url.is_empty());
    }

    #[tokio::test]
    async fn rejects_empty_artist_or_title() {
        let (service, store, _repository) = make_service();

        let result = service.create("   ", "pop", "Song1", vec![1]).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));

        let result = service.create("Bob", "pop", "  ", vec![1]).await;
        assert!(matches!(result, Err(CatalogError::InvalidInput(_))));

        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_duplicate_differing_only_by_case_and_whitespace() {
        let (service, _store, repository) = make_service();

        service.create("Bob", "pop", "Song1", vec![1]).await.unwrap();
        let result = service.create("  BOB", "rock", "song1 ", vec![2]).await;

        assert!(matches!(result, Err(CatalogError::DuplicateEntry { .. })));
        // The duplicate was rejected before any upload side effect.
        assert_eq!(repository.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn racing_insert_surfaces_constraint_violation_as_duplicate() {
        let (service, store, _repository) = make_service();

        // Both concurrent creates pass the pre-check; the store's
        // constraint rejects the second insert.
        store
            .fail_inserts_with_constraint
            .store(true, Ordering::SeqCst);

        let result = service.create("Bob", "pop", "Song1", vec![1]).await;
        assert!(matches!(result, Err(CatalogError::DuplicateEntry { .. })));
    }

    #[tokio::test]
    async fn failed_upload_adds_no_row() {
        let (service, store, repository) = make_service();

        repository.fail_uploads.store(true, Ordering::SeqCst);

        let result = service.create("A", "rock", "T", vec![1, 2]).await;
        assert!(matches!(result, Err(CatalogError::UploadFailed(_))));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resolve_stream_returns_url_from_create() {
        let (service, store, _repository) = make_service();

        let created = service
            .create("Bob", "pop", "Song1", vec![1, 2, 3])
            .await
            .unwrap();

        let entry = store.find_by_artist_title("Bob", "Song1").unwrap().unwrap();
        let resolved = service.resolve_stream_url(entry.id).unwrap();
        assert_eq!(resolved, created.url);
    }

    #[test]
    fn resolve_stream_of_unknown_id_is_not_found() {
        let (service, _store, _repository) = make_service();

        let result = service.resolve_stream_url(42);
        assert!(matches!(result, Err(CatalogError::NotFound)));
    }

    #[tokio::test]
    async fn delete_removes_remote_object_then_row() {
        let (service, store, repository) = make_service();

        service.create("Bob", "pop", "Song1", vec![1]).await.unwrap();
        service.delete(" bob", "SONG1 ").await.unwrap();

        assert!(store.list_all().unwrap().is_empty());
        assert_eq!(repository.deletes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_unknown_pair_is_not_found_and_changes_nothing() {
        let (service, store, repository) = make_service();

        service.create("Bob", "pop", "Song1", vec![1]).await.unwrap();

        let result = service.delete("Alice", "Song2").await;
        assert!(matches!(result, Err(CatalogError::NotFound)));
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert!(repository.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_remote_delete_leaves_row_intact() {
        let (service, _store, repository) = make_service();

        service.create("A", "rock", "T", vec![1]).await.unwrap();
        repository.fail_deletes.store(true, Ordering::SeqCst);

        let result = service.delete("A", "T").await;
        assert!(matches!(result, Err(CatalogError::DeleteFailed(_))));

        let listed = service.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].artist, "A");
        assert_eq!(listed[0].song, "T");
    }
}
