use std::sync::{Arc, RwLock};

use folio_store::{ArtworkBackend, StoreError};
use folio_types::{ArtworkId, ArtworkPatch, ArtworkRecord, Category, NewArtwork};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::event::{CatalogEvent, CatalogStatus};

const EVENT_CAPACITY: usize = 32;

/// The authoritative in-memory artwork list.
///
/// Reads hand out the current snapshot as a shared `Arc`; a refresh builds
/// the next snapshot completely before swapping it in, so readers never see
/// a half-updated list. Refreshes are serialized: a second request waits for
/// the one in flight. Mutations are serialized with each other as well and
/// always end with a refresh, never with a local edit of the list.
pub struct CatalogStore {
    backend: Arc<dyn ArtworkBackend>,
    snapshot: RwLock<Arc<Vec<ArtworkRecord>>>,
    status: RwLock<CatalogStatus>,
    refresh_lock: Mutex<()>,
    write_lock: Mutex<()>,
    events: broadcast::Sender<CatalogEvent>,
}

impl CatalogStore {
    /// Create an empty, never-loaded store over `backend`.
    pub fn new(backend: Arc<dyn ArtworkBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            snapshot: RwLock::new(Arc::new(Vec::new())),
            status: RwLock::new(CatalogStatus::default()),
            refresh_lock: Mutex::new(()),
            write_lock: Mutex::new(()),
            events,
        }
    }

    /// Create a store and perform the initial load.
    ///
    /// A failed initial load is not fatal: the store starts empty with the
    /// error recorded in its status.
    pub async fn open(backend: Arc<dyn ArtworkBackend>) -> Self {
        let store = Self::new(backend);
        if let Err(e) = store.refresh().await {
            warn!(error = %e, "initial catalog load failed");
        }
        store
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// The current list, newest first.
    pub fn snapshot(&self) -> Arc<Vec<ArtworkRecord>> {
        Arc::clone(&self.snapshot.read().expect("snapshot lock poisoned"))
    }

    /// Look up one record in the current snapshot.
    pub fn get(&self, id: &ArtworkId) -> Option<ArtworkRecord> {
        self.snapshot().iter().find(|r| &r.id == id).cloned()
    }

    pub fn status(&self) -> CatalogStatus {
        self.status.read().expect("status lock poisoned").clone()
    }

    /// Receive a [`CatalogEvent`] after every refresh attempt.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    /// Reload the full list from the backend.
    ///
    /// On failure the previous snapshot stays in place and the error is
    /// recorded in [`CatalogStatus::error`] as well as returned.
    pub async fn refresh(&self) -> CatalogResult<Arc<Vec<ArtworkRecord>>> {
        let _in_flight = self.refresh_lock.lock().await;
        self.update_status(|s| s.loading = true);

        match self.backend.load_all().await {
            Ok(records) => {
                let next = Arc::new(records);
                *self.snapshot.write().expect("snapshot lock poisoned") = Arc::clone(&next);
                let revision = self.update_status(|s| {
                    s.loading = false;
                    s.error = None;
                    s.revision += 1;
                });
                debug!(revision, count = next.len(), "catalog refreshed");
                let _ = self.events.send(CatalogEvent::Refreshed {
                    revision,
                    count: next.len(),
                });
                Ok(next)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(backend = self.backend.name(), error = %message, "catalog refresh failed");
                self.update_status(|s| {
                    s.loading = false;
                    s.error = Some(message.clone());
                });
                let _ = self.events.send(CatalogEvent::RefreshFailed { message });
                Err(e.into())
            }
        }
    }

    /// Add a new artwork and reload.
    ///
    /// Returns the record as stored by the backend.
    pub async fn add(&self, input: NewArtwork) -> CatalogResult<ArtworkRecord> {
        validate_new(&input)?;
        let _writer = self.write_lock.lock().await;

        let image_url = self.backend.resolve_image(input.image()).await?;
        let fields = input.into_fields(image_url);
        let record = self.backend.insert(fields).await?;
        info!(id = %record.id, title = %record.title, "artwork added");

        self.refresh().await?;
        Ok(self.get(&record.id).unwrap_or(record))
    }

    /// Apply a partial update and reload.
    ///
    /// A patch that names no field writes nothing; it only checks that `id`
    /// is in the current list.
    pub async fn update(&self, id: &ArtworkId, patch: ArtworkPatch) -> CatalogResult<()> {
        validate_patch(&patch)?;
        let fields = patch.to_field_patch();
        if fields.is_empty() {
            debug!(%id, "empty patch, nothing to write");
            return match self.get(id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(id.clone()).into()),
            };
        }
        let _writer = self.write_lock.lock().await;

        self.backend.update(id, fields).await?;
        info!(%id, "artwork updated");

        self.refresh().await?;
        Ok(())
    }

    /// Delete an artwork permanently and reload.
    pub async fn delete(&self, id: &ArtworkId) -> CatalogResult<()> {
        let _writer = self.write_lock.lock().await;

        self.backend.delete(id).await?;
        info!(%id, "artwork deleted");

        self.refresh().await?;
        Ok(())
    }

    fn update_status(&self, change: impl FnOnce(&mut CatalogStatus)) -> u64 {
        let mut status = self.status.write().expect("status lock poisoned");
        change(&mut status);
        status.revision
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("backend", &self.backend.name())
            .field("count", &self.snapshot().len())
            .field("status", &self.status())
            .finish()
    }
}

fn validate_new(input: &NewArtwork) -> CatalogResult<()> {
    if input.image().is_empty() {
        return Err(CatalogError::validation("missing image"));
    }
    if input.title.trim().is_empty() {
        return Err(CatalogError::validation("missing title"));
    }
    validate_category(&input.category)
}

fn validate_patch(patch: &ArtworkPatch) -> CatalogResult<()> {
    if patch.image_url.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(CatalogError::validation("missing image"));
    }
    if patch.title.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(CatalogError::validation("missing title"));
    }
    match &patch.category {
        Some(category) => validate_category(category),
        None => Ok(()),
    }
}

fn validate_category(category: &Category) -> CatalogResult<()> {
    if category.is_known() {
        Ok(())
    } else {
        Err(CatalogError::validation(format!(
            "unknown category '{category}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use folio_store::{InMemoryBackend, InlineImage, StoreResult};
    use folio_types::{ArtworkFields, FieldPatch, PriceInput};

    use crate::error::ErrorKind;

    const PNG_URI: &str = "data:image/png;base64,iVBORw0KGgo=";

    /// Wraps the in-memory backend with switchable failures and a load delay.
    #[derive(Default)]
    struct ScriptedBackend {
        inner: InMemoryBackend,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
        loads: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        load_delay_ms: u64,
    }

    #[async_trait]
    impl ArtworkBackend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn load_all(&self) -> StoreResult<Vec<ArtworkRecord>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.load_delay_ms)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("backend offline".into()));
            }
            self.inner.load_all().await
        }

        async fn upload_image(&self, image: &InlineImage) -> StoreResult<String> {
            self.inner.upload_image(image).await
        }

        async fn insert(&self, fields: ArtworkFields) -> StoreResult<ArtworkRecord> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::WriteFailed("row level security".into()));
            }
            self.inner.insert(fields).await
        }

        async fn patch(&self, id: &ArtworkId, patch: &FieldPatch) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::WriteFailed("row level security".into()));
            }
            self.inner.patch(id, patch).await
        }

        async fn delete(&self, id: &ArtworkId) -> StoreResult<()> {
            self.inner.delete(id).await
        }
    }

    fn scripted() -> Arc<ScriptedBackend> {
        Arc::new(ScriptedBackend::default())
    }

    fn input(title: &str) -> NewArtwork {
        NewArtwork::new(title, PNG_URI)
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn add_yields_exactly_one_matching_record() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let mut new = input("Dusk");
        new.category = Category::Botanical;
        new.medium = "Oil".into();
        new.featured = true;
        new.price = Some(PriceInput::from("₦45,000"));

        let record = store.add(new).await.unwrap();
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0], record);
        assert_eq!(record.title, "Dusk");
        assert_eq!(record.category, Category::Botanical);
        assert_eq!(record.price, Some(45000.0));
        assert!(record.featured);
        assert!(record.image_url.starts_with("memory://"));
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn add_without_image_fails_before_backend() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let err = store.add(NewArtwork::new("Dusk", "")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "missing image");
        assert_eq!(backend.loads.load(Ordering::SeqCst), 0);
        assert!(backend.inner.is_empty());
    }

    #[tokio::test]
    async fn add_rejects_blank_title_and_unknown_category() {
        let store = CatalogStore::new(scripted());
        let err = store.add(input("  ")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut bad = input("Dusk");
        bad.category = Category::Unrecognized("Sculpture".into());
        let err = store.add(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn add_with_reference_skips_upload() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let record = store
            .add(NewArtwork::new("Dusk", "https://cdn/dusk.jpg"))
            .await
            .unwrap();
        assert_eq!(record.image_url, "https://cdn/dusk.jpg");
        assert_eq!(backend.inner.image_count(), 0);
    }

    #[tokio::test]
    async fn failed_insert_reports_and_keeps_list() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        store.add(input("First")).await.unwrap();
        let before = store.snapshot();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let err = store.add(input("Second")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteFailed);
        assert_eq!(store.snapshot(), before);
        // The image was uploaded before the insert failed and stays orphaned.
        assert_eq!(backend.inner.image_count(), 2);
    }

    // -----------------------------------------------------------------------
    // Update / delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_patches_and_reloads() {
        let store = CatalogStore::new(scripted());
        let record = store.add(input("Dusk")).await.unwrap();
        let patch = ArtworkPatch {
            available: Some(false),
            price: Some(Some(PriceInput::from("1,500"))),
            ..Default::default()
        };
        store.update(&record.id, patch).await.unwrap();

        let updated = store.get(&record.id).unwrap();
        assert!(!updated.available);
        assert_eq!(updated.price, Some(1500.0));
        assert_eq!(updated.image_url, record.image_url);
        assert_eq!(store.status().revision, 2);
    }

    #[tokio::test]
    async fn update_with_new_inline_image_uploads_it() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let record = store
            .add(NewArtwork::new("Dusk", "https://cdn/dusk.jpg"))
            .await
            .unwrap();
        let patch = ArtworkPatch {
            image_url: Some(PNG_URI.into()),
            ..Default::default()
        };
        store.update(&record.id, patch).await.unwrap();
        let updated = store.get(&record.id).unwrap();
        assert!(updated.image_url.starts_with("memory://"));
        assert_eq!(backend.inner.image_count(), 1);
    }

    #[tokio::test]
    async fn update_rejects_blank_image() {
        let store = CatalogStore::new(scripted());
        let record = store.add(input("Dusk")).await.unwrap();
        let patch = ArtworkPatch {
            image_url: Some(String::new()),
            ..Default::default()
        };
        let err = store.update(&record.id, patch).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = CatalogStore::new(scripted());
        let err = store
            .update(&ArtworkId::new("nope"), ArtworkPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn empty_update_leaves_record_and_revision() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let record = store.add(input("Dusk")).await.unwrap();
        backend.fail_writes.store(true, Ordering::SeqCst);

        store.update(&record.id, ArtworkPatch::default()).await.unwrap();
        assert_eq!(store.get(&record.id), Some(record));
        assert_eq!(store.status().revision, 1);
        assert_eq!(backend.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_removes_and_repeat_is_not_found() {
        let store = CatalogStore::new(scripted());
        let keep = store.add(input("Keep")).await.unwrap();
        let gone = store.add(input("Gone")).await.unwrap();

        store.delete(&gone.id).await.unwrap();
        assert!(store.get(&gone.id).is_none());
        assert!(store.get(&keep.id).is_some());

        let err = store.delete(&gone.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // -----------------------------------------------------------------------
    // Refresh
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn failed_refresh_keeps_stale_list_and_sets_error() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        store.add(input("Dusk")).await.unwrap();
        let before = store.snapshot();

        backend.fail_reads.store(true, Ordering::SeqCst);
        let err = store.refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(store.snapshot(), before);
        let status = store.status();
        assert!(!status.loading);
        assert!(status.error.as_deref().unwrap().contains("backend offline"));

        backend.fail_reads.store(false, Ordering::SeqCst);
        store.refresh().await.unwrap();
        assert!(store.status().error.is_none());
    }

    #[tokio::test]
    async fn open_tolerates_failed_initial_load() {
        let backend = scripted();
        backend.fail_reads.store(true, Ordering::SeqCst);
        let store = CatalogStore::open(backend).await;
        assert!(store.snapshot().is_empty());
        assert_eq!(store.status().revision, 0);
        assert!(store.status().error.is_some());
    }

    #[tokio::test]
    async fn concurrent_refreshes_never_overlap() {
        let backend = Arc::new(ScriptedBackend {
            load_delay_ms: 20,
            ..Default::default()
        });
        let store = Arc::new(CatalogStore::new(backend.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.refresh().await.map(|s| s.len()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 1);
        assert_eq!(store.status().revision, 8);
    }

    #[tokio::test]
    async fn subscribers_are_notified() {
        let backend = scripted();
        let store = CatalogStore::new(backend.clone());
        let mut events = store.subscribe();

        store.add(input("Dusk")).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            CatalogEvent::Refreshed {
                revision: 1,
                count: 1
            }
        );

        backend.fail_reads.store(true, Ordering::SeqCst);
        let _ = store.refresh().await;
        assert!(matches!(
            events.recv().await.unwrap(),
            CatalogEvent::RefreshFailed { .. }
        ));
    }
}
