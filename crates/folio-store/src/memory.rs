use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use folio_types::{ArtworkFields, ArtworkId, ArtworkRecord, FieldPatch};

use crate::error::{StoreError, StoreResult};
use crate::inline::InlineImage;
use crate::row::sort_newest_first;
use crate::traits::ArtworkBackend;

/// In-memory artwork backend.
///
/// Intended for tests and embedding. Records and uploaded images live behind
/// `RwLock`s and are lost when the backend is dropped. Uploaded images are
/// referenced as `memory://<object name>`.
pub struct InMemoryBackend {
    records: RwLock<Vec<ArtworkRecord>>,
    images: RwLock<HashMap<String, InlineImage>>,
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Create a backend pre-populated with records.
    pub fn with_records(mut records: Vec<ArtworkRecord>) -> Self {
        sort_newest_first(&mut records);
        Self {
            records: RwLock::new(records),
            images: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }

    /// Number of uploaded images, referenced or not.
    pub fn image_count(&self) -> usize {
        self.images.read().expect("lock poisoned").len()
    }

    /// Look up an uploaded image by the reference `upload_image` returned.
    pub fn image(&self, reference: &str) -> Option<InlineImage> {
        let name = reference.strip_prefix("memory://")?;
        self.images.read().expect("lock poisoned").get(name).cloned()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtworkBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load_all(&self) -> StoreResult<Vec<ArtworkRecord>> {
        let mut records = self.records.read().expect("lock poisoned").clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn upload_image(&self, image: &InlineImage) -> StoreResult<String> {
        if image.is_empty() {
            return Err(StoreError::UploadFailed("empty image payload".into()));
        }
        let name = image.object_name();
        self.images
            .write()
            .expect("lock poisoned")
            .insert(name.clone(), image.clone());
        Ok(format!("memory://{name}"))
    }

    async fn insert(&self, fields: ArtworkFields) -> StoreResult<ArtworkRecord> {
        let record = ArtworkRecord::from_fields(ArtworkId::generate(), Some(Utc::now()), fields);
        self.records
            .write()
            .expect("lock poisoned")
            .insert(0, record.clone());
        Ok(record)
    }

    async fn patch(&self, id: &ArtworkId, patch: &FieldPatch) -> StoreResult<()> {
        if patch.has_inline_image() {
            return Err(StoreError::WriteFailed(
                "inline image must be uploaded before patching".into(),
            ));
        }
        let mut records = self.records.write().expect("lock poisoned");
        let record = records
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        record.apply(patch);
        Ok(())
    }

    async fn delete(&self, id: &ArtworkId) -> StoreResult<()> {
        let mut records = self.records.write().expect("lock poisoned");
        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("record_count", &self.len())
            .field("image_count", &self.image_count())
            .finish()
    }
}
