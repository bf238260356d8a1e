//! Local persisted state: one JSON slot plus an images directory.
//!
//! The slot holds the serialized `ArtworkRecord` array. It is read once when
//! the backend opens; a missing or unparsable slot falls back to the default
//! set. Every mutation rewrites the whole slot (temporary sibling, then
//! rename) before the in-memory copy is replaced, so a failed write leaves
//! both the file and the served list as they were.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use folio_types::{ArtworkFields, ArtworkId, ArtworkRecord, FieldPatch};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::LocalConfig;
use crate::error::{StoreError, StoreResult};
use crate::inline::InlineImage;
use crate::row::sort_newest_first;
use crate::seed::default_artworks;
use crate::traits::ArtworkBackend;

/// File-backed artwork backend for deployments without a hosted store.
#[derive(Debug)]
pub struct LocalBackend {
    path: PathBuf,
    images_dir: PathBuf,
    public_base: String,
    records: Mutex<Vec<ArtworkRecord>>,
}

impl LocalBackend {
    /// Open the slot described by `config`.
    pub async fn open(config: &LocalConfig) -> StoreResult<Self> {
        let records = read_slot(&config.path).await;
        info!(
            path = %config.path.display(),
            count = records.len(),
            "opened local artwork slot"
        );
        Ok(Self {
            path: config.path.clone(),
            images_dir: config.images_dir.clone(),
            public_base: config.public_base.trim_end_matches('/').to_string(),
            records: Mutex::new(records),
        })
    }

    /// Path of the JSON slot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory uploaded images are written to.
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    async fn persist(&self, records: &[ArtworkRecord]) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomically(&self.path, &json)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("{}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), count = records.len(), "artwork slot written");
        Ok(())
    }
}

async fn read_slot(path: &Path) -> Vec<ArtworkRecord> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no artwork slot yet, using default set");
            return default_artworks();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artwork slot unreadable, using default set");
            return default_artworks();
        }
    };
    match serde_json::from_slice::<Vec<ArtworkRecord>>(&bytes) {
        Ok(mut records) => {
            sort_newest_first(&mut records);
            records
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "artwork slot corrupt, using default set");
            default_artworks()
        }
    }
}

async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await
}

#[async_trait]
impl ArtworkBackend for LocalBackend {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn load_all(&self) -> StoreResult<Vec<ArtworkRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn upload_image(&self, image: &InlineImage) -> StoreResult<String> {
        let name = image.object_name();
        let target = self.images_dir.join(&name);
        let written = async {
            tokio::fs::create_dir_all(&self.images_dir).await?;
            tokio::fs::write(&target, &image.data).await
        }
        .await;
        written.map_err(|e| StoreError::UploadFailed(format!("{}: {e}", target.display())))?;
        debug!(file = %target.display(), bytes = image.len(), "image stored");
        Ok(format!("{}/{name}", self.public_base))
    }

    async fn insert(&self, fields: ArtworkFields) -> StoreResult<ArtworkRecord> {
        let mut records = self.records.lock().await;
        let record = ArtworkRecord::from_fields(ArtworkId::generate(), Some(Utc::now()), fields);
        let mut next = records.clone();
        next.insert(0, record.clone());
        self.persist(&next).await?;
        *records = next;
        Ok(record)
    }

    async fn patch(&self, id: &ArtworkId, patch: &FieldPatch) -> StoreResult<()> {
        if patch.has_inline_image() {
            return Err(StoreError::WriteFailed(
                "inline image must be uploaded before patching".into(),
            ));
        }
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?
            .apply(patch);
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }

    async fn delete(&self, id: &ArtworkId) -> StoreResult<()> {
        let mut records = self.records.lock().await;
        if !records.iter().any(|r| &r.id == id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        let next: Vec<ArtworkRecord> = records.iter().filter(|r| &r.id != id).cloned().collect();
        self.persist(&next).await?;
        *records = next;
        Ok(())
    }
}
