use async_trait::async_trait;
use folio_types::{ArtworkFields, ArtworkId, ArtworkRecord, FieldPatch, ImageSource};

use crate::error::StoreResult;
use crate::inline::InlineImage;

/// Where artwork records and their images live.
///
/// All implementations must satisfy these invariants:
/// - `load_all` returns records in canonical shape, newest first.
/// - Records are never written with an inline image payload; inline data is
///   uploaded first and the returned reference is stored instead.
/// - Ids are assigned by the backend on insert and never change.
/// - Deletes are permanent.
/// - Failures are returned, never swallowed.
#[async_trait]
pub trait ArtworkBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch every record, newest first.
    async fn load_all(&self) -> StoreResult<Vec<ArtworkRecord>>;

    /// Store image bytes durably and return a fetchable reference.
    async fn upload_image(&self, image: &InlineImage) -> StoreResult<String>;

    /// Persist a new record; the backend assigns `id` and `created_at`.
    async fn insert(&self, fields: ArtworkFields) -> StoreResult<ArtworkRecord>;

    /// Apply a patch whose image, if any, is already a reference.
    async fn patch(&self, id: &ArtworkId, patch: &FieldPatch) -> StoreResult<()>;

    /// Remove a record permanently.
    async fn delete(&self, id: &ArtworkId) -> StoreResult<()>;

    /// Turn an image source into a stored reference, uploading inline data.
    async fn resolve_image(&self, image: ImageSource) -> StoreResult<String> {
        match image {
            ImageSource::Reference(url) => Ok(url),
            ImageSource::Inline(uri) => {
                let decoded = InlineImage::decode(&uri)?;
                self.upload_image(&decoded).await
            }
        }
    }

    /// Apply a partial update, uploading an inline image first.
    ///
    /// If the upload succeeds but the patch fails, the uploaded image stays
    /// behind unreferenced and the patch error is returned.
    async fn update(&self, id: &ArtworkId, mut patch: FieldPatch) -> StoreResult<()> {
        if let Some(image) = patch.image.take() {
            let url = self.resolve_image(image).await?;
            patch.image = Some(ImageSource::Reference(url));
        }
        self.patch(id, &patch).await
    }
}
