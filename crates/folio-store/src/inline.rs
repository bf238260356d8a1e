use base64::Engine;
use bytes::Bytes;
use folio_types::INLINE_PREFIX;

use crate::error::{StoreError, StoreResult};

/// Image bytes decoded from a `data:` URI, ready to upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineImage {
    pub mime: String,
    pub data: Bytes,
}

impl InlineImage {
    pub fn new(mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// Decode `data:image/<type>;base64,<payload>`.
    pub fn decode(uri: &str) -> StoreResult<Self> {
        let rest = uri
            .strip_prefix(INLINE_PREFIX)
            .ok_or_else(|| StoreError::UploadFailed("not a data URI".into()))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| StoreError::UploadFailed("data URI has no payload".into()))?;

        let mut params = meta.split(';');
        let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(StoreError::UploadFailed(
                "only base64 data URIs are supported".into(),
            ));
        }
        if !mime.starts_with("image/") {
            return Err(StoreError::UploadFailed(format!(
                "expected an image, got '{}'",
                if mime.is_empty() { "unknown" } else { &mime }
            )));
        }

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StoreError::UploadFailed(format!("invalid base64 payload: {e}")))?;
        if data.is_empty() {
            return Err(StoreError::UploadFailed("empty image payload".into()));
        }

        Ok(Self::new(mime, data))
    }

    /// Encode back into a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!(
            "{INLINE_PREFIX}{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// File extension derived from the MIME subtype.
    pub fn extension(&self) -> &'static str {
        match self.mime.strip_prefix("image/").unwrap_or_default() {
            "png" => "png",
            "gif" => "gif",
            "webp" => "webp",
            "avif" => "avif",
            "svg+xml" => "svg",
            _ => "jpg",
        }
    }

    /// Storage object name: upload time plus a content digest prefix.
    pub fn object_name(&self) -> String {
        let digest = blake3::hash(&self.data);
        format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            hex::encode(&digest.as_bytes()[..8]),
            self.extension()
        )
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
