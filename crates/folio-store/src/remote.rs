//! Hosted backend: a PostgREST-style table plus an object-storage bucket.

use std::time::Duration;

use async_trait::async_trait;
use folio_types::{ArtworkFields, ArtworkId, ArtworkRecord, FieldPatch};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::RemoteConfig;
use crate::error::{StoreError, StoreResult};
use crate::inline::InlineImage;
use crate::row::{normalize_rows, patch_columns, ArtworkRow, InsertRow};
use crate::traits::ArtworkBackend;

/// Artwork backend talking to a hosted table and storage service.
///
/// Timeouts and connection failures are reported as
/// [`StoreError::Unavailable`] whatever the operation.
#[derive(Clone, Debug)]
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    table: String,
    bucket: String,
}

impl RemoteBackend {
    /// Build a client for the configured service.
    pub fn new(config: &RemoteConfig) -> StoreResult<Self> {
        if config.url.trim().is_empty() {
            return Err(StoreError::Config("remote backend needs a url".into()));
        }
        let mut headers = header::HeaderMap::new();
        if !config.api_key.is_empty() {
            let key = header::HeaderValue::from_str(&config.api_key)
                .map_err(|e| StoreError::Config(format!("invalid api key: {e}")))?;
            let bearer = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| StoreError::Config(format!("invalid api key: {e}")))?;
            headers.insert("apikey", key);
            headers.insert(header::AUTHORIZATION, bearer);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Config(format!("failed to create HTTP client: {e}")))?;

        info!(url = %config.url, table = %config.table, bucket = %config.bucket, "remote backend configured");
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
        })
    }

    /// Table endpoint.
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Upload endpoint for a storage object.
    pub fn object_url(&self, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{name}", self.base_url, self.bucket)
    }

    /// Public, fetchable URL of a storage object.
    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{name}",
            self.base_url, self.bucket
        )
    }

    fn by_id(&self, builder: RequestBuilder, id: &ArtworkId) -> RequestBuilder {
        builder
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
    }

    /// Send a request whose rejection maps to `rejected`.
    async fn send(
        request: RequestBuilder,
        rejected: fn(String) -> StoreError,
    ) -> StoreResult<Response> {
        let response = request.send().await.map_err(|e| transport(e, rejected))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(rejected(format!("{status}: {}", error_message(&body))))
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        rejected: fn(String) -> StoreError,
    ) -> StoreResult<T> {
        let text = response.text().await.map_err(|e| transport(e, rejected))?;
        serde_json::from_str(&text).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Rows returned by a mutation; none means nothing matched the id.
    async fn affected(response: Response, id: &ArtworkId) -> StoreResult<()> {
        let rows: Vec<ArtworkRow> = Self::decode(response, StoreError::WriteFailed).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

fn transport(err: reqwest::Error, rejected: fn(String) -> StoreError) -> StoreError {
    if err.is_timeout() || err.is_connect() {
        StoreError::Unavailable(err.to_string())
    } else {
        rejected(err.to_string())
    }
}

/// Pull the human-readable message out of a service error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error", "msg"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl ArtworkBackend for RemoteBackend {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn load_all(&self) -> StoreResult<Vec<ArtworkRecord>> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let response = Self::send(request, StoreError::Unavailable).await?;
        let rows: Vec<ArtworkRow> = Self::decode(response, StoreError::Unavailable)
            .await
            .map_err(|e| match e {
                StoreError::Serialization(msg) => {
                    StoreError::Unavailable(format!("unreadable rows: {msg}"))
                }
                other => other,
            })?;
        debug!(count = rows.len(), "artworks fetched");
        Ok(normalize_rows(rows))
    }

    async fn upload_image(&self, image: &InlineImage) -> StoreResult<String> {
        let name = image.object_name();
        let request = self
            .client
            .post(self.object_url(&name))
            .header(header::CONTENT_TYPE, image.mime.as_str())
            .header("x-upsert", "false")
            .body(image.data.clone());
        Self::send(request, StoreError::UploadFailed).await?;
        debug!(object = %name, bytes = image.len(), "image uploaded");
        Ok(self.public_url(&name))
    }

    async fn insert(&self, fields: ArtworkFields) -> StoreResult<ArtworkRecord> {
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&[InsertRow::from(&fields)]);
        let response = Self::send(request, StoreError::WriteFailed).await?;
        let rows: Vec<ArtworkRow> = Self::decode(response, StoreError::WriteFailed).await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::WriteFailed("insert returned no row".into()))?;
        Ok(row.normalize())
    }

    async fn patch(&self, id: &ArtworkId, patch: &FieldPatch) -> StoreResult<()> {
        if patch.has_inline_image() {
            return Err(StoreError::WriteFailed(
                "inline image must be uploaded before patching".into(),
            ));
        }
        let request = self
            .by_id(self.client.patch(self.table_url()), id)
            .json(&patch_columns(patch));
        let response = Self::send(request, StoreError::WriteFailed).await?;
        Self::affected(response, id).await
    }

    async fn delete(&self, id: &ArtworkId) -> StoreResult<()> {
        let request = self.by_id(self.client.delete(self.table_url()), id);
        let response = Self::send(request, StoreError::WriteFailed).await?;
        Self::affected(response, id).await
    }
}
