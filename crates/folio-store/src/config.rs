use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::StoreResult;
use crate::local::LocalBackend;
use crate::memory::InMemoryBackend;
use crate::remote::RemoteBackend;
use crate::traits::ArtworkBackend;

/// Which backend a deployment uses. Chosen once at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Memory,
    Local(LocalConfig),
    Remote(RemoteConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Local(LocalConfig::default())
    }
}

/// Local JSON slot settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// The JSON file holding the artwork array.
    pub path: PathBuf,
    /// Directory uploaded images are written to.
    pub images_dir: PathBuf,
    /// URL prefix under which `images_dir` is served.
    pub public_base: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("artworks.json"),
            images_dir: PathBuf::from("images"),
            public_base: "/images".into(),
        }
    }
}

/// Hosted table + storage settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Service base URL, e.g. `https://<project>.supabase.co`.
    pub url: String,
    /// Key sent as `apikey` and bearer token.
    pub api_key: String,
    pub table: String,
    pub bucket: String,
    /// Per-request timeout; expiry counts as the store being unavailable.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            table: "artworks".into(),
            bucket: "artworks".into(),
            timeout_secs: 15,
        }
    }
}

/// Build the configured backend.
pub async fn open_backend(config: &BackendConfig) -> StoreResult<Arc<dyn ArtworkBackend>> {
    let backend: Arc<dyn ArtworkBackend> = match config {
        BackendConfig::Memory => Arc::new(InMemoryBackend::new()),
        BackendConfig::Local(local) => Arc::new(LocalBackend::open(local).await?),
        BackendConfig::Remote(remote) => Arc::new(RemoteBackend::new(remote)?),
    };
    info!(backend = backend.name(), "artwork backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local() {
        match BackendConfig::default() {
            BackendConfig::Local(local) => {
                assert_eq!(local.path, PathBuf::from("artworks.json"));
                assert_eq!(local.public_base, "/images");
            }
            other => panic!("unexpected default: {other:?}"),
        }
    }

    #[test]
    fn parses_tagged_json() {
        let cfg: BackendConfig =
            serde_json::from_str(r#"{"kind":"remote","url":"https://x.supabase.co"}"#).unwrap();
        match cfg {
            BackendConfig::Remote(remote) => {
                assert_eq!(remote.url, "https://x.supabase.co");
                assert_eq!(remote.table, "artworks");
                assert_eq!(remote.timeout_secs, 15);
            }
            other => panic!("unexpected: {other:?}"),
        }
        let memory: BackendConfig = serde_json::from_str(r#"{"kind":"memory"}"#).unwrap();
        assert_eq!(memory, BackendConfig::Memory);
    }

    #[tokio::test]
    async fn opens_memory_backend() {
        let backend = open_backend(&BackendConfig::Memory).await.unwrap();
        assert_eq!(backend.name(), "memory");
        assert!(backend.load_all().await.unwrap().is_empty());
    }
}
