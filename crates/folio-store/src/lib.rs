//! Persistence backends for the Folio gallery.
//!
//! Every backend implements [`ArtworkBackend`]: load the whole catalog,
//! upload an image and get back a fetchable reference, insert, patch and
//! delete records. Backends normalize what they read so callers only ever
//! see the canonical [`ArtworkRecord`](folio_types::ArtworkRecord) shape,
//! ordered newest first.
//!
//! # Backends
//!
//! - [`RemoteBackend`] -- hosted table + object storage over HTTP
//! - [`LocalBackend`] -- a single JSON file plus an images directory
//! - [`InMemoryBackend`] -- `RwLock`-guarded vectors for tests and embedding
//!
//! One backend is chosen at startup from [`BackendConfig`] via
//! [`open_backend`]; the rest of the system only holds a
//! `dyn ArtworkBackend`.

pub mod config;
pub mod error;
pub mod inline;
pub mod local;
pub mod memory;
pub mod remote;
pub mod row;
pub mod seed;
pub mod traits;

pub use config::{open_backend, BackendConfig, LocalConfig, RemoteConfig};
pub use error::{StoreError, StoreResult};
pub use inline::InlineImage;
pub use local::LocalBackend;
pub use memory::InMemoryBackend;
pub use remote::RemoteBackend;
pub use row::{sort_newest_first, ArtworkRow};
pub use traits::ArtworkBackend;
