//! Catalog store for the Folio gallery.
//!
//! [`CatalogStore`] holds the authoritative in-memory artwork list. Every
//! mutation goes through the configured
//! [`ArtworkBackend`](folio_store::ArtworkBackend) and is followed by a full
//! reload, so the list always mirrors the backend rather than a local guess.
//! Presentation code reads a snapshot and re-renders when a
//! [`CatalogEvent`] arrives.
//!
//! # Modules
//!
//! - [`store`] - [`CatalogStore`]: refresh, add, update, delete
//! - [`views`] - pure filters over a snapshot: category, availability, featured
//! - [`event`] - [`CatalogEvent`] notifications and [`CatalogStatus`]
//! - [`error`] - [`CatalogError`] and the user-facing [`ErrorKind`] taxonomy

pub mod error;
pub mod event;
pub mod store;
pub mod views;

pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use event::{CatalogEvent, CatalogStatus};
pub use store::CatalogStore;
pub use views::{
    featured, filter_by_availability, filter_by_category, GalleryQuery, HOME_FEATURED_LIMIT,
};
