//! Foundation types for the Folio gallery.
//!
//! This crate provides the data model shared by every other Folio crate:
//! the artwork record itself, its fixed category set, the price input
//! parser, and the classification of raw image text into inline payloads
//! versus already-stored references.
//!
//! # Key Types
//!
//! - [`ArtworkRecord`] - The sole persisted entity
//! - [`ArtworkId`] - Stable record identifier, immutable after creation
//! - [`Category`] / [`CategoryFilter`] - Fixed category set and the gallery filter
//! - [`NewArtwork`] / [`ArtworkPatch`] - Add input and partial update input
//! - [`PriceInput`] - Raw price as typed by the admin, see [`parse_price`]
//! - [`ImageSource`] - Inline `data:` payload or stored reference

pub mod artwork;
pub mod category;
pub mod error;
pub mod id;
pub mod image;
pub mod price;

pub use artwork::{ArtworkFields, ArtworkPatch, ArtworkRecord, FieldPatch, NewArtwork};
pub use category::{Category, CategoryFilter};
pub use error::TypeError;
pub use id::ArtworkId;
pub use image::{ImageSource, INLINE_PREFIX};
pub use price::{parse_price, PriceInput};
