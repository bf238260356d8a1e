//! HTTP server for the Folio gallery.
//!
//! Serves the public catalog (listing, filters, featured works), the
//! admin-only catalog mutations behind bearer session tokens, and the
//! contact form relay.

pub mod config;
pub mod contact;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::{ContactConfig, ServerConfig};
pub use contact::{ContactMessage, ContactRelay, FormRelay, MemoryRelay};
pub use error::{ServerError, ServerResult};
pub use server::FolioServer;
pub use state::{Admin, AppState, BearerToken};
