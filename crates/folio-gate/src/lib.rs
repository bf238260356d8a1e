//! Admin session gate for the Folio gallery.
//!
//! Only a logged-in admin may mutate the catalog. The gate supports two
//! policies behind one [`AdminPolicy`] trait, picked once at startup:
//!
//! - [`AllowListPolicy`] -- sign in against an external identity service,
//!   then require the identity's email to match the configured address (any
//!   identity is accepted when no address is configured).
//! - [`SharedSecretPolicy`] -- compare a submitted secret with one
//!   configured value; no identity service involved.
//!
//! [`AdminGate`] turns successful logins into opaque session tokens and
//! tracks each session's [`SessionState`]. Failure messages are meant to be
//! shown to the person at the login form as-is.

pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod policy;
pub mod session;

pub use config::{AdminConfig, AdminPolicyConfig};
pub use error::{GateError, GateResult};
pub use gate::AdminGate;
pub use identity::{Identity, IdentityProvider, InMemoryIdentityProvider, RemoteIdentityProvider};
pub use policy::{
    AdminPolicy, AllowListPolicy, AuthenticatedAdmin, Credentials, SharedSecretPolicy,
    NOT_ALLOWED_MESSAGE,
};
pub use session::{AdminSession, SessionState, SessionToken};
