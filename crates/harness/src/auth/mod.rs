//! Identity provider authentication.
//!
//! [`IdentityProvider`] speaks the provider's REST API; [`CredentialCache`]
//! wraps it with time-based token reuse and turns every failure into "no
//! credential"; [`store`] reads and writes the seeded identity and token files.

mod cache;
mod provider;
pub mod store;

pub use cache::{CredentialCache, CredentialEntry};
pub use provider::IdentityProvider;
pub use store::{CustomTokenRecord, SeededUser, SeededUserStore, StoredToken, TokenFile};
