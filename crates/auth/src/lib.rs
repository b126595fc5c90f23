//! Token issuance and credential verification.
//!
//! JWT-based identity tokens with Argon2 password hashing. Principals are
//! registered through sign-up and authenticated through sign-in; both flows
//! end in a signed, time-bounded token.
//!
//! ## Identity Types
//!
//! - [`Principal`] — Registered identity with a hashed credential
//! - [`Claims`] — JWT payload structure
//!
//! ## Issuance
//!
//! - [`Issuer`] — Sign-in and sign-up orchestration
//! - [`Settings`] — Immutable, eagerly validated configuration
//! - [`Crypto`] — JWT signing and verification
//! - [`Credentials`] — Principal persistence
//! - [`password`] — Argon2 hashing and verification
mod claims;
mod crypto;
mod dto;
mod errors;
mod issuer;
pub mod password;
mod principal;
mod repository;
mod settings;

pub use claims::*;
pub use crypto::*;
pub use dto::*;
pub use errors::*;
pub use issuer::*;
pub use principal::*;
pub use repository::*;
pub use settings::*;

#[cfg(feature = "server")]
mod handlers;
#[cfg(feature = "server")]
mod middleware;
#[cfg(feature = "server")]
pub use handlers::*;
#[cfg(feature = "server")]
pub use middleware::*;

#[cfg(test)]
mod memory;
