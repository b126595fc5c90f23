//! Signed, time-bounded identity tokens over a migrated PostgreSQL store.
//!
//! The workspace splits into:
//!
//! - [`warden_core`] — Typed identifiers, durations, logging
//! - [`warden_database`] — Store connectivity and the migration runner
//! - [`warden_auth`] — Token issuance, password hashing, credential store
//! - [`warden_server`] — Command line, middleware, and HTTP server
pub use warden_auth as auth;
pub use warden_database as database;
pub use warden_server as server;

pub use warden_core::*;
pub use warden_server::Cli;
