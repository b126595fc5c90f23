//! PostgreSQL connectivity and versioned schema migrations.
//!
//! The store is connected once at process start, migrated to the newest
//! schema version, and only then shared with request handlers.
//!
//! ## Connectivity
//!
//! - [`connect()`] — Opens a [`Store`] from a connection address
//! - [`Store`] — Owned client plus its background connection task
//!
//! ## Migrations
//!
//! - [`Migration`] — One versioned pair of up/down scripts
//! - [`Migrator`] — Discovers, orders, and applies migrations
//! - [`Ledger`] — Persisted migration state, implemented for [`Store`]
//! - [`State`] — Uninitialized, at a version, or failed
//!
//! ## Table Names
//!
//! Constants for every table the service owns.
mod errors;
mod ledger;
mod migration;
mod migrator;

pub use errors::*;
pub use ledger::*;
pub use migration::*;
pub use migrator::*;

use tokio_postgres::Client;

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// Table for registered principals.
#[rustfmt::skip]
pub const PRINCIPALS: &str = "principals";
/// Table holding the single migration ledger row.
#[rustfmt::skip]
pub const LEDGER:     &str = "schema_ledger";

/// Connected PostgreSQL store.
///
/// Owns the client and the task driving its connection. Dropping the store
/// closes the connection, so holding it in a scope releases it on every
/// exit path, including startup failures after connecting.
pub struct Store {
    client: Client,
    connection: tokio::task::JoinHandle<()>,
}

impl Store {
    pub fn client(&self) -> &Client {
        &self.client
    }
    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }
}

impl std::ops::Deref for Store {
    type Target = Client;
    fn deref(&self) -> &Client {
        &self.client
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.connection.abort();
    }
}

/// Establishes a database connection.
///
/// Parses `address` (URL or key/value form) and connects without TLS.
/// Must be called from within a tokio runtime.
pub async fn connect(address: &str) -> Result<Store, ConnectionError> {
    let config = address
        .parse::<tokio_postgres::Config>()
        .map_err(ConnectionError::Address)?;
    log::info!("connecting to database");
    let (client, connection) = config
        .connect(tokio_postgres::tls::NoTls)
        .await
        .map_err(ConnectionError::Unreachable)?;
    let connection = tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("database connection closed error={}", e);
        }
    });
    let store = Store { client, connection };
    store
        .execute("SET client_min_messages TO WARNING", &[])
        .await
        .map_err(ConnectionError::Unreachable)?;
    Ok(store)
}
