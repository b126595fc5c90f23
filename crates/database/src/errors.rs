use super::*;
use std::path::PathBuf;

type Source = Box<dyn std::error::Error + Send + Sync>;

/// The store could not be reached at all.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("malformed database address: {0}")]
    Address(#[source] PgErr),
    #[error("database unreachable: {0}")]
    Unreachable(#[source] PgErr),
}

/// Schema application failed or cannot proceed.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("migration directory {path} is unreadable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed migration file {0}")]
    Malformed(String),
    #[error("migration {0} is defined more than once")]
    Duplicate(Version),
    #[error("migration {0} has no up script")]
    MissingUp(Version),
    #[error("migration {0} has no down script")]
    MissingDown(Version),
    #[error("store is at version {0} which has no migration in the directory")]
    Unknown(Version),
    #[error("migration {0} failed previously; resolve it and force a version")]
    Dirty(Version),
    #[error("migration ledger: {0}")]
    Ledger(#[source] Source),
    #[error("migration {version} ({name}) failed: {source}")]
    Script {
        version: Version,
        name: String,
        #[source]
        source: Source,
    },
}

impl MigrationError {
    pub(crate) fn ledger<E>(e: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Ledger(Box::new(e))
    }
}
