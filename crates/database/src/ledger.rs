use super::*;
use tokio_postgres::GenericClient;

/// Persisted migration state of one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing has been applied yet.
    Uninitialized,
    /// Every migration up to and including this version is applied.
    At(Version),
    /// The script of `failed` did not apply while the store stood at `at`.
    Failed {
        at: Option<Version>,
        failed: Version,
    },
}

impl State {
    pub fn current(&self) -> Option<Version> {
        match self {
            Self::Uninitialized => None,
            Self::At(version) => Some(*version),
            Self::Failed { at, .. } => *at,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::At(version) => write!(f, "at {}", version),
            Self::Failed { at: Some(at), failed } => write!(f, "failed {} at {}", failed, at),
            Self::Failed { at: None, failed } => write!(f, "failed {} uninitialized", failed),
        }
    }
}

/// Storage of the migration state, owned by [`Migrator`].
///
/// `apply` must be atomic: either the script's effects and the new state
/// both persist, or neither does.
#[allow(async_fn_in_trait)]
pub trait Ledger {
    type Error: std::error::Error + Send + Sync + 'static;
    /// Creates the ledger if it does not exist.
    async fn prepare(&mut self) -> Result<(), Self::Error>;
    async fn state(&mut self) -> Result<State, Self::Error>;
    /// Runs `script` and moves the ledger to `to` in one unit.
    async fn apply(&mut self, script: &str, to: State) -> Result<(), Self::Error>;
    /// Overwrites the ledger without running anything.
    async fn record(&mut self, state: State) -> Result<(), Self::Error>;
}

impl Ledger for Store {
    type Error = PgErr;

    async fn prepare(&mut self) -> Result<(), PgErr> {
        self.client()
            .batch_execute(const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                LEDGER,
                " (
                    version     BIGINT NOT NULL,
                    failed      BIGINT
                );"
            ))
            .await
    }

    async fn state(&mut self) -> Result<State, PgErr> {
        self.client()
            .query_opt(
                const_format::concatcp!("SELECT version, failed FROM ", LEDGER, " LIMIT 1"),
                &[],
            )
            .await
            .map(|row| match row {
                None => State::Uninitialized,
                Some(row) => decode(row.get::<_, i64>(0), row.get::<_, Option<i64>>(1)),
            })
    }

    async fn apply(&mut self, script: &str, to: State) -> Result<(), PgErr> {
        let tx = self.client_mut().transaction().await?;
        tx.batch_execute(script).await?;
        write(&tx, to).await?;
        tx.commit().await
    }

    async fn record(&mut self, state: State) -> Result<(), PgErr> {
        let tx = self.client_mut().transaction().await?;
        write(&tx, state).await?;
        tx.commit().await
    }
}

/// Replaces the single ledger row. Zero encodes "nothing applied".
async fn write<C>(client: &C, state: State) -> Result<(), PgErr>
where
    C: GenericClient,
{
    client
        .execute(const_format::concatcp!("DELETE FROM ", LEDGER), &[])
        .await?;
    let (version, failed) = encode(state);
    if version == 0 && failed.is_none() {
        return Ok(());
    }
    client
        .execute(
            const_format::concatcp!("INSERT INTO ", LEDGER, " (version, failed) VALUES ($1, $2)"),
            &[&version, &failed],
        )
        .await
        .map(|_| ())
}

fn encode(state: State) -> (i64, Option<i64>) {
    match state {
        State::Uninitialized => (0, None),
        State::At(version) => (version as i64, None),
        State::Failed { at, failed } => (at.unwrap_or(0) as i64, Some(failed as i64)),
    }
}

fn decode(version: i64, failed: Option<i64>) -> State {
    let at = (version > 0).then_some(version as Version);
    match (at, failed) {
        (_, Some(failed)) => State::Failed {
            at,
            failed: failed as Version,
        },
        (Some(version), None) => State::At(version),
        (None, None) => State::Uninitialized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_row_encoding() {
        for state in [
            State::Uninitialized,
            State::At(1000),
            State::Failed { at: None, failed: 1000 },
            State::Failed { at: Some(1000), failed: 1001 },
        ] {
            let (version, failed) = encode(state);
            assert_eq!(decode(version, failed), state);
        }
    }

    #[test]
    fn current_version() {
        assert_eq!(State::Uninitialized.current(), None);
        assert_eq!(State::At(4).current(), Some(4));
        assert_eq!(State::Failed { at: Some(4), failed: 5 }.current(), Some(4));
    }

    /// Runs against a real server when `DATABASE_URL` is set.
    /// Drops and recreates the `public` schema.
    #[tokio::test]
    async fn postgres_ledger() {
        let Ok(ref url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let mut store = connect(url).await.unwrap();
        store
            .batch_execute("DROP SCHEMA public CASCADE; CREATE SCHEMA public;")
            .await
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let write = |file: &str, sql: &str| std::fs::write(dir.path().join(file), sql).unwrap();
        write("1000_first.up.sql", r#"CREATE TABLE "films" ("prod" varchar);"#);
        write("1000_first.down.sql", r#"DROP TABLE "films";"#);
        write("1001_second.up.sql", r#"CREATE ms" ("prod");"#);
        write("1001_second.down.sql", "SELECT 1;");
        let migrator = Migrator::open(dir.path()).unwrap();
        let result = migrator.up(&mut store).await;
        assert!(matches!(result, Err(MigrationError::Script { version: 1001, .. })));
        assert_eq!(
            store.state().await.unwrap(),
            State::Failed { at: Some(1000), failed: 1001 }
        );
        store.execute(r#"SELECT * FROM "films""#, &[]).await.unwrap();

        write("1001_second.up.sql", r#"CREATE TABLE "users" ("name" varchar);"#);
        let migrator = Migrator::open(dir.path()).unwrap();
        migrator.force(&mut store, 1000).await.unwrap();
        let report = migrator.up(&mut store).await.unwrap();
        assert_eq!(report.applied(), &[1001]);
        let report = migrator.up(&mut store).await.unwrap();
        assert!(report.applied().is_empty());

        let report = migrator.down(&mut store, 2).await.unwrap();
        assert_eq!(report.applied(), &[1001, 1000]);
        assert_eq!(store.state().await.unwrap(), State::Uninitialized);
        store
            .batch_execute("DROP SCHEMA public CASCADE; CREATE SCHEMA public;")
            .await
            .unwrap();
    }
}
