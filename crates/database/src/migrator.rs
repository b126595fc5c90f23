use super::*;
use std::path::Path;

/// Applies a directory of versioned migrations to a [`Ledger`].
///
/// Migrations run strictly in version order, one unit per version, and
/// stop at the first failure. A failure is recorded in the ledger and
/// blocks further runs until an operator calls [`Migrator::force`].
/// Failed scripts are never rolled back through their down script.
#[derive(Debug, Clone)]
pub struct Migrator {
    migrations: Vec<Migration>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    from: State,
    to: State,
    applied: Vec<Version>,
}

impl Report {
    pub fn from(&self) -> State {
        self.from
    }
    pub fn to(&self) -> State {
        self.to
    }
    /// Versions whose scripts ran, in execution order.
    pub fn applied(&self) -> &[Version] {
        &self.applied
    }
}

/// Ledger state together with the versions still to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub state: State,
    pub pending: Vec<Version>,
}

impl Migrator {
    /// Discovers every migration in `directory`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, MigrationError> {
        let directory = directory.as_ref();
        let migrations = Migration::discover(directory)?;
        log::debug!(
            "discovered {} migrations in {}",
            migrations.len(),
            directory.display()
        );
        Ok(Self { migrations })
    }
    pub fn latest(&self) -> Option<Version> {
        self.migrations.last().map(Migration::version)
    }

    pub async fn status<L>(&self, ledger: &mut L) -> Result<Status, MigrationError>
    where
        L: Ledger,
    {
        ledger.prepare().await.map_err(MigrationError::ledger)?;
        let state = ledger.state().await.map_err(MigrationError::ledger)?;
        let current = state.current();
        Ok(Status {
            state,
            pending: self
                .migrations
                .iter()
                .map(Migration::version)
                .filter(|v| Some(*v) > current)
                .collect(),
        })
    }

    /// Applies every pending up script in ascending order.
    pub async fn up<L>(&self, ledger: &mut L) -> Result<Report, MigrationError>
    where
        L: Ledger,
    {
        let from = self.clean(ledger).await?;
        let mut current = from.current();
        let mut applied = Vec::new();
        let pending = self
            .migrations
            .iter()
            .filter(|m| Some(m.version()) > from.current());
        for migration in pending {
            log::info!(
                "applying migration version={} name={}",
                migration.version(),
                migration.name()
            );
            let to = State::At(migration.version());
            self.run(ledger, migration, migration.up(), current, to).await?;
            current = Some(migration.version());
            applied.push(migration.version());
        }
        let to = current.map_or(State::Uninitialized, State::At);
        log::info!("schema {} ({} applied)", to, applied.len());
        Ok(Report { from, to, applied })
    }

    /// Reverts the newest `steps` applied migrations in descending order.
    pub async fn down<L>(&self, ledger: &mut L, steps: usize) -> Result<Report, MigrationError>
    where
        L: Ledger,
    {
        let from = self.clean(ledger).await?;
        let mut current = from.current();
        let mut applied = Vec::new();
        let reverting = self
            .migrations
            .iter()
            .rev()
            .skip_while(|m| Some(m.version()) > current)
            .take(steps)
            .collect::<Vec<_>>();
        for migration in reverting {
            let script = migration
                .down()
                .ok_or(MigrationError::MissingDown(migration.version()))?;
            let previous = self
                .migrations
                .iter()
                .map(Migration::version)
                .take_while(|v| *v < migration.version())
                .last();
            log::info!(
                "reverting migration version={} name={}",
                migration.version(),
                migration.name()
            );
            let to = previous.map_or(State::Uninitialized, State::At);
            self.run(ledger, migration, script, current, to).await?;
            current = previous;
            applied.push(migration.version());
        }
        let to = current.map_or(State::Uninitialized, State::At);
        log::info!("schema {} ({} reverted)", to, applied.len());
        Ok(Report { from, to, applied })
    }

    /// Sets the ledger to `version` without running scripts.
    /// Zero resets it to uninitialized. Clears a failed state.
    pub async fn force<L>(&self, ledger: &mut L, version: Version) -> Result<State, MigrationError>
    where
        L: Ledger,
    {
        let state = match version {
            0 => State::Uninitialized,
            v if self.contains(v) => State::At(v),
            v => return Err(MigrationError::Unknown(v)),
        };
        ledger.prepare().await.map_err(MigrationError::ledger)?;
        ledger.record(state).await.map_err(MigrationError::ledger)?;
        log::warn!("schema forced to {}", state);
        Ok(state)
    }

    fn contains(&self, version: Version) -> bool {
        self.migrations
            .binary_search_by_key(&version, Migration::version)
            .is_ok()
    }

    /// Reads the ledger and refuses to continue from a failed or foreign state.
    async fn clean<L>(&self, ledger: &mut L) -> Result<State, MigrationError>
    where
        L: Ledger,
    {
        ledger.prepare().await.map_err(MigrationError::ledger)?;
        match ledger.state().await.map_err(MigrationError::ledger)? {
            State::Failed { failed, .. } => Err(MigrationError::Dirty(failed)),
            State::At(version) if !self.contains(version) => Err(MigrationError::Unknown(version)),
            state => Ok(state),
        }
    }

    async fn run<L>(
        &self,
        ledger: &mut L,
        migration: &Migration,
        script: &str,
        current: Option<Version>,
        to: State,
    ) -> Result<(), MigrationError>
    where
        L: Ledger,
    {
        match ledger.apply(script, to).await {
            Ok(()) => Ok(()),
            Err(source) => {
                log::error!(
                    "migration failed version={} name={} error={}",
                    migration.version(),
                    migration.name(),
                    source
                );
                let failed = State::Failed {
                    at: current,
                    failed: migration.version(),
                };
                if let Err(e) = ledger.record(failed).await {
                    log::error!(
                        "could not record failed migration version={} error={}",
                        migration.version(),
                        e
                    );
                }
                Err(MigrationError::Script {
                    version: migration.version(),
                    name: migration.name().to_string(),
                    source: Box::new(source),
                })
            }
        }
    }
}
