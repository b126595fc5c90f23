use super::*;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;
use std::time::Duration;
use warden_auth::Settings;
use warden_core::parse_duration;
use warden_database::Version;

/// Token service command line. Every option can come from the environment.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Signed identity tokens over PostgreSQL")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Migrate the store to the newest schema, then serve sign-in and sign-up.
    Serve(Config),
    /// Inspect or move the schema version without serving.
    Migrate {
        #[command(flatten)]
        database: Database,
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum Action {
    /// Apply every pending migration.
    Up,
    /// Revert the newest applied migrations.
    Down {
        #[arg(default_value_t = 1)]
        steps: usize,
    },
    /// Print the ledger state and pending versions.
    Status,
    /// Set the ledger to a version without running scripts (0 resets it).
    Force { version: Version },
}

/// Store address and migration scripts.
#[derive(Debug, Clone, Args)]
pub struct Database {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
    #[arg(long, env = "MIGRATIONS_FOLDER", default_value = "./db/migrations")]
    pub migrations: PathBuf,
}

/// Everything `serve` needs, parsed and validated before touching the store.
#[derive(Debug, Clone, Args)]
pub struct Config {
    #[command(flatten)]
    pub database: Database,
    /// Listen address.
    #[arg(long, env = "HOST")]
    pub host: String,
    #[arg(long, env = "TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: String,
    #[arg(long, env = "TOKEN_ISSUER", default_value = "warden")]
    pub token_issuer: String,
    #[arg(long, env = "TOKEN_EXPIRE", value_parser = parse_duration)]
    pub token_expire: Duration,
    #[arg(long, env = "HTTP_READ_TIMEOUT", value_parser = parse_duration)]
    pub http_read_timeout: Duration,
    #[arg(long, env = "HTTP_WRITE_TIMEOUT", value_parser = parse_duration)]
    pub http_write_timeout: Duration,
    #[arg(long, env = "HTTP_IDLE_TIMEOUT", value_parser = parse_duration)]
    pub http_idle_timeout: Duration,
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings::new(self.token_secret.as_bytes())
            .with_expiration(self.token_expire)
            .with_issuer(self.token_issuer.as_str())
            .with_logger("warden::auth")
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve(config) => serve(config).await,
            Command::Migrate { database, action } => migrate(database, action).await,
        }
    }
}

async fn migrate(database: Database, action: Action) -> anyhow::Result<()> {
    let migrator = warden_database::Migrator::open(&database.migrations)?;
    let ref mut store = warden_database::connect(&database.database_url).await?;
    let report = match action {
        Action::Up => migrator.up(store).await?,
        Action::Down { steps } => migrator.down(store, steps).await?,
        Action::Force { version } => {
            migrator.force(store, version).await?;
            return Ok(());
        }
        Action::Status => {
            let status = migrator.status(store).await?;
            log::info!(
                "schema {} latest={:?} pending={:?}",
                status.state,
                migrator.latest(),
                status.pending
            );
            return Ok(());
        }
    };
    log::info!(
        "schema moved from {} to {} versions={:?}",
        report.from(),
        report.to(),
        report.applied()
    );
    Ok(())
}
