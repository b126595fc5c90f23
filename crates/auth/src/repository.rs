use super::*;
use std::sync::Arc;

/// Persistence of principals.
///
/// The store is the single source of truth: no caching, no write-behind.
/// `create` must report a taken username as [`StoreError::Conflict`]
/// however the violation is detected.
#[allow(async_fn_in_trait)]
pub trait Credentials {
    async fn find(&self, username: &str) -> Result<Principal, StoreError>;
    async fn create(&self, username: &str, hashword: &str) -> Result<Principal, StoreError>;
}

impl<T> Credentials for Arc<T>
where
    T: Credentials,
{
    async fn find(&self, username: &str) -> Result<Principal, StoreError> {
        T::find(self, username).await
    }
    async fn create(&self, username: &str, hashword: &str) -> Result<Principal, StoreError> {
        T::create(self, username, hashword).await
    }
}

#[cfg(feature = "database")]
mod postgres {
    use super::*;
    use tokio_postgres::error::SqlState;
    use warden_core::ID;
    use warden_core::Unique;
    use warden_database::*;

    /// The `UNIQUE` constraint on `username` arbitrates concurrent sign-ups;
    /// there is no pre-check.
    impl Credentials for Store {
        async fn find(&self, username: &str) -> Result<Principal, StoreError> {
            self.query_opt(
                const_format::concatcp!(
                    "SELECT id, username, password_hash, created_at FROM ",
                    PRINCIPALS,
                    " WHERE username = $1"
                ),
                &[&username],
            )
            .await
            .map_err(backend)?
            .map(|row| {
                Principal::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    row.get::<_, String>(1),
                    row.get::<_, String>(2),
                    row.get::<_, std::time::SystemTime>(3),
                )
            })
            .ok_or(StoreError::NotFound)
        }

        async fn create(&self, username: &str, hashword: &str) -> Result<Principal, StoreError> {
            let principal = Principal::new(
                ID::default(),
                username.to_string(),
                hashword.to_string(),
                std::time::SystemTime::now(),
            );
            self.execute(
                const_format::concatcp!(
                    "INSERT INTO ",
                    PRINCIPALS,
                    " (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)"
                ),
                &[
                    &principal.id().inner(),
                    &principal.username(),
                    &principal.hashword(),
                    &principal.created_at(),
                ],
            )
            .await
            .map_err(|e| match e.code() {
                Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::Conflict,
                _ => backend(e),
            })?;
            Ok(principal)
        }
    }

    fn backend(e: PgErr) -> StoreError {
        StoreError::Backend(Box::new(e))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        /// Runs against a real server when `DATABASE_URL` is set.
        #[tokio::test]
        async fn postgres_credentials() {
            let Ok(ref url) = std::env::var("DATABASE_URL") else {
                return;
            };
            let mut store = connect(url).await.unwrap();
            let migrator = Migrator::open(concat!(env!("CARGO_MANIFEST_DIR"), "/../../db/migrations"))
                .unwrap();
            migrator.up(&mut store).await.unwrap();
            let username = format!("user-{}", uuid::Uuid::now_v7());
            assert!(matches!(store.find(&username).await, Err(StoreError::NotFound)));
            let created = store.create(&username, "hash").await.unwrap();
            let found = store.find(&username).await.unwrap();
            assert_eq!(found.id(), created.id());
            assert_eq!(found.hashword(), "hash");
            assert!(matches!(
                store.create(&username, "other").await,
                Err(StoreError::Conflict)
            ));
        }
    }
}
