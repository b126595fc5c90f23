use super::*;

const DEFAULT_EXPIRATION: std::time::Duration = std::time::Duration::from_secs(15 * 60);
const DEFAULT_ISSUER: &str = "warden";
const DEFAULT_LOGGER: &str = "warden::auth";

/// Issuer configuration.
///
/// Built once from named options and validated by [`Issuer::new`];
/// immutable afterwards.
#[derive(Clone)]
pub struct Settings {
    secret: Vec<u8>,
    expiration: std::time::Duration,
    issuer: String,
    logger: String,
    hashing: argon2::Params,
}

impl Settings {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            expiration: DEFAULT_EXPIRATION,
            issuer: DEFAULT_ISSUER.to_string(),
            logger: DEFAULT_LOGGER.to_string(),
            hashing: argon2::Params::DEFAULT,
        }
    }
    /// Token lifetime added to the issue time. `exp` is rounded up to the
    /// next whole second.
    pub fn with_expiration(self, expiration: std::time::Duration) -> Self {
        Self { expiration, ..self }
    }
    /// Value of the `iss` claim.
    pub fn with_issuer(self, issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..self
        }
    }
    /// Log target for diagnostic events.
    pub fn with_logger(self, logger: impl Into<String>) -> Self {
        Self {
            logger: logger.into(),
            ..self
        }
    }
    /// Argon2 cost parameters for new hashes.
    pub fn with_hashing(self, hashing: argon2::Params) -> Self {
        Self { hashing, ..self }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
    pub fn expiration(&self) -> std::time::Duration {
        self.expiration
    }
    pub fn issuer(&self) -> &str {
        &self.issuer
    }
    pub fn logger(&self) -> &str {
        &self.logger
    }
    pub fn hashing(&self) -> &argon2::Params {
        &self.hashing
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Secret);
        }
        if self.expiration.is_zero() || self.expiration.as_secs() > i64::MAX as u64 / 2 {
            return Err(ConfigError::Expiration(self.expiration));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("secret", &"<redacted>")
            .field("expiration", &self.expiration)
            .field("issuer", &self.issuer)
            .field("logger", &self.logger)
            .field("hashing", &self.hashing)
            .finish()
    }
}
