use super::*;
use warden_core::Unique;

/// Verified against when a username is unknown, so both sign-in failures
/// cost one Argon2 verification.
const DECOY: &str = "decoy-password";

/// Sign-in and sign-up over a credential store.
///
/// Holds no mutable state; share it freely across workers.
pub struct Issuer<S> {
    store: S,
    crypto: Crypto,
    settings: Settings,
    decoy: String,
}

impl<S> Issuer<S>
where
    S: Credentials,
{
    /// Validates `settings` eagerly so misconfiguration never surfaces
    /// mid-traffic.
    pub fn new(store: S, settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let decoy = password::hash(DECOY, settings.hashing()).map_err(ConfigError::Hashing)?;
        Ok(Self {
            crypto: Crypto::new(&settings),
            store,
            settings,
            decoy,
        })
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn crypto(&self) -> &Crypto {
        &self.crypto
    }

    /// Token for an existing principal.
    ///
    /// Unknown usernames and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<String, AuthError> {
        check(username, password)?;
        let principal = match self.store.find(username).await {
            Ok(principal) => principal,
            Err(StoreError::NotFound) => {
                password::verify(password, &self.decoy);
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(self.unexpected("sign-in", username, AuthError::Store(e))),
        };
        if !password::verify(password, principal.hashword()) {
            log::debug!(target: self.settings.logger(), "sign-in rejected username={}", username);
            return Err(AuthError::InvalidCredentials);
        }
        self.mint(&principal)
    }

    /// Registers a principal and returns its first token.
    pub async fn sign_up(&self, username: &str, password: &str) -> Result<String, AuthError> {
        check(username, password)?;
        let hashword = password::hash(password, self.settings.hashing())
            .map_err(|e| self.unexpected("sign-up", username, AuthError::Hashing(e)))?;
        let principal = match self.store.create(username, &hashword).await {
            Ok(principal) => principal,
            Err(StoreError::Conflict) => return Err(AuthError::UsernameTaken),
            Err(e) => return Err(self.unexpected("sign-up", username, AuthError::Store(e))),
        };
        log::info!(
            target: self.settings.logger(),
            "principal created id={} username={}",
            principal.id(),
            principal.username()
        );
        self.mint(&principal)
    }

    /// Pure structural check of a token issued by this service.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.crypto.verify(token)
    }

    fn mint(&self, principal: &Principal) -> Result<String, AuthError> {
        let claims = self
            .crypto
            .claims(principal.id(), std::time::SystemTime::now());
        self.crypto
            .encode(&claims)
            .map_err(|e| self.unexpected("signing", principal.username(), AuthError::Signing(e)))
    }

    fn unexpected(&self, flow: &str, username: &str, error: AuthError) -> AuthError {
        log::error!(
            target: self.settings.logger(),
            "{} failed username={} error={}",
            flow,
            username,
            error
        );
        error
    }
}

fn check(username: &str, password: &str) -> Result<(), AuthError> {
    match username.is_empty() || password.is_empty() {
        true => Err(AuthError::InvalidInput),
        false => Ok(()),
    }
}
