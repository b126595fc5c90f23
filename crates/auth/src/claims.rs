use super::*;
use warden_core::ID;

/// Signed token payload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: uuid::Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        subject: ID<Principal>,
        issuer: &str,
        lifetime: std::time::Duration,
        now: std::time::SystemTime,
    ) -> Self {
        let end = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_add(lifetime);
        // whole seconds on the wire; rounding up keeps the full lifetime
        let exp = end.as_secs().saturating_add((end.subsec_nanos() > 0) as u64);
        Self {
            sub: subject.inner(),
            iss: issuer.to_string(),
            iat: warden_core::unix(now),
            exp: i64::try_from(exp).unwrap_or(i64::MAX),
        }
    }
    /// A token is live only while `exp` lies strictly in the future.
    pub fn expired_at(&self, now: std::time::SystemTime) -> bool {
        self.exp <= warden_core::unix(now)
    }
    pub fn subject(&self) -> ID<Principal> {
        ID::from(self.sub)
    }
    pub fn issuer(&self) -> &str {
        &self.iss
    }
}
