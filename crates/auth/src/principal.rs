use warden_core::ID;
use warden_core::Unique;

/// Registered identity with a hashed credential.
///
/// Created only by sign-up and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    id: ID<Self>,
    username: String,
    hashword: String,
    created: std::time::SystemTime,
}

impl Principal {
    pub fn new(
        id: ID<Self>,
        username: String,
        hashword: String,
        created: std::time::SystemTime,
    ) -> Self {
        Self {
            id,
            username,
            hashword,
            created,
        }
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    /// Argon2 PHC string.
    pub fn hashword(&self) -> &str {
        &self.hashword
    }
    pub fn created_at(&self) -> std::time::SystemTime {
        self.created
    }
}

impl Unique for Principal {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

impl std::fmt::Debug for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("hashword", &"<redacted>")
            .field("created", &self.created)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_hash() {
        let principal = Principal::new(
            ID::default(),
            "alice".to_string(),
            "$argon2id$v=19$secret".to_string(),
            std::time::SystemTime::now(),
        );
        let debug = format!("{:?}", principal);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("argon2id"));
    }
}
