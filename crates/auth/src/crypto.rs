use super::*;
use warden_core::ID;

/// JWT signing and verification with a shared HMAC secret.
///
/// Verification is pure: no I/O, safe to call from any number of tasks.
#[derive(Clone)]
pub struct Crypto {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
    validation: jsonwebtoken::Validation,
    issuer: String,
    lifetime: std::time::Duration,
}

impl Crypto {
    pub fn new(settings: &Settings) -> Self {
        let mut validation = jsonwebtoken::Validation::new(jsonwebtoken::Algorithm::HS256);
        // expiry is checked against an explicit clock in verify_at
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[settings.issuer()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(settings.secret()),
            decoding: jsonwebtoken::DecodingKey::from_secret(settings.secret()),
            validation,
            issuer: settings.issuer().to_string(),
            lifetime: settings.expiration(),
        }
    }
    /// Claims for `subject` issued at `now`.
    pub fn claims(&self, subject: ID<Principal>, now: std::time::SystemTime) -> Claims {
        Claims::new(subject, &self.issuer, self.lifetime, now)
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
            claims,
            &self.encoding,
        )
    }
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, std::time::SystemTime::now())
    }
    /// Checks signature and issuer, then rejects tokens expired at `now`.
    pub fn verify_at(&self, token: &str, now: std::time::SystemTime) -> Result<Claims, TokenError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)?;
        if claims.expired_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use std::time::SystemTime;

    fn crypto(secret: &str, issuer: &str, lifetime: Duration) -> Crypto {
        Crypto::new(
            &Settings::new(secret)
                .with_issuer(issuer)
                .with_expiration(lifetime),
        )
    }

    #[test]
    fn token_roundtrip() {
        let crypto = crypto("s3cret", "auth-svc", Duration::from_secs(3600));
        let subject = ID::default();
        let now = SystemTime::now();
        let claims = crypto.claims(subject, now);
        let token = crypto.encode(&claims).unwrap();
        let verified = crypto.verify_at(&token, now).unwrap();
        assert_eq!(verified, claims);
        assert_eq!(verified.subject(), subject);
    }

    #[test]
    fn short_lived_token_expires() {
        let crypto = crypto("s3cret", "auth-svc", Duration::from_secs(1));
        let now = SystemTime::now();
        let token = crypto.encode(&crypto.claims(ID::default(), now)).unwrap();
        assert!(crypto.verify_at(&token, now).is_ok());
        assert!(matches!(
            crypto.verify_at(&token, now + Duration::from_secs(2)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn token_issued_late_in_a_second_survives() {
        let crypto = crypto("s3cret", "auth-svc", Duration::from_secs(1));
        let issued = SystemTime::UNIX_EPOCH + Duration::from_millis(1_700_000_000_999);
        let token = crypto.encode(&crypto.claims(ID::default(), issued)).unwrap();
        assert!(crypto.verify_at(&token, issued + Duration::from_millis(2)).is_ok());
        assert!(matches!(
            crypto.verify_at(&token, issued + Duration::from_secs(2)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn wrong_secret_always_fails() {
        let signer = crypto("s3cret", "auth-svc", Duration::from_secs(3600));
        let verifier = crypto("other", "auth-svc", Duration::from_secs(3600));
        let now = SystemTime::now();
        let token = signer.encode(&signer.claims(ID::default(), now)).unwrap();
        assert!(matches!(
            verifier.verify_at(&token, now),
            Err(TokenError::Invalid(_))
        ));
        assert!(matches!(
            verifier.verify_at(&token, now + Duration::from_secs(7200)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn foreign_issuer_fails() {
        let signer = crypto("s3cret", "elsewhere", Duration::from_secs(3600));
        let verifier = crypto("s3cret", "auth-svc", Duration::from_secs(3600));
        let now = SystemTime::now();
        let token = signer.encode(&signer.claims(ID::default(), now)).unwrap();
        assert!(verifier.verify_at(&token, now).is_err());
    }

    #[test]
    fn garbage_fails() {
        let crypto = crypto("s3cret", "auth-svc", Duration::from_secs(3600));
        assert!(crypto.verify("not.a.token").is_err());
        assert!(crypto.verify("").is_err());
    }
}
