/// Invalid issuer configuration, detected at construction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    Secret,
    #[error("token expiration must be positive, got {0:?}")]
    Expiration(std::time::Duration),
    #[error("password hashing parameters rejected: {0}")]
    Hashing(argon2::password_hash::Error),
}

/// Signals from the credential store. Consumed by [`crate::Issuer`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("principal not found")]
    NotFound,
    #[error("username already taken")]
    Conflict,
    #[error("credential store: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Request-level failure of sign-in or sign-up.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("username already taken")]
    UsernameTaken,
    #[error("username and password are required")]
    InvalidInput,
    #[error("credential store failure: {0}")]
    Store(#[source] StoreError),
    #[error("password hashing failure: {0}")]
    Hashing(argon2::password_hash::Error),
    #[error("token signing failure: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// Failures the caller cannot fix by changing the request.
    pub fn internal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Hashing(_) | Self::Signing(_))
    }
}

/// Token rejected by [`crate::Crypto::verify`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
}

#[cfg(feature = "server")]
mod response {
    use super::*;
    use actix_web::HttpResponse;
    use actix_web::ResponseError;
    use actix_web::http::StatusCode;

    impl ResponseError for AuthError {
        fn status_code(&self) -> StatusCode {
            match self {
                Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
                Self::UsernameTaken => StatusCode::CONFLICT,
                Self::InvalidInput => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
        fn error_response(&self) -> HttpResponse {
            let error = match self.internal() {
                true => "internal server error".to_string(),
                false => self.to_string(),
            };
            HttpResponse::build(self.status_code()).json(crate::ErrorResponse { error })
        }
    }

    impl ResponseError for TokenError {
        fn status_code(&self) -> StatusCode {
            StatusCode::UNAUTHORIZED
        }
        fn error_response(&self) -> HttpResponse {
            HttpResponse::Unauthorized().json(crate::ErrorResponse {
                error: "invalid token".to_string(),
            })
        }
    }
}
