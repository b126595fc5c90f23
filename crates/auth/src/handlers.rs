use super::*;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::error::JsonPayloadError;
use actix_web::web;

/// Mounts the `/users` routes for an issuer over store `S`.
///
/// Expects `web::Data<Issuer<S>>` and `web::Data<Crypto>` in app data.
pub fn routes<S>(cfg: &mut web::ServiceConfig)
where
    S: Credentials + 'static,
{
    cfg.service(
        web::scope("/users")
            .app_data(web::JsonConfig::default().error_handler(rejected))
            .route("/sign_in", web::post().to(sign_in::<S>))
            .route("/sign_up", web::post().to(sign_up::<S>))
            .route("/me", web::get().to(me)),
    );
}

/// Unreadable bodies answer like empty fields, without parser details.
fn rejected(error: JsonPayloadError, _: &HttpRequest) -> actix_web::Error {
    log::debug!("request body rejected error={}", error);
    AuthError::InvalidInput.into()
}

pub async fn sign_in<S>(
    issuer: web::Data<Issuer<S>>,
    req: web::Json<AuthRequest>,
) -> Result<HttpResponse, AuthError>
where
    S: Credentials + 'static,
{
    let token = issuer.sign_in(&req.username, &req.password).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub async fn sign_up<S>(
    issuer: web::Data<Issuer<S>>,
    req: web::Json<AuthRequest>,
) -> Result<HttpResponse, AuthError>
where
    S: Credentials + 'static,
{
    let token = issuer.sign_up(&req.username, &req.password).await?;
    Ok(HttpResponse::Created().json(TokenResponse { token }))
}

pub async fn me(auth: Auth) -> HttpResponse {
    HttpResponse::Ok().json(IdentityResponse {
        id: auth.subject().to_string(),
        issuer: auth.claims().issuer().to_string(),
        expires_at: auth.claims().exp,
    })
}
