use actix_web::HttpMessage;
use actix_web::HttpResponse;
use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::error::InternalError;
use actix_web::http::header::HeaderName;
use actix_web::http::header::HeaderValue;
use actix_web::middleware::Next;
use std::time::Duration;
use warden_auth::ErrorResponse;

/// Correlation header, echoed on every response.
pub const REQUEST_ID: &str = "x-request-id";

/// Correlation identifier of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Upper bound on handling one request. Stored as app data.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(pub Duration);

/// Adopts the caller's `x-request-id` or mints a UUID v7, stores it in the
/// request extensions, and echoes it on the response.
pub async fn correlate(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let id = req
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.call(req).await?;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID), value);
    }
    Ok(res)
}

/// Drops the handler when the [`Deadline`] elapses. Dropping aborts any
/// in-flight store call, and the request fails with 503.
pub async fn deadline(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let Some(Deadline(limit)) = req.app_data::<Deadline>().copied() else {
        return next.call(req).await;
    };
    let path = req.path().to_owned();
    let id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    match tokio::time::timeout(limit, next.call(req)).await {
        Ok(res) => res,
        Err(_) => {
            log::warn!("request deadline exceeded id={} path={} limit={:?}", id, path, limit);
            let res = HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "request deadline exceeded".to_string(),
            });
            Err(InternalError::from_response("request deadline exceeded", res).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::HttpRequest;
    use actix_web::dev::Service;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::test;
    use actix_web::web;
    use warden_auth::AuthRequest;
    use warden_auth::Credentials;
    use warden_auth::Issuer;
    use warden_auth::Principal;
    use warden_auth::Settings;
    use warden_auth::StoreError;

    async fn echo(req: HttpRequest) -> HttpResponse {
        let id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();
        HttpResponse::Ok().body(id)
    }

    async fn slow() -> HttpResponse {
        tokio::time::sleep(Duration::from_secs(5)).await;
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn mints_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(correlate))
                .route("/", web::get().to(echo)),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        let header = res.headers().get(REQUEST_ID).unwrap().to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&header).is_ok());
        let body = test::read_body(res).await;
        assert_eq!(body, header.as_bytes());
    }

    #[actix_web::test]
    async fn adopts_inbound_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(correlate))
                .route("/", web::get().to(echo)),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((REQUEST_ID, "abc-123"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.headers().get(REQUEST_ID).unwrap(), "abc-123");
    }

    /// Knows nobody and refuses every registration.
    struct Nobody;

    impl Credentials for Nobody {
        async fn find(&self, _: &str) -> Result<Principal, StoreError> {
            Err(StoreError::NotFound)
        }
        async fn create(&self, _: &str, _: &str) -> Result<Principal, StoreError> {
            Err(StoreError::Conflict)
        }
    }

    #[actix_web::test]
    async fn deadline_aborts_slow_handlers() {
        let app = test::init_service(
            App::new()
                .app_data(Deadline(Duration::from_millis(50)))
                .wrap(from_fn(deadline))
                .route("/slow", web::get().to(slow))
                .route("/fast", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;
        let req = test::TestRequest::get().uri("/slow").to_request();
        let error = match app.call(req).await {
            Ok(_) => panic!("slow handler finished"),
            Err(error) => error,
        };
        let res = error.error_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let req = test::TestRequest::get().uri("/fast").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn routed_requests_pass_both_middlewares() {
        let issuer = web::Data::new(Issuer::new(Nobody, Settings::new("s3cret")).unwrap());
        let crypto = web::Data::new(issuer.crypto().clone());
        let app = test::init_service(
            App::new()
                .wrap(from_fn(deadline))
                .wrap(from_fn(correlate))
                .app_data(Deadline(Duration::from_secs(5)))
                .app_data(issuer)
                .app_data(crypto)
                .configure(warden_auth::routes::<Nobody>),
        )
        .await;
        let body = AuthRequest {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let req = test::TestRequest::post()
            .uri("/users/sign_in")
            .insert_header((REQUEST_ID, "abc-123"))
            .set_json(&body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get(REQUEST_ID).unwrap(), "abc-123");
        let req = test::TestRequest::post()
            .uri("/users/sign_up")
            .set_json(&body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
