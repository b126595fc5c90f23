//! Token service backend.
//!
//! Parses configuration, connects and migrates the store, then serves the
//! sign-in and sign-up routes on an actix-web server.
//!
//! ## Submodules
//!
//! - [`cli`] — Command line and environment configuration
//! - [`middleware`] — Request correlation and deadlines
pub mod cli;
pub mod middleware;

pub use cli::*;
pub use middleware::*;

use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::middleware::from_fn;
use actix_web::web;
use std::sync::Arc;
use warden_auth::Issuer;
use warden_database::Store;

async fn health(store: web::Data<Arc<Store>>) -> impl Responder {
    match store
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed error={}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

/// Startup sequence: validate settings, connect, migrate, serve.
///
/// Any failure before the listener binds aborts startup. The store is
/// released on every exit path when its last handle drops.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let settings = config.settings();
    settings.validate()?;
    let migrator = warden_database::Migrator::open(&config.database.migrations)?;
    let mut store = warden_database::connect(&config.database.database_url).await?;
    migrator.up(&mut store).await?;
    let store = Arc::new(store);
    let issuer = web::Data::new(Issuer::new(store.clone(), settings)?);
    let crypto = web::Data::new(issuer.crypto().clone());
    let store = web::Data::new(store);
    let limit = Deadline(config.http_write_timeout);
    log::info!("listening on {}", config.host);
    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(deadline))
            .wrap(from_fn(correlate))
            .wrap(Logger::new("%{x-request-id}o %r %s %Ts"))
            .app_data(limit)
            .app_data(issuer.clone())
            .app_data(crypto.clone())
            .app_data(store.clone())
            .route("/health", web::get().to(health))
            .configure(warden_auth::routes::<Arc<Store>>)
    })
    .client_request_timeout(config.http_read_timeout)
    .keep_alive(config.http_idle_timeout)
    .bind(&config.host)?
    .run()
    .await?;
    log::info!("server stopped");
    Ok(())
}
