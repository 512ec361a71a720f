/// Portal Service - Main entry point
use actix_middleware::Logging;
use actix_web::{App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use portal_service::{
    config::Config,
    db::{self, PgRevocationStore, PgUserStore},
    routes,
    security::{RevocationCache, TokenLifecycle},
    services::ContactRelay,
    telemetry, AppState,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env().context("Failed to load configuration from environment")?;
    tracing::info!(
        "Starting portal service on {}:{}",
        config.server_host,
        config.server_port
    );

    let db_config =
        db_pool::DbConfig::from_env_with_url("portal-service", config.database_url.clone())?;
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to create database pool")?;
    db_pool::migrate(&pool, &db::MIGRATOR)
        .await
        .context("Failed to run database migrations")?;

    let keys = config.jwt_keys().context("Invalid JWT_SECRET_KEY")?;
    let tokens = TokenLifecycle::new(
        keys,
        RevocationCache::new(),
        Arc::new(PgRevocationStore::new(pool.clone())),
    );
    let contact =
        ContactRelay::new(&config.smtp).context("Invalid contact relay configuration")?;
    tracing::info!(
        smtp_enabled = contact.is_enabled(),
        "Contact relay ready"
    );

    let state = AppState {
        users: Arc::new(PgUserStore::new(pool)),
        tokens: Arc::new(tokens),
        contact,
    };

    let origins = config.allowed_origins();
    let static_dir = config.static_dir.clone();
    let bind_addr = (config.server_host.clone(), config.server_port);

    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors(origins.as_deref()))
            .wrap(Logging)
            .wrap(TracingLogger::default())
            .configure(|cfg| routes::configure(cfg, &state))
            .service(routes::spa_service(&static_dir))
    })
    .bind(bind_addr)
    .with_context(|| format!("Failed to bind {}:{}", config.server_host, config.server_port))?
    .run()
    .await?;

    tracing::info!("Portal service stopped");
    Ok(())
}
