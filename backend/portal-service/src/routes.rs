use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_middleware::{JwtAuthMiddleware, TokenRequirement};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::web;
use std::path::PathBuf;

use crate::{error::ApiError, handlers, metrics::metrics_handler, AppState};

/// Mount the API, health and metrics routes
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let verifier = state.verifier();

    cfg.app_data(web::Data::new(state.clone()))
        .app_data(json_config())
        .route("/health", web::get().to(handlers::health))
        .route("/metrics", web::get().to(metrics_handler))
        .service(
            web::scope("/api")
                .route("/home", web::get().to(handlers::home))
                .route("/register", web::post().to(handlers::register))
                .route("/login", web::post().to(handlers::login))
                .route("/refresh", web::post().to(handlers::refresh))
                .service(
                    web::resource("/logout")
                        .wrap(JwtAuthMiddleware::new(
                            verifier.clone(),
                            TokenRequirement::Any,
                        ))
                        .route(web::delete().to(handlers::logout)),
                )
                .service(
                    web::resource("/protected")
                        .wrap(JwtAuthMiddleware::new(verifier, TokenRequirement::Access))
                        .route(web::get().to(handlers::protected)),
                )
                .route("/contact", web::post().to(handlers::contact)),
        );
}

/// Malformed or incomplete JSON bodies become 400 responses
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::Validation(err.to_string()).into())
}

/// Serve the single-page client from `static_dir`
///
/// Existing files are served as-is; any other path falls back to
/// `index.html` so client-side routes resolve. Must be registered after the
/// API routes.
pub fn spa_service(static_dir: &str) -> Files {
    let index = PathBuf::from(static_dir).join("index.html");

    Files::new("/", static_dir)
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(&index).await?;
                let res = file.into_response(&req);
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}

/// CORS policy; `None` allows any origin
pub fn cors(allowed_origins: Option<&[String]>) -> Cors {
    let cors = match allowed_origins {
        None => Cors::default().allow_any_origin(),
        Some(origins) => origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin)),
    };

    cors.allow_any_method()
        .allow_any_header()
        .expose_headers(["x-request-id"])
        .max_age(3600)
}
