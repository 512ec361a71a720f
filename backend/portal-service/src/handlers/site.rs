use actix_web::HttpResponse;
use serde_json::json;

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "msg": "Home" }))
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
