use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::{metrics, models::ContactRequest, AppState};

/// Relay a contact form submission
///
/// Relay failures are reported in the body with a 200 status.
pub async fn contact(
    state: web::Data<AppState>,
    payload: web::Json<ContactRequest>,
) -> HttpResponse {
    match state.contact.send(&payload).await {
        Ok(()) => {
            metrics::record_auth_event("contact", "success");
            HttpResponse::Ok().json(json!({ "msg": "Contact" }))
        }
        Err(e) => {
            tracing::error!(error = %e, "contact relay failed");
            metrics::record_auth_event("contact", "failure");
            HttpResponse::Ok().json(json!({ "error": "Mail not sent" }))
        }
    }
}
