use actix_web::{HttpResponse, Responder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)
        .expect("static metric options are valid");

    if let Err(e) = prometheus::default_registry().register(Box::new(counter.clone())) {
        tracing::error!(metric = name, error = %e, "failed to register metric");
    }
    counter
}

/// Register, login, refresh, logout and contact outcomes
static AUTH_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "portal_auth_events_total",
        "Authentication events by event and outcome",
        &["event", "outcome"],
    )
});

/// Rejected credentials by reason
static TOKEN_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_counter_vec(
        "portal_token_rejections_total",
        "Rejected credentials by reason",
        &["reason"],
    )
});

#[inline]
pub fn record_auth_event(event: &str, outcome: &str) {
    AUTH_EVENTS_TOTAL.with_label_values(&[event, outcome]).inc();
}

#[inline]
pub fn record_token_rejection(reason: &str) {
    TOKEN_REJECTIONS_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_show_up_in_registry() {
        record_auth_event("login", "success");
        record_token_rejection("revoked");

        let names: Vec<String> = prometheus::gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();
        assert!(names.contains(&"portal_auth_events_total".to_string()));
        assert!(names.contains(&"portal_token_rejections_total".to_string()));
    }
}
